use crate::error::ScanError;
use std::ops::Range;

/// Byte range of one record recovered from a blob. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractedRecord {
    pub start: usize,
    pub end: usize,
}

impl ExtractedRecord {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Borrows the record's bytes out of the blob it was found in.
    #[inline]
    #[must_use]
    pub fn slice<'a>(&self, blob: &'a [u8]) -> &'a [u8] {
        &blob[self.range()]
    }
}

/// A start signature that did not lead to a complete record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedCandidate {
    pub offset: usize,
    pub reason: ScanError,
}

/// Records found in a blob plus the start signatures that were discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub records: Vec<ExtractedRecord>,
    pub rejected: Vec<RejectedCandidate>,
}

impl SplitReport {
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    #[must_use]
    pub fn bytes_recovered(&self) -> usize {
        self.records.iter().map(ExtractedRecord::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_len_and_range() {
        let record = ExtractedRecord::new(4, 10);
        assert_eq!(record.len(), 6);
        assert_eq!(record.range(), 4..10);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_inverted_record_is_empty() {
        let record = ExtractedRecord::new(5, 3);
        assert_eq!(record.len(), 0);
        assert!(record.is_empty());
    }

    #[test]
    fn test_record_slice() {
        let blob = [0u8, 1, 2, 3, 4, 5];
        let record = ExtractedRecord::new(1, 4);
        assert_eq!(record.slice(&blob), &[1, 2, 3]);
    }

    #[test]
    fn test_report_totals() {
        let report = SplitReport {
            records: vec![ExtractedRecord::new(0, 10), ExtractedRecord::new(12, 20)],
            rejected: vec![RejectedCandidate {
                offset: 30,
                reason: ScanError::UnterminatedRecord { start: 30 },
            }],
        };
        assert_eq!(report.record_count(), 2);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(report.bytes_recovered(), 18);
    }
}
