//! Splits a blob of back-to-back JPEG streams into record ranges.
//!
//! The splitter looks for the two-byte start signature with a SIMD-accelerated
//! substring search, hands each hit to [`RecordScanner`](crate::jpeg::RecordScanner)
//! and either yields the completed range or steps two bytes past a false
//! start. The search position never moves backwards, so a signature that sits
//! inside an already yielded record is never revisited.

use crate::jpeg::{scan_record, SOI};
use crate::types::{ExtractedRecord, RejectedCandidate, SplitReport};
use memchr::memmem::Finder;

/// One result of the splitting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Record(ExtractedRecord),
    Rejected(RejectedCandidate),
}

/// Lazy iterator over every start signature in a blob and its verdict.
pub struct Splitter<'a> {
    blob: &'a [u8],
    finder: Finder<'static>,
    search: usize,
}

impl<'a> Splitter<'a> {
    #[must_use]
    pub fn new(blob: &'a [u8]) -> Self {
        Self {
            blob,
            finder: Finder::new(&SOI),
            search: 0,
        }
    }

    /// Offset from which the next start signature will be searched.
    #[inline]
    pub fn position(&self) -> usize {
        self.search
    }

    /// Only the successfully extracted records, in discovery order.
    pub fn records(self) -> impl Iterator<Item = ExtractedRecord> + 'a {
        self.filter_map(|candidate| match candidate {
            Candidate::Record(record) => Some(record),
            Candidate::Rejected(_) => None,
        })
    }
}

impl Iterator for Splitter<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let rest = self.blob.get(self.search..)?;
        let start = self.search + self.finder.find(rest)?;

        match scan_record(self.blob, start) {
            Ok(end) => {
                self.search = end;
                Some(Candidate::Record(ExtractedRecord::new(start, end)))
            }
            Err(reason) => {
                tracing::debug!(offset = start, %reason, "rejected start signature");
                self.search = start + SOI.len();
                Some(Candidate::Rejected(RejectedCandidate {
                    offset: start,
                    reason,
                }))
            }
        }
    }
}

/// Returns every well-formed record in `blob`, silently skipping false starts.
#[must_use]
pub fn split(blob: &[u8]) -> Vec<ExtractedRecord> {
    Splitter::new(blob).records().collect()
}

/// Like [`split`], but also reports the start signatures that were rejected.
#[must_use]
pub fn split_with_report(blob: &[u8]) -> SplitReport {
    let mut report = SplitReport::default();

    for candidate in Splitter::new(blob) {
        match candidate {
            Candidate::Record(record) => report.records.push(record),
            Candidate::Rejected(rejected) => report.rejected.push(rejected),
        }
    }

    tracing::debug!(
        records = report.record_count(),
        rejected = report.rejected_count(),
        "split pass complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    fn record(payload: &[u8]) -> Vec<u8> {
        [
            &[0xFF, 0xD8][..],
            &[0xFF, 0xE0, 0x00, 0x04, 0x01, 0x02][..],
            &[0xFF, 0xDA, 0x00, 0x02][..],
            payload,
            &[0xFF, 0xD9][..],
        ]
        .concat()
    }

    #[test]
    fn test_concrete_scenario() {
        let blob = record(&[0xAA, 0xFF, 0x00, 0xBB]);
        assert_eq!(split(&blob), vec![ExtractedRecord::new(0, blob.len())]);
    }

    #[test]
    fn test_empty_blob() {
        assert!(split(&[]).is_empty());
        assert!(split_with_report(&[]).rejected.is_empty());
    }

    #[test]
    fn test_two_back_to_back() {
        let first = record(&[0x01, 0x02]);
        let second = record(&[0x03, 0xFF, 0x00]);
        let blob = [first.clone(), second.clone()].concat();

        assert_eq!(
            split(&blob),
            vec![
                ExtractedRecord::new(0, first.len()),
                ExtractedRecord::new(first.len(), blob.len()),
            ]
        );
    }

    #[test]
    fn test_signature_inside_payload_is_not_revisited() {
        // FF D8 inside a segment payload must not start a second record
        let blob = [
            0xFF, 0xD8, 0xFF, 0xFE, 0x00, 0x06, 0xFF, 0xD8, 0x00, 0x00, 0xFF, 0xD9,
        ];
        assert_eq!(split(&blob), vec![ExtractedRecord::new(0, 12)]);
    }

    #[test]
    fn test_dangling_start_yields_nothing() {
        let blob = [0x00, 0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0x10, 0x20];
        let report = split_with_report(&blob);
        assert!(report.records.is_empty());
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(report.rejected[0].offset, 1);
        assert_eq!(
            report.rejected[0].reason,
            ScanError::UnterminatedRecord { start: 1 }
        );
    }

    #[test]
    fn test_false_positive_then_real_record() {
        let genuine = record(&[0x42]);
        let mut blob = vec![0x12, 0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x01, 0x99];
        let offset = blob.len();
        blob.extend_from_slice(&genuine);

        let report = split_with_report(&blob);
        assert_eq!(
            report.records,
            vec![ExtractedRecord::new(offset, blob.len())]
        );
        assert_eq!(report.rejected_count(), 1);
        assert!(matches!(
            report.rejected[0].reason,
            ScanError::InvalidSegmentLength { length: 1, .. }
        ));
    }

    #[test]
    fn test_splitter_position_advances() {
        let blob = record(&[0x01]);
        let mut splitter = Splitter::new(&blob);
        assert_eq!(splitter.position(), 0);
        assert!(matches!(splitter.next(), Some(Candidate::Record(_))));
        assert_eq!(splitter.position(), blob.len());
        assert_eq!(splitter.next(), None);
    }
}
