use super::{walk_segment, MarkerClass, Step, ESCAPE, SOI, STUFFING};
use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    /// Walking header segments, every escape byte starts a marker.
    SeekingMarker,
    /// Inside entropy-coded data, `FF 00` is a literal.
    InScanPayload,
    /// End marker consumed; `end` is exclusive.
    Done { end: usize },
}

/// Walks one record from its start-of-record marker to its end marker.
///
/// The scanner never moves backwards: every call to [`RecordScanner::step`]
/// either advances the cursor by at least one byte or finishes the record.
#[derive(Debug, Clone)]
pub struct RecordScanner<'a> {
    blob: &'a [u8],
    start: usize,
    cursor: usize,
    in_scan: bool,
    state: ScannerState,
}

impl<'a> RecordScanner<'a> {
    pub fn new(blob: &'a [u8], start: usize) -> Result<Self, ScanError> {
        if blob.get(start..).is_none_or(|rest| !rest.starts_with(&SOI)) {
            return Err(ScanError::NotAtStart { offset: start });
        }

        Ok(Self {
            blob,
            start,
            cursor: start + SOI.len(),
            in_scan: false,
            state: ScannerState::SeekingMarker,
        })
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn in_scan(&self) -> bool {
        self.in_scan
    }

    #[inline]
    pub fn state(&self) -> ScannerState {
        self.state
    }

    /// Consumes the next marker candidate.
    pub fn step(&mut self) -> Result<ScannerState, ScanError> {
        if let ScannerState::Done { .. } = self.state {
            return Ok(self.state);
        }

        let unterminated = ScanError::UnterminatedRecord { start: self.start };

        let escape = self
            .blob
            .get(self.cursor..)
            .and_then(|rest| memchr::memchr(ESCAPE, rest))
            .map(|pos| self.cursor + pos)
            .ok_or(unterminated)?;

        // a run of fill bytes may precede the real category byte
        let category_at = self.blob[escape..]
            .iter()
            .position(|&b| b != ESCAPE)
            .map(|pos| escape + pos)
            .ok_or(unterminated)?;
        let category = self.blob[category_at];

        self.cursor = category_at + 1;

        if self.in_scan && category == STUFFING {
            return Ok(self.state);
        }

        let class = MarkerClass::classify(category);
        self.state = match walk_segment(self.blob, self.cursor, class, self.in_scan)? {
            Step::End { cursor } => {
                self.cursor = cursor;
                ScannerState::Done { end: cursor }
            }
            Step::Continue { cursor, in_scan } => {
                self.cursor = cursor;
                self.in_scan = in_scan;
                if in_scan {
                    ScannerState::InScanPayload
                } else {
                    ScannerState::SeekingMarker
                }
            }
        };

        Ok(self.state)
    }

    /// Runs to completion and returns the exclusive end offset of the record.
    pub fn run(mut self) -> Result<usize, ScanError> {
        loop {
            if let ScannerState::Done { end } = self.step()? {
                return Ok(end);
            }
        }
    }
}

/// Scans the record that starts at `start` and returns its exclusive end.
pub fn scan_record(blob: &[u8], start: usize) -> Result<usize, ScanError> {
    RecordScanner::new(blob, start)?.run()
}
