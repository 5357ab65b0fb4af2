pub mod blocks;
mod error;
pub mod jpeg;
pub mod mesh;
pub mod splitter;
mod types;

pub use error::{CoreError, MeshError, Result, ScanError};
pub use jpeg::{scan_record, MarkerClass, RecordScanner};
pub use splitter::{split, split_with_report, Candidate, Splitter};
pub use types::{ExtractedRecord, RejectedCandidate, SplitReport};
