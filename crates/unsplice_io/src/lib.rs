mod blob;
pub mod discovery;
pub mod extract;
pub mod manifest;
pub mod writer;

pub use blob::Blob;
pub use extract::{
    dump_blocks, split_file, BlockDump, BlockDumpOptions, BlockStatus, ExtractError,
    SplitOptions, SplitSummary,
};
pub use writer::{RecordWriter, WriteError, WriteOutcome};
