use thiserror::Error;

/// Reasons a single record attempt is abandoned.
///
/// None of these abort a splitting pass: the splitter treats every variant as
/// a false-positive start signature and resumes two bytes later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Segment length at offset {offset:#X} runs past end of blob")]
    TruncatedSegment { offset: usize },

    #[error("Segment length {length} at offset {offset:#X} is smaller than its own field")]
    InvalidSegmentLength { offset: usize, length: u16 },

    #[error("No end marker found for record starting at {start:#X}")]
    UnterminatedRecord { start: usize },

    #[error("Offset {offset:#X} is not a start-of-record marker")]
    NotAtStart { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("Could not locate descriptor record after offset {0:#X}")]
    DescriptorNotFound(usize),

    #[error("Vertex offsets out of range (floats at {floats:#X}, end at {end:#X})")]
    OffsetsOutOfRange { floats: usize, end: usize },

    #[error("Vertex block end {end:#X} must lie after its start {floats:#X}")]
    EmptyVertexRange { floats: usize, end: usize },

    #[error("Vertex block size not a multiple of 12 (got {0})")]
    MisalignedVertexBlock(usize),

    #[error("Could not find index run after offset {0:#X}")]
    IndexRunNotFound(usize),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Offset {offset} is out of bounds (max: {max})")]
    OutOfBounds { offset: u64, max: u64 },

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
