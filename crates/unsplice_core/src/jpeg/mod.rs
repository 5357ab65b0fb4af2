mod scanner;
mod segment;

pub use scanner::{scan_record, RecordScanner, ScannerState};
pub use segment::{walk_segment, Step};

pub const ESCAPE: u8 = 0xFF;
pub const STUFFING: u8 = 0x00;
pub const SOI: [u8; 2] = [0xFF, 0xD8];
pub const EOI: [u8; 2] = [0xFF, 0xD9];
pub const SOI_BYTE: u8 = 0xD8;
pub const EOI_BYTE: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const TEM: u8 = 0x01;
pub const RST0: u8 = 0xD0;
pub const RST7: u8 = 0xD7;

#[inline]
pub const fn is_restart_marker(marker: u8) -> bool {
    marker >= RST0 && marker <= RST7
}

/// Category of the byte that follows an escape byte.
///
/// The set is closed: anything that is not one of the well-known standalone,
/// scan-start or end markers is treated as a generic length-prefixed segment,
/// so vendor-specific APPn/COM-like segments walk the same way as known ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    /// SOI, TEM and RST0-RST7; no payload follows.
    Standalone,
    /// SOS; a length-prefixed header followed by entropy-coded data.
    ScanStart,
    /// Any segment whose 16-bit big-endian length (including itself) follows.
    LengthPrefixed,
    /// EOI; terminates the record.
    End,
}

impl MarkerClass {
    #[inline]
    pub const fn classify(marker: u8) -> Self {
        match marker {
            EOI_BYTE => Self::End,
            SOS => Self::ScanStart,
            SOI_BYTE | TEM => Self::Standalone,
            m if is_restart_marker(m) => Self::Standalone,
            _ => Self::LengthPrefixed,
        }
    }

    #[inline]
    pub const fn has_length(&self) -> bool {
        matches!(self, Self::ScanStart | Self::LengthPrefixed)
    }
}
