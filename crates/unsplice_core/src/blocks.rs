//! Pointer-table block extraction.
//!
//! Some containers start with a fixed table of 32-bit offsets and no sizes.
//! Each block is assumed to run until the next pointer (or the end of the
//! container for the last one).

use crate::error::{CoreError, Result};
use std::fmt;

const POINTER_SIZE: usize = 4;
const SIGNATURE_PROBE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    #[inline]
    pub fn read_u32(&self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerTable {
    pub table_offset: usize,
    pub count: usize,
    pub endian: Endian,
    /// Added to every pointer when they are relative to some base.
    pub base: u64,
    pub require_monotonic: bool,
}

impl Default for PointerTable {
    fn default() -> Self {
        Self {
            table_offset: 0,
            count: 0,
            endian: Endian::Big,
            base: 0,
            require_monotonic: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Jpeg,
    Shd,
    Unknown,
}

impl BlockKind {
    #[must_use]
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if head.starts_with(b"shd.") {
            Self::Shd
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Shd => "shd",
            Self::Unknown => "bin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNote {
    OutOfRange,
    NonMonotonicNext,
    BadSize,
}

impl fmt::Display for BlockNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::NonMonotonicNext => "NON_MONOTONIC_NEXT_PTR",
            Self::BadSize => "BAD_SIZE",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub index: usize,
    pub offset: u64,
    pub size: u64,
    pub kind: BlockKind,
    pub note: Option<BlockNote>,
}

impl Block {
    fn rejected(index: usize, offset: u64, note: BlockNote) -> Self {
        Self {
            index,
            offset,
            size: 0,
            kind: BlockKind::Unknown,
            note: Some(note),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `block_0003_000098E0_00007540.shd`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "block_{:04}_{:08X}_{:08X}.{}",
            self.index,
            self.offset,
            self.size,
            self.kind.extension()
        )
    }

    #[must_use]
    pub fn slice<'a>(&self, blob: &'a [u8]) -> Option<&'a [u8]> {
        let start = usize::try_from(self.offset).ok()?;
        let len = usize::try_from(self.size).ok()?;
        blob.get(start..start.checked_add(len)?)
    }
}

/// Reads the raw pointer values from the table.
pub fn read_pointers(blob: &[u8], table: &PointerTable) -> Result<Vec<u32>> {
    let table_len = table
        .count
        .checked_mul(POINTER_SIZE)
        .ok_or_else(|| CoreError::InvalidFormat("pointer count overflows".into()))?;
    let end = table.table_offset.saturating_add(table_len);

    let raw = blob
        .get(table.table_offset..end)
        .ok_or(CoreError::OutOfBounds {
            offset: end as u64,
            max: blob.len() as u64,
        })?;

    Ok(raw
        .chunks_exact(POINTER_SIZE)
        .map(|chunk| table.endian.read_u32([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Resolves every table entry into a block, sizing each by its successor.
///
/// Entries that cannot be sized are kept as zero-size blocks carrying a
/// [`BlockNote`], so the index numbering always matches the table.
pub fn read_pointer_blocks(blob: &[u8], table: &PointerTable) -> Result<Vec<Block>> {
    let file_size = blob.len() as u64;
    let offsets: Vec<u64> = read_pointers(blob, table)?
        .into_iter()
        .map(|ptr| table.base.saturating_add(u64::from(ptr)))
        .collect();

    let mut blocks = Vec::with_capacity(offsets.len());

    for (index, &offset) in offsets.iter().enumerate() {
        if offset >= file_size {
            blocks.push(Block::rejected(index, offset, BlockNote::OutOfRange));
            continue;
        }

        let size = match offsets.get(index + 1) {
            Some(&next) if next < offset => {
                // no fallback size exists either way; the flag only changes the log level
                if table.require_monotonic {
                    tracing::warn!(index, offset, next, "pointer table is not monotonic");
                } else {
                    tracing::debug!(index, offset, next, "skipping non-monotonic entry");
                }
                blocks.push(Block::rejected(index, offset, BlockNote::NonMonotonicNext));
                continue;
            }
            Some(&next) => next - offset,
            None => file_size - offset,
        };

        if size == 0 || offset + size > file_size {
            blocks.push(Block::rejected(index, offset, BlockNote::BadSize));
            continue;
        }

        let head_end = (offset as usize + SIGNATURE_PROBE).min(blob.len());
        let kind = BlockKind::detect(&blob[offset as usize..head_end]);

        blocks.push(Block {
            index,
            offset,
            size,
            kind,
            note: None,
        });
    }

    Ok(blocks)
}
