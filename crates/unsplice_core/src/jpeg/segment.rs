use super::MarkerClass;
use crate::error::ScanError;

/// Outcome of consuming one marker's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue { cursor: usize, in_scan: bool },
    End { cursor: usize },
}

/// Advances past the payload of a single marker.
///
/// `cursor` must point at the byte right after the two-byte marker. Length
/// fields are big-endian and count their own two bytes, so the smallest legal
/// value is 2.
pub fn walk_segment(
    blob: &[u8],
    cursor: usize,
    class: MarkerClass,
    in_scan: bool,
) -> Result<Step, ScanError> {
    match class {
        MarkerClass::End => Ok(Step::End { cursor }),
        MarkerClass::Standalone => Ok(Step::Continue { cursor, in_scan }),
        MarkerClass::ScanStart => Ok(Step::Continue {
            cursor: skip_length_prefixed(blob, cursor)?,
            in_scan: true,
        }),
        MarkerClass::LengthPrefixed => Ok(Step::Continue {
            cursor: skip_length_prefixed(blob, cursor)?,
            in_scan,
        }),
    }
}

fn skip_length_prefixed(blob: &[u8], cursor: usize) -> Result<usize, ScanError> {
    let field = blob
        .get(cursor..)
        .and_then(|rest| rest.get(..2))
        .ok_or(ScanError::TruncatedSegment { offset: cursor })?;

    let length = u16::from_be_bytes([field[0], field[1]]);
    if length < 2 {
        return Err(ScanError::InvalidSegmentLength {
            offset: cursor,
            length,
        });
    }

    let end = cursor + length as usize;
    if end > blob.len() {
        return Err(ScanError::TruncatedSegment { offset: cursor });
    }

    Ok(end)
}
