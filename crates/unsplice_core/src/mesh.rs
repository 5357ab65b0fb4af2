//! Decoder for SHD mesh blocks.
//!
//! The header holds two big-endian offsets: the descriptor table at `0x38` and
//! the start of the trailing texture data at `0x3C`. The descriptor table is
//! zero-padded; the first non-zero word starts a record whose first two words
//! locate a packed float3 vertex array. The u16 triangle index list that
//! follows is found by its characteristic `0, 1, 2` opening.

use crate::error::{CoreError, MeshError, Result};
use memchr::memmem;
use std::io::{self, Write};

const DESCRIPTOR_OFFSET_FIELD: usize = 0x38;
const MARKER_OFFSET_FIELD: usize = 0x3C;
const DESCRIPTOR_SEARCH_SPAN: usize = 0x200;
const DESCRIPTOR_TAIL_GUARD: usize = 16;
const VERTEX_STRIDE: usize = 12;
const INDEX_RUN_PATTERN: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x00, 0x02];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshLayout {
    pub record: usize,
    pub floats_offset: usize,
    pub vertex_end: usize,
    pub index_start: usize,
    pub index_end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub layout: MeshLayout,
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u16; 3]>,
}

#[inline]
fn read_u32_be(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(CoreError::OutOfBounds {
            offset: offset as u64,
            max: data.len() as u64,
        })
}

fn find_first_record(data: &[u8], descriptor: usize) -> Option<usize> {
    let end = (descriptor + DESCRIPTOR_SEARCH_SPAN)
        .min(data.len().saturating_sub(DESCRIPTOR_TAIL_GUARD));

    (descriptor..end)
        .step_by(4)
        .find(|&offset| read_u32_be(data, offset).is_ok_and(|word| word != 0))
}

impl Mesh {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let descriptor = read_u32_be(data, DESCRIPTOR_OFFSET_FIELD)? as usize;
        let marker = read_u32_be(data, MARKER_OFFSET_FIELD)? as usize;

        let record =
            find_first_record(data, descriptor).ok_or(MeshError::DescriptorNotFound(descriptor))?;

        let relative_floats = read_u32_be(data, record)? as usize;
        let vertex_end = read_u32_be(data, record + 4)? as usize;
        let floats_offset = record + relative_floats;

        if floats_offset >= data.len() || vertex_end > data.len() {
            return Err(MeshError::OffsetsOutOfRange {
                floats: floats_offset,
                end: vertex_end,
            }
            .into());
        }
        if vertex_end <= floats_offset {
            return Err(MeshError::EmptyVertexRange {
                floats: floats_offset,
                end: vertex_end,
            }
            .into());
        }

        let vertex_bytes = vertex_end - floats_offset;
        if vertex_bytes % VERTEX_STRIDE != 0 {
            return Err(MeshError::MisalignedVertexBlock(vertex_bytes).into());
        }

        let index_end = marker.min(data.len());
        let index_start = data
            .get(vertex_end..index_end)
            .and_then(|window| memmem::find(window, INDEX_RUN_PATTERN))
            .map(|pos| vertex_end + pos)
            .ok_or(MeshError::IndexRunNotFound(vertex_end))?;

        let vertices: Vec<[f32; 3]> = data[floats_offset..vertex_end]
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| {
                let f = |i: usize| f32::from_be_bytes([v[i], v[i + 1], v[i + 2], v[i + 3]]);
                [f(0), f(4), f(8)]
            })
            .collect();

        let vertex_count = vertices.len();
        // an odd search end still reads the u16 that straddles it
        let indices: Vec<u16> = (index_start..index_end)
            .step_by(2)
            .map_while(|off| data.get(off..off + 2))
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .collect();

        let faces: Vec<[u16; 3]> = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .filter(|t| t.iter().all(|&i| (i as usize) < vertex_count))
            .collect();

        tracing::debug!(
            vertices = vertex_count,
            faces = faces.len(),
            dropped = indices.len() / 3 - faces.len(),
            "decoded mesh"
        );

        Ok(Self {
            layout: MeshLayout {
                record,
                floats_offset,
                vertex_end,
                index_start,
                index_end,
            },
            vertices,
            faces,
        })
    }

    /// Writes the mesh as Wavefront OBJ with 1-based face indices.
    pub fn write_obj<W: Write>(&self, out: &mut W, source_name: &str) -> io::Result<()> {
        let l = &self.layout;
        writeln!(out, "# {}", source_name)?;
        writeln!(
            out,
            "# rec=0x{:X} floats_ofs=0x{:X} next_ofs=0x{:X}",
            l.record, l.floats_offset, l.vertex_end
        )?;
        writeln!(
            out,
            "# vert_count={} idx_start=0x{:X} idx_end=0x{:X}",
            self.vertices.len(),
            l.index_start,
            l.index_end
        )?;
        writeln!(out, "o shd_mesh")?;

        for [x, y, z] in &self.vertices {
            writeln!(out, "v {:.6} {:.6} {:.6}", x, y, z)?;
        }
        for [a, b, c] in &self.faces {
            writeln!(out, "f {} {} {}", *a as u32 + 1, *b as u32 + 1, *c as u32 + 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_u32(data: &mut [u8], offset: usize, value: u32) {
        data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn build_shd() -> Vec<u8> {
        let mut data = vec![0u8; 0x40];
        data[..4].copy_from_slice(b"shd.");

        // descriptor table: one zero word, then the record at 0x44
        data.extend_from_slice(&[0u8; 4]);
        let record = data.len();
        data.extend_from_slice(&[0u8; 0x10]);
        put_u32(&mut data, record, 0x10);

        let floats = data.len();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.5, -2.0]] {
            for c in v {
                data.extend_from_slice(&c.to_be_bytes());
            }
        }
        let vertex_end = data.len();
        put_u32(&mut data, record + 4, vertex_end as u32);
        assert_eq!(floats, record + 0x10);

        data.extend_from_slice(&[0xEE, 0xEE]);
        for i in [0u16, 1, 2, 2, 1, 5] {
            data.extend_from_slice(&i.to_be_bytes());
        }
        let marker = data.len();
        data.extend_from_slice(b"TPL0");

        put_u32(&mut data, 0x38, 0x40);
        put_u32(&mut data, 0x3C, marker as u32);
        data
    }

    #[test]
    fn test_decode_synthetic_mesh() {
        let data = build_shd();
        let mesh = Mesh::decode(&data).unwrap();

        assert_eq!(mesh.layout.record, 0x44);
        assert_eq!(mesh.layout.floats_offset, 0x54);
        assert_eq!(mesh.layout.vertex_end, 0x78);
        assert_eq!(mesh.layout.index_start, 0x7A);
        assert_eq!(mesh.layout.index_end, 0x86);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[2], [0.0, 1.5, -2.0]);
        // the second triangle references vertex 5 and is dropped
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_write_obj() {
        let mesh = Mesh::decode(&build_shd()).unwrap();
        let mut out = Vec::new();
        mesh.write_obj(&mut out, "mesh.shd").unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# mesh.shd");
        assert_eq!(lines[1], "# rec=0x44 floats_ofs=0x54 next_ofs=0x78");
        assert_eq!(lines[2], "# vert_count=3 idx_start=0x7A idx_end=0x86");
        assert_eq!(lines[3], "o shd_mesh");
        assert_eq!(lines[6], "v 0.000000 1.500000 -2.000000");
        assert_eq!(lines[7], "f 1 2 3");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_odd_index_end_reads_straddling_index() {
        let mut data = build_shd();
        // last index becomes 0 so the second triangle is valid
        data[0x85] = 0;
        put_u32(&mut data, 0x3C, 0x85);

        let mesh = Mesh::decode(&data).unwrap();
        assert_eq!(mesh.layout.index_end, 0x85);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [2, 1, 0]]);
    }

    #[test]
    fn test_index_read_stops_at_blob_end() {
        let mut data = build_shd();
        data.truncate(0x85);
        put_u32(&mut data, 0x3C, 0x85);

        let mesh = Mesh::decode(&data).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            Mesh::decode(&[0u8; 0x20]),
            Err(CoreError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_descriptor_missing() {
        let mut data = vec![0u8; 0x100];
        put_u32(&mut data, 0x38, 0x40);
        assert!(matches!(
            Mesh::decode(&data),
            Err(CoreError::Mesh(MeshError::DescriptorNotFound(0x40)))
        ));
    }

    #[test]
    fn test_misaligned_vertex_block() {
        let mut data = build_shd();
        put_u32(&mut data, 0x44 + 4, 0x77);
        assert!(matches!(
            Mesh::decode(&data),
            Err(CoreError::Mesh(MeshError::MisalignedVertexBlock(35)))
        ));
    }

    #[test]
    fn test_empty_vertex_range() {
        let mut data = build_shd();
        put_u32(&mut data, 0x44 + 4, 0x54);
        assert!(matches!(
            Mesh::decode(&data),
            Err(CoreError::Mesh(MeshError::EmptyVertexRange { .. }))
        ));
    }

    #[test]
    fn test_index_run_missing() {
        let mut data = build_shd();
        put_u32(&mut data, 0x3C, 0x7C);
        assert!(matches!(
            Mesh::decode(&data),
            Err(CoreError::Mesh(MeshError::IndexRunNotFound(0x78)))
        ));
    }
}
