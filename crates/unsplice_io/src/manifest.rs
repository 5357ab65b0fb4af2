use crate::writer::WriteError;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use unsplice_core::ExtractedRecord;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub source_offset: String,
    pub source_offset_decimal: usize,
    pub file_size: usize,
    pub sha256_hash: String,
}

/// Sidecar describing where every extracted file came from.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub source: String,
    pub source_size: usize,
    pub extraction_timestamp: String,
    pub rejected_candidates: usize,
    pub records: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(source: &Path, source_size: usize) -> Self {
        Self {
            source: source.display().to_string(),
            source_size,
            extraction_timestamp: Utc::now().to_rfc3339(),
            rejected_candidates: 0,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, filename: &str, record: &ExtractedRecord, data: &[u8]) {
        self.records.push(ManifestEntry {
            filename: filename.to_string(),
            source_offset: format!("0x{:016X}", record.start),
            source_offset_decimal: record.start,
            file_size: record.len(),
            sha256_hash: compute_sha256(data),
        });
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, WriteError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            compute_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_manifest_written_as_json() {
        let dir = tempdir().unwrap();
        let blob = [0x00, 0xFF, 0xD8, 0xFF, 0xD9];
        let record = ExtractedRecord::new(1, 5);

        let mut manifest = Manifest::new(Path::new("input.bin"), blob.len());
        manifest.rejected_candidates = 2;
        manifest.push("img_0000.jpg", &record, record.slice(&blob));

        let path = manifest.write_to(dir.path()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(value["source"], "input.bin");
        assert_eq!(value["rejected_candidates"], 2);
        assert_eq!(value["records"][0]["filename"], "img_0000.jpg");
        assert_eq!(value["records"][0]["source_offset"], "0x0000000000000001");
        assert_eq!(value["records"][0]["file_size"], 4);
        assert_eq!(value["records"][0]["sha256_hash"].as_str().unwrap().len(), 64);
    }
}
