//! Writes extracted ranges to the local filesystem.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use unsplice_core::blocks::Block;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Manifest serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The target existed and overwriting was not allowed.
    SkippedExisting(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(p) | Self::SkippedExisting(p) => p,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// `img_0007.jpg`
pub fn record_file_name(index: usize) -> String {
    format!("img_{:04}.jpg", index)
}

/// Output directory for an input: `split_<stem>` next to the input, or under
/// `root` when one is given.
pub fn split_dir_for(input: &Path, root: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("blob");
    let name = format!("split_{}", stem);

    match root {
        Some(root) => root.join(name),
        None => input.with_file_name(name),
    }
}

/// Writes files into one output directory.
///
/// The directory is created on the first write, so a pass that finds nothing
/// leaves no empty folders behind.
pub struct RecordWriter {
    output_dir: PathBuf,
    overwrite: bool,
    dir_ready: bool,
    files_written: usize,
    bytes_written: u64,
}

impl RecordWriter {
    pub fn new(output_dir: &Path, overwrite: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            overwrite,
            dir_ready: false,
            files_written: 0,
            bytes_written: 0,
        }
    }

    fn ensure_output_dir(&mut self) -> Result<(), WriteError> {
        if self.dir_ready {
            return Ok(());
        }

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                WriteError::PermissionDenied(self.output_dir.display().to_string())
            } else {
                WriteError::Io(e)
            }
        })?;
        self.dir_ready = true;
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn files_written(&self) -> usize {
        self.files_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn write_record(&mut self, index: usize, data: &[u8]) -> Result<WriteOutcome, WriteError> {
        self.write_named(&record_file_name(index), data)
    }

    pub fn write_block(&mut self, block: &Block, data: &[u8]) -> Result<WriteOutcome, WriteError> {
        self.write_named(&block.file_name(), data)
    }

    pub fn write_named(&mut self, name: &str, data: &[u8]) -> Result<WriteOutcome, WriteError> {
        let path = self.output_dir.join(name);

        if path.exists() && !self.overwrite {
            tracing::debug!(path = %path.display(), "output exists, skipping");
            return Ok(WriteOutcome::SkippedExisting(path));
        }

        self.ensure_output_dir()?;
        let file = File::create(&path)?;
        let mut writer = BufWriter::with_capacity(131_072, file);
        writer.write_all(data)?;
        writer.flush()?;

        self.files_written += 1;
        self.bytes_written += data.len() as u64;

        Ok(WriteOutcome::Written(path))
    }
}
