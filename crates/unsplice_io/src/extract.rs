//! End-to-end extraction: load an input, run a core pass over it and
//! materialize the results on disk.

use crate::blob::Blob;
use crate::manifest::Manifest;
use crate::writer::{split_dir_for, RecordWriter, WriteError, WriteOutcome};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use unsplice_core::blocks::{read_pointer_blocks, Block, PointerTable};
use unsplice_core::{split_with_report, CoreError};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Parent for the `split_<stem>` directories; next to each input if unset.
    pub output_root: Option<PathBuf>,
    pub overwrite: bool,
    pub manifest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub input_size: usize,
    pub records: usize,
    pub rejected: usize,
    pub written: usize,
    pub skipped_existing: usize,
    pub bytes_written: u64,
    /// The pass stopped early because `running` was cleared.
    pub interrupted: bool,
    pub manifest: Option<PathBuf>,
}

/// Splits one input file into `img_NNNN.jpg` files.
///
/// The output directory only appears once a record is written, so a pass over
/// a folder of unrelated files leaves no empty `split_*` directories behind.
/// Clearing `running` stops the pass before the next record.
pub fn split_file(
    input: &Path,
    options: &SplitOptions,
    running: &AtomicBool,
) -> Result<SplitSummary, ExtractError> {
    let blob = Blob::open(input)?;
    let report = split_with_report(&blob);

    let output_dir = split_dir_for(input, options.output_root.as_deref());
    let mut writer = RecordWriter::new(&output_dir, options.overwrite);
    let mut manifest = Manifest::new(input, blob.len());
    manifest.rejected_candidates = report.rejected_count();

    let mut skipped_existing = 0;
    let mut interrupted = false;
    for (index, record) in report.records.iter().enumerate() {
        if !running.load(Ordering::SeqCst) {
            tracing::warn!(input = %input.display(), index, "split interrupted");
            interrupted = true;
            break;
        }

        let data = record.slice(&blob);
        let outcome = writer.write_record(index, data)?;
        if let WriteOutcome::SkippedExisting(path) = &outcome {
            tracing::warn!(path = %path.display(), "skipped existing output");
            skipped_existing += 1;
        }
        if options.manifest {
            let name = outcome
                .path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            manifest.push(&name, record, data);
        }
    }

    let manifest_path = if options.manifest && !manifest.records.is_empty() {
        Some(manifest.write_to(&output_dir)?)
    } else {
        None
    };

    tracing::info!(
        input = %input.display(),
        records = report.record_count(),
        rejected = report.rejected_count(),
        "split complete"
    );

    Ok(SplitSummary {
        input: input.to_path_buf(),
        output_dir,
        input_size: blob.len(),
        records: report.record_count(),
        rejected: report.rejected_count(),
        written: writer.files_written(),
        skipped_existing,
        bytes_written: writer.bytes_written(),
        interrupted,
        manifest: manifest_path,
    })
}

#[derive(Debug, Clone, Default)]
pub struct BlockDumpOptions {
    pub output_dir: PathBuf,
    pub overwrite: bool,
    /// Write zero-size entries as empty files instead of skipping them.
    pub keep_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    Written(PathBuf),
    SkippedEmpty,
    SkippedExisting(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDump {
    pub blocks: Vec<(Block, BlockStatus)>,
    /// Blocks after the interruption point are not listed.
    pub interrupted: bool,
}

impl BlockDump {
    pub fn written(&self) -> usize {
        self.blocks
            .iter()
            .filter(|(_, s)| matches!(s, BlockStatus::Written(_)))
            .count()
    }
}

/// Reads the pointer table of `input` and writes every block it describes,
/// stopping before the next block once `running` is cleared.
pub fn dump_blocks(
    input: &Path,
    table: &PointerTable,
    options: &BlockDumpOptions,
    running: &AtomicBool,
) -> Result<BlockDump, ExtractError> {
    let blob = Blob::open(input)?;
    let blocks = read_pointer_blocks(&blob, table)?;
    let mut writer = RecordWriter::new(&options.output_dir, options.overwrite);

    let mut dumped = Vec::with_capacity(blocks.len());
    let mut interrupted = false;
    for block in blocks {
        if !running.load(Ordering::SeqCst) {
            tracing::warn!(
                input = %input.display(),
                index = block.index,
                "block dump interrupted"
            );
            interrupted = true;
            break;
        }

        if block.is_empty() && !options.keep_zero {
            dumped.push((block, BlockStatus::SkippedEmpty));
            continue;
        }

        let data = block.slice(&blob).unwrap_or_default();
        let status = match writer.write_block(&block, data)? {
            WriteOutcome::Written(path) => BlockStatus::Written(path),
            WriteOutcome::SkippedExisting(path) => BlockStatus::SkippedExisting(path),
        };
        dumped.push((block, status));
    }

    Ok(BlockDump {
        blocks: dumped,
        interrupted,
    })
}
