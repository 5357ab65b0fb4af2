use anyhow::{Context, Result};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use unsplice_core::blocks::{Block, PointerTable};
use unsplice_core::mesh::Mesh;
use unsplice_io::discovery::discover_inputs;
use unsplice_io::{
    dump_blocks, split_file, BlockDumpOptions, BlockStatus, Blob, SplitOptions, SplitSummary,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SplitTotals {
    pub inputs: usize,
    pub with_records: usize,
    pub records: usize,
    pub rejected: usize,
    pub failed: usize,
}

pub fn run_split(
    inputs: &[PathBuf],
    extensions: &[String],
    options: &SplitOptions,
    running: &AtomicBool,
) -> Result<SplitTotals> {
    let roots = if inputs.is_empty() {
        vec![std::env::current_dir().context("Failed to read current directory")?]
    } else {
        inputs.to_vec()
    };

    let files = discover_inputs(&roots, extensions).context("Failed to enumerate inputs")?;
    let mut totals = SplitTotals::default();

    if files.is_empty() {
        println!("No .{} files found.", extensions.join("/."));
        return Ok(totals);
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("##-"),
    );

    for path in &files {
        if !running.load(Ordering::SeqCst) {
            pb.println("Interrupted, stopping before the next input.");
            break;
        }

        let name = display_name(path);
        pb.set_message(name.clone());
        totals.inputs += 1;

        match split_file(path, options, running) {
            Ok(summary) => {
                pb.println(describe_split(&name, &summary));
                totals.records += summary.records;
                totals.rejected += summary.rejected;
                if summary.records > 0 {
                    totals.with_records += 1;
                }
                if summary.interrupted {
                    pb.println(format!(
                        "[{}] interrupted after {} of {} JPEG(s)",
                        name,
                        summary.written + summary.skipped_existing,
                        summary.records
                    ));
                }
            }
            Err(e) => {
                tracing::error!(input = %path.display(), error = %e, "split failed");
                pb.println(format!("[{}] failed: {}", name, e));
                totals.failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    println!();
    println!(
        "Processed {} input(s): {} JPEG(s) recovered, {} false start(s) skipped",
        totals.inputs, totals.records, totals.rejected
    );
    if totals.failed > 0 {
        println!("Failed inputs: {}", totals.failed);
    }

    Ok(totals)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn describe_split(name: &str, summary: &SplitSummary) -> String {
    if summary.records == 0 {
        return format!("[{}] no JPEG streams found", name);
    }

    let mut line = format!(
        "[{}] extracted {} JPEG(s) -> {} ({})",
        name,
        summary.records,
        summary.output_dir.display(),
        format_size(summary.bytes_written, BINARY)
    );
    if summary.skipped_existing > 0 {
        line.push_str(&format!(", {} existing kept", summary.skipped_existing));
    }
    line
}

pub fn run_blocks(
    input: &Path,
    table: &PointerTable,
    options: &BlockDumpOptions,
    running: &AtomicBool,
) -> Result<usize> {
    let dump = dump_blocks(input, table, options, running)
        .with_context(|| format!("Failed to dump blocks from {}", input.display()))?;

    print_blocks(dump.blocks.iter().map(|(block, _)| block));
    println!();

    for (block, status) in &dump.blocks {
        match status {
            BlockStatus::Written(path) => {
                let note = block.note.map(|n| format!(" note={}", n)).unwrap_or_default();
                println!(
                    "[OK]   {:04} -> {} ({} bytes){}",
                    block.index,
                    display_name(path),
                    block.size,
                    note
                );
            }
            BlockStatus::SkippedEmpty => {
                let note = block.note.map(|n| n.to_string()).unwrap_or_default();
                println!(
                    "[SKIP] {:04} ofs=0x{:08X} size=0 note={}",
                    block.index, block.offset, note
                );
            }
            BlockStatus::SkippedExisting(path) => {
                println!("[SKIP] exists: {}", path.display());
            }
        }
    }

    if dump.interrupted {
        println!(
            "\nInterrupted after {} of {} table entries.",
            dump.blocks.len(),
            table.count
        );
    }

    Ok(dump.written())
}

fn print_blocks<'a>(blocks: impl Iterator<Item = &'a Block>) {
    println!("Index | Offset       | Size         | Ext | Note");
    println!("------+--------------+--------------+-----+----------------");
    for b in blocks {
        let note = b.note.map(|n| n.to_string()).unwrap_or_default();
        println!(
            "{:5} | 0x{:08X} | 0x{:08X} | {:3} | {}",
            b.index,
            b.offset,
            b.size,
            b.kind.extension(),
            note
        );
    }
}

pub fn run_mesh(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let blob = Blob::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let mesh = Mesh::decode(&blob)
        .with_context(|| format!("Failed to decode mesh in {}", input.display()))?;

    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("obj"));

    let file = File::create(&out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);
    mesh.write_obj(&mut writer, &display_name(input))?;
    writer.flush()?;

    let l = &mesh.layout;
    println!("Wrote: {}", out_path.display());
    println!(
        "Vertices: {} (from 0x{:X}..0x{:X})",
        mesh.vertices.len(),
        l.floats_offset,
        l.vertex_end
    );
    println!(
        "Faces:    {} (indices from 0x{:X}..0x{:X})",
        mesh.faces.len(),
        l.index_start,
        l.index_end
    );

    Ok(out_path)
}
