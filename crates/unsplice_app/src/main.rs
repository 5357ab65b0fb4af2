//! Unsplice - recovers JPEG streams and pointer-table blocks from opaque
//! container files.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use unsplice_core::blocks::PointerTable;
use unsplice_io::{BlockDumpOptions, SplitOptions};

fn init_tracing(cli: &Cli) {
    let default_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Routes Ctrl+C into a flag the long-running passes poll between items.
fn install_interrupt_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    Ok(running)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Split {
            inputs,
            ext,
            output,
            overwrite,
            manifest,
        } => {
            let options = SplitOptions {
                output_root: output,
                overwrite,
                manifest,
            };
            let running = install_interrupt_flag()?;
            let totals = commands::run_split(&inputs, &ext, &options, &running)?;
            if totals.failed > 0 && totals.failed == totals.inputs {
                anyhow::bail!("every input failed to split");
            }
        }

        Commands::Blocks {
            input,
            table_offset,
            count,
            endian,
            base,
            output,
            overwrite,
            keep_zero,
            allow_non_monotonic,
        } => {
            let table = PointerTable {
                table_offset: usize::try_from(table_offset)
                    .context("table offset does not fit in memory")?,
                count: usize::try_from(count).context("pointer count does not fit in memory")?,
                endian: endian.into(),
                base,
                require_monotonic: !allow_non_monotonic,
            };
            let options = BlockDumpOptions {
                output_dir: output,
                overwrite,
                keep_zero,
            };
            let running = install_interrupt_flag()?;
            let written = commands::run_blocks(&input, &table, &options, &running)?;
            println!("\nDone. Wrote {} file(s) to: {}", written, options.output_dir.display());
        }

        Commands::Mesh { input, output } => {
            commands::run_mesh(&input, output.as_deref())?;
        }
    }

    Ok(())
}
