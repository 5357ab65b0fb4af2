use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use unsplice_core::blocks::Endian;

#[derive(Parser, Debug)]
#[command(name = "unsplice")]
#[command(author, version, about = "Recover JPEG streams and blocks packed inside opaque blobs", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split concatenated JPEG streams into separate files
    Split {
        /// Files or directories to process (defaults to the current directory)
        inputs: Vec<PathBuf>,

        /// Extensions picked up when a directory is given
        #[arg(short, long, value_delimiter = ',', default_value = "jpg,jpeg,bin")]
        ext: Vec<String>,

        /// Parent directory for the split_<name> folders
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        overwrite: bool,

        /// Write a manifest.json with offsets and hashes next to the images
        #[arg(long)]
        manifest: bool,
    },

    /// Dump the blocks listed in a pointer table
    Blocks {
        input: PathBuf,

        /// Where the pointer table begins (decimal or 0x-prefixed hex)
        #[arg(long, value_parser = parse_number, default_value = "0")]
        table_offset: u64,

        /// Number of 32-bit pointers in the table
        #[arg(short, long, value_parser = parse_number)]
        count: u64,

        #[arg(long, value_enum, default_value_t = EndianArg::Be)]
        endian: EndianArg,

        /// Added to every pointer when they are relative
        #[arg(long, value_parser = parse_number, default_value = "0")]
        base: u64,

        #[arg(short, long, default_value = "./dump_blocks")]
        output: PathBuf,

        #[arg(long)]
        overwrite: bool,

        /// Also write zero-size entries as empty files
        #[arg(long)]
        keep_zero: bool,

        /// Log non-monotonic entries at debug level instead of warning
        #[arg(long)]
        allow_non_monotonic: bool,
    },

    /// Export an SHD mesh block as Wavefront OBJ
    Mesh {
        input: PathBuf,

        /// Defaults to the input path with an .obj extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EndianArg {
    Be,
    Le,
}

impl From<EndianArg> for Endian {
    fn from(arg: EndianArg) -> Self {
        match arg {
            EndianArg::Be => Endian::Big,
            EndianArg::Le => Endian::Little,
        }
    }
}

pub fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0"), Ok(0));
        assert_eq!(parse_number("1234"), Ok(1234));
        assert_eq!(parse_number("0x98E0"), Ok(0x98E0));
        assert_eq!(parse_number("0XFF"), Ok(255));
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("-1").is_err());
    }

    #[test]
    fn test_split_defaults() {
        let cli = Cli::try_parse_from(["unsplice", "split"]).unwrap();
        match cli.command {
            Commands::Split {
                inputs,
                ext,
                output,
                overwrite,
                manifest,
            } => {
                assert!(inputs.is_empty());
                assert_eq!(ext, vec!["jpg", "jpeg", "bin"]);
                assert!(output.is_none());
                assert!(!overwrite);
                assert!(!manifest);
            }
            _ => panic!("expected split"),
        }
    }

    #[test]
    fn test_blocks_arguments() {
        let cli = Cli::try_parse_from([
            "unsplice",
            "-v",
            "blocks",
            "r111.bgz",
            "--count",
            "5",
            "--table-offset",
            "0x10",
            "--endian",
            "le",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Blocks {
                count,
                table_offset,
                endian,
                output,
                ..
            } => {
                assert_eq!(count, 5);
                assert_eq!(table_offset, 0x10);
                assert_eq!(Endian::from(endian), Endian::Little);
                assert_eq!(output, PathBuf::from("./dump_blocks"));
            }
            _ => panic!("expected blocks"),
        }
    }

    #[test]
    fn test_blocks_requires_count() {
        assert!(Cli::try_parse_from(["unsplice", "blocks", "r111.bgz"]).is_err());
    }
}
