//! OxiUCL CLI
//!
//! A Pure Rust front end for the NRV2B, NRV2D and NRV2E block codecs.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{
    CompressOptions, DecompressOptions, OverlapOptions, TestOptions, cmd_compress,
    cmd_decompress, cmd_overlap, cmd_test,
};
use oxiucl_nrv::Variant;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxiucl")]
#[command(author, version, about = "Pure Rust UCL block compressor")]
#[command(long_about = "
OxiUCL compresses a whole file as one raw NRV block (no header).
The method and the original size are not stored, so they have to be
passed again when decompressing.

Methods: nrv2b (a, 2b), nrv2d (d, 2d), nrv2e (e, 2e)

Examples:
  oxiucl compress data.bin -m nrv2e -l 9
  oxiucl decompress data.bin.nrv2e -m nrv2e -s 65536
  oxiucl test data.bin.nrv2e -m nrv2e -s 65536
  oxiucl overlap data.bin.nrv2e -m nrv2e -s 65536
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a raw NRV block
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to INPUT.<method>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression method
        #[arg(short, long, default_value = "nrv2b")]
        method: Variant,

        /// Compression level (1-9)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=9))]
        level: u8,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Decompress a raw NRV block
    #[command(alias = "d")]
    Decompress {
        /// Compressed file
        input: PathBuf,

        /// Output file (defaults to INPUT without its method extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression method the block was written with
        #[arg(short, long, default_value = "nrv2b")]
        method: Variant,

        /// Decompressed size (upper bound of the output)
        #[arg(short, long)]
        size: usize,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Check that a block decodes cleanly
    #[command(alias = "t")]
    Test {
        /// Compressed files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Compression method the blocks were written with
        #[arg(short, long, default_value = "nrv2b")]
        method: Variant,

        /// Decompressed size (upper bound of the output)
        #[arg(short, long)]
        size: usize,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Compute the smallest offset for in-place decompression
    Overlap {
        /// Compressed file
        input: PathBuf,

        /// Compression method the block was written with
        #[arg(short, long, default_value = "nrv2b")]
        method: Variant,

        /// Decompressed size
        #[arg(short, long)]
        size: usize,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            method,
            level,
            verbose,
            progress,
            json,
        } => cmd_compress(&CompressOptions {
            input: &input,
            output: output.as_deref(),
            variant: method,
            level,
            verbose,
            progress,
            json,
        }),
        Commands::Decompress {
            input,
            output,
            method,
            size,
            verbose,
            json,
        } => cmd_decompress(&DecompressOptions {
            input: &input,
            output: output.as_deref(),
            variant: method,
            size,
            verbose,
            json,
        }),
        Commands::Test {
            inputs,
            method,
            size,
            verbose,
            json,
        } => cmd_test(&TestOptions {
            inputs: &inputs,
            variant: method,
            size,
            verbose,
            json,
        }),
        Commands::Overlap {
            input,
            method,
            size,
            json,
        } => cmd_overlap(&OverlapOptions {
            input: &input,
            variant: method,
            size,
            json,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
