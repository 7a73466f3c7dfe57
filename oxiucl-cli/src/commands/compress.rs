//! Compress command implementation.

use crate::utils::{compressed_path, create_progress_bar, space_savings};
use oxiucl_core::{Progress, ProgressAction, ProgressState, UclError};
use oxiucl_nrv::{Variant, compress_with_progress};
use serde::Serialize;
use std::path::Path;

/// JSON report for a compressed file.
#[derive(Debug, Serialize)]
struct CompressReport {
    input: String,
    output: Option<String>,
    method: String,
    level: u8,
    original_size: usize,
    compressed_size: Option<usize>,
    ratio: Option<f64>,
    compressible: bool,
}

/// Options for compressing a file.
pub struct CompressOptions<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub variant: Variant,
    pub level: u8,
    pub verbose: bool,
    pub progress: bool,
    pub json: bool,
}

pub fn cmd_compress(options: &CompressOptions<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(options.input)?;
    let output = options
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| compressed_path(options.input, options.variant));

    if options.verbose && !options.json {
        println!(
            "Compressing {} ({} bytes) with {} level {}",
            options.input.display(),
            data.len(),
            options.variant,
            options.level
        );
    }

    let pb = create_progress_bar(data.len() as u64, options.progress && !options.json);
    let mut on_progress = |p: Progress| {
        pb.set_position(p.bytes_in as u64);
        if p.state == ProgressState::Finished {
            pb.finish_with_message(format!("{} bytes", p.bytes_out));
        }
        ProgressAction::Continue
    };
    let result = compress_with_progress(options.variant, &data, options.level, &mut on_progress);

    let mut report = CompressReport {
        input: options.input.display().to_string(),
        output: None,
        method: options.variant.to_string(),
        level: options.level,
        original_size: data.len(),
        compressed_size: None,
        ratio: None,
        compressible: true,
    };

    match result {
        Ok(packed) => {
            std::fs::write(&output, &packed)?;
            report.output = Some(output.display().to_string());
            report.compressed_size = Some(packed.len());
            report.ratio = Some(space_savings(data.len(), packed.len()));
        }
        Err(e @ UclError::NotCompressible { .. }) => {
            pb.abandon();
            report.compressible = false;
            if !options.json {
                return Err(format!("{} ({}); store it uncompressed", e, e.kind().name()).into());
            }
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.compressible {
            std::process::exit(2);
        }
    } else if let (Some(size), Some(ratio)) = (report.compressed_size, report.ratio) {
        println!(
            "{} -> {} ({} -> {} bytes, {:.1}% saved)",
            options.input.display(),
            output.display(),
            data.len(),
            size,
            ratio
        );
        if options.verbose {
            println!(
                "Decompress with: oxiucl decompress {} -m {} -s {}",
                output.display(),
                options.variant,
                data.len()
            );
        }
    }
    Ok(())
}
