//! Decompress command implementation.

use crate::utils::decompressed_path;
use oxiucl_nrv::{Variant, decompress};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct DecompressReport {
    input: String,
    output: String,
    method: String,
    compressed_size: usize,
    decompressed_size: usize,
}

/// Options for decompressing a file.
pub struct DecompressOptions<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub variant: Variant,
    pub size: usize,
    pub verbose: bool,
    pub json: bool,
}

pub fn cmd_decompress(options: &DecompressOptions<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let packed = std::fs::read(options.input)?;
    let output = options
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| decompressed_path(options.input, options.variant));

    if options.verbose && !options.json {
        println!(
            "Decompressing {} ({} bytes, {}) into at most {} bytes",
            options.input.display(),
            packed.len(),
            options.variant,
            options.size
        );
    }

    let data = decompress(options.variant, &packed, options.size)
        .map_err(|e| format!("{}: {} ({})", options.input.display(), e, e.kind().name()))?;
    std::fs::write(&output, &data)?;

    if options.json {
        let report = DecompressReport {
            input: options.input.display().to_string(),
            output: output.display().to_string(),
            method: options.variant.to_string(),
            compressed_size: packed.len(),
            decompressed_size: data.len(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} -> {} ({} bytes)",
            options.input.display(),
            output.display(),
            data.len()
        );
        if data.len() < options.size && options.verbose {
            println!(
                "Note: decoded {} bytes, {} fewer than the given size",
                data.len(),
                options.size - data.len()
            );
        }
    }
    Ok(())
}
