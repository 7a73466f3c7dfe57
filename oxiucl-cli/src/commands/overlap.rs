//! Overlap command implementation.

use oxiucl_nrv::{Variant, required_overlap_offset};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct OverlapReport {
    file: String,
    method: String,
    compressed_size: usize,
    decompressed_size: usize,
    /// Smallest offset of the compressed block inside the shared buffer.
    offset: usize,
    /// Bytes the shared buffer needs beyond the decompressed size.
    extra: usize,
}

/// Options for the in-place decompression probe.
pub struct OverlapOptions<'a> {
    pub input: &'a Path,
    pub variant: Variant,
    pub size: usize,
    pub json: bool,
}

pub fn cmd_overlap(options: &OverlapOptions<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let packed = std::fs::read(options.input)?;
    let offset = required_overlap_offset(options.variant, &packed, options.size)
        .map_err(|e| format!("{}: {} ({})", options.input.display(), e, e.kind().name()))?;
    let buffer_len = (offset + packed.len()).max(options.size);

    let report = OverlapReport {
        file: options.input.display().to_string(),
        method: options.variant.to_string(),
        compressed_size: packed.len(),
        decompressed_size: options.size,
        offset,
        extra: buffer_len - options.size,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("In-place decompression of {}", report.file);
        println!("  Method: {}", report.method);
        println!("  Compressed size: {} bytes", report.compressed_size);
        println!("  Decompressed size: {} bytes", report.decompressed_size);
        println!("  Minimum input offset: {}", report.offset);
        println!("  Buffer size: {} bytes ({} extra)", buffer_len, report.extra);
    }
    Ok(())
}
