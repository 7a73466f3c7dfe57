//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use oxiucl_nrv::Variant;
use std::path::{Path, PathBuf};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Default name for the compressed form of `input`: `INPUT.<method>`.
pub fn compressed_path(input: &Path, variant: Variant) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(variant.to_string());
    PathBuf::from(name)
}

/// Default name for the decompressed form of `input`.
///
/// Strips a trailing `.<method>` extension, or appends `.out` if there is none.
pub fn decompressed_path(input: &Path, variant: Variant) -> PathBuf {
    let matches_method = input
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(&variant.to_string()));
    if matches_method {
        input.with_extension("")
    } else {
        let mut name = input.as_os_str().to_os_string();
        name.push(".out");
        PathBuf::from(name)
    }
}

/// Space saved, in percent of the original size.
pub fn space_savings(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}
