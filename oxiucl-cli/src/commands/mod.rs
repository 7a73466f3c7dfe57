//! Command implementations for OxiUCL CLI.

pub mod compress;
pub mod decompress;
pub mod overlap;

pub use compress::{CompressOptions, cmd_compress};
pub use decompress::{DecompressOptions, cmd_decompress};
pub use overlap::{OverlapOptions, cmd_overlap};
pub use test::{TestOptions, cmd_test};
