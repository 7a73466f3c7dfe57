//! # OxiUCL Core
//!
//! Core components shared by the OxiUCL codecs.
//!
//! - [`bitstream`]: Flag-group bit I/O used by the NRV bitstreams
//! - [`traits`]: Block codec traits, compression levels and progress reporting
//! - [`error`]: Error types with UCL status codes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: CLI                                                 │
//! │     oxiucl compress / decompress / test / overlap      │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     NRV2B, NRV2D, NRV2E (matcher, encoder, decoder)    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     FlagReader/FlagWriter, traits, errors              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiucl_core::{CompressionLevel, ErrorKind};
//!
//! let level = CompressionLevel::new(9).unwrap();
//! assert_eq!(level.level(), 9);
//!
//! let err = CompressionLevel::new(0).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidArgument);
//! assert_eq!(err.code(), -2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod bitstream;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bitstream::{FlagReader, FlagWriter};
pub use error::{ErrorKind, Result, UclError};
pub use traits::{
    BlockCompressor, BlockDecompressor, CompressionLevel, NoProgress, Progress, ProgressAction,
    ProgressCallback, ProgressState,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{FlagReader, FlagWriter};
    pub use crate::error::{ErrorKind, Result, UclError};
    pub use crate::traits::{
        BlockCompressor, BlockDecompressor, CompressionLevel, Progress, ProgressAction,
        ProgressCallback, ProgressState,
    };
}
