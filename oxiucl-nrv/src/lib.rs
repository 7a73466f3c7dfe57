//! # OxiUCL-NRV: Pure Rust NRV2B / NRV2D / NRV2E
//!
//! This crate implements the three NRV codecs of the UCL family. All of
//! them share one engine: a hash-chain match finder emits literal and
//! match tokens, an encoder serializes them into a flag-group bitstream,
//! and a fully bounds-checked decoder turns the stream back into bytes.
//! The variants differ only in how offsets and lengths are coded, which
//! is captured by a constant [`VariantDescriptor`] per variant.
//!
//! ## Features
//!
//! - **Pure Rust**: no C dependencies, no `unsafe`
//! - **Bit-exact**: streams decode with the reference `nrv2?_decompress_safe_8`
//! - **Levels 1-9**: from a short greedy search to deep lazy matching
//! - **Safe decoding**: corrupt input yields an error, never an out-of-bounds access
//! - **In-place probe**: find the smallest safe offset for in-place decompression
//!
//! ## Example
//!
//! ```rust
//! use oxiucl_nrv::{Variant, compress, decompress};
//!
//! let original = b"aaaaaaaaaaaaaaaaaaaa";
//! let packed = compress(Variant::Nrv2b, original, 1).unwrap();
//! assert!(packed.len() < original.len());
//!
//! let unpacked = decompress(Variant::Nrv2b, &packed, original.len()).unwrap();
//! assert_eq!(unpacked, original);
//! ```
//!
//! ## Incompressible data
//!
//! A block that would not shrink is reported as
//! [`UclError::NotCompressible`]; callers are expected to store it raw.
//!
//! ```rust
//! use oxiucl_nrv::{UclError, Variant, compress};
//!
//! let err = compress(Variant::Nrv2e, b"xyz", 9).unwrap_err();
//! assert_eq!(err, UclError::not_compressible(3));
//! assert!(err.kind().is_recoverable());
//! ```
//!
//! ## Variant selection
//!
//! A stream carries no header, so the decoder has to be given the variant
//! the encoder used. Decoding with another variant is not guaranteed to
//! fail.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod decoder;
mod encoder;
mod matcher;
mod overlap;
mod variant;

pub use decoder::{decompress, decompress_into};
pub use encoder::{NrvEncoder, PROGRESS_INTERVAL, encode, max_compressed_len};
pub use matcher::{LevelParams, Token, TokenStream, find_tokens};
pub use overlap::{required_overlap_offset, test_overlap};
pub use oxiucl_core::{
    BlockCompressor, BlockDecompressor, CompressionLevel, ErrorKind, NoProgress, Progress,
    ProgressAction, ProgressCallback, ProgressState, Result, UclError,
};
pub use variant::{
    LengthCode, MAX_DISTANCE, NRV2B, NRV2D, NRV2E, OffsetPrefix, Variant, VariantDescriptor,
};

/// Levels whose parse every higher level also tries, keeping the
/// smallest stream.
const BASELINE_LEVELS: [u8; 2] = [1, 3];

/// Forwards progress but holds back `Finished` until the stream that will
/// be returned is known.
struct HoldFinished<'p> {
    inner: &'p mut dyn ProgressCallback,
}

impl ProgressCallback for HoldFinished<'_> {
    fn on_progress(&mut self, progress: Progress) -> ProgressAction {
        match progress.state {
            ProgressState::Finished => ProgressAction::Continue,
            _ => self.inner.on_progress(progress),
        }
    }
}

/// Encode the parse of `level`, or `None` if it needs more than `capacity` bytes.
fn encode_within(
    variant: Variant,
    data: &[u8],
    level: CompressionLevel,
    capacity: usize,
    progress: &mut dyn ProgressCallback,
) -> Result<Option<Vec<u8>>> {
    let tokens = TokenStream::new(data, variant.descriptor(), level)?;
    match encode(data, tokens, variant, capacity, progress) {
        Ok(packed) => Ok(Some(packed)),
        Err(UclError::OutputOverrun { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn compress_level(
    variant: Variant,
    data: &[u8],
    level: CompressionLevel,
    progress: &mut dyn ProgressCallback,
) -> Result<Vec<u8>> {
    let capacity = if data.is_empty() {
        max_compressed_len(0)
    } else {
        data.len() - 1
    };
    let mut best = encode_within(
        variant,
        data,
        level,
        capacity,
        &mut HoldFinished {
            inner: &mut *progress,
        },
    )?;

    for baseline in BASELINE_LEVELS {
        if baseline >= level.level() {
            break;
        }
        let limit = best.as_ref().map_or(capacity, |packed| packed.len() - 1);
        let baseline = CompressionLevel::new(baseline)?;
        if let Some(packed) = encode_within(variant, data, baseline, limit, &mut NoProgress)? {
            best = Some(packed);
        }
    }

    let packed = best.ok_or_else(|| UclError::not_compressible(data.len()))?;
    progress.on_progress(Progress {
        bytes_in: data.len(),
        bytes_out: packed.len(),
        state: ProgressState::Finished,
    });
    Ok(packed)
}

/// Compress `data` with `variant` at `level` (1-9).
///
/// Levels above 1 also try the level 1 and level 3 parses and return the
/// smallest stream, so level 9 is never larger than level 1 and levels 4
/// to 9 are never larger than level 3.
///
/// Fails with `NotCompressible` if the stream would not be smaller than
/// `data`, and with `InvalidArgument` for a level outside `1..=9`.
///
/// # Example
///
/// ```rust
/// use oxiucl_nrv::{Variant, compress};
///
/// let packed = compress(Variant::Nrv2d, &[0u8; 1000], 6).unwrap();
/// assert!(packed.len() < 32);
/// ```
pub fn compress(variant: Variant, data: &[u8], level: u8) -> Result<Vec<u8>> {
    compress_with_progress(variant, data, level, &mut NoProgress)
}

/// Compress `data`, reporting progress to `progress`.
///
/// The callback sees `Started`, then `Running` about every
/// [`PROGRESS_INTERVAL`] input bytes of the requested level's parse, then
/// `Finished` with the size of the returned stream. Returning
/// [`ProgressAction::Cancel`] from any but the last event aborts with
/// `Cancelled`.
pub fn compress_with_progress(
    variant: Variant,
    data: &[u8],
    level: u8,
    progress: &mut dyn ProgressCallback,
) -> Result<Vec<u8>> {
    compress_level(variant, data, CompressionLevel::new(level)?, progress)
}

/// NRV block compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NrvCompressor {
    variant: Variant,
    level: CompressionLevel,
}

impl NrvCompressor {
    /// Create a compressor for `variant` at `level`.
    pub fn new(variant: Variant, level: CompressionLevel) -> Self {
        Self { variant, level }
    }

    /// Variant written by this compressor.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Compression level.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }
}

impl BlockCompressor for NrvCompressor {
    fn compress_block(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        compress_level(self.variant, input, self.level, &mut NoProgress)
    }

    fn compress_block_with_progress(
        &mut self,
        input: &[u8],
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<u8>> {
        compress_level(self.variant, input, self.level, progress)
    }

    fn max_compressed_len(&self, input_len: usize) -> usize {
        max_compressed_len(input_len)
    }
}

/// NRV block decompressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NrvDecompressor {
    variant: Variant,
}

impl NrvDecompressor {
    /// Create a decompressor for `variant`.
    pub fn new(variant: Variant) -> Self {
        Self { variant }
    }
}

impl BlockDecompressor for NrvDecompressor {
    fn decompress_block_into(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        decompress_into(self.variant, input, output)
    }
}
