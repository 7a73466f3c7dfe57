//! Core traits for single-shot block compression.
//!
//! Every codec in OxiUCL works on one in-memory block at a time: the whole
//! input is available up front and the whole output is produced before
//! the call returns. Progress is reported synchronously through
//! [`ProgressCallback`], which is also the only way to cancel a running
//! compression.

use crate::error::{Result, UclError};

/// Compression effort, from 1 (fastest) to 9 (best ratio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a compression level, rejecting values outside `1..=9`.
    pub fn new(level: u8) -> Result<Self> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(UclError::invalid_argument(format!(
                "compression level {level} is outside 1..=9"
            )))
        }
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::FAST
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = UclError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

/// Phase of a compression run reported with each [`Progress`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// Emitted once before the first token is encoded.
    Started,
    /// Emitted periodically while tokens are encoded.
    Running,
    /// Emitted once after the end-of-stream marker has been written.
    Finished,
}

/// A progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Input bytes consumed so far.
    pub bytes_in: usize,
    /// Compressed bytes produced so far.
    pub bytes_out: usize,
    /// Phase of the run.
    pub state: ProgressState,
}

/// What the encoder should do after a progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressAction {
    /// Keep going.
    #[default]
    Continue,
    /// Stop and fail with [`UclError::Cancelled`].
    Cancel,
}

/// Observer for compression progress.
///
/// Implementations run on the compressing thread between tokens. They
/// cannot influence the encoded bytes, only observe them or cancel.
pub trait ProgressCallback {
    /// Called with cumulative counters.
    fn on_progress(&mut self, progress: Progress) -> ProgressAction;
}

impl<F> ProgressCallback for F
where
    F: FnMut(Progress) -> ProgressAction,
{
    fn on_progress(&mut self, progress: Progress) -> ProgressAction {
        self(progress)
    }
}

/// A callback that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&mut self, _progress: Progress) -> ProgressAction {
        ProgressAction::Continue
    }
}

/// A single-shot block compressor.
pub trait BlockCompressor {
    /// Compress `input` into a new buffer.
    fn compress_block(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    /// Compress `input`, reporting progress to `progress`.
    fn compress_block_with_progress(
        &mut self,
        input: &[u8],
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<u8>>;

    /// Upper bound of the compressed size for `input_len` bytes.
    fn max_compressed_len(&self, input_len: usize) -> usize;
}

/// A single-shot block decompressor.
pub trait BlockDecompressor {
    /// Decompress `input` into `output`, returning the number of bytes written.
    ///
    /// Bytes of `output` past the returned length are left untouched.
    fn decompress_block_into(&self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Decompress `input` into a new buffer of at most `capacity` bytes.
    fn decompress_block(&self, input: &[u8], capacity: usize) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        output
            .try_reserve_exact(capacity)
            .map_err(|_| UclError::out_of_memory(capacity))?;
        output.resize(capacity, 0);
        let written = self.decompress_block_into(input, &mut output)?;
        output.truncate(written);
        Ok(output)
    }
}
