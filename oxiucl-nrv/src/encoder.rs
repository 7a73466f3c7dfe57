//! NRV encoder: serializes a token sequence into a variant bitstream.

use oxiucl_core::bitstream::FlagWriter;
use oxiucl_core::error::{Result, UclError};
use oxiucl_core::traits::{Progress, ProgressAction, ProgressCallback, ProgressState};

use crate::matcher::Token;
use crate::variant::{MAX_DISTANCE, Variant, VariantDescriptor};

/// Input bytes between two `Running` progress reports.
pub const PROGRESS_INTERVAL: usize = 4096;

/// Fixed allowance for the end marker and flag padding.
const FRAMING_OVERHEAD: usize = 256;

/// Upper bound of the compressed size of `input_len` bytes.
///
/// Each literal costs nine bits and the matcher never picks a match that
/// costs more than its literals, so `n + ceil(n / 8)` plus the framing
/// allowance always suffices.
pub fn max_compressed_len(input_len: usize) -> usize {
    input_len + input_len.div_ceil(8) + FRAMING_OVERHEAD
}

/// Encoder for one block.
pub struct NrvEncoder<'a, 'p> {
    source: &'a [u8],
    desc: &'static VariantDescriptor,
    writer: FlagWriter,
    pos: usize,
    last_distance: usize,
    progress: &'p mut dyn ProgressCallback,
    last_report: usize,
}

impl<'a, 'p> NrvEncoder<'a, 'p> {
    /// Create an encoder writing at most `capacity` bytes.
    pub fn new(
        source: &'a [u8],
        variant: Variant,
        capacity: usize,
        progress: &'p mut dyn ProgressCallback,
    ) -> Result<Self> {
        let reserve = capacity.min(max_compressed_len(source.len()));
        Ok(Self {
            source,
            desc: variant.descriptor(),
            writer: FlagWriter::with_reserve(capacity, reserve)?,
            pos: 0,
            last_distance: 1,
            progress,
            last_report: 0,
        })
    }

    fn report(&mut self, state: ProgressState) -> Result<()> {
        let event = Progress {
            bytes_in: self.pos,
            bytes_out: self.writer.len(),
            state,
        };
        match self.progress.on_progress(event) {
            ProgressAction::Cancel if state != ProgressState::Finished => {
                Err(UclError::cancelled(self.pos))
            }
            _ => Ok(()),
        }
    }

    fn write_literals(&mut self, len: usize) -> Result<()> {
        if len == 0 || len > self.source.len() - self.pos {
            return Err(UclError::invalid_argument(format!(
                "literal run of {len} bytes at {} does not fit a {}-byte source",
                self.pos,
                self.source.len()
            )));
        }
        for &byte in &self.source[self.pos..self.pos + len] {
            self.writer.write_bit(1)?;
            self.writer.write_byte(byte)?;
        }
        self.pos += len;
        Ok(())
    }

    fn write_match(&mut self, distance: usize, length: usize) -> Result<()> {
        let pos = self.pos;
        if distance == 0 || distance > pos || distance > MAX_DISTANCE {
            return Err(UclError::invalid_argument(format!(
                "match distance {distance} is invalid at position {pos}"
            )));
        }
        if length < self.desc.min_match_len(distance) || length > self.source.len() - pos {
            return Err(UclError::invalid_argument(format!(
                "match length {length} is invalid at position {pos} (distance {distance})"
            )));
        }
        let reproduces = (0..length).all(|i| self.source[pos + i] == self.source[pos + i - distance]);
        if !reproduces {
            return Err(UclError::invalid_argument(format!(
                "match at position {pos} does not reproduce the source"
            )));
        }

        let repeat = distance == self.last_distance;
        self.writer.write_bit(0)?;
        self.desc
            .write_match(&mut self.writer, distance, length, repeat)?;
        self.last_distance = distance;
        self.pos += length;
        Ok(())
    }

    /// Encode one token.
    pub fn push(&mut self, token: Token) -> Result<()> {
        match token {
            Token::Literal { len } => self.write_literals(len)?,
            Token::Match { distance, length } => self.write_match(distance, length)?,
        }
        if self.pos - self.last_report >= PROGRESS_INTERVAL {
            self.last_report = self.pos;
            self.report(ProgressState::Running)?;
        }
        Ok(())
    }

    /// Write the end marker and return the compressed bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pos != self.source.len() {
            return Err(UclError::invalid_argument(format!(
                "tokens cover {} of {} source bytes",
                self.pos,
                self.source.len()
            )));
        }
        self.desc.write_end_marker(&mut self.writer)?;
        self.writer.flush();
        self.report(ProgressState::Finished)?;
        Ok(self.writer.finish())
    }
}

/// Encode `tokens` over `source`, writing at most `capacity` bytes.
///
/// Fails with `OutputOverrun` if the stream does not fit, `InvalidArgument`
/// if the tokens do not partition `source` into valid literals and
/// matches, and `Cancelled` if `progress` asks to stop.
pub fn encode<I>(
    source: &[u8],
    tokens: I,
    variant: Variant,
    capacity: usize,
    progress: &mut dyn ProgressCallback,
) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Token>,
{
    let mut encoder = NrvEncoder::new(source, variant, capacity, progress)?;
    encoder.report(ProgressState::Started)?;
    for token in tokens {
        encoder.push(token)?;
    }
    encoder.finish()
}
