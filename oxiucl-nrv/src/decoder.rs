//! Safe NRV decoder.
//!
//! Every read and write is bounds checked. Malformed input produces one of
//! the decompression errors and never touches memory outside the caller's
//! output slice.

use oxiucl_core::bitstream::FlagReader;
use oxiucl_core::error::{Result, UclError};
use oxiucl_core::traits::BlockDecompressor;

use crate::NrvDecompressor;
use crate::variant::{END_MARKER_RAW, REPEAT_OFFSET_PREFIX, Variant, VariantDescriptor};

/// Destination of decoded tokens.
///
/// `input_pos` is the number of compressed bytes consumed once the token
/// has been fully read, for sinks that track the input side too.
pub(crate) trait OutputSink {
    /// Bytes produced so far.
    fn len(&self) -> usize;

    /// Maximum number of bytes the sink accepts.
    fn capacity(&self) -> usize;

    /// Append one literal byte.
    fn put_literal(&mut self, byte: u8, input_pos: usize) -> Result<()>;

    /// Append `length` bytes copied from `distance` bytes back.
    fn put_match(&mut self, distance: usize, length: usize, input_pos: usize) -> Result<()>;
}

/// Sink writing into a caller-provided slice.
pub(crate) struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl OutputSink for SliceSink<'_> {
    fn len(&self) -> usize {
        self.pos
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    fn put_literal(&mut self, byte: u8, _input_pos: usize) -> Result<()> {
        let capacity = self.buf.len();
        let slot = self
            .buf
            .get_mut(self.pos)
            .ok_or_else(|| UclError::output_overrun(capacity))?;
        *slot = byte;
        self.pos += 1;
        Ok(())
    }

    #[inline]
    fn put_match(&mut self, distance: usize, length: usize, _input_pos: usize) -> Result<()> {
        if length > self.buf.len() - self.pos {
            return Err(UclError::output_overrun(self.buf.len()));
        }
        if distance > self.pos {
            return Err(UclError::lookbehind_overrun(distance, self.pos));
        }
        let start = self.pos - distance;
        if distance >= length {
            self.buf.copy_within(start..start + length, self.pos);
        } else {
            // Overlapping copy: each byte may depend on one written in this loop.
            for i in 0..length {
                self.buf[self.pos + i] = self.buf[start + i];
            }
        }
        self.pos += length;
        Ok(())
    }
}

/// Run the decoder for `desc` over `src`, feeding tokens into `sink`.
///
/// Returns the number of bytes produced.
pub(crate) fn decode_with<S: OutputSink>(
    desc: &VariantDescriptor,
    src: &[u8],
    sink: &mut S,
) -> Result<usize> {
    let mut reader = FlagReader::new(src);
    let mut last_distance = 1usize;
    let split_offset = desc.offset_low_bits < 8;

    loop {
        if reader.needs_group() && reader.is_exhausted() {
            return Err(UclError::eof_not_found(reader.position()));
        }

        if reader.read_bit()? == 1 {
            let byte = reader.read_byte()?;
            sink.put_literal(byte, reader.position())?;
            continue;
        }

        let prefix = desc.read_prefix(&mut reader, sink.len())?;
        let (distance, lead) = if prefix == REPEAT_OFFSET_PREFIX {
            let lead = if split_offset { reader.read_bit()? } else { 0 };
            (last_distance, lead)
        } else {
            let raw = (u64::from(prefix - 3) << 8) | u64::from(reader.read_byte()?);
            if raw == u64::from(END_MARKER_RAW) {
                break;
            }
            let (distance, lead) = if split_offset {
                ((raw >> 1) + 1, ((raw & 1) ^ 1) as u32)
            } else {
                (raw + 1, 0)
            };
            (usize::try_from(distance).unwrap_or(usize::MAX), lead)
        };

        let length = desc.read_length(&mut reader, lead, distance, sink.capacity())?;
        sink.put_match(distance, length, reader.position())?;
        last_distance = distance;
    }

    if !reader.is_exhausted() {
        return Err(UclError::input_not_consumed(reader.position(), reader.len()));
    }
    Ok(sink.len())
}

/// Decompress `src` into `dst`, returning the number of bytes written.
///
/// Bytes of `dst` past the returned length are not modified on success.
/// On failure the contents of `dst` are unspecified but nothing outside it
/// is written.
///
/// The stream does not record which variant wrote it. Decoding with the
/// wrong variant usually fails but is not guaranteed to: the empty streams
/// of NRV2D and NRV2E, for one, are the same bytes. Callers that need to
/// tell variants apart must store the variant next to the block.
pub fn decompress_into(variant: Variant, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let mut sink = SliceSink::new(dst);
    decode_with(variant.descriptor(), src, &mut sink)
}

/// Decompress `src` into a new buffer holding at most `capacity` bytes.
///
/// As with [`decompress_into`], `variant` must be the one the stream was
/// written with; a mismatch is not always detected.
pub fn decompress(variant: Variant, src: &[u8], capacity: usize) -> Result<Vec<u8>> {
    NrvDecompressor::new(variant).decompress_block(src, capacity)
}
