//! Flag-group bit I/O for the NRV bitstreams.
//!
//! NRV streams interleave single control bits with whole bytes. Control
//! bits are collected MSB-first into 8-bit groups; the group byte occupies
//! the output position at which its *first* bit was written, and any
//! literal or offset bytes emitted while the group fills up follow it.
//! The decoder mirrors this by fetching a new group byte only when it
//! needs a bit and the previous group is exhausted.
//!
//! # Example
//!
//! ```
//! use oxiucl_core::bitstream::{FlagReader, FlagWriter};
//!
//! let mut writer = FlagWriter::new(64);
//! writer.write_bit(1).unwrap();
//! writer.write_byte(b'x').unwrap();
//! writer.write_bit(0).unwrap();
//! let data = writer.finish();
//! assert_eq!(data, vec![0b1000_0000, b'x']);
//!
//! let mut reader = FlagReader::new(&data);
//! assert_eq!(reader.read_bit().unwrap(), 1);
//! assert_eq!(reader.read_byte().unwrap(), b'x');
//! assert_eq!(reader.read_bit().unwrap(), 0);
//! ```

use crate::error::{Result, UclError};

/// Writer for flag-group bitstreams with a hard output limit.
#[derive(Debug)]
pub struct FlagWriter {
    /// Output buffer.
    output: Vec<u8>,
    /// Maximum number of bytes the output may hold.
    limit: usize,
    /// Position of the reserved byte of the current group.
    group_pos: usize,
    /// Bits of the current group (MSB-first).
    group: u8,
    /// Number of bits in the current group.
    group_len: u8,
}

impl FlagWriter {
    /// Create a writer that fails once more than `limit` bytes are needed.
    pub fn new(limit: usize) -> Self {
        Self {
            output: Vec::new(),
            limit,
            group_pos: 0,
            group: 0,
            group_len: 0,
        }
    }

    /// Create a writer and reserve `reserve` bytes of storage up front.
    ///
    /// Fails with [`UclError::OutOfMemory`] if the allocation is refused.
    pub fn with_reserve(limit: usize, reserve: usize) -> Result<Self> {
        let mut writer = Self::new(limit);
        let reserve = reserve.min(limit);
        writer
            .output
            .try_reserve_exact(reserve)
            .map_err(|_| UclError::out_of_memory(reserve))?;
        Ok(writer)
    }

    #[inline]
    fn push(&mut self, byte: u8) -> Result<()> {
        if self.output.len() >= self.limit {
            return Err(UclError::output_overrun(self.limit));
        }
        self.output.push(byte);
        Ok(())
    }

    /// Write one control bit.
    #[inline]
    pub fn write_bit(&mut self, bit: u32) -> Result<()> {
        debug_assert!(bit <= 1);
        if self.group_len == 0 {
            self.group_pos = self.output.len();
            self.push(0)?;
        }
        self.group = (self.group << 1) | bit as u8;
        self.group_len += 1;
        if self.group_len == 8 {
            self.output[self.group_pos] = self.group;
            self.group = 0;
            self.group_len = 0;
        }
        Ok(())
    }

    /// Write a whole byte at the current byte position.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.push(byte)
    }

    /// Write a run of bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.output.len() + bytes.len() > self.limit {
            return Err(UclError::output_overrun(self.limit));
        }
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    /// Number of bytes emitted so far, including reserved group bytes.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Pad the open group with zero bits and store it.
    pub fn flush(&mut self) {
        if self.group_len > 0 {
            self.output[self.group_pos] = self.group << (8 - self.group_len);
            self.group = 0;
            self.group_len = 0;
        }
    }

    /// Flush and return the written bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.output
    }
}

/// Bounds-checked reader for flag-group bitstreams.
#[derive(Debug, Clone)]
pub struct FlagReader<'a> {
    /// Input data.
    data: &'a [u8],
    /// Next byte to read.
    pos: usize,
    /// Remaining bits of the current group, left-aligned.
    group: u8,
    /// Number of unread bits in the current group.
    group_len: u8,
}

impl<'a> FlagReader<'a> {
    /// Create a reader over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            group: 0,
            group_len: 0,
        }
    }

    /// Read one control bit, fetching a new group byte if needed.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u32> {
        if self.group_len == 0 {
            self.group = self.read_byte()?;
            self.group_len = 8;
        }
        let bit = (self.group >> 7) as u32;
        self.group <<= 1;
        self.group_len -= 1;
        Ok(bit)
    }

    /// Read one whole byte.
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        match self.data.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => Err(UclError::input_overrun(self.pos)),
        }
    }

    /// Number of bytes consumed (group bytes included).
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total input length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the input is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether every input byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Whether the next bit read would have to fetch a new group byte.
    pub fn needs_group(&self) -> bool {
        self.group_len == 0
    }
}
