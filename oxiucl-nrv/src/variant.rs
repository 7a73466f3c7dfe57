//! Variant policy table for NRV2B, NRV2D and NRV2E.
//!
//! The three formats share the literal/match grammar and differ only in
//! how a match offset and length are turned into bits. Each format is
//! described by one immutable [`VariantDescriptor`]; the encoder and
//! decoder consult the descriptor instead of carrying per-format code
//! paths.

use std::fmt;
use std::str::FromStr;

use oxiucl_core::bitstream::{FlagReader, FlagWriter};
use oxiucl_core::error::{Result, UclError};

/// Offset prefix value that repeats the previous match offset.
pub const REPEAT_OFFSET_PREFIX: u32 = 2;

/// Offset prefix value written by the end-of-stream marker.
pub const END_MARKER_PREFIX: u32 = 0x0100_0002;

/// Low byte written by the end-of-stream marker.
pub const END_MARKER_BYTE: u8 = 0xFF;

/// Decoded raw offset that terminates the stream.
pub const END_MARKER_RAW: u32 = 0xFFFF_FFFF;

/// Largest offset prefix a decoder accepts.
pub const MAX_OFFSET_PREFIX: u32 = 0x00FF_FFFF + 3;

/// Largest match distance the encoder will emit.
pub const MAX_DISTANCE: usize = 0x00FF_FFFF;

/// Bits spent on a literal (flag + byte).
pub const LITERAL_BITS: usize = 9;

/// The supported codec variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Variant A: NRV2B.
    #[default]
    Nrv2b,
    /// Variant D: NRV2D.
    Nrv2d,
    /// Variant E: NRV2E.
    Nrv2e,
}

impl Variant {
    /// All variants, in method-id order.
    pub const ALL: [Variant; 3] = [Variant::Nrv2b, Variant::Nrv2d, Variant::Nrv2e];

    /// The descriptor for this variant.
    pub fn descriptor(self) -> &'static VariantDescriptor {
        match self {
            Variant::Nrv2b => &NRV2B,
            Variant::Nrv2d => &NRV2D,
            Variant::Nrv2e => &NRV2E,
        }
    }

    /// Conventional single-letter name (A, D or E).
    pub fn letter(self) -> char {
        self.descriptor().letter
    }

    /// Look up a variant by its UCL method id (0x2B, 0x2D, 0x2E).
    pub fn from_method_id(id: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.descriptor().method_id == id)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

impl FromStr for Variant {
    type Err = UclError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "2b" | "nrv2b" => Ok(Variant::Nrv2b),
            "d" | "2d" | "nrv2d" => Ok(Variant::Nrv2d),
            "e" | "2e" | "nrv2e" => Ok(Variant::Nrv2e),
            _ => Err(UclError::invalid_argument(format!("unknown variant '{s}'"))),
        }
    }
}

/// How the high part of a match offset is prefix-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetPrefix {
    /// One data bit per step, each followed by a stop bit.
    Gamma1,
    /// Two data bits per step, separated by a stop bit.
    Gamma2,
}

/// How a match length is coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthCode {
    /// Two plain bits for 1..=3, otherwise `00` and gamma(len - 2).
    TwoBit,
    /// A bit carried by the offset plus one plain bit for 1..=3,
    /// otherwise `0`, `0` and gamma(len - 2).
    SplitTwoBit,
    /// A bit carried by the offset: `1` + one bit for 1..=2,
    /// `0 1` + one bit for 3..=4, otherwise `0 0` and gamma(len - 3).
    Tiered,
}

/// Immutable description of one NRV variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDescriptor {
    /// Variant name.
    pub name: &'static str,
    /// Conventional single-letter name.
    pub letter: char,
    /// UCL method id.
    pub method_id: u8,
    /// Coding of the offset prefix.
    pub offset_prefix: OffsetPrefix,
    /// Number of offset bits stored in the low byte after the prefix.
    /// The remaining bit, if any, carries the first length bit.
    pub offset_low_bits: u32,
    /// Coding of the match length.
    pub length_code: LengthCode,
    /// Distances above this need one extra byte of match length.
    pub far_distance: usize,
    /// Shortest match for near distances.
    pub min_match: usize,
}

/// NRV2B (variant A).
pub const NRV2B: VariantDescriptor = VariantDescriptor {
    name: "nrv2b",
    letter: 'A',
    method_id: 0x2B,
    offset_prefix: OffsetPrefix::Gamma1,
    offset_low_bits: 8,
    length_code: LengthCode::TwoBit,
    far_distance: 0xD00,
    min_match: 2,
};

/// NRV2D (variant D).
pub const NRV2D: VariantDescriptor = VariantDescriptor {
    name: "nrv2d",
    letter: 'D',
    method_id: 0x2D,
    offset_prefix: OffsetPrefix::Gamma2,
    offset_low_bits: 7,
    length_code: LengthCode::SplitTwoBit,
    far_distance: 0x500,
    min_match: 2,
};

/// NRV2E (variant E).
pub const NRV2E: VariantDescriptor = VariantDescriptor {
    name: "nrv2e",
    letter: 'E',
    method_id: 0x2E,
    offset_prefix: OffsetPrefix::Gamma2,
    offset_low_bits: 7,
    length_code: LengthCode::Tiered,
    far_distance: 0x500,
    min_match: 2,
};

/// Number of bits of `gamma1(value)`.
#[inline]
pub fn gamma1_bits(value: u32) -> usize {
    debug_assert!(value >= 2);
    2 * (31 - value.leading_zeros() as usize)
}

/// Number of bits of `gamma2(value)`.
#[inline]
pub fn gamma2_bits(value: u32) -> usize {
    debug_assert!(value >= 2);
    let (mut high, mut steps) = (3u64, 1usize);
    while u64::from(value) > high {
        high = 4 * high - 1;
        steps += 1;
    }
    3 * steps - 1
}

/// Write `value >= 2` as a one-bit-per-step gamma code.
pub fn write_gamma1(writer: &mut FlagWriter, value: u32) -> Result<()> {
    debug_assert!(value >= 2);
    let top = 31 - value.leading_zeros();
    for shift in (0..top).rev() {
        writer.write_bit((value >> shift) & 1)?;
        writer.write_bit(u32::from(shift == 0))?;
    }
    Ok(())
}

/// Write `value >= 2` as a two-bits-per-step gamma code.
pub fn write_gamma2(writer: &mut FlagWriter, value: u32) -> Result<()> {
    debug_assert!(value >= 2);
    write_gamma2_steps(writer, value)?;
    writer.write_bit(1)
}

fn write_gamma2_steps(writer: &mut FlagWriter, value: u32) -> Result<()> {
    if value < 4 {
        return writer.write_bit(value & 1);
    }
    let upper = value >> 1;
    write_gamma2_steps(writer, (upper >> 1) + 1)?;
    writer.write_bit(0)?;
    writer.write_bit(upper & 1)?;
    writer.write_bit(value & 1)
}

/// Read a one-bit-per-step gamma code, failing once the value exceeds `limit`.
pub fn read_gamma1(reader: &mut FlagReader<'_>, limit: u32, on_overflow: UclError) -> Result<u32> {
    let mut value: u64 = 1;
    loop {
        value = value * 2 + u64::from(reader.read_bit()?);
        if value > u64::from(limit) {
            return Err(on_overflow);
        }
        if reader.read_bit()? == 1 {
            return Ok(value as u32);
        }
    }
}

/// Read a two-bits-per-step gamma code, failing once the value exceeds `limit`.
pub fn read_gamma2(reader: &mut FlagReader<'_>, limit: u32, on_overflow: UclError) -> Result<u32> {
    let mut value: u64 = 1;
    loop {
        value = value * 2 + u64::from(reader.read_bit()?);
        if value > u64::from(limit) {
            return Err(on_overflow);
        }
        if reader.read_bit()? == 1 {
            return Ok(value as u32);
        }
        value = (value - 1) * 2 + u64::from(reader.read_bit()?);
    }
}

impl VariantDescriptor {
    /// Shortest match the format can express at `distance`.
    #[inline]
    pub fn min_match_len(&self, distance: usize) -> usize {
        self.min_match + usize::from(distance > self.far_distance)
    }

    /// Length value as stored in the stream for a copy of `length` bytes.
    #[inline]
    pub fn stored_length(&self, distance: usize, length: usize) -> usize {
        length - 1 - usize::from(distance > self.far_distance)
    }

    /// Write the offset prefix.
    pub fn write_prefix(&self, writer: &mut FlagWriter, value: u32) -> Result<()> {
        match self.offset_prefix {
            OffsetPrefix::Gamma1 => write_gamma1(writer, value),
            OffsetPrefix::Gamma2 => write_gamma2(writer, value),
        }
    }

    /// Read the offset prefix.
    pub fn read_prefix(&self, reader: &mut FlagReader<'_>, available: usize) -> Result<u32> {
        let overflow = UclError::lookbehind_overrun(MAX_DISTANCE + 1, available);
        match self.offset_prefix {
            OffsetPrefix::Gamma1 => read_gamma1(reader, MAX_OFFSET_PREFIX, overflow),
            OffsetPrefix::Gamma2 => read_gamma2(reader, MAX_OFFSET_PREFIX, overflow),
        }
    }

    fn prefix_bits(&self, value: u32) -> usize {
        match self.offset_prefix {
            OffsetPrefix::Gamma1 => gamma1_bits(value),
            OffsetPrefix::Gamma2 => gamma2_bits(value),
        }
    }

    /// Exact number of bits a match costs, flag bit included.
    ///
    /// `repeat` is true when `distance` equals the previous match distance.
    pub fn match_bits(&self, distance: usize, length: usize, repeat: bool) -> usize {
        let stored = self.stored_length(distance, length);
        let offset_bits = if repeat {
            self.prefix_bits(REPEAT_OFFSET_PREFIX)
        } else {
            let raw = ((distance - 1) as u64) << (8 - self.offset_low_bits);
            self.prefix_bits((raw >> 8) as u32 + 3) + self.offset_low_bits as usize
        };
        let length_bits = match self.length_code {
            LengthCode::TwoBit | LengthCode::SplitTwoBit if stored < 4 => 2,
            LengthCode::TwoBit | LengthCode::SplitTwoBit => 2 + gamma1_bits(stored as u32 - 2),
            LengthCode::Tiered if stored <= 2 => 2,
            LengthCode::Tiered if stored <= 4 => 3,
            LengthCode::Tiered => 2 + gamma1_bits(stored as u32 - 3),
        };
        1 + offset_bits + length_bits
    }

    /// Whether a match beats emitting its bytes as literals.
    #[inline]
    pub fn is_profitable(&self, distance: usize, length: usize, repeat: bool) -> bool {
        length >= self.min_match_len(distance)
            && self.match_bits(distance, length, repeat) < LITERAL_BITS * length
    }

    /// Bits saved by a match over emitting its bytes as literals.
    ///
    /// Negative when the match costs more than the literals would.
    #[inline]
    pub fn match_gain(&self, distance: usize, length: usize, repeat: bool) -> isize {
        (LITERAL_BITS * length) as isize - self.match_bits(distance, length, repeat) as isize
    }

    /// Write the match body (everything after the flag bit).
    pub fn write_match(
        &self,
        writer: &mut FlagWriter,
        distance: usize,
        length: usize,
        repeat: bool,
    ) -> Result<()> {
        let stored = self.stored_length(distance, length);
        // First length bit, carried by the offset byte in D and E.
        let lead = match self.length_code {
            LengthCode::TwoBit => 0,
            LengthCode::SplitTwoBit => u32::from(stored < 4 && stored >= 2),
            LengthCode::Tiered => u32::from(stored <= 2),
        };

        if repeat {
            self.write_prefix(writer, REPEAT_OFFSET_PREFIX)?;
            if self.offset_low_bits < 8 {
                writer.write_bit(lead)?;
            }
        } else {
            let raw = if self.offset_low_bits < 8 {
                (((distance - 1) as u64) << 1) | u64::from(lead ^ 1)
            } else {
                (distance - 1) as u64
            };
            self.write_prefix(writer, (raw >> 8) as u32 + 3)?;
            writer.write_byte(raw as u8)?;
        }

        match self.length_code {
            LengthCode::TwoBit => {
                if stored < 4 {
                    writer.write_bit((stored >> 1) as u32)?;
                    writer.write_bit((stored & 1) as u32)
                } else {
                    writer.write_bit(0)?;
                    writer.write_bit(0)?;
                    write_gamma1(writer, stored as u32 - 2)
                }
            }
            LengthCode::SplitTwoBit => {
                if stored < 4 {
                    writer.write_bit((stored & 1) as u32)
                } else {
                    writer.write_bit(0)?;
                    write_gamma1(writer, stored as u32 - 2)
                }
            }
            LengthCode::Tiered => {
                if stored <= 2 {
                    writer.write_bit(stored as u32 - 1)
                } else if stored <= 4 {
                    writer.write_bit(1)?;
                    writer.write_bit(stored as u32 - 3)
                } else {
                    writer.write_bit(0)?;
                    write_gamma1(writer, stored as u32 - 3)
                }
            }
        }
    }

    /// Write the end-of-stream marker (flag bit included).
    pub fn write_end_marker(&self, writer: &mut FlagWriter) -> Result<()> {
        writer.write_bit(0)?;
        self.write_prefix(writer, END_MARKER_PREFIX)?;
        writer.write_byte(END_MARKER_BYTE)
    }

    /// Decode a match length given the first length bit (D and E only),
    /// returning the number of bytes to copy.
    pub fn read_length(
        &self,
        reader: &mut FlagReader<'_>,
        lead: u32,
        distance: usize,
        capacity: usize,
    ) -> Result<usize> {
        let limit = u32::try_from(capacity).unwrap_or(u32::MAX);
        let overflow = UclError::output_overrun(capacity);
        let stored = match self.length_code {
            LengthCode::TwoBit | LengthCode::SplitTwoBit => {
                let high = match self.length_code {
                    LengthCode::TwoBit => reader.read_bit()?,
                    _ => lead,
                };
                let short = high * 2 + reader.read_bit()?;
                if short == 0 {
                    read_gamma1(reader, limit, overflow)? as usize + 2
                } else {
                    short as usize
                }
            }
            LengthCode::Tiered => {
                if lead == 1 {
                    1 + reader.read_bit()? as usize
                } else if reader.read_bit()? == 1 {
                    3 + reader.read_bit()? as usize
                } else {
                    read_gamma1(reader, limit, overflow)? as usize + 3
                }
            }
        };
        Ok(stored + 1 + usize::from(distance > self.far_distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written_bits(f: impl FnOnce(&mut FlagWriter) -> Result<()>) -> Vec<u32> {
        let mut writer = FlagWriter::new(64);
        f(&mut writer).unwrap();
        let data = writer.finish();
        data.iter()
            .flat_map(|b| (0..8).rev().map(move |i| u32::from((b >> i) & 1)))
            .collect()
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("A".parse::<Variant>().unwrap(), Variant::Nrv2b);
        assert_eq!("2d".parse::<Variant>().unwrap(), Variant::Nrv2d);
        assert_eq!("NRV2E".parse::<Variant>().unwrap(), Variant::Nrv2e);
        assert!("2x".parse::<Variant>().is_err());
        assert_eq!(Variant::Nrv2e.to_string(), "nrv2e");
        assert_eq!(Variant::Nrv2d.letter(), 'D');
        assert_eq!(Variant::from_method_id(0x2E), Some(Variant::Nrv2e));
        assert_eq!(Variant::from_method_id(0x2C), None);
    }

    #[test]
    fn test_gamma1_layout() {
        // 5 = 0b101: data bits 0,1 each followed by a stop bit.
        let bits = written_bits(|w| write_gamma1(w, 5));
        assert_eq!(&bits[..4], &[0, 0, 1, 1]);
        assert_eq!(gamma1_bits(5), 4);
        assert_eq!(gamma1_bits(2), 2);
        assert_eq!(gamma1_bits(END_MARKER_PREFIX), 48);
    }

    #[test]
    fn test_gamma2_layout() {
        // 4 = step 0, continue, then 0, 0, stop.
        let bits = written_bits(|w| write_gamma2(w, 4));
        assert_eq!(&bits[..5], &[0, 0, 0, 0, 1]);
        assert_eq!(gamma2_bits(3), 2);
        assert_eq!(gamma2_bits(4), 5);
        assert_eq!(gamma2_bits(11), 5);
        assert_eq!(gamma2_bits(12), 8);
        assert_eq!(gamma2_bits(END_MARKER_PREFIX), 38);
    }

    #[test]
    fn test_gamma_roundtrip() {
        for value in (2u32..2000).chain([0xFFFF, 0x12345, END_MARKER_PREFIX]) {
            let mut writer = FlagWriter::new(64);
            write_gamma1(&mut writer, value).unwrap();
            write_gamma2(&mut writer, value).unwrap();
            let data = writer.finish();

            let mut reader = FlagReader::new(&data);
            let err = UclError::generic("overflow");
            assert_eq!(read_gamma1(&mut reader, u32::MAX, err.clone()).unwrap(), value);
            assert_eq!(read_gamma2(&mut reader, u32::MAX, err).unwrap(), value);
        }
    }

    #[test]
    fn test_gamma_limit() {
        let mut writer = FlagWriter::new(64);
        write_gamma1(&mut writer, 1000).unwrap();
        let data = writer.finish();
        let mut reader = FlagReader::new(&data);
        let err = read_gamma1(&mut reader, 500, UclError::output_overrun(500)).unwrap_err();
        assert_eq!(err, UclError::output_overrun(500));
    }

    #[test]
    fn test_min_match_len() {
        assert_eq!(NRV2B.min_match_len(0xD00), 2);
        assert_eq!(NRV2B.min_match_len(0xD01), 3);
        assert_eq!(NRV2D.min_match_len(0x500), 2);
        assert_eq!(NRV2E.min_match_len(0x501), 3);
    }

    #[test]
    fn test_match_bits_agree_with_writer() {
        for desc in [NRV2B, NRV2D, NRV2E] {
            for &distance in &[1usize, 2, 255, 256, 0x500, 0x501, 0xD00, 0xD01, 70_000] {
                for length in desc.min_match_len(distance)..40 {
                    for repeat in [false, true] {
                        let mut writer = FlagWriter::new(64);
                        writer.write_bit(0).unwrap();
                        desc.write_match(&mut writer, distance, length, repeat)
                            .unwrap();
                        let bytes = writer.len();
                        let bits = desc.match_bits(distance, length, repeat);
                        // Bytes written = whole payload bytes + reserved group bytes.
                        let payload = if repeat { 0 } else { 1 };
                        let groups = (bits - payload * 8).div_ceil(8);
                        assert_eq!(bytes, groups + payload, "{} d={distance} l={length}", desc.name);
                    }
                }
            }
        }
    }

    #[test]
    fn test_short_far_match_is_not_profitable() {
        assert!(NRV2B.is_profitable(1, 2, false));
        assert!(!NRV2B.is_profitable(0xD01, 2, false));
        assert!(NRV2E.is_profitable(0x400, 2, false));
        assert!(!NRV2E.is_profitable(0x4F0, 2, false));
        assert!(NRV2E.is_profitable(0x4F0, 2, true));
    }

    #[test]
    fn test_match_gain() {
        // A repeated distance only pays for the two-bit prefix.
        assert_eq!(NRV2B.match_gain(4, 3, true), 27 - 5);
        assert_eq!(NRV2B.match_gain(15, 4, false), 36 - 13);
        assert!(NRV2B.match_gain(0xD01, 3, false) > 0);
        assert!(NRV2E.match_gain(0x4F0, 2, false) <= 0);
        for (distance, length, repeat) in [(1, 2, false), (300, 9, true), (70_000, 40, false)] {
            assert_eq!(
                NRV2D.match_gain(distance, length, repeat) > 0,
                NRV2D.is_profitable(distance, length, repeat)
            );
        }
    }
}
