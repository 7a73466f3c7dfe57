//! In-place decompression probe.
//!
//! When a compressed block is stored at the tail of the buffer it will be
//! decompressed into, every write must stay behind the bytes the decoder
//! still has to read. The probe replays the decoder without producing any
//! output and reports the first write that would clobber unread input.

use oxiucl_core::error::{ErrorKind, Result, UclError};

use crate::decoder::{OutputSink, decode_with};
use crate::variant::Variant;

/// Sink that only tracks positions.
struct OverlapProbe {
    src_off: usize,
    pos: usize,
    capacity: usize,
}

impl OverlapProbe {
    fn advance(&mut self, n: usize, input_pos: usize) -> Result<()> {
        if n > self.capacity - self.pos {
            return Err(UclError::output_overrun(self.capacity));
        }
        let end = self.pos + n;
        let unread = self.src_off.saturating_add(input_pos);
        if end > unread {
            return Err(UclError::overlap_overrun(end, unread));
        }
        self.pos = end;
        Ok(())
    }
}

impl OutputSink for OverlapProbe {
    fn len(&self) -> usize {
        self.pos
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn put_literal(&mut self, _byte: u8, input_pos: usize) -> Result<()> {
        self.advance(1, input_pos)
    }

    fn put_match(&mut self, distance: usize, length: usize, input_pos: usize) -> Result<()> {
        if length > self.capacity - self.pos {
            return Err(UclError::output_overrun(self.capacity));
        }
        if distance > self.pos {
            return Err(UclError::lookbehind_overrun(distance, self.pos));
        }
        self.advance(length, input_pos)
    }
}

/// Check that `src`, placed at offset `src_off` of a shared buffer, can be
/// decompressed in place into the start of that buffer with room for
/// `dst_len` output bytes.
///
/// Returns the decompressed length. Fails with `OverlapOverrun` if a write
/// would overtake the unread input, or with the regular decoder errors if
/// `src` is not a valid stream.
pub fn test_overlap(variant: Variant, src: &[u8], src_off: usize, dst_len: usize) -> Result<usize> {
    let mut probe = OverlapProbe {
        src_off,
        pos: 0,
        capacity: dst_len,
    };
    decode_with(variant.descriptor(), src, &mut probe)
}

/// Smallest offset at which `src` can be decompressed in place.
///
/// Moving the input further right only loosens the constraint, so the
/// answer is found by bisection between 0 and `dst_len`.
pub fn required_overlap_offset(variant: Variant, src: &[u8], dst_len: usize) -> Result<usize> {
    test_overlap(variant, src, dst_len, dst_len)?;

    let (mut lo, mut hi) = (0usize, dst_len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match test_overlap(variant, src, mid, dst_len) {
            Ok(_) => hi = mid,
            Err(e) if e.kind() == ErrorKind::OverlapOverrun => lo = mid + 1,
            Err(e) => return Err(e),
        }
    }
    Ok(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN_2E: &[u8] = &[0x92, 0x61, 0xB0, 0x92, 0x49, 0x24, 0x92, 0xA0, 0xFF];

    #[test]
    fn test_roomy_offset_passes() {
        assert_eq!(test_overlap(Variant::Nrv2e, RUN_2E, 20, 20).unwrap(), 20);
        assert_eq!(test_overlap(Variant::Nrv2e, RUN_2E, 100, 20).unwrap(), 20);
    }

    #[test]
    fn test_zero_offset_fails() {
        let err = test_overlap(Variant::Nrv2e, RUN_2E, 0, 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverlapOverrun);
    }

    #[test]
    fn test_required_offset_is_tight() {
        let off = required_overlap_offset(Variant::Nrv2e, RUN_2E, 20).unwrap();
        assert!(off > 0 && off <= 20);
        assert_eq!(test_overlap(Variant::Nrv2e, RUN_2E, off, 20).unwrap(), 20);
        let err = test_overlap(Variant::Nrv2e, RUN_2E, off - 1, 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverlapOverrun);
    }

    #[test]
    fn test_decoder_errors_pass_through() {
        let err = required_overlap_offset(Variant::Nrv2e, RUN_2E, 19).unwrap_err();
        assert_eq!(err, UclError::output_overrun(19));
        let err = test_overlap(Variant::Nrv2e, &RUN_2E[..4], 64, 64).unwrap_err();
        assert!(err.kind().is_decompression_error());
    }
}
