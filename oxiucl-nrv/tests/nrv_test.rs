//! NRV integration tests.

use oxiucl_nrv::{
    CompressionLevel, ErrorKind, NoProgress, Progress, ProgressAction, ProgressState, Token,
    UclError, Variant, compress, compress_with_progress, decompress, decompress_into, encode,
    find_tokens, max_compressed_len, required_overlap_offset, test_overlap,
};

fn text(size: usize) -> Vec<u8> {
    let text = b"The quick brown fox jumps over the lazy dog. \
                 Pack my box with five dozen liquor jugs. \
                 How vexingly quick daft zebras jump! ";
    text.iter().copied().cycle().take(size).collect()
}

fn noise(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Mostly text with a few random bytes sprinkled in, to exercise far
/// distances and mixed literal/match runs.
fn mixed(size: usize) -> Vec<u8> {
    let mut data = text(size);
    let bytes = noise(size / 7 + 1, 99);
    for (i, b) in bytes.into_iter().enumerate() {
        let at = i * 7;
        if at < data.len() {
            data[at] = b;
        }
    }
    data
}

/// Small-alphabet letters, short runs, word salad and three-symbol noise.
fn low_entropy_inputs() -> Vec<Vec<u8>> {
    let words: [&[u8]; 8] = [
        b"the ", b"quick ", b"zebra ", b"jumps ", b"over ", b"lazy ", b"dog ", b"and ",
    ];
    let mut inputs = Vec::new();
    for (seed, size) in [50usize, 700, 5000, 20_000].into_iter().enumerate() {
        let seed = seed as u64 * 4 + 1;
        // Long hash chains make these slow at level 9.
        let symbols = size.min(6000);
        inputs.push(
            noise(symbols, seed)
                .into_iter()
                .map(|b| b"abcde"[usize::from(b % 5)])
                .collect(),
        );

        let mut runs = Vec::with_capacity(size + 8);
        for b in noise(size, seed + 1) {
            runs.extend(std::iter::repeat_n(b >> 5, usize::from(b & 7) + 1));
            if runs.len() >= size {
                break;
            }
        }
        runs.truncate(size);
        inputs.push(runs);

        let mut salad = Vec::with_capacity(size + 8);
        for b in noise(size, seed + 2) {
            salad.extend_from_slice(words[usize::from(b % 8)]);
            if salad.len() >= size {
                break;
            }
        }
        salad.truncate(size);
        inputs.push(salad);

        inputs.push(noise(symbols, seed + 3).into_iter().map(|b| b % 3).collect());
    }
    inputs
}

#[test]
fn test_roundtrip_every_variant_and_level() {
    let inputs = [text(3000), mixed(5000), vec![0u8; 70_000], b"abababababababab".to_vec()];
    for variant in Variant::ALL {
        for level in 1..=9 {
            for input in &inputs {
                let packed = compress(variant, input, level).expect("compression failed");
                assert!(packed.len() < input.len());
                let unpacked =
                    decompress(variant, &packed, input.len()).expect("decompression failed");
                assert_eq!(&unpacked, input, "{variant} level {level}");
            }
        }
    }
}

#[test]
fn test_twenty_a_scenario() {
    let original = b"aaaaaaaaaaaaaaaaaaaa";
    let packed = compress(Variant::Nrv2b, original, 1).expect("compression failed");
    assert!(packed.len() < 20);
    assert_eq!(
        packed,
        [0x90, 0x61, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x12, 0xFF]
    );
    let unpacked = decompress(Variant::Nrv2b, &packed, 20).expect("decompression failed");
    assert_eq!(unpacked, original);
}

#[test]
fn test_empty_input_scenario() {
    for variant in Variant::ALL {
        let packed = compress(variant, b"", 1).expect("compression failed");
        assert!(packed.len() <= max_compressed_len(0));
        assert_eq!(decompress(variant, &packed, 0).expect("decompression failed"), b"");
    }
    assert_eq!(
        compress(Variant::Nrv2b, b"", 9).unwrap(),
        [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x80, 0xFF]
    );
    assert_eq!(
        compress(Variant::Nrv2e, b"", 9).unwrap(),
        [0x09, 0x24, 0x92, 0x49, 0x2A, 0xFF]
    );
}

#[test]
fn test_decode_is_deterministic() {
    let input = mixed(4000);
    for variant in Variant::ALL {
        let packed = compress(variant, &input, 6).unwrap();
        let first = decompress(variant, &packed, input.len());
        let second = decompress(variant, &packed, input.len());
        assert_eq!(first, second);

        let short = decompress(variant, &packed, input.len() - 1);
        assert_eq!(short, decompress(variant, &packed, input.len() - 1));
        assert_eq!(short.unwrap_err().kind(), ErrorKind::OutputOverrun);
    }
}

#[test]
fn test_higher_level_not_worse() {
    // The repeat sits 40 KiB back, outside the level 1 window.
    let block = noise(40_000, 3);
    let mut input = block.clone();
    input.extend_from_slice(&block);
    input.extend_from_slice(&[0u8; 40_000]);
    for variant in Variant::ALL {
        let fast = compress(variant, &input, 1).unwrap().len();
        let best = compress(variant, &input, 9).unwrap().len();
        println!("{variant}: level 1 = {fast} bytes, level 9 = {best} bytes");
        assert!(best <= fast, "{variant}: {best} > {fast}");
    }
}

/// Compressed size after checking the round trip, or `usize::MAX` for a
/// block that does not shrink.
fn packed_len(variant: Variant, input: &[u8], level: u8) -> usize {
    match compress(variant, input, level) {
        Ok(packed) => {
            let unpacked = decompress(variant, &packed, input.len()).expect("decompression failed");
            assert_eq!(unpacked, input, "{variant} level {level}");
            packed.len()
        }
        Err(UclError::NotCompressible { .. }) => usize::MAX,
        Err(e) => panic!("{variant} level {level}: {e}"),
    }
}

#[test]
fn test_levels_not_worse_than_baselines() {
    for variant in Variant::ALL {
        for input in low_entropy_inputs() {
            let sizes: Vec<usize> = (1..=9)
                .map(|level| packed_len(variant, &input, level))
                .collect();
            let n = input.len();
            assert!(sizes[8] <= sizes[0], "{variant}, {n} bytes: {sizes:?}");
            for level in 4..=9 {
                assert!(sizes[level - 1] <= sizes[2], "{variant}, {n} bytes: {sizes:?}");
            }
        }
    }
}

#[test]
fn test_noise_is_not_compressible() {
    for variant in Variant::ALL {
        for level in [1, 5, 9] {
            for size in [64, 1000, 16_384] {
                let input = noise(size, size as u64);
                let err = compress(variant, &input, level).unwrap_err();
                assert_eq!(err, UclError::not_compressible(size));
                assert!(err.kind().is_recoverable());
            }
        }
    }
}

#[test]
fn test_worst_case_bound_holds() {
    for variant in Variant::ALL {
        for size in [1, 7, 8, 9, 100, 5000] {
            let input = noise(size, 7);
            let tokens = find_tokens(&input, variant.descriptor(), CompressionLevel::BEST).unwrap();
            let bound = max_compressed_len(size);
            let packed = encode(&input, tokens, variant, bound, &mut NoProgress)
                .expect("bound must fit");
            assert!(packed.len() <= bound);

            // All-literal parse is the most expensive one the encoder accepts.
            let literals = vec![Token::Literal { len: size }];
            let packed = encode(&input, literals, variant, bound, &mut NoProgress)
                .expect("bound must fit");
            assert_eq!(decompress(variant, &packed, size).unwrap(), input);
        }
    }
}

#[test]
fn test_truncated_streams() {
    let input = text(2000);
    for variant in Variant::ALL {
        let packed = compress(variant, &input, 4).unwrap();
        for cut in 0..packed.len() {
            let err = decompress(variant, &packed[..cut], input.len()).unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::EofNotFound | ErrorKind::InputOverrun),
                "{variant} cut at {cut}: {err}"
            );
        }
    }
}

#[test]
fn test_decompress_into_larger_buffer() {
    let input = mixed(3000);
    for variant in Variant::ALL {
        let packed = compress(variant, &input, 3).unwrap();
        let mut dst = vec![0x5Au8; input.len() + 100];
        let n = decompress_into(variant, &packed, &mut dst).unwrap();
        assert_eq!(n, input.len());
        assert_eq!(&dst[..n], &input[..]);
        assert!(dst[n..].iter().all(|&b| b == 0x5A));
    }
}

#[test]
fn test_progress_reporting() {
    let input = text(50_000);
    let mut events: Vec<Progress> = Vec::new();
    let mut record = |p: Progress| {
        events.push(p);
        ProgressAction::Continue
    };
    let packed = compress_with_progress(Variant::Nrv2d, &input, 5, &mut record).unwrap();

    assert_eq!(events.first().unwrap().state, ProgressState::Started);
    assert_eq!(events.first().unwrap().bytes_in, 0);
    let last = events.last().unwrap();
    assert_eq!(last.state, ProgressState::Finished);
    assert_eq!(last.bytes_in, input.len());
    assert_eq!(last.bytes_out, packed.len());
    assert!(events.iter().any(|e| e.state == ProgressState::Running));
    assert!(events.windows(2).all(|w| w[0].bytes_in <= w[1].bytes_in));
    let encoding = &events[..events.len() - 1];
    assert!(encoding.windows(2).all(|w| w[0].bytes_out <= w[1].bytes_out));

    // Progress must not change the bytes.
    assert_eq!(packed, compress(Variant::Nrv2d, &input, 5).unwrap());
}

#[test]
fn test_cancel_on_start() {
    let input = text(1000);
    let mut cancel = |_: Progress| ProgressAction::Cancel;
    let err = compress_with_progress(Variant::Nrv2b, &input, 1, &mut cancel).unwrap_err();
    assert_eq!(err, UclError::cancelled(0));
    assert_eq!(err.code(), -102);
}

#[test]
fn test_cancel_on_finish_is_ignored() {
    let input = text(1000);
    let mut cancel_late = |p: Progress| {
        if p.state == ProgressState::Finished {
            ProgressAction::Cancel
        } else {
            ProgressAction::Continue
        }
    };
    let packed = compress_with_progress(Variant::Nrv2e, &input, 1, &mut cancel_late).unwrap();
    assert_eq!(decompress(Variant::Nrv2e, &packed, input.len()).unwrap(), input);
}

#[test]
fn test_overlap_probe() {
    let input = mixed(6000);
    for variant in Variant::ALL {
        let packed = compress(variant, &input, 7).unwrap();
        let off = required_overlap_offset(variant, &packed, input.len()).unwrap();
        assert_eq!(test_overlap(variant, &packed, off, input.len()).unwrap(), input.len());
        if off > 0 {
            let err = test_overlap(variant, &packed, off - 1, input.len()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::OverlapOverrun);
        }
        // The compressed block has to fit behind the output in any case.
        assert!(off + packed.len() >= input.len());
    }
}

#[test]
fn test_error_codes() {
    let expected = [
        (UclError::generic("x"), -1),
        (UclError::invalid_argument("x"), -2),
        (UclError::out_of_memory(1), -3),
        (UclError::not_compressible(1), -101),
        (UclError::input_overrun(0), -201),
        (UclError::output_overrun(0), -202),
        (UclError::lookbehind_overrun(1, 0), -203),
        (UclError::eof_not_found(0), -204),
        (UclError::input_not_consumed(0, 1), -205),
        (UclError::overlap_overrun(1, 0), -206),
    ];
    for (err, code) in expected {
        assert_eq!(err.code(), code, "{err}");
        assert_eq!(ErrorKind::from_code(code), Some(err.kind()));
    }
}
