//! Match finder producing the literal/match token sequence.
//!
//! Positions are indexed by hash chains over 3-byte prefixes, plus a
//! direct table keyed by 2-byte prefixes for the short, near matches the
//! NRV formats can express. Chains are walked nearest-first.
//!
//! Every candidate is priced with the variant's exact bit cost and the
//! one saving the most bits over literals wins, with ties going to the
//! smallest distance. A match that saves nothing is never proposed. The
//! lazy levels apply the same measure when deciding whether to give up
//! a match for a better one starting one byte later.

use oxiucl_core::error::{Result, UclError};
use oxiucl_core::traits::CompressionLevel;

use crate::variant::{LITERAL_BITS, MAX_DISTANCE, VariantDescriptor};

/// Hash table size for 3-byte prefixes (power of 2).
const HASH_BITS: u32 = 16;
const HASH_SIZE: usize = 1 << HASH_BITS;

/// Direct table size for 2-byte prefixes.
const PAIR_SIZE: usize = 1 << 16;

/// A unit of the parse. Tokens cover the source exactly, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Copy `len` bytes verbatim from the source.
    Literal {
        /// Number of bytes.
        len: usize,
    },
    /// Copy `length` bytes starting `distance` bytes back in the output.
    Match {
        /// Distance back into the output (1-based).
        distance: usize,
        /// Number of bytes to copy.
        length: usize,
    },
}

impl Token {
    /// Number of source bytes this token accounts for.
    pub fn consumed(&self) -> usize {
        match *self {
            Token::Literal { len } => len,
            Token::Match { length, .. } => length,
        }
    }
}

/// Search parameters derived from a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelParams {
    /// Largest distance searched (power of 2).
    pub window: usize,
    /// Maximum number of chain candidates examined per position.
    pub max_chain: usize,
    /// Stop searching once a match this long is found.
    pub nice_len: usize,
    /// Defer a match by one byte when the next position saves more bits.
    pub lazy: bool,
}

impl LevelParams {
    /// Parameters for `level`.
    pub fn for_level(level: CompressionLevel) -> Self {
        let (window, max_chain, nice_len, lazy) = match level.level() {
            1 => (1 << 15, 4, 32, false),
            2 => (1 << 16, 8, 64, false),
            3 => (1 << 16, 16, 96, false),
            4 => (1 << 17, 32, 128, true),
            5 => (1 << 18, 64, 192, true),
            6 => (1 << 19, 128, 256, true),
            7 => (1 << 20, 256, 1024, true),
            8 => (1 << 21, 1024, 2048, true),
            _ => (1 << 22, 4096, usize::MAX, true),
        };
        Self {
            window,
            max_chain,
            nice_len,
            lazy,
        }
    }
}

/// Allocate a zeroed `u32` table, reporting allocation failure.
fn alloc_table(len: usize) -> Result<Vec<u32>> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(len)
        .map_err(|_| UclError::out_of_memory(len * std::mem::size_of::<u32>()))?;
    table.resize(len, 0);
    Ok(table)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: usize,
    length: usize,
    /// Bits saved over literals.
    gain: isize,
}

/// Hash chain index over a source buffer.
///
/// Table entries store `position + 1`; zero marks an empty slot.
#[derive(Debug)]
pub struct MatchFinder<'a> {
    input: &'a [u8],
    desc: &'static VariantDescriptor,
    params: LevelParams,
    head: Vec<u32>,
    prev: Vec<u32>,
    pairs: Vec<u32>,
    window_mask: usize,
    /// Every position below this has been inserted.
    inserted: usize,
}

impl<'a> MatchFinder<'a> {
    /// Build an empty index over `input`.
    pub fn new(
        input: &'a [u8],
        desc: &'static VariantDescriptor,
        params: LevelParams,
    ) -> Result<Self> {
        if input.len() >= u32::MAX as usize {
            return Err(UclError::invalid_argument(format!(
                "input of {} bytes exceeds the 32-bit size limit",
                input.len()
            )));
        }
        let window = params
            .window
            .min(input.len().next_power_of_two())
            .clamp(1, MAX_DISTANCE + 1);
        let (head, pairs) = if input.len() < 2 {
            (Vec::new(), Vec::new())
        } else {
            (alloc_table(HASH_SIZE)?, alloc_table(PAIR_SIZE)?)
        };
        Ok(Self {
            input,
            desc,
            params: LevelParams { window, ..params },
            head,
            prev: alloc_table(window)?,
            pairs,
            window_mask: window - 1,
            inserted: 0,
        })
    }

    #[inline]
    fn hash3(&self, pos: usize) -> usize {
        let v = u32::from(self.input[pos]) << 16
            | u32::from(self.input[pos + 1]) << 8
            | u32::from(self.input[pos + 2]);
        (v.wrapping_mul(2654435761) >> (32 - HASH_BITS)) as usize
    }

    #[inline]
    fn pair_key(&self, pos: usize) -> usize {
        usize::from(u16::from_be_bytes([self.input[pos], self.input[pos + 1]]))
    }

    /// Index every position below `end`.
    pub fn insert_until(&mut self, end: usize) {
        let end = end.min(self.input.len());
        while self.inserted < end {
            let pos = self.inserted;
            if pos + 3 <= self.input.len() {
                let h = self.hash3(pos);
                self.prev[pos & self.window_mask] = self.head[h];
                self.head[h] = pos as u32 + 1;
            }
            if pos + 2 <= self.input.len() {
                let key = self.pair_key(pos);
                self.pairs[key] = pos as u32 + 1;
            }
            self.inserted += 1;
        }
    }

    #[inline]
    fn common_len(&self, earlier: usize, pos: usize, max_len: usize) -> usize {
        self.input[earlier..]
            .iter()
            .zip(&self.input[pos..pos + max_len])
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Keep `(distance, length)` if it saves more bits than `best`.
    fn consider(
        &self,
        distance: usize,
        length: usize,
        last_distance: usize,
        best: &mut Option<Candidate>,
    ) {
        if length < self.desc.min_match_len(distance) {
            return;
        }
        let gain = self
            .desc
            .match_gain(distance, length, distance == last_distance);
        let better = match *best {
            None => gain > 0,
            Some(current) => {
                gain > current.gain || (gain == current.gain && distance < current.distance)
            }
        };
        if better {
            *best = Some(Candidate {
                distance,
                length,
                gain,
            });
        }
    }

    /// Find the best profitable match at `pos`.
    ///
    /// All positions below `pos` must be indexed and `pos` itself must not
    /// be. `last_distance` is the distance of the previous match, which
    /// the encoder can repeat cheaply.
    pub fn find(&self, pos: usize, last_distance: usize) -> Option<(usize, usize)> {
        debug_assert_eq!(self.inserted, pos);
        let max_len = self.input.len() - pos;
        if max_len < self.desc.min_match {
            return None;
        }

        let mut best = None;
        if max_len >= 3 {
            // Candidates only get farther along the chain; a farther one
            // is priced only when it is longer.
            let mut longest = 1;
            let mut candidate = self.head[self.hash3(pos)] as usize;
            let mut previous = usize::MAX;
            let mut chain = self.params.max_chain;
            while candidate != 0 && chain > 0 {
                let earlier = candidate - 1;
                if earlier >= previous || earlier >= pos {
                    break;
                }
                let distance = pos - earlier;
                if distance > self.params.window {
                    break;
                }
                if self.input[earlier + longest] == self.input[pos + longest] {
                    let length = self.common_len(earlier, pos, max_len);
                    if length > longest {
                        longest = length;
                        self.consider(distance, length, last_distance, &mut best);
                        if longest >= self.params.nice_len || longest == max_len {
                            break;
                        }
                    }
                }
                previous = earlier;
                candidate = self.prev[earlier & self.window_mask] as usize;
                chain -= 1;
            }
        }

        let repeat_found = best.is_some_and(|found| found.distance == last_distance);
        if last_distance <= pos && !repeat_found {
            let length = self.common_len(pos - last_distance, pos, max_len);
            self.consider(last_distance, length, last_distance, &mut best);
        }

        if best.is_none() {
            let candidate = self.pairs[self.pair_key(pos)] as usize;
            if candidate != 0 {
                let earlier = candidate - 1;
                let distance = pos - earlier;
                if distance <= self.desc.far_distance {
                    let length = self.common_len(earlier, pos, max_len);
                    self.consider(distance, length, last_distance, &mut best);
                }
            }
        }

        best.map(|found| (found.distance, found.length))
    }
}

/// Lazy iterator over the tokens of a source buffer.
#[derive(Debug)]
pub struct TokenStream<'a> {
    finder: MatchFinder<'a>,
    pos: usize,
    last_distance: usize,
    /// Match found at `pos` while evaluating the previous position.
    lookahead: Option<Option<(usize, usize)>>,
    /// Match to emit after the pending literal run.
    queued: Option<Token>,
}

impl<'a> TokenStream<'a> {
    /// Create a token stream for `input` at `level`.
    pub fn new(
        input: &'a [u8],
        desc: &'static VariantDescriptor,
        level: CompressionLevel,
    ) -> Result<Self> {
        Self::with_params(input, desc, LevelParams::for_level(level))
    }

    /// Create a token stream with explicit search parameters.
    pub fn with_params(
        input: &'a [u8],
        desc: &'static VariantDescriptor,
        params: LevelParams,
    ) -> Result<Self> {
        Ok(Self {
            finder: MatchFinder::new(input, desc, params)?,
            pos: 0,
            last_distance: 1,
            lookahead: None,
            queued: None,
        })
    }

    fn search(&mut self) -> Option<(usize, usize)> {
        match self.lookahead.take() {
            Some(found) => found,
            None => {
                self.finder.insert_until(self.pos);
                self.finder.find(self.pos, self.last_distance)
            }
        }
    }

    /// Whether a literal followed by the match at the next position saves
    /// more bits than taking `(distance, length)` here.
    fn defer_pays_off(&mut self, distance: usize, length: usize) -> bool {
        let params = self.finder.params;
        if !params.lazy || length >= params.nice_len || self.pos + 1 >= self.finder.input.len() {
            return false;
        }
        self.finder.insert_until(self.pos + 1);
        let next = self.finder.find(self.pos + 1, self.last_distance);
        self.lookahead = Some(next);

        let desc = self.finder.desc;
        let last = self.last_distance;
        let here = desc.match_gain(distance, length, distance == last);
        next.is_some_and(|(d, l)| desc.match_gain(d, l, d == last) > here + LITERAL_BITS as isize)
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.queued.take() {
            return Some(token);
        }

        let len = self.finder.input.len();
        let start = self.pos;
        while self.pos < len {
            match self.search() {
                Some((distance, length)) if !self.defer_pays_off(distance, length) => {
                    self.lookahead = None;
                    self.pos += length;
                    self.last_distance = distance;
                    let found = Token::Match { distance, length };
                    if self.pos - length == start {
                        return Some(found);
                    }
                    self.queued = Some(found);
                    return Some(Token::Literal {
                        len: self.pos - length - start,
                    });
                }
                _ => self.pos += 1,
            }
        }

        (self.pos > start).then(|| Token::Literal {
            len: self.pos - start,
        })
    }
}

/// Parse `source` into tokens at `level`.
pub fn find_tokens(
    source: &[u8],
    desc: &'static VariantDescriptor,
    level: CompressionLevel,
) -> Result<Vec<Token>> {
    Ok(TokenStream::new(source, desc, level)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{NRV2B, NRV2D, NRV2E};

    fn level(n: u8) -> CompressionLevel {
        CompressionLevel::new(n).unwrap()
    }

    fn check_partition(source: &[u8], tokens: &[Token]) {
        let mut pos = 0;
        for token in tokens {
            if let Token::Match { distance, length } = *token {
                assert!(distance >= 1 && distance <= pos, "distance {distance} at {pos}");
                for i in 0..length {
                    assert_eq!(source[pos + i], source[pos + i - distance]);
                }
            }
            pos += token.consumed();
        }
        assert_eq!(pos, source.len());
    }

    #[test]
    fn test_empty_and_tiny() {
        assert!(find_tokens(b"", &NRV2B, level(1)).unwrap().is_empty());
        assert_eq!(
            find_tokens(b"x", &NRV2B, level(9)).unwrap(),
            vec![Token::Literal { len: 1 }]
        );
    }

    #[test]
    fn test_run_of_a() {
        let source = [b'a'; 20];
        let tokens = find_tokens(&source, &NRV2B, level(1)).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal { len: 1 },
                Token::Match {
                    distance: 1,
                    length: 19
                }
            ]
        );
    }

    #[test]
    fn test_tie_prefers_nearest() {
        // "abcX" twice then "abc": both earlier copies match 3 bytes.
        let source = b"abcXabcYabc";
        let tokens = find_tokens(source, &NRV2B, level(9)).unwrap();
        check_partition(source, &tokens);
        assert_eq!(
            tokens.last(),
            Some(&Token::Match {
                distance: 4,
                length: 3
            })
        );
    }

    #[test]
    fn test_no_matches_in_distinct_bytes() {
        let source: Vec<u8> = (0..=255).collect();
        let tokens = find_tokens(&source, &NRV2E, level(5)).unwrap();
        assert_eq!(tokens, vec![Token::Literal { len: 256 }]);
    }

    #[test]
    fn test_partition_all_levels() {
        let source = b"The quick brown fox jumps over the lazy dog. The quick brown cat. "
            .repeat(20);
        for desc in [&NRV2B, &NRV2D, &NRV2E] {
            for n in 1..=9 {
                let tokens = find_tokens(&source, desc, level(n)).unwrap();
                check_partition(&source, &tokens);
                for token in &tokens {
                    if let Token::Match { distance, length } = *token {
                        assert!(length >= desc.min_match_len(distance));
                    }
                }
            }
        }
    }

    #[test]
    fn test_level_params_grow() {
        let mut prev = LevelParams::for_level(level(1));
        for n in 2..=9 {
            let params = LevelParams::for_level(level(n));
            assert!(params.window >= prev.window);
            assert!(params.max_chain > prev.max_chain);
            prev = params;
        }
        assert!(!LevelParams::for_level(level(1)).lazy);
        assert!(LevelParams::for_level(level(9)).lazy);
    }

    #[test]
    fn test_short_near_match_found() {
        // "zq" recurs at distance 3 with no 3-byte repeat.
        let source = b"zqAzqB";
        let tokens = find_tokens(source, &NRV2D, level(1)).unwrap();
        check_partition(source, &tokens);
        assert!(tokens.contains(&Token::Match {
            distance: 3,
            length: 2
        }));
    }

    #[test]
    fn test_lazy_keeps_cheaper_repeat() {
        // At 14 "xyz" repeats the last distance; at 15 "yzRS" matches four
        // bytes but at a new distance, which saves only one bit more.
        let source = b"yzRS-wxyzwxyzQxyzRS!";
        let tokens = find_tokens(source, &NRV2B, level(9)).unwrap();
        check_partition(source, &tokens);
        assert!(tokens.contains(&Token::Match {
            distance: 4,
            length: 3
        }));
        assert!(!tokens.contains(&Token::Match {
            distance: 15,
            length: 4
        }));
    }

    #[test]
    fn test_lazy_defers_for_larger_saving() {
        // "abc" matches three bytes at 14, "bcdefghij" nine bytes at 15.
        let source = b"bcdefghij=abc-abcdefghij!";
        let greedy = find_tokens(source, &NRV2B, level(1)).unwrap();
        assert!(greedy.contains(&Token::Match {
            distance: 4,
            length: 3
        }));

        let lazy = find_tokens(source, &NRV2B, level(9)).unwrap();
        check_partition(source, &lazy);
        assert!(lazy.contains(&Token::Match {
            distance: 15,
            length: 9
        }));
    }

    #[test]
    fn test_repeat_distance_wins_on_gain() {
        let source = b"abXabYabZab";
        let mut finder =
            MatchFinder::new(source, &NRV2E, LevelParams::for_level(level(9))).unwrap();
        finder.insert_until(9);
        // Distance 3 is nearest; distance 6 is cheaper once it repeats.
        assert_eq!(finder.find(9, 1), Some((3, 2)));
        assert_eq!(finder.find(9, 6), Some((6, 2)));
    }
}
