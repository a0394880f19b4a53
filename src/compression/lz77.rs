//! LZ77 sliding-window compression.
//!
//! The encoder walks the input and, at each position, looks back through a window of
//! already-seen bytes for the longest repeat of what comes next. Repeats of at least
//! [`MIN_MATCH_LENGTH`] bytes become match tokens, everything else a literal:
//!
//! ```text
//! literal: [0x00][byte]
//! match:   [0x01][distance:2 BE][length:1][next:1]
//! ```
//!
//! A match token always carries the byte that follows the match. When the match runs to
//! the very end of the input there is no such byte and a `0` sentinel is written instead;
//! the decoder drops the trailing byte of a final match token when it is `0`. The encoder
//! never ends a stream on a match whose real next byte is `0`, so the sentinel is
//! unambiguous.
//!
//! # Example
//!
//! ```
//! use bytecodecs::compression::lz77::{reconstruct, tokenize, Lz77Config, Token};
//!
//! let config = Lz77Config::default();
//! let tokens = tokenize(b"abcabcabcx", &config);
//! assert_eq!(tokens[3], Token::Match { distance: 3, length: 3, next: b'a' });
//! assert_eq!(reconstruct(&tokens).unwrap(), b"abcabcabcx");
//! ```

use crate::compression::{Compression, Result};
use crate::error::{Error, Malformed};

/// Bytes of history the encoder searches by default
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Longest match considered by default
pub const DEFAULT_BUFFER_SIZE: usize = 18;

/// Shorter repeats are cheaper as literals
pub const MIN_MATCH_LENGTH: usize = 3;

const NAME: &str = "LZ77";

const LITERAL_FLAG: u8 = 0x00;
const MATCH_FLAG: u8 = 0x01;
const SENTINEL: u8 = 0;

const LITERAL_TOKEN_LEN: usize = 2;
const MATCH_TOKEN_LEN: usize = 5;

/// Encoder search limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lz77Config {
    window_size: usize,
    buffer_size: usize,
}

impl Lz77Config {
    /// Creates a configuration, rejecting sizes the token format cannot carry.
    ///
    /// # Arguments
    ///
    /// * `window_size` - How far back matches may reach, `1..=65535`
    /// * `buffer_size` - Longest match, `3..=255`
    pub fn new(window_size: usize, buffer_size: usize) -> Result<Self> {
        if window_size == 0 || window_size > u16::MAX as usize {
            return Err(Error::invalid_config(format!(
                "LZ77 window size must be in 1..={}, got {}",
                u16::MAX,
                window_size
            )));
        }
        if !(MIN_MATCH_LENGTH..=u8::MAX as usize).contains(&buffer_size) {
            return Err(Error::invalid_config(format!(
                "LZ77 buffer size must be in {}..={}, got {}",
                MIN_MATCH_LENGTH,
                u8::MAX,
                buffer_size
            )));
        }
        Ok(Lz77Config {
            window_size,
            buffer_size,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for Lz77Config {
    fn default() -> Self {
        Lz77Config {
            window_size: DEFAULT_WINDOW_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// An LZ77 token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A single byte copied through.
    Literal(u8),
    /// Copy `length` bytes from `distance` back, then append `next`.
    Match { distance: u16, length: u8, next: u8 },
}

impl Token {
    pub fn is_literal(&self) -> bool {
        self.distance() == 0
    }

    /// Backward distance; zero for literals.
    pub fn distance(&self) -> u16 {
        match self {
            Token::Literal(_) => 0,
            Token::Match { distance, .. } => *distance,
        }
    }

    /// Size of the token once serialized.
    pub fn encoded_len(&self) -> usize {
        match self {
            Token::Literal(_) => LITERAL_TOKEN_LEN,
            Token::Match { .. } => MATCH_TOKEN_LEN,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match *self {
            Token::Literal(byte) => out.extend_from_slice(&[LITERAL_FLAG, byte]),
            Token::Match {
                distance,
                length,
                next,
            } => {
                out.push(MATCH_FLAG);
                out.extend_from_slice(&distance.to_be_bytes());
                out.push(length);
                out.push(next);
            }
        }
    }
}

/// A repeat found by [`find_longest_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub distance: usize,
    pub length: usize,
}

/// Find the longest earlier occurrence of the bytes starting at `pos`.
///
/// Candidates are limited to the window, the buffer size, the end of the input and the
/// candidate's own distance, so a match never overlaps the bytes it encodes. Among
/// equally long candidates the nearest wins. Returns `None` below [`MIN_MATCH_LENGTH`].
pub fn find_longest_match(data: &[u8], pos: usize, config: &Lz77Config) -> Option<Match> {
    if pos == 0 || pos >= data.len() {
        return None;
    }
    let max_length = config.buffer_size.min(data.len() - pos);
    if max_length < MIN_MATCH_LENGTH {
        return None;
    }
    let lookahead = &data[pos..pos + max_length];
    let max_distance = config.window_size.min(pos);

    let mut best: Option<Match> = None;
    for distance in MIN_MATCH_LENGTH..=max_distance {
        let start = pos - distance;
        let limit = max_length.min(distance);
        let length = data[start..start + limit]
            .iter()
            .zip(lookahead)
            .take_while(|(a, b)| a == b)
            .count();
        if length >= MIN_MATCH_LENGTH && best.map_or(true, |m| length > m.length) {
            best = Some(Match { distance, length });
            if length == max_length {
                break;
            }
        }
    }
    best
}

/// Compress the input data into LZ77 tokens.
pub fn tokenize(data: &[u8], config: &Lz77Config) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let Some(found) = find_longest_match(data, pos, config) else {
            tokens.push(Token::Literal(data[pos]));
            pos += 1;
            continue;
        };

        let end = pos + found.length;
        let (length, next) = if end == data.len() {
            (found.length, SENTINEL)
        } else if end + 1 == data.len() && data[end] == SENTINEL {
            // A final match ending in a real 0 would read as the sentinel. Give the
            // 0 its own literal token.
            if found.length == MIN_MATCH_LENGTH {
                tokens.push(Token::Literal(data[pos]));
                pos += 1;
                continue;
            }
            (found.length - 1, data[end - 1])
        } else {
            (found.length, data[end])
        };

        tokens.push(Token::Match {
            distance: found.distance as u16,
            length: length as u8,
            next,
        });
        pos += length + 1;
    }
    tokens
}

/// Serialize tokens to the wire format.
pub fn serialize(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.iter().map(Token::encoded_len).sum());
    for token in tokens {
        token.write_to(&mut out);
    }
    out
}

/// Parse the wire format back into tokens.
pub fn parse(data: &[u8]) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(data.len() / LITERAL_TOKEN_LEN);
    let mut pos = 0;
    while pos < data.len() {
        let offset = pos;
        match data[pos] {
            LITERAL_FLAG => {
                let byte = *data
                    .get(pos + 1)
                    .ok_or_else(|| Error::malformed(NAME, Malformed::MissingLiteral { offset }))?;
                tokens.push(Token::Literal(byte));
                pos += LITERAL_TOKEN_LEN;
            }
            MATCH_FLAG => {
                let fields = data
                    .get(pos + 1..pos + MATCH_TOKEN_LEN)
                    .ok_or_else(|| Error::malformed(NAME, Malformed::TruncatedMatch { offset }))?;
                let distance = u16::from_be_bytes([fields[0], fields[1]]);
                if distance == 0 {
                    return Err(Error::malformed(NAME, Malformed::ZeroDistance { offset }));
                }
                tokens.push(Token::Match {
                    distance,
                    length: fields[2],
                    next: fields[3],
                });
                pos += MATCH_TOKEN_LEN;
            }
            flag => {
                return Err(Error::malformed(
                    NAME,
                    Malformed::UnknownTokenFlag { flag, offset },
                ));
            }
        }
    }
    Ok(tokens)
}

/// Replay tokens into the original bytes.
///
/// Match bytes are copied one at a time from the output being built, so a match whose
/// distance is shorter than its length repeats the bytes it has just written.
pub fn reconstruct(tokens: &[Token]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            Token::Literal(byte) => output.push(byte),
            Token::Match {
                distance,
                length,
                next,
            } => {
                let distance = distance as usize;
                if distance == 0 || distance > output.len() {
                    return Err(Error::malformed(
                        NAME,
                        Malformed::DistanceOutOfRange {
                            distance,
                            available: output.len(),
                        },
                    ));
                }
                let start = output.len() - distance;
                for k in 0..length as usize {
                    let byte = output[start + k];
                    output.push(byte);
                }
                let is_last = i + 1 == tokens.len();
                if !(is_last && next == SENTINEL) {
                    output.push(next);
                }
            }
        }
    }
    Ok(output)
}

/// LZ77 compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz77 {
    config: Lz77Config,
}

impl Lz77 {
    /// Uses a 4096-byte window and 18-byte matches.
    pub fn new() -> Self {
        Lz77::default()
    }

    pub fn with_config(config: Lz77Config) -> Self {
        Lz77 { config }
    }

    pub fn config(&self) -> &Lz77Config {
        &self.config
    }

    /// The match the encoder would use at `pos`.
    pub fn find_longest_match(&self, data: &[u8], pos: usize) -> Option<Match> {
        find_longest_match(data, pos, &self.config)
    }
}

impl Compression for Lz77 {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let tokens = tokenize(data, &self.config);
        let output = serialize(&tokens);
        log::debug!(
            "lz77: {} bytes -> {} tokens ({} matches) -> {} bytes",
            data.len(),
            tokens.len(),
            tokens.iter().filter(|t| !t.is_literal()).count(),
            output.len()
        );
        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let tokens = parse(data)?;
        let output = reconstruct(&tokens)?;
        log::debug!("lz77: {} tokens -> {} bytes", tokens.len(), output.len());
        Ok(output)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let lz77 = Lz77::new();
        assert!(lz77.compress(b"").unwrap().is_empty());
        assert!(lz77.decompress(b"").unwrap().is_empty());
    }

    #[test]
    fn test_no_repetition() {
        let tokens = tokenize(b"abcdefg", &Lz77Config::default());
        assert_eq!(tokens.len(), 7);
        assert!(tokens.iter().all(Token::is_literal));
        assert_eq!(reconstruct(&tokens).unwrap(), b"abcdefg");
    }

    #[test]
    fn test_find_longest_match() {
        let lz77 = Lz77::new();
        let data = b"abcabcabc";
        assert_eq!(lz77.find_longest_match(data, 0), None);
        assert_eq!(
            lz77.find_longest_match(data, 3),
            Some(Match {
                distance: 3,
                length: 3
            })
        );
        assert_eq!(
            lz77.find_longest_match(data, 6),
            Some(Match {
                distance: 3,
                length: 3
            })
        );
    }

    #[test]
    fn test_minimum_match_length() {
        let lz77 = Lz77::new();
        assert_eq!(lz77.find_longest_match(b"abcdefab", 6), None);
        assert_eq!(
            lz77.find_longest_match(b"abcdefabc", 6),
            Some(Match {
                distance: 6,
                length: 3
            })
        );

        let tokens = tokenize(b"abxyab", &Lz77Config::default());
        assert!(tokens.iter().all(Token::is_literal));
    }

    #[test]
    fn test_longer_match_beats_nearer() {
        let lz77 = Lz77::new();
        // "abcd" at distance 9 is longer than "abc" at distance 4
        let data = b"abcdxabcyabcd";
        assert_eq!(
            lz77.find_longest_match(data, 9),
            Some(Match {
                distance: 9,
                length: 4
            })
        );
    }

    #[test]
    fn test_match_capped_by_buffer_and_window() {
        let config = Lz77Config::new(8, 4).unwrap();
        let data = b"abcdefghabcdefgh";
        assert_eq!(
            find_longest_match(data, 8, &config),
            Some(Match {
                distance: 8,
                length: 4
            })
        );

        let config = Lz77Config::new(7, 18).unwrap();
        assert_eq!(find_longest_match(data, 8, &config), None);
    }

    #[test]
    fn test_match_token_carries_next_byte() {
        let tokens = tokenize(b"abcabcx", &Lz77Config::default());
        assert_eq!(
            tokens,
            vec![
                Token::Literal(b'a'),
                Token::Literal(b'b'),
                Token::Literal(b'c'),
                Token::Match {
                    distance: 3,
                    length: 3,
                    next: b'x'
                },
            ]
        );
    }

    #[test]
    fn test_sentinel_at_end_of_stream() {
        let lz77 = Lz77::new();
        let compressed = lz77.compress(b"abcabc").unwrap();
        assert_eq!(
            compressed,
            vec![0, b'a', 0, b'b', 0, b'c', 1, 0, 3, 3, 0]
        );
        assert_eq!(lz77.decompress(&compressed).unwrap(), b"abcabc");
    }

    #[test]
    fn test_real_trailing_zero_is_not_a_sentinel() {
        let lz77 = Lz77::new();
        let inputs: [&[u8]; 4] = [b"abcabc\0", b"abcdabcd\0", b"\0\0\0\0\0", b"xyzxyzxyz\0"];
        for input in inputs {
            let compressed = lz77.compress(input).unwrap();
            assert_eq!(lz77.decompress(&compressed).unwrap(), input);
        }

        let tokens = tokenize(b"abcdabcd\0", &Lz77Config::default());
        assert_eq!(
            tokens.last(),
            Some(&Token::Literal(0)),
            "trailing zero should be its own literal"
        );
    }

    #[test]
    fn test_overlapping_copy() {
        // distance 1, length 5 repeats the last byte
        let tokens = [
            Token::Literal(b'a'),
            Token::Match {
                distance: 1,
                length: 5,
                next: b'b',
            },
        ];
        assert_eq!(reconstruct(&tokens).unwrap(), b"aaaaaab");

        let tokens = [
            Token::Literal(b'x'),
            Token::Literal(b'y'),
            Token::Match {
                distance: 2,
                length: 5,
                next: b'z',
            },
        ];
        assert_eq!(reconstruct(&tokens).unwrap(), b"xyxyxyxz");
    }

    #[test]
    fn test_repeating_pattern() {
        let lz77 = Lz77::new();
        let input = b"abcdabcdabcdabcdabcdabcdabcdabcd";
        let compressed = lz77.compress(input).unwrap();
        assert!(compressed.len() < input.len());
        assert_eq!(lz77.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_input_larger_than_window() {
        let lz77 = Lz77::new();
        let input: Vec<u8> = (0..5000).map(|i| b'a' + (i % 26) as u8).collect();
        let compressed = lz77.compress(&input).unwrap();
        assert_eq!(lz77.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_binary_data() {
        let lz77 = Lz77::new();
        let input = [0x00, 0x01, 0x02, 0x03, 0x00, 0x01, 0x02, 0x03, 0xFF, 0xFE];
        let compressed = lz77.compress(&input).unwrap();
        assert_eq!(lz77.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_truncated_match_rejected() {
        let err = Lz77::new().decompress(&[1, 0, 5]).unwrap_err();
        assert_eq!(
            err.malformed_kind(),
            Some(&Malformed::TruncatedMatch { offset: 0 })
        );
    }

    #[test]
    fn test_missing_literal_rejected() {
        let err = Lz77::new().decompress(&[0, b'a', 0]).unwrap_err();
        assert_eq!(
            err.malformed_kind(),
            Some(&Malformed::MissingLiteral { offset: 2 })
        );
    }

    #[test]
    fn test_distance_beyond_output_rejected() {
        let err = Lz77::new().decompress(&[1, 0, 10, 3, b'a']).unwrap_err();
        assert_eq!(
            err.malformed_kind(),
            Some(&Malformed::DistanceOutOfRange {
                distance: 10,
                available: 0
            })
        );
    }

    #[test]
    fn test_unknown_flag_and_zero_distance_rejected() {
        let lz77 = Lz77::new();
        let err = lz77.decompress(&[0, b'a', 7, 0]).unwrap_err();
        assert_eq!(
            err.malformed_kind(),
            Some(&Malformed::UnknownTokenFlag { flag: 7, offset: 2 })
        );

        let err = lz77.decompress(&[0, b'a', 1, 0, 0, 3, b'b']).unwrap_err();
        assert_eq!(
            err.malformed_kind(),
            Some(&Malformed::ZeroDistance { offset: 2 })
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(Lz77Config::new(0, 18).is_err());
        assert!(Lz77Config::new(70_000, 18).is_err());
        assert!(Lz77Config::new(4096, 2).is_err());
        assert!(Lz77Config::new(4096, 256).is_err());

        let config = Lz77Config::new(65_535, 255).unwrap();
        assert_eq!(config.window_size(), 65_535);
        assert_eq!(config.buffer_size(), 255);

        let lz77 = Lz77::with_config(config);
        let input = b"Lorem ipsum dolor sit amet, Lorem ipsum dolor sit amet".repeat(20);
        let compressed = lz77.compress(&input).unwrap();
        assert_eq!(lz77.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_token_helpers() {
        let literal = Token::Literal(b'a');
        assert!(literal.is_literal());
        assert_eq!(literal.distance(), 0);
        assert_eq!(literal.encoded_len(), 2);

        let matched = Token::Match {
            distance: 5,
            length: 3,
            next: b'b',
        };
        assert!(!matched.is_literal());
        assert_eq!(matched.encoded_len(), 5);
        assert_eq!(serialize(&[matched]), vec![1, 0, 5, 3, b'b']);
        assert_eq!(parse(&[1, 0, 5, 3, b'b']).unwrap(), vec![matched]);
    }
}
