//! Error types shared by every codec.
//!
//! Decoding failures are always reported as [`Error::MalformedInput`] together with a
//! [`Malformed`] kind naming the structural element that was missing or invalid.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the compression engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The compressed bytes do not follow the codec's framing.
    #[error("malformed {codec} input: {kind}")]
    MalformedInput {
        /// Name of the codec that rejected the input
        codec: &'static str,
        /// What was wrong with it
        kind: Malformed,
    },

    /// The input cannot be represented in the codec's header fields.
    #[error("input of {len} bytes exceeds the maximum of {max} bytes")]
    InputTooLarge { len: usize, max: usize },

    /// A codec was configured with values its framing cannot express.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A bug in the engine itself. Not recoverable by the caller.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl Error {
    pub(crate) fn malformed(codec: &'static str, kind: Malformed) -> Self {
        Error::MalformedInput { codec, kind }
    }

    pub(crate) fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfig(msg.into())
    }

    pub(crate) fn internal<S: Into<String>>(msg: S) -> Self {
        Error::InternalInvariant(msg.into())
    }

    /// Returns `true` if this error signals corrupt or truncated compressed data.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedInput { .. })
    }

    /// The malformation kind, if this is a [`Error::MalformedInput`].
    pub fn malformed_kind(&self) -> Option<&Malformed> {
        match self {
            Error::MalformedInput { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// The structural element of a compressed stream that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    // RLE
    #[error("odd number of bytes ({len}), expected (byte, count) pairs")]
    OddLength { len: usize },
    #[error("zero run count at offset {offset}")]
    ZeroRunCount { offset: usize },

    // Huffman
    #[error("missing distinct-symbol count")]
    MissingSymbolCount,
    #[error("frequency table truncated after {read} of {expected} entries")]
    TruncatedFrequencyTable { expected: usize, read: usize },
    #[error("symbol {symbol:#04x} appears twice in the frequency table")]
    DuplicateSymbol { symbol: u8 },
    #[error("symbol {symbol:#04x} has a zero frequency")]
    ZeroFrequency { symbol: u8 },
    #[error("frequency table is empty")]
    EmptyFrequencyTable,
    #[error("missing original length")]
    MissingOriginalLength,
    #[error("missing padding-bit count")]
    MissingPaddingBits,
    #[error("padding-bit count {padding} is invalid for a {payload_len}-byte payload")]
    InvalidPaddingBits { padding: u8, payload_len: usize },
    #[error("frequencies sum to {total} but original length is {original}")]
    FrequencyMismatch { total: u64, original: u64 },
    #[error("payload exhausted after {decoded} of {expected} bytes")]
    TruncatedPayload { decoded: usize, expected: usize },

    // LZ77
    #[error("unknown token flag {flag:#04x} at offset {offset}")]
    UnknownTokenFlag { flag: u8, offset: usize },
    #[error("literal token at offset {offset} is missing its byte")]
    MissingLiteral { offset: usize },
    #[error("match token at offset {offset} is truncated")]
    TruncatedMatch { offset: usize },
    #[error("match token at offset {offset} has zero distance")]
    ZeroDistance { offset: usize },
    #[error("match distance {distance} is outside the {available} bytes decoded so far")]
    DistanceOutOfRange { distance: usize, available: usize },
}
