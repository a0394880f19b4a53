//! Compression algorithms implementation.
//!
//! This module provides three independent lossless byte-stream codecs behind one
//! contract:
//! - Run-length encoding (`rle`)
//! - Huffman coding (`huffman`)
//! - LZ77 sliding-window compression (`lz77`)
//!
//! Every codec produces a self-contained blob: whatever model the decoder needs is
//! embedded in the output, so `decompress` only ever needs the bytes `compress` returned.
//!
//! # Examples
//!
//! ```rust
//! use bytecodecs::compression::{Compression, Huffman, Lz77, Rle};
//!
//! let codecs: Vec<Box<dyn Compression>> =
//!     vec![Box::new(Rle::new()), Box::new(Huffman::new()), Box::new(Lz77::new())];
//!
//! let data = b"abracadabra abracadabra";
//! for codec in &codecs {
//!     let packed = codec.compress(data).unwrap();
//!     assert_eq!(codec.decompress(&packed).unwrap(), data);
//! }
//! ```

pub use crate::error::{Error, Malformed, Result};

/// Trait for compression algorithms
pub trait Compression {
    /// Compress the input data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress the compressed data
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Human-readable algorithm name
    fn name(&self) -> &'static str;

    /// Compress the input and report how much it shrank.
    ///
    /// The returned bytes are exactly what [`Compression::compress`] produces.
    fn compress_with_stats(&self, data: &[u8]) -> Result<(Vec<u8>, CompressionStats)> {
        let compressed = self.compress(data)?;
        let stats = CompressionStats::new(self.name(), data.len(), compressed.len());
        Ok((compressed, stats))
    }
}

/// Size statistics for a single compression call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    /// Name of the codec that produced the output
    pub algorithm: &'static str,
    /// Input size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub compressed_size: u64,
    /// `compressed_size / original_size`, or 0.0 for empty input
    pub ratio: f64,
}

impl CompressionStats {
    pub fn new(algorithm: &'static str, original_size: usize, compressed_size: usize) -> Self {
        let original_size = original_size as u64;
        let compressed_size = compressed_size as u64;
        let ratio = if original_size > 0 {
            compressed_size as f64 / original_size as f64
        } else {
            0.0
        };
        CompressionStats {
            algorithm,
            original_size,
            compressed_size,
            ratio,
        }
    }

    /// Fraction of the input saved; negative when the output grew.
    pub fn space_savings(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            1.0 - self.ratio
        }
    }

    /// Whether the compressed output is strictly smaller than the input.
    pub fn is_smaller(&self) -> bool {
        self.compressed_size < self.original_size
    }
}

pub mod huffman;
pub mod lz77;
pub mod rle;

pub use huffman::{
    build_code_table, build_huffman_tree, CodeTable, FrequencyTable, Huffman, HuffmanNode,
};
pub use lz77::{Lz77, Lz77Config, Match, Token};
pub use rle::{analyze, Rle, Run, RunAnalysis};
