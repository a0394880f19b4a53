//! Interchangeable lossless byte-stream compressors.
//!
//! Three engines share the [`Compression`] contract: run-length encoding ([`Rle`]),
//! Huffman coding ([`Huffman`]) and LZ77 ([`Lz77`]). Each produces a self-describing
//! blob that only its own `decompress` understands.

pub mod compression;
pub mod error;

pub use compression::{Compression, CompressionStats, Huffman, Lz77, Lz77Config, Rle};
pub use error::{Error, Malformed, Result};
