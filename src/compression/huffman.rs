//! Huffman coding over bytes.
//!
//! The compressed blob carries the frequency table rather than the tree shape. Tree
//! construction is fully deterministic, so the decoder rebuilds exactly the tree the
//! encoder used:
//!
//! ```text
//! [distinct:1] ([byte:1][freq:4 BE]) x distinct [orig_len:4 BE] [padding_bits:1] [payload]
//! ```
//!
//! `distinct` is written modulo 256; a zero means all 256 byte values are present, since
//! empty input produces empty output and never reaches the header.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use bitvec::prelude::*;

use crate::compression::{Compression, Result};
use crate::error::{Error, Malformed};

/// Longest input whose length fits the 4-byte header field
pub const MAX_INPUT_LEN: usize = u32::MAX as usize;

const NAME: &str = "Huffman Coding";

// symbol byte + 4-byte frequency
const TABLE_ENTRY_LEN: usize = 5;

/// Represents a node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    /// A leaf node holds one byte value and its frequency.
    Leaf { byte: u8, freq: u64 },
    /// An internal node with left (bit 0) and right (bit 1) children.
    Internal {
        freq: u64,
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
    },
}

impl HuffmanNode {
    /// Returns the frequency of the node.
    pub fn freq(&self) -> u64 {
        match self {
            HuffmanNode::Leaf { freq, .. } => *freq,
            HuffmanNode::Internal { freq, .. } => *freq,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffmanNode::Leaf { .. })
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            HuffmanNode::Leaf { .. } => 1,
            HuffmanNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// Byte value -> occurrence count, iterated in ascending byte order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u32>,
}

impl FrequencyTable {
    /// Count every byte in `data`.
    ///
    /// Counts saturate at `u32::MAX`; [`Huffman::compress`] rejects inputs that long
    /// before building a table.
    pub fn from_data(data: &[u8]) -> Self {
        let mut raw = [0u64; 256];
        for &byte in data {
            raw[byte as usize] += 1;
        }
        let counts = raw
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(byte, &count)| (byte as u8, count.min(u32::MAX as u64) as u32))
            .collect();
        FrequencyTable { counts }
    }

    /// Occurrences of `byte`, zero if absent.
    pub fn get(&self, byte: u8) -> u32 {
        self.counts.get(&byte).copied().unwrap_or(0)
    }

    /// Number of distinct bytes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    /// `(byte, count)` pairs in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts.iter().map(|(&byte, &count)| (byte, count))
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        // 256 wraps to 0
        out.push(self.counts.len() as u8);
        for (byte, count) in self.iter() {
            out.push(byte);
            out.extend_from_slice(&count.to_be_bytes());
        }
    }

    /// Parse the table at the start of `data`, returning it and the bytes consumed.
    fn read_from(data: &[u8]) -> Result<(Self, usize)> {
        let distinct = *data
            .first()
            .ok_or_else(|| Error::malformed(NAME, Malformed::MissingSymbolCount))?;
        let expected = if distinct == 0 { 256 } else { distinct as usize };

        let mut counts = BTreeMap::new();
        let mut pos = 1;
        for read in 0..expected {
            let entry = data.get(pos..pos + TABLE_ENTRY_LEN).ok_or_else(|| {
                Error::malformed(
                    NAME,
                    Malformed::TruncatedFrequencyTable { expected, read },
                )
            })?;
            let symbol = entry[0];
            let count = u32::from_be_bytes([entry[1], entry[2], entry[3], entry[4]]);
            if count == 0 {
                return Err(Error::malformed(NAME, Malformed::ZeroFrequency { symbol }));
            }
            if counts.insert(symbol, count).is_some() {
                return Err(Error::malformed(NAME, Malformed::DuplicateSymbol { symbol }));
            }
            pos += TABLE_ENTRY_LEN;
        }
        Ok((FrequencyTable { counts }, pos))
    }
}

impl FromIterator<(u8, u32)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u32)>>(iter: I) -> Self {
        FrequencyTable {
            counts: iter.into_iter().filter(|&(_, count)| count > 0).collect(),
        }
    }
}

/// A heap entry ordered so the smallest frequency pops first, ties going to whichever
/// entry was pushed earlier.
#[derive(Debug)]
struct HeapEntry {
    freq: u64,
    seq: usize,
    node: Box<HuffmanNode>,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse: BinaryHeap is a max-heap.
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

/// Build the Huffman tree given a frequency table.
/// Returns `None` if the frequency table is empty.
///
/// Leaves enter the queue in ascending byte order and merged nodes after them, so two
/// runs over the same table always produce the same tree.
pub fn build_huffman_tree(table: &FrequencyTable) -> Option<HuffmanNode> {
    let mut heap = BinaryHeap::with_capacity(table.len());
    let mut seq = 0;
    for (byte, count) in table.iter() {
        let freq = count as u64;
        heap.push(HeapEntry {
            freq,
            seq,
            node: Box::new(HuffmanNode::Leaf { byte, freq }),
        });
        seq += 1;
    }

    while heap.len() > 1 {
        let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
            break;
        };
        let freq = left.freq + right.freq;
        heap.push(HeapEntry {
            freq,
            seq,
            node: Box::new(HuffmanNode::Internal {
                freq,
                left: left.node,
                right: right.node,
            }),
        });
        seq += 1;
    }

    let root = heap.pop().map(|entry| *entry.node);
    if let Some(root) = &root {
        log::trace!(
            "huffman: built tree with {} leaves, root freq {}",
            root.leaf_count(),
            root.freq()
        );
    }
    root
}

/// Byte value -> code bits, most significant first.
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: Vec<BitVec<u8, Msb0>>,
}

impl CodeTable {
    /// The code for `byte`, or `None` if it never occurred.
    pub fn get(&self, byte: u8) -> Option<&BitSlice<u8, Msb0>> {
        let code = &self.codes[byte as usize];
        if code.is_empty() {
            None
        } else {
            Some(code.as_bitslice())
        }
    }

    /// Number of bytes with a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|code| !code.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the code table by walking root-to-leaf paths (left = 0, right = 1).
///
/// If the tree consists of a single leaf, that byte gets the one-bit code `0`.
pub fn build_code_table(root: &HuffmanNode) -> CodeTable {
    let mut codes: Vec<BitVec<u8, Msb0>> = vec![BitVec::new(); 256];
    match root {
        HuffmanNode::Leaf { byte, .. } => codes[*byte as usize] = bitvec![u8, Msb0; 0],
        HuffmanNode::Internal { .. } => assign_codes(root, &mut BitVec::new(), &mut codes),
    }
    CodeTable { codes }
}

fn assign_codes(
    node: &HuffmanNode,
    prefix: &mut BitVec<u8, Msb0>,
    codes: &mut [BitVec<u8, Msb0>],
) {
    match node {
        HuffmanNode::Leaf { byte, .. } => codes[*byte as usize] = prefix.clone(),
        HuffmanNode::Internal { left, right, .. } => {
            prefix.push(false);
            assign_codes(left, prefix, codes);
            prefix.pop();
            prefix.push(true);
            assign_codes(right, prefix, codes);
            prefix.pop();
        }
    }
}

/// Concatenate the code of every byte in `data`.
pub fn encode(data: &[u8], codes: &CodeTable) -> Result<BitVec<u8, Msb0>> {
    let mut bits = BitVec::with_capacity(data.len() * 2);
    for &byte in data {
        let code = codes
            .get(byte)
            .ok_or_else(|| Error::internal(format!("no Huffman code for byte {byte:#04x}")))?;
        bits.extend_from_bitslice(code);
    }
    Ok(bits)
}

/// Walk `tree` along `bits`, emitting a byte at every leaf until `len` bytes are out.
///
/// A single-leaf tree reads no bits, but the payload must still hold one bit per byte.
pub fn decode(bits: &BitSlice<u8, Msb0>, tree: &HuffmanNode, len: usize) -> Result<Vec<u8>> {
    if let HuffmanNode::Leaf { byte, .. } = tree {
        if bits.len() < len {
            return Err(Error::malformed(
                NAME,
                Malformed::TruncatedPayload {
                    decoded: 0,
                    expected: len,
                },
            ));
        }
        return Ok(vec![*byte; len]);
    }

    // every symbol costs at least one bit
    let mut output = Vec::with_capacity(len.min(bits.len()));
    let mut current = tree;
    for bit in bits.iter().by_vals() {
        if output.len() == len {
            break;
        }
        if let HuffmanNode::Internal { left, right, .. } = current {
            current = if bit { right } else { left };
        }
        if let HuffmanNode::Leaf { byte, .. } = current {
            output.push(*byte);
            current = tree;
        }
    }

    if output.len() < len {
        return Err(Error::malformed(
            NAME,
            Malformed::TruncatedPayload {
                decoded: output.len(),
                expected: len,
            },
        ));
    }
    Ok(output)
}

fn read_u32_be(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos + 4)
        .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
        .map(u32::from_be_bytes)
}

/// Huffman coder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Huffman;

impl Huffman {
    pub fn new() -> Self {
        Huffman
    }
}

impl Compression for Huffman {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        if data.len() > MAX_INPUT_LEN {
            return Err(Error::InputTooLarge {
                len: data.len(),
                max: MAX_INPUT_LEN,
            });
        }

        let table = FrequencyTable::from_data(data);
        let tree = build_huffman_tree(&table).ok_or_else(|| {
            Error::internal("Huffman tree could not be built from a non-empty frequency table")
        })?;
        let codes = build_code_table(&tree);

        let mut bits = encode(data, &codes)?;
        let padding = (8 - bits.len() % 8) % 8;
        bits.resize(bits.len() + padding, false);
        let payload = bits.into_vec();

        let mut output =
            Vec::with_capacity(1 + table.len() * TABLE_ENTRY_LEN + 5 + payload.len());
        table.write_to(&mut output);
        output.extend_from_slice(&(data.len() as u32).to_be_bytes());
        output.push(padding as u8);
        output.extend_from_slice(&payload);

        log::debug!(
            "huffman: {} bytes, {} distinct symbols -> {} bytes ({} payload, {} padding bits)",
            data.len(),
            table.len(),
            output.len(),
            payload.len(),
            padding
        );
        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let (table, mut pos) = FrequencyTable::read_from(data)?;

        let original_len = read_u32_be(data, pos)
            .ok_or_else(|| Error::malformed(NAME, Malformed::MissingOriginalLength))?;
        pos += 4;

        let padding = *data
            .get(pos)
            .ok_or_else(|| Error::malformed(NAME, Malformed::MissingPaddingBits))?;
        pos += 1;

        let payload = &data[pos..];
        if padding >= 8 || (padding > 0 && payload.is_empty()) {
            return Err(Error::malformed(
                NAME,
                Malformed::InvalidPaddingBits {
                    padding,
                    payload_len: payload.len(),
                },
            ));
        }

        let total = table.total();
        if total != original_len as u64 {
            return Err(Error::malformed(
                NAME,
                Malformed::FrequencyMismatch {
                    total,
                    original: original_len as u64,
                },
            ));
        }

        let tree = build_huffman_tree(&table)
            .ok_or_else(|| Error::malformed(NAME, Malformed::EmptyFrequencyTable))?;

        let bits = payload.view_bits::<Msb0>();
        let bits = &bits[..bits.len() - padding as usize];
        let output = decode(bits, &tree, original_len as usize)?;

        log::debug!(
            "huffman: decoded {} bytes from {} payload bytes",
            output.len(),
            payload.len()
        );
        Ok(output)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
