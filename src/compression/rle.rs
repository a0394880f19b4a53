//! Run-length encoding.
//!
//! Each maximal run of identical bytes becomes a `(byte, count)` pair. Counts are a single
//! byte, so runs longer than [`MAX_RUN_LENGTH`] are split: 300 copies of `b'x'` encode as
//! `[b'x', 255, b'x', 45]`. There is no header; the output is just the pairs.
//!
//! RLE only pays off on data dominated by long runs. On text it typically doubles the
//! size, which [`analyze`] can predict before compressing.

use std::collections::BTreeMap;
use std::fmt;

use crate::compression::{Compression, Result};
use crate::error::{Error, Malformed};

/// Longest run a single pair can describe
pub const MAX_RUN_LENGTH: u8 = u8::MAX;

/// Runs at least this long count as "long" in [`RunAnalysis`]
pub const LONG_RUN_THRESHOLD: usize = 4;

const NAME: &str = "Run-Length Encoding (RLE)";

/// A run of `len` copies of `byte`; `len` is always in `1..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub byte: u8,
    pub len: u8,
}

/// Iterator over the capped runs of a byte slice.
#[derive(Debug, Clone)]
pub struct Runs<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Split `data` into runs of at most [`MAX_RUN_LENGTH`] identical bytes.
///
/// ```
/// use bytecodecs::compression::rle::{runs, Run};
///
/// let all: Vec<Run> = runs(b"aaab").collect();
/// assert_eq!(all, vec![Run { byte: b'a', len: 3 }, Run { byte: b'b', len: 1 }]);
/// ```
pub fn runs(data: &[u8]) -> Runs<'_> {
    Runs { data, pos: 0 }
}

impl Iterator for Runs<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let byte = *self.data.get(self.pos)?;
        let mut len = 1u8;
        while len < MAX_RUN_LENGTH && self.data.get(self.pos + len as usize) == Some(&byte) {
            len += 1;
        }
        self.pos += len as usize;
        Some(Run { byte, len })
    }
}

/// Run-length encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rle;

impl Rle {
    pub fn new() -> Self {
        Rle
    }
}

impl Compression for Rle {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        for run in runs(data) {
            output.push(run.byte);
            output.push(run.len);
        }
        log::debug!(
            "rle: {} bytes -> {} runs ({} bytes)",
            data.len(),
            output.len() / 2,
            output.len()
        );
        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() % 2 != 0 {
            return Err(Error::malformed(
                NAME,
                Malformed::OddLength { len: data.len() },
            ));
        }

        let mut output = Vec::new();
        for (i, pair) in data.chunks_exact(2).enumerate() {
            let (byte, count) = (pair[0], pair[1]);
            if count == 0 {
                return Err(Error::malformed(
                    NAME,
                    Malformed::ZeroRunCount { offset: i * 2 + 1 },
                ));
            }
            output.resize(output.len() + count as usize, byte);
        }

        log::debug!("rle: expanded {} pairs to {} bytes", data.len() / 2, output.len());
        Ok(output)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

/// Advisory statistics about how well a buffer suits run-length encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunAnalysis {
    /// Input size in bytes
    pub input_size: usize,
    /// Number of runs the encoder would emit
    pub total_runs: usize,
    /// Mean bytes per run
    pub average_run_length: f64,
    /// Run length -> how many runs had that length
    pub histogram: BTreeMap<usize, usize>,
    /// Runs of at least [`LONG_RUN_THRESHOLD`] bytes
    pub long_runs: usize,
    /// Exact size `Rle::compress` would produce
    pub estimated_size: usize,
    /// `estimated_size / input_size`, or 0.0 for empty input
    pub estimated_ratio: f64,
}

impl RunAnalysis {
    /// Share of runs that are long, in `[0, 1]`.
    pub fn long_run_fraction(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.long_runs as f64 / self.total_runs as f64
        }
    }

    /// Whether RLE would shrink the input.
    pub fn is_compressible(&self) -> bool {
        self.estimated_size < self.input_size
    }
}

/// Measure the runs in `data` without encoding it.
///
/// Uses the same run detection as [`Rle::compress`], so `estimated_size` is exact.
pub fn analyze(data: &[u8]) -> RunAnalysis {
    let mut analysis = RunAnalysis {
        input_size: data.len(),
        ..RunAnalysis::default()
    };

    for run in runs(data) {
        let len = run.len as usize;
        analysis.total_runs += 1;
        *analysis.histogram.entry(len).or_insert(0) += 1;
        if len >= LONG_RUN_THRESHOLD {
            analysis.long_runs += 1;
        }
    }

    if analysis.total_runs > 0 {
        analysis.average_run_length = data.len() as f64 / analysis.total_runs as f64;
        analysis.estimated_size = analysis.total_runs * 2;
        analysis.estimated_ratio = analysis.estimated_size as f64 / data.len() as f64;
    }
    analysis
}

impl fmt::Display for RunAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input_size == 0 {
            return writeln!(f, "no data");
        }
        writeln!(f, "total runs: {}", self.total_runs)?;
        writeln!(f, "average run length: {:.2}", self.average_run_length)?;
        writeln!(
            f,
            "long runs ({}+ bytes): {} ({:.1}%)",
            LONG_RUN_THRESHOLD,
            self.long_runs,
            self.long_run_fraction() * 100.0
        )?;
        writeln!(f, "estimated compressed size: {} bytes", self.estimated_size)?;
        writeln!(f, "estimated ratio: {:.2}%", self.estimated_ratio * 100.0)
    }
}
