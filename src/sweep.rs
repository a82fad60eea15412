//! Depth selection: run a fresh tree per candidate depth over the same input
//! and compare code lengths.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::info;

use crate::config::TreeConfig;
use crate::error::Result;
use crate::helpers::bits_of;
use crate::models::{CtwModel, Model};

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub depth: usize,
    /// Nodes the tree ended up with.
    pub nodes: usize,
    /// `-log2 pw(root)` after the whole input.
    pub code_length_bits: f64,
    pub elapsed: Duration,
}

impl SweepResult {
    /// Bytes in compressed size roughly
    pub fn code_length_bytes(&self) -> u64 {
        (self.code_length_bits / 8.0).ceil() as u64
    }

    /// The result with the smallest code length, ties going to the shallower
    /// tree.
    pub fn best(results: &[SweepResult]) -> Option<&SweepResult> {
        results.iter().min_by(|a, b| {
            a.code_length_bits
                .total_cmp(&b.code_length_bits)
                .then(a.depth.cmp(&b.depth))
        })
    }
}

/// Feeds every bit of `buf` (MSB first) through a tree built from `config`.
pub fn evaluate(buf: &[u8], config: TreeConfig) -> Result<SweepResult> {
    let timer = Instant::now();
    let mut model = CtwModel::new(config)?;
    for &byte in buf {
        for bit in bits_of(byte) {
            model.update(bit)?;
        }
    }
    let elapsed = timer.elapsed();

    let tree = model.tree();
    let result = SweepResult {
        depth: config.depth,
        nodes: tree.len(),
        code_length_bits: tree.code_length(),
        elapsed,
    };
    info!(
        depth = result.depth,
        nodes = result.nodes,
        csize = result.code_length_bytes(),
        ratio = result.code_length_bits / (buf.len() as f64 * 8.0).max(1.0),
        ?elapsed,
        "[ctw] depth evaluated"
    );
    Ok(result)
}

/// Evaluates each depth in parallel, one tree per depth.
///
/// Results come back in the order of `depths`; the first failing depth
/// (usually an arena too small for a deep tree) fails the sweep.
pub fn sweep_depths(buf: &[u8], depths: &[usize], base: TreeConfig) -> Result<Vec<SweepResult>> {
    depths
        .par_iter()
        .map(|&depth| evaluate(buf, TreeConfig { depth, ..base }))
        .collect()
}
