//! Near-duplicate detection over screenshot feature embeddings.
//!
//! [`scan`] compares every pair of embeddings of the same dimension, keeps
//! the pairs within the configured distance threshold that neither side has
//! allow-listed, and returns them as a [`DuplicateScan`] iterator in
//! ascending distance order. With [`ScanOptions::limit`] set, only the
//! closest `limit` pairs are ever held in memory.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::validate_range;
use crate::types::DbId;

/// Slack applied to the pruning bound so float rounding never drops a pair.
const PRUNE_EPSILON: f64 = 1e-9;

/// Default cosine-distance threshold for duplicate candidates.
pub const DEFAULT_THRESHOLD: f64 = 0.05;

// ---------------------------------------------------------------------------
// Distance metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Euclidean,
    #[default]
    Cosine,
}

impl DistanceMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
        }
    }

    /// Distance between two vectors; lower means more similar.
    ///
    /// Returns `None` for empty vectors or vectors of different lengths.
    pub fn distance(self, a: &[f32], b: &[f32]) -> Option<f64> {
        if a.is_empty() || a.len() != b.len() {
            return None;
        }
        Some(match self {
            Self::Euclidean => euclidean_distance(a, b),
            Self::Cosine => 1.0 - cosine_similarity(a, b),
        })
    }

    /// Upper bound on the Euclidean distance between two (projected) vectors
    /// whose metric distance is at most `threshold`.
    ///
    /// Cosine is bounded on unit-normalised copies: `|a - b|^2 = 2 * (1 - cos)`.
    fn euclidean_bound(self, threshold: f64) -> f64 {
        match self {
            Self::Euclidean => threshold,
            Self::Cosine => (2.0 * threshold).sqrt(),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            other => Err(CoreError::Validation(format!(
                "Unknown distance metric '{other}'. Must be 'euclidean' or 'cosine'"
            ))),
        }
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity in `[-1, 1]`. Zero vectors are dissimilar to everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Reject embeddings that cannot take part in a scan.
pub fn validate_embedding(embedding: &[f32]) -> Result<(), CoreError> {
    if embedding.is_empty() {
        return Err(CoreError::Validation(
            "Embedding must not be empty".to_string(),
        ));
    }
    if let Some(pos) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(CoreError::Validation(format!(
            "Embedding value at index {pos} is not finite"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scan input / output
// ---------------------------------------------------------------------------

/// One screenshot's embedding plus its permanent suppression list.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingEntry {
    pub screenshot_id: DbId,
    pub embedding: Vec<f32>,
    pub allowed_similarity_with_ids: Vec<DbId>,
}

/// A near-duplicate pair, canonicalised so `screenshot_a_id < screenshot_b_id`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DuplicateCandidate {
    pub screenshot_a_id: DbId,
    pub screenshot_b_id: DbId,
    pub distance: f64,
}

impl DuplicateCandidate {
    fn new(x: DbId, y: DbId, distance: f64) -> Self {
        let (screenshot_a_id, screenshot_b_id) = if x < y { (x, y) } else { (y, x) };
        Self {
            screenshot_a_id,
            screenshot_b_id,
            distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub threshold: f64,
    pub metric: DistanceMetric,
    /// Sweep-and-prune along the highest-variance axis. Exact either way.
    pub prune: bool,
    /// Keep only the closest `limit` pairs. `None` keeps every pair.
    pub limit: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: DistanceMetric::default(),
            prune: true,
            limit: None,
        }
    }
}

impl ScanOptions {
    /// Cosine distance never exceeds 2, so a larger cosine threshold is rejected.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(CoreError::Validation(format!(
                "Similarity threshold must be a finite non-negative number, got {}",
                self.threshold
            )));
        }
        if self.metric == DistanceMetric::Cosine {
            validate_range(self.threshold, 0.0, 2.0, "Cosine similarity threshold")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Heap key: ascending distance, then ids.
#[derive(Debug)]
struct Ranked(DuplicateCandidate);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then(self.0.screenshot_a_id.cmp(&other.0.screenshot_a_id))
            .then(self.0.screenshot_b_id.cmp(&other.0.screenshot_b_id))
    }
}

/// Duplicate candidates in ascending distance order.
///
/// Holds no connection or lock; dropping it early discards the remaining pairs.
#[derive(Debug, Default)]
pub struct DuplicateScan {
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl DuplicateScan {
    /// Candidates not yet yielded.
    pub fn remaining(&self) -> usize {
        self.heap.len()
    }
}

impl Iterator for DuplicateScan {
    type Item = DuplicateCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.heap.pop().map(|Reverse(Ranked(candidate))| candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl ExactSizeIterator for DuplicateScan {}

/// Find every allowed pair within `options.threshold`, or the closest
/// `options.limit` of them.
///
/// Entries are grouped by embedding dimension; vectors of different lengths
/// are never compared.
pub fn scan(entries: &[EmbeddingEntry], options: &ScanOptions) -> Result<DuplicateScan, CoreError> {
    options.validate()?;

    let mut by_dimension: HashMap<usize, Vec<&EmbeddingEntry>> = HashMap::new();
    for entry in entries.iter().filter(|e| !e.embedding.is_empty()) {
        by_dimension
            .entry(entry.embedding.len())
            .or_default()
            .push(entry);
    }

    // Max-heap on distance: the root is the farthest pair kept so far.
    let mut kept: BinaryHeap<Ranked> = BinaryHeap::new();
    for group in by_dimension.values() {
        let allowed: Vec<HashSet<DbId>> = group
            .iter()
            .map(|e| e.allowed_similarity_with_ids.iter().copied().collect())
            .collect();

        let mut emit = |i: usize, j: usize| {
            let (a, b) = (group[i], group[j]);
            if a.screenshot_id == b.screenshot_id
                || allowed[i].contains(&b.screenshot_id)
                || allowed[j].contains(&a.screenshot_id)
            {
                return;
            }
            if let Some(distance) = options.metric.distance(&a.embedding, &b.embedding) {
                if distance <= options.threshold {
                    let candidate =
                        Ranked(DuplicateCandidate::new(a.screenshot_id, b.screenshot_id, distance));
                    match options.limit {
                        Some(0) => {}
                        Some(limit) if kept.len() >= limit => {
                            if let Some(mut farthest) = kept.peek_mut() {
                                if candidate < *farthest {
                                    *farthest = candidate;
                                }
                            }
                        }
                        _ => kept.push(candidate),
                    }
                }
            }
        };

        if options.prune {
            let bound = options.metric.euclidean_bound(options.threshold) + PRUNE_EPSILON;
            let order = sweep_order(group, options.metric);
            for (pos, &(i, coord_i)) in order.iter().enumerate() {
                for &(j, coord_j) in &order[pos + 1..] {
                    if coord_j - coord_i > bound {
                        break;
                    }
                    emit(i, j);
                }
            }
        } else {
            for i in 0..group.len() {
                for j in i + 1..group.len() {
                    emit(i, j);
                }
            }
        }
    }

    Ok(DuplicateScan {
        heap: kept.into_iter().map(Reverse).collect(),
    })
}

/// `(index, coordinate)` pairs sorted along the highest-variance axis.
fn sweep_order(group: &[&EmbeddingEntry], metric: DistanceMetric) -> Vec<(usize, f64)> {
    let projected: Vec<Vec<f64>> = group
        .iter()
        .map(|e| {
            let raw: Vec<f64> = e.embedding.iter().map(|v| f64::from(*v)).collect();
            match metric {
                DistanceMetric::Euclidean => raw,
                DistanceMetric::Cosine => normalize(raw),
            }
        })
        .collect();

    let axis = highest_variance_axis(&projected);
    let mut order: Vec<(usize, f64)> = projected
        .iter()
        .enumerate()
        .map(|(i, v)| (i, v[axis]))
        .collect();
    order.sort_by(|x, y| x.1.total_cmp(&y.1));
    order
}

fn normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

fn highest_variance_axis(vectors: &[Vec<f64>]) -> usize {
    let Some(dim) = vectors.first().map(Vec::len) else {
        return 0;
    };
    let n = vectors.len() as f64;

    (0..dim)
        .map(|axis| {
            let mean = vectors.iter().map(|v| v[axis]).sum::<f64>() / n;
            let variance = vectors
                .iter()
                .map(|v| (v[axis] - mean).powi(2))
                .sum::<f64>()
                / n;
            (axis, variance)
        })
        .max_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(axis, _)| axis)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
