//! Chunk optimization: relationship enforcement, sentence snapping and size
//! balancing.
//!
//! ## Cut Selection
//!
//! The generator's spans are a starting point, not the answer: merging
//! fragments can leave spans above `max`, and boundaries can be sparse.
//! The optimizer picks the final cut points as a minimum-cost path over
//! candidate positions:
//!
//! ```text
//! candidates:  generator joints (weight = boundary weight)
//!              sentence starts  (0.2)
//!              word starts      (0.05)
//!              forced points    (0.0, last resort)
//!
//! cost(piece)  = |measured - target| + 0.25 * target
//! cost(cut)    = (1 - weight) * 0.5 * target
//!
//! every piece must measure within [min, max]
//! ```
//!
//! Each chunk pays a fixed penalty, so for a 2000-byte paragraph at
//! `target = 800` two chunks (cost 1080) beat three (cost 1560).
//!
//! ## Protection
//!
//! - Interiors of keep-together relationships that fit in `max` cannot be cut.
//! - Larger keep-together relationships may be cut once: no piece may start
//!   and end inside the same such span.
//! - With `preserve.structure`, interiors of code blocks and tables that fit
//!   in `max` cannot be cut.
//!
//! When no segmentation satisfies the protection, it is dropped; when that
//! still fails, forced points every `(max - min) / 2` bytes are added. Only
//! then does optimization fail.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::boundary::Boundary;
use crate::chunk::{Chunk, ContextualInfo};
use crate::relationship::Relationship;
use crate::sentence::{ceil_char_boundary, measured_len, sentence_starts, trimmed_span, word_starts};
use crate::structure::{SectionType, StructureAnalysis};
use crate::{Error, Result, SizeLimits, StrategyConfig};

/// Share of `target` charged for a cut with weight 0.
const CUT_COST_RATIO: f64 = 0.5;
/// Share of `target` charged per chunk.
const CHUNK_PENALTY_RATIO: f64 = 0.25;
/// Weight of a cut at a sentence start that is not a boundary.
const SENTENCE_WEIGHT: f64 = 0.2;
/// Weight of a cut at a word start.
const WORD_WEIGHT: f64 = 0.05;
/// Weight of a forced cut.
const FORCED_WEIGHT: f64 = 0.0;
/// Weight assumed for a joint with no matching boundary.
const DEFAULT_JOINT_WEIGHT: f64 = 0.3;

/// How much protection had to be given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relaxation {
    /// All protection honored.
    #[default]
    Strict,
    /// Relationship and structure protection dropped.
    Unprotected,
    /// Forced character cuts were needed.
    Forced,
}

/// Output of [`ChunkOptimizer::optimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    /// Final chunks without overlap or quality.
    pub chunks: Vec<Chunk>,
    /// Protection level that produced them.
    pub relaxation: Relaxation,
}

#[derive(Debug, Default)]
struct Protection {
    forbidden: Vec<(usize, usize)>,
    split_once: Vec<(usize, usize)>,
}

impl Protection {
    fn new(content: &str, relationships: &[Relationship], analysis: &StructureAnalysis, config: &StrategyConfig) -> Self {
        let max = config.limits.max();
        let mut protection = Self::default();
        for rel in relationships.iter().filter(|r| r.keep_together) {
            if rel.len() <= max {
                protection.forbidden.push((rel.start, rel.end));
            } else if rel.max_separation >= 2 {
                protection.split_once.push((rel.start, rel.end));
            }
        }
        if config.preserve.structure {
            protection.forbidden.extend(
                analysis
                    .content_structures
                    .protected_spans()
                    .into_iter()
                    .filter(|&(s, e)| {
                        s <= e
                            && content.is_char_boundary(s)
                            && content.is_char_boundary(e)
                            && measured_len(content, s, e) <= max
                    }),
            );
        }
        protection
    }

    fn is_forbidden(&self, pos: usize) -> bool {
        self.forbidden.iter().any(|&(s, e)| s < pos && pos < e)
    }

    fn cuts_twice(&self, a: usize, b: usize) -> bool {
        self.split_once
            .iter()
            .any(|&(s, e)| s < a && a < e && s < b && b < e)
    }
}

/// Rebalances generator output into final chunks.
#[derive(Debug, Clone, Copy)]
pub struct ChunkOptimizer {
    snap_tolerance: usize,
    semantic_hint: Option<SectionType>,
}

impl Default for ChunkOptimizer {
    fn default() -> Self {
        Self::new(80)
    }
}

impl ChunkOptimizer {
    /// Create an optimizer that snaps joints at most `snap_tolerance` bytes.
    #[must_use]
    pub const fn new(snap_tolerance: usize) -> Self {
        Self {
            snap_tolerance,
            semantic_hint: None,
        }
    }

    /// Use `hint` as the semantic type of chunks that classify as general.
    #[must_use]
    pub fn with_semantic_hint(mut self, hint: Option<SectionType>) -> Self {
        self.semantic_hint = hint;
        self
    }

    /// Optimize `spans` into chunks satisfying the size limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Chunking`] when no segmentation fits the limits
    /// even with forced cuts.
    pub fn optimize(
        &self,
        content: &str,
        spans: &[(usize, usize)],
        boundaries: &[Boundary],
        relationships: &[Relationship],
        analysis: &StructureAnalysis,
        config: &StrategyConfig,
    ) -> Result<Optimized> {
        let limits = config.limits;
        let (start, end) = trimmed_span(content, 0, content.len());
        if start == end {
            return Ok(Optimized {
                chunks: Vec::new(),
                relaxation: Relaxation::Strict,
            });
        }
        if end - start < limits.min() {
            let chunks = build_chunks(content, &[start, end], relationships, analysis, self.semantic_hint);
            return Ok(Optimized {
                chunks,
                relaxation: Relaxation::Strict,
            });
        }

        let protection = Protection::new(content, relationships, analysis, config);
        let boundary_weights: HashMap<usize, f64> =
            boundaries.iter().map(|b| (b.position, b.weight)).collect();
        let sentences = sentence_starts(content);

        let mut candidates: BTreeMap<usize, f64> = BTreeMap::new();
        add_candidate(&mut candidates, 0, 1.0);
        add_candidate(&mut candidates, content.len(), 1.0);
        for &s in &sentences {
            add_candidate(&mut candidates, s, SENTENCE_WEIGHT);
        }
        for w in word_starts(content) {
            add_candidate(&mut candidates, w, WORD_WEIGHT);
        }
        for &(joint, _) in spans.iter().skip(1) {
            let weight = boundary_weights.get(&joint).copied().unwrap_or(DEFAULT_JOINT_WEIGHT);
            let snapped = self.snap(joint, &sentences, &protection);
            add_candidate(&mut candidates, snapped, weight);
        }

        let list: Vec<(usize, f64)> = candidates.iter().map(|(&p, &w)| (p, w)).collect();
        if let Some(cuts) = select_cuts(content, &list, limits, Some(&protection)) {
            return Ok(self.finish(content, &cuts, relationships, analysis, Relaxation::Strict));
        }
        tracing::warn!(strategy = %config.strategy, "relationship protection relaxed");
        if let Some(cuts) = select_cuts(content, &list, limits, None) {
            return Ok(self.finish(content, &cuts, relationships, analysis, Relaxation::Unprotected));
        }

        let step = ((limits.max() - limits.min()) / 2).max(1);
        let mut pos = step;
        while pos < content.len() {
            add_candidate(&mut candidates, ceil_char_boundary(content, pos), FORCED_WEIGHT);
            pos += step;
        }
        let list: Vec<(usize, f64)> = candidates.iter().map(|(&p, &w)| (p, w)).collect();
        tracing::warn!(strategy = %config.strategy, step, "forcing character cuts");
        if let Some(cuts) = select_cuts(content, &list, limits, None) {
            return Ok(self.finish(content, &cuts, relationships, analysis, Relaxation::Forced));
        }

        Err(Error::chunking(format!(
            "no segmentation of {} bytes fits {}..={}",
            content.len(),
            limits.min(),
            limits.max()
        )))
    }

    /// Move `joint` to the nearest unprotected sentence start within tolerance.
    fn snap(&self, joint: usize, sentences: &[usize], protection: &Protection) -> usize {
        if sentences.binary_search(&joint).is_ok() {
            return joint;
        }
        sentences
            .iter()
            .copied()
            .filter(|s| s.abs_diff(joint) <= self.snap_tolerance && !protection.is_forbidden(*s))
            .min_by_key(|s| s.abs_diff(joint))
            .unwrap_or(joint)
    }

    fn finish(
        &self,
        content: &str,
        cuts: &[usize],
        relationships: &[Relationship],
        analysis: &StructureAnalysis,
        relaxation: Relaxation,
    ) -> Optimized {
        let chunks = build_chunks(content, cuts, relationships, analysis, self.semantic_hint);
        tracing::debug!(
            chunks = chunks.len(),
            relaxation = ?relaxation,
            snap_tolerance = self.snap_tolerance,
            "chunks optimized"
        );
        Optimized { chunks, relaxation }
    }
}

/// Minimum-cost cut positions, including 0 and `content.len()`.
fn select_cuts(
    content: &str,
    candidates: &[(usize, f64)],
    limits: SizeLimits,
    protection: Option<&Protection>,
) -> Option<Vec<usize>> {
    let len = content.len();
    let points: Vec<(usize, f64)> = candidates
        .iter()
        .copied()
        .filter(|&(p, _)| p == 0 || p == len || protection.map_or(true, |pr| !pr.is_forbidden(p)))
        .collect();
    let n = points.len();
    if n < 2 {
        return None;
    }

    let target = limits.target() as f64;
    let penalty = CHUNK_PENALTY_RATIO * target;
    let mut best = vec![f64::INFINITY; n];
    let mut prev = vec![usize::MAX; n];
    best[0] = 0.0;

    for j in 1..n {
        let (end, weight) = points[j];
        let cut_cost = if end == len {
            0.0
        } else {
            (1.0 - weight) * CUT_COST_RATIO * target
        };
        for i in (0..j).rev() {
            let start = points[i].0;
            let size = measured_len(content, start, end);
            if size > limits.max() {
                break;
            }
            if size < limits.min() || !best[i].is_finite() {
                continue;
            }
            if protection.is_some_and(|p| p.cuts_twice(start, end)) {
                continue;
            }
            let cost = best[i] + limits.deviation(size) as f64 + penalty + cut_cost;
            if cost < best[j] {
                best[j] = cost;
                prev[j] = i;
            }
        }
    }

    if !best[n - 1].is_finite() {
        return None;
    }
    let mut cuts = vec![len];
    let mut j = n - 1;
    while j != 0 {
        j = prev[j];
        cuts.push(points[j].0);
    }
    cuts.reverse();
    Some(cuts)
}

/// Record `pos`, keeping the highest weight seen for it.
fn add_candidate(candidates: &mut BTreeMap<usize, f64>, pos: usize, weight: f64) {
    let slot = candidates.entry(pos).or_insert(weight);
    *slot = slot.max(weight);
}

fn build_chunks(
    content: &str,
    cuts: &[usize],
    relationships: &[Relationship],
    analysis: &StructureAnalysis,
    hint: Option<SectionType>,
) -> Vec<Chunk> {
    cuts.windows(2)
        .map(|pair| trimmed_span(content, pair[0], pair[1]))
        .filter(|(s, e)| s < e)
        .enumerate()
        .map(|(index, (s, e))| {
            let text = &content[s..e];
            let mut chunk = Chunk::new(text, s, e, index);
            chunk.relationships = relationships
                .iter()
                .filter(|r| r.overlaps(s, e))
                .cloned()
                .collect();
            chunk.contextual_info = contextual_info(analysis, s, text, hint);
            chunk
        })
        .collect()
}

fn contextual_info(analysis: &StructureAnalysis, start: usize, text: &str, hint: Option<SectionType>) -> ContextualInfo {
    let section = analysis.section_at(start);
    let semantic_type = match section.map(|s| s.section_type) {
        Some(kind) if kind != SectionType::General => kind,
        _ => match SectionType::classify(text) {
            SectionType::General => hint.unwrap_or_default(),
            kind => kind,
        },
    };
    ContextualInfo {
        document_type: analysis.document_type.clone(),
        semantic_type,
        has_hierarchy: analysis.hierarchy.is_hierarchical()
            || analysis.navigation.roots.len() < analysis.navigation.nodes.len(),
        heading: analysis.heading_before(start).map(|h| h.text.clone()),
        section_id: section.map(|s| s.id.clone()),
    }
}

/// Number of chunks whose own span intersects `rel`.
#[must_use]
pub fn chunks_touched(rel: &Relationship, chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .filter(|c| rel.overlaps(c.start_position, c.end_position))
        .count()
}
