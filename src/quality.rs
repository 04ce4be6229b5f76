//! Chunk quality scoring and lightweight enhancement.
//!
//! ## Factors
//!
//! | Factor | Weight | Signals |
//! |--------|--------|---------|
//! | completeness | 0.30 | ends on a sentence, step sequences and definitions intact |
//! | coherence | 0.25 | vocabulary repetition ratio, transition words |
//! | context | 0.25 | contextual info, document structure, semantic type |
//! | readability | 0.20 | average words per sentence |
//!
//! Scores are always in [0, 1]. Chunks below the target are enhanced, never
//! dropped; whether to discard low-quality chunks is the caller's decision.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::QualityConfig;
use crate::relationship::RelationshipKind;
use crate::sentence::{ends_with_terminal, sentences, word_count, words};
use crate::structure::{SectionType, StructureAnalysis};
use crate::{Chunk, Error, Result};

/// Per-factor scores for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityBreakdown {
    /// Completeness factor.
    pub completeness: f64,
    /// Coherence factor.
    pub coherence: f64,
    /// Context factor.
    pub context: f64,
    /// Readability factor.
    pub readability: f64,
    /// Weighted composite, clamped to [0, 1].
    pub overall: f64,
}

static TRANSITIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:however|therefore|furthermore|moreover|additionally|consequently|meanwhile|thus|hence|first|then|next|finally|also|because|instead|otherwise)\b",
    )
    .expect("transition word pattern")
});

/// Words shorter than this are ignored by the repetition ratio.
const MIN_CONTENT_WORD: usize = 4;
/// First lines longer than this are never used as headings.
const MAX_BACKFILL_HEADING: usize = 80;

/// Scores chunks and enhances the weak ones.
#[derive(Debug, Clone)]
pub struct QualityAssessor {
    config: QualityConfig,
    target: f64,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new(QualityConfig::default(), 0.7)
    }
}

impl QualityAssessor {
    /// Create an assessor enhancing chunks below `target`.
    #[must_use]
    pub fn new(config: QualityConfig, target: f64) -> Self {
        Self { config, target }
    }

    /// Enhancement threshold.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Score `chunk`, whose own text is `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QualityAssessment`] when the weighted score is not
    /// finite (for example, under non-finite configured weights).
    pub fn assess(&self, text: &str, chunk: &Chunk, analysis: &StructureAnalysis) -> Result<QualityBreakdown> {
        let c = &self.config;
        let completeness = self.completeness(text, chunk);
        let coherence = self.coherence(text);
        let context = Self::context(chunk, analysis);
        let readability = Self::readability(text);

        let overall = completeness * c.completeness_weight
            + coherence * c.coherence_weight
            + context * c.context_weight
            + readability * c.readability_weight;
        if !overall.is_finite() {
            return Err(Error::quality(format!("non-finite score for {}", chunk.id)));
        }
        Ok(QualityBreakdown {
            completeness,
            coherence,
            context,
            readability,
            overall: overall.clamp(0.0, 1.0),
        })
    }

    /// Score and, below target, enhance every chunk.
    ///
    /// `own_text` returns the chunk's text without overlap.
    pub fn process<'a>(
        &self,
        chunks: &mut [Chunk],
        analysis: &StructureAnalysis,
        own_text: impl Fn(&Chunk) -> &'a str,
    ) {
        let mut enhanced = 0usize;
        for chunk in chunks.iter_mut() {
            let text = own_text(chunk);
            match self.assess(text, chunk, analysis) {
                Ok(breakdown) => {
                    chunk.quality_score = breakdown.overall;
                    chunk.quality = Some(breakdown);
                }
                Err(e) => {
                    tracing::warn!(error = %e, chunk = %chunk.id, "quality assessment failed, using default");
                    chunk.quality_score = self.config.default_score;
                    chunk.quality = None;
                }
            }
            if chunk.quality_score < self.target {
                self.enhance(chunk, text);
                enhanced += 1;
            }
        }
        tracing::debug!(chunks = chunks.len(), enhanced, "quality assessed");
    }

    /// Backfill a heading and reward domain vocabulary.
    pub fn enhance(&self, chunk: &mut Chunk, text: &str) {
        let lower = text.to_lowercase();
        let keyword = self
            .config
            .domain_keywords
            .iter()
            .find(|k| words(&lower).any(|w| w == k.as_str()));

        if chunk.contextual_info.heading.is_none() {
            chunk.contextual_info.heading = first_line_heading(text)
                .map(str::to_string)
                .or_else(|| keyword.map(|k| capitalize(k)));
        }
        if keyword.is_some() {
            chunk.quality_score = (chunk.quality_score + self.config.domain_bonus).clamp(0.0, 1.0);
        }
        chunk.enhanced = true;
    }

    fn completeness(&self, text: &str, chunk: &Chunk) -> f64 {
        let c = &self.config;
        let intact = |kind: RelationshipKind| {
            chunk
                .relationships
                .iter()
                .filter(|r| r.kind == kind)
                .all(|r| r.start >= chunk.start_position && r.end <= chunk.end_position)
        };
        let mut score = c.base_score;
        if ends_with_terminal(text) {
            score += c.sentence_bonus;
        }
        if intact(RelationshipKind::StepSequence) {
            score += c.steps_bonus;
        }
        if intact(RelationshipKind::Definition) {
            score += c.definition_bonus;
        }
        score.clamp(0.0, 1.0)
    }

    fn coherence(&self, text: &str) -> f64 {
        let c = &self.config;
        let content_words: Vec<String> = words(text)
            .filter(|w| w.chars().count() >= MIN_CONTENT_WORD)
            .map(str::to_lowercase)
            .collect();
        let mut score = c.base_score;
        if !content_words.is_empty() {
            let unique: HashSet<&str> = content_words.iter().map(String::as_str).collect();
            let ratio = 1.0 - unique.len() as f64 / content_words.len() as f64;
            if (0.1..=0.5).contains(&ratio) {
                score += c.repetition_bonus;
            } else if (0.05..0.1).contains(&ratio) || (0.5..=0.7).contains(&ratio) {
                score += c.near_repetition_bonus;
            }
        }
        if TRANSITIONS.is_match(text) {
            score += c.transition_bonus;
        }
        score.clamp(0.0, 1.0)
    }

    fn context(chunk: &Chunk, analysis: &StructureAnalysis) -> f64 {
        let info = &chunk.contextual_info;
        let mut score: f64 = 0.0;
        if info.is_informative() {
            score += 0.4;
        }
        if analysis.has_structure() {
            score += 0.3;
        }
        if info.semantic_type != SectionType::General {
            score += 0.3;
        }
        score.min(1.0)
    }

    fn readability(text: &str) -> f64 {
        let found = sentences(text);
        if found.is_empty() {
            return 0.0;
        }
        let average = word_count(text) as f64 / found.len() as f64;
        if (10.0..=20.0).contains(&average) {
            1.0
        } else if (8.0..=25.0).contains(&average) {
            0.7
        } else {
            0.4
        }
    }
}

/// The first line, when it is short and reads like a title.
fn first_line_heading(text: &str) -> Option<&str> {
    let line = text.lines().next()?.trim().trim_start_matches('#').trim();
    let looks_like_title = !line.is_empty()
        && line.len() <= MAX_BACKFILL_HEADING
        && !line.ends_with(['.', '!', '?', ',', ';'])
        && word_count(line) <= 10;
    looks_like_title.then_some(line)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
