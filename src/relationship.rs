//! Relationship detection: spans that chunking must not fragment.
//!
//! ## Kinds and Priorities
//!
//! | Kind | Priority | Max chunks |
//! |------|----------|------------|
//! | step sequence | 3 | 2 |
//! | Q&A pair | 3 | 1 |
//! | definition | 2 | 1 |
//! | warning | 2 | 1 |
//! | example | 1 | 2 |
//!
//! ## Overlap Resolution
//!
//! Pattern variants overlap all the time: a numbered procedure can contain
//! a "Warning:" line, and a Q&A pair can contain a definition. Candidates
//! are sorted by `(priority desc, start asc)` and accepted greedily when
//! they do not intersect anything already accepted:
//!
//! ```text
//! step    [=========================]        priority 3  -> kept
//! warning        [=======]                   priority 2  -> dropped
//! example                          [=====]   priority 1  -> dropped (overlaps step)
//! example                                [==] priority 1 -> kept
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sentence::trimmed_span;
use crate::{SizeLimits, StrategyConfig};

/// A semantic grouping detected in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Consecutive "Step N" or numbered lines.
    StepSequence,
    /// A question followed by its answer.
    QaPair,
    /// A term and its definition.
    Definition,
    /// An example block or inline example.
    Example,
    /// A warning, caution or prohibition.
    Warning,
}

impl RelationshipKind {
    /// Higher wins when spans overlap.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::StepSequence | Self::QaPair => 3,
            Self::Definition | Self::Warning => 2,
            Self::Example => 1,
        }
    }

    /// How many consecutive chunks the span may occupy.
    #[must_use]
    pub const fn max_separation(self) -> usize {
        match self {
            Self::StepSequence | Self::Example => 2,
            Self::QaPair | Self::Definition | Self::Warning => 1,
        }
    }

    fn patterns(self) -> &'static [Regex] {
        match self {
            Self::StepSequence => &STEP_PATTERNS,
            Self::QaPair => &QA_PATTERNS,
            Self::Definition => &DEFINITION_PATTERNS,
            Self::Example => &EXAMPLE_PATTERNS,
            Self::Warning => &WARNING_PATTERNS,
        }
    }
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in relationship pattern"))
        .collect()
}

static STEP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?mi)(?:^[ \t]*step[ \t]*\d+\b[^\n]*(?:\n|\z)(?:[ \t]+\S[^\n]*(?:\n|\z))*){2,}",
        r"(?m)(?:^[ \t]*\d+[.)][ \t]+\S[^\n]*(?:\n|\z)(?:[ \t]+\S[^\n]*(?:\n|\z))*){2,}",
        r"(?mi)(?:^[ \t]*(?:first|second|third|then|next|finally|lastly)\b[^\n]*(?:\n|\z)){2,}",
    ])
});

static QA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?mi)^[ \t]*(?:q|question)[ \t]*\d*[ \t]*[:.][^\n]*\n(?:[ \t]*\n)?[ \t]*(?:a|answer)[ \t]*\d*[ \t]*[:.][^\n]*(?:\n[ \t]*[^\s>#q][^\n]*)*",
        r"(?m)^[ \t]*[^\n?]{3,200}\?[ \t]*\n[ \t]*[^\s?#][^\n]*",
        r"(?m)^#{1,6}[ \t]+[^\n]*\?[ \t]*\n+[ \t]*[^\s#][^\n]*(?:\n[ \t]*[^\s#][^\n]*)*",
    ])
});

static DEFINITION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?m)^[ \t]*(?:\*\*)?[A-Z][\w \-]{1,40}(?:\*\*)?:[ \t]+[^\n]{10,}",
        r"\b[A-Z][a-zA-Z\-]*(?: [A-Za-z\-]+){0,3} (?:is|are) (?:a|an|the|defined as) [^.!?\n]{5,}[.!?]",
        r"(?i)\b[a-z][\w\-]*(?: [\w\-]+){0,3} (?:means|refers to|is defined as) [^.!?\n]{5,}[.!?]",
    ])
});

static EXAMPLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?mi)^[ \t]*(?:\*\*)?example[ \t]*\d*(?:\*\*)?[ \t]*[:.][^\n]*(?:\n[ \t]*[^\s#][^\n]*)*",
        r"(?i)\b(?:for example|for instance|e\.g\.|such as)[^\n]*?[.!?](?:\s|\z)",
    ])
});

static WARNING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?mi)^[ \t]*(?:\*\*)?(?:warning|caution|important|note|danger)(?:\*\*)?[ \t]*[:!][^\n]*(?:\n[ \t]*[^\s#][^\n]*)*",
        r"(?i)\b(?:do not|don't|never|must not)\b[^.!?\n]*[.!?]",
    ])
});

/// A detected relationship span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    /// What kind of grouping this is.
    pub kind: RelationshipKind,
    /// Byte offset of the first char.
    pub start: usize,
    /// Byte offset one past the last char.
    pub end: usize,
    /// The matched text.
    pub content: String,
    /// Whether the optimizer must honor `max_separation`.
    pub keep_together: bool,
    /// Maximum number of chunks the span may touch.
    pub max_separation: usize,
    /// Overlap-resolution priority.
    pub priority: u8,
}

impl Relationship {
    /// Span length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether `pos` lies strictly inside the span.
    #[must_use]
    pub fn strictly_contains(&self, pos: usize) -> bool {
        self.start < pos && pos < self.end
    }

    /// Whether the span intersects `start..end`.
    #[must_use]
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Copy with positions moved by `offset`.
    #[must_use]
    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..self.clone()
        }
    }
}

/// Finds relationships for the kinds a strategy evaluates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipIdentifier;

impl RelationshipIdentifier {
    /// Identify relationships required by `config.strategy`.
    pub fn identify(content: &str, config: &StrategyConfig) -> Vec<Relationship> {
        Self::identify_kinds(content, config.strategy.relationship_kinds(), config.limits)
    }

    /// Identify relationships of the given kinds.
    ///
    /// The result is non-overlapping and sorted by start.
    pub fn identify_kinds(
        content: &str,
        kinds: &[RelationshipKind],
        limits: SizeLimits,
    ) -> Vec<Relationship> {
        let mut candidates = Vec::new();
        for &kind in kinds {
            for pattern in kind.patterns() {
                for m in pattern.find_iter(content) {
                    let (start, end) = trimmed_span(content, m.start(), m.end());
                    if start == end {
                        continue;
                    }
                    let max_separation = kind.max_separation();
                    candidates.push(Relationship {
                        kind,
                        start,
                        end,
                        content: content[start..end].to_string(),
                        keep_together: end - start <= limits.max() * max_separation,
                        max_separation,
                        priority: kind.priority(),
                    });
                }
            }
        }

        let mut kept = select_non_overlapping(candidates);
        kept.sort_by_key(|r| r.start);
        tracing::debug!(count = kept.len(), "relationships identified");
        kept
    }
}

/// Greedy interval selection by `(priority desc, start asc)`.
fn select_non_overlapping(mut candidates: Vec<Relationship>) -> Vec<Relationship> {
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.start.cmp(&b.start)));

    let mut kept: Vec<Relationship> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept.iter().all(|k| !k.overlaps(candidate.start, candidate.end)) {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strategy;

    fn identify(content: &str, strategy: Strategy) -> Vec<Relationship> {
        RelationshipIdentifier::identify(content, &strategy.config())
    }

    #[test]
    fn test_step_sequence() {
        let text = "Intro line.\nStep 1: Do X.\nStep 2: Do Y.\nStep 3: Do Z.";
        let found = identify(text, Strategy::ProcedurePreserving);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, RelationshipKind::StepSequence);
        assert_eq!(found[0].content, "Step 1: Do X.\nStep 2: Do Y.\nStep 3: Do Z.");
        assert!(found[0].keep_together);
        assert_eq!(found[0].max_separation, 2);
    }

    #[test]
    fn test_single_step_is_not_a_sequence() {
        let found = identify("Step 1: Only one step here.", Strategy::ProcedurePreserving);
        assert!(found.iter().all(|r| r.kind != RelationshipKind::StepSequence));
    }

    #[test]
    fn test_qa_pair() {
        let text = "Q: What is X?\nA: X is Y.";
        let found = identify(text, Strategy::QaPairPreserving);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, RelationshipKind::QaPair);
        assert_eq!(found[0].start, 0);
        assert_eq!(found[0].end, text.len());
    }

    #[test]
    fn test_strategy_gates_kinds() {
        let text = "Q: What is X?\nA: X is Y.";
        assert!(identify(text, Strategy::ProcedurePreserving).is_empty());
        assert!(identify(text, Strategy::Simple).is_empty());
    }

    #[test]
    fn test_priority_resolves_overlap() {
        let text = "1. Open the valve.\n2. Warning: never touch the pipe.\n3. Close the valve.";
        let found = identify(text, Strategy::ProcedurePreserving);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, RelationshipKind::StepSequence);
    }

    #[test]
    fn test_results_do_not_overlap() {
        let text = "A widget is a small device used for testing things. For example, a button.\n\
                    Warning: do not drop the widget.\nLatency refers to the time taken by a request.";
        let found = identify(text, Strategy::SemanticAdaptive);
        assert!(!found.is_empty());
        for pair in found.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap: {pair:?}");
        }
    }

    #[test]
    fn test_oversized_span_is_not_kept_together() {
        let limits = SizeLimits::new(10, 20, 30).unwrap();
        let text = "Step 1: the first step has a long description.\nStep 2: and so does the second one.";
        let found = RelationshipIdentifier::identify_kinds(text, &[RelationshipKind::StepSequence], limits);
        assert_eq!(found.len(), 1);
        assert!(!found[0].keep_together);
    }

    #[test]
    fn test_strictly_contains() {
        let rel = Relationship {
            kind: RelationshipKind::Warning,
            start: 10,
            end: 20,
            content: String::new(),
            keep_together: true,
            max_separation: 1,
            priority: 2,
        };
        assert!(!rel.strictly_contains(10));
        assert!(rel.strictly_contains(11));
        assert!(!rel.strictly_contains(20));
        assert_eq!(rel.shifted(5).start, 15);
    }
}
