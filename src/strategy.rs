//! Chunking strategies and strategy selection.
//!
//! A strategy is a named bundle of size limits, overlap and preservation
//! flags. The set is closed: adding one means adding an enum variant, and
//! every `match` below stops compiling until it is handled.
//!
//! ## Selection Order
//!
//! ```text
//! 1. Explicit caller override          (unknown name -> simple)
//! 2. Structure recommendation          (unless it is the adaptive default)
//! 3. Content heuristics                (steps, questions, definitions)
//! 4. semantic_adaptive
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::relationship::RelationshipKind;
use crate::structure::StructureAnalysis;
use crate::{Error, SizeLimits};

/// The closed set of chunking strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// General prose: all relationship kinds, moderate overlap.
    #[default]
    SemanticAdaptive,
    /// Step-by-step instructions.
    ProcedurePreserving,
    /// FAQ-style question/answer content.
    QaPairPreserving,
    /// Glossaries and definition-heavy text.
    DefinitionPreserving,
    /// Documents with a usable heading hierarchy.
    StructurePreserving,
    /// Documents organized into canonical sections.
    SectionBased,
    /// No relationship detection; the fallback strategy.
    Simple,
}

impl Strategy {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::SemanticAdaptive,
        Self::ProcedurePreserving,
        Self::QaPairPreserving,
        Self::DefinitionPreserving,
        Self::StructurePreserving,
        Self::SectionBased,
        Self::Simple,
    ];

    /// The snake_case name used in configuration and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SemanticAdaptive => "semantic_adaptive",
            Self::ProcedurePreserving => "procedure_preserving",
            Self::QaPairPreserving => "qa_pair_preserving",
            Self::DefinitionPreserving => "definition_preserving",
            Self::StructurePreserving => "structure_preserving",
            Self::SectionBased => "section_based",
            Self::Simple => "simple",
        }
    }

    /// The built-in configuration for this strategy.
    #[must_use]
    pub const fn config(self) -> StrategyConfig {
        let (min, target, max, overlap, preserve) = match self {
            Self::SemanticAdaptive => (200, 800, 1200, 100, PreserveFlags::new(true, true, true, false)),
            Self::ProcedurePreserving => (150, 600, 1000, 50, PreserveFlags::new(true, false, false, false)),
            Self::QaPairPreserving => (100, 500, 900, 0, PreserveFlags::new(false, true, false, false)),
            Self::DefinitionPreserving => (150, 600, 1000, 50, PreserveFlags::new(false, false, true, false)),
            Self::StructurePreserving => (200, 1000, 1500, 100, PreserveFlags::new(true, false, false, true)),
            Self::SectionBased => (200, 900, 1400, 100, PreserveFlags::new(false, false, false, true)),
            Self::Simple => (100, 500, 800, 50, PreserveFlags::NONE),
        };
        StrategyConfig {
            strategy: self,
            limits: SizeLimits::fixed(min, target, max),
            overlap_size: overlap,
            preserve,
        }
    }

    /// Relationship kinds this strategy evaluates.
    #[must_use]
    pub const fn relationship_kinds(self) -> &'static [RelationshipKind] {
        use RelationshipKind::{Definition, Example, QaPair, StepSequence, Warning};
        match self {
            Self::SemanticAdaptive => &[StepSequence, QaPair, Definition, Warning, Example],
            Self::ProcedurePreserving => &[StepSequence, Warning, Example],
            Self::QaPairPreserving => &[QaPair, Example],
            Self::DefinitionPreserving => &[Definition, Example],
            Self::StructurePreserving => &[StepSequence, QaPair, Definition, Warning],
            Self::SectionBased => &[StepSequence, QaPair],
            Self::Simple => &[],
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| Error::invalid_config(format!("unknown strategy: {s}")))
    }
}

/// Which structures a strategy refuses to split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PreserveFlags {
    /// Keep step sequences in as few chunks as possible.
    pub steps: bool,
    /// Never separate a question from its answer.
    pub qa_pairs: bool,
    /// Keep a term with its definition.
    pub definitions: bool,
    /// Avoid cutting after headings or inside code blocks and tables.
    pub structure: bool,
}

impl PreserveFlags {
    /// Nothing preserved.
    pub const NONE: Self = Self::new(false, false, false, false);

    /// Create a flag set.
    #[must_use]
    pub const fn new(steps: bool, qa_pairs: bool, definitions: bool, structure: bool) -> Self {
        Self {
            steps,
            qa_pairs,
            definitions,
            structure,
        }
    }
}

/// Fully resolved parameters for one chunking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyConfig {
    /// The strategy these parameters belong to.
    pub strategy: Strategy,
    /// Size limits in bytes of trimmed text.
    pub limits: SizeLimits,
    /// Overlap budget in bytes; 0 disables overlap.
    pub overlap_size: usize,
    /// Preservation flags.
    pub preserve: PreserveFlags,
}

impl StrategyConfig {
    /// Replace the size limits.
    #[must_use]
    pub const fn with_limits(self, limits: SizeLimits) -> Self {
        Self { limits, ..self }
    }

    /// Replace the overlap budget.
    #[must_use]
    pub const fn with_overlap(self, overlap_size: usize) -> Self {
        Self {
            overlap_size,
            ..self
        }
    }
}

/// How the caller asked for a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StrategyChoice {
    /// Let the selector decide.
    #[default]
    Auto,
    /// Use this strategy.
    Explicit(Strategy),
    /// The caller named a strategy that does not exist.
    Unknown(String),
}

impl StrategyChoice {
    /// Stable name used in cache keys.
    #[must_use]
    pub fn key_name(&self) -> &str {
        match self {
            Self::Auto => "auto",
            Self::Explicit(strategy) => strategy.as_str(),
            Self::Unknown(name) => name,
        }
    }
}

static STEP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:step[ \t]+\d+|\d+[.)][ \t]+\S)").expect("step marker pattern")
});

static QUESTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:q|question)[ \t]*\d*[ \t]*[:.]").expect("question marker pattern")
});

static DEFINITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:is (?:a|an|the)|are (?:a|an|the)|means|refers to)\b")
        .expect("definitional pattern")
});

/// Picks a strategy for a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySelector;

impl StrategySelector {
    /// Minimum marker count before a content heuristic fires.
    const HEURISTIC_THRESHOLD: usize = 2;

    /// Select a strategy following the documented order.
    pub fn select(choice: &StrategyChoice, analysis: &StructureAnalysis, content: &str) -> Strategy {
        match choice {
            StrategyChoice::Explicit(strategy) => return *strategy,
            StrategyChoice::Unknown(name) => {
                tracing::warn!(strategy = %name, "unknown strategy requested, using simple");
                return Strategy::Simple;
            }
            StrategyChoice::Auto => {}
        }

        let recommended = analysis.recommendation.chunking_strategy;
        if recommended != Strategy::SemanticAdaptive {
            return recommended;
        }

        Self::from_content(content).unwrap_or_default()
    }

    /// Direct content heuristics, without structure analysis.
    pub fn from_content(content: &str) -> Option<Strategy> {
        if STEP_MARKER.find_iter(content).count() >= Self::HEURISTIC_THRESHOLD {
            return Some(Strategy::ProcedurePreserving);
        }
        let questions = content.matches('?').count();
        if questions >= Self::HEURISTIC_THRESHOLD || QUESTION_MARKER.is_match(content) {
            return Some(Strategy::QaPairPreserving);
        }
        if DEFINITIONAL.find_iter(content).count() >= Self::HEURISTIC_THRESHOLD {
            return Some(Strategy::DefinitionPreserving);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!("Procedure-Preserving".parse::<Strategy>().unwrap(), Strategy::ProcedurePreserving);
        assert!("chaotic".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_configs_are_consistent() {
        for strategy in Strategy::ALL {
            let config = strategy.config();
            let limits = config.limits;
            assert!(SizeLimits::new(limits.min(), limits.target(), limits.max()).is_ok());
            assert!(limits.max() >= 2 * limits.min(), "{strategy}: max < 2 * min");
            assert_eq!(config.strategy, strategy);
        }
        assert_eq!(Strategy::SemanticAdaptive.config().limits.max(), 1200);
        assert_eq!(Strategy::ProcedurePreserving.config().limits.max(), 1000);
    }

    #[test]
    fn test_procedure_evaluates_only_its_kinds() {
        let kinds = Strategy::ProcedurePreserving.relationship_kinds();
        assert!(kinds.contains(&RelationshipKind::StepSequence));
        assert!(!kinds.contains(&RelationshipKind::QaPair));
        assert!(Strategy::Simple.relationship_kinds().is_empty());
    }

    #[test]
    fn test_content_heuristics() {
        assert_eq!(
            StrategySelector::from_content("Step 1: open.\nStep 2: close."),
            Some(Strategy::ProcedurePreserving)
        );
        assert_eq!(
            StrategySelector::from_content("Q: Why?\nA: Because."),
            Some(Strategy::QaPairPreserving)
        );
        assert_eq!(
            StrategySelector::from_content("A cache is a store. Latency refers to delay."),
            Some(Strategy::DefinitionPreserving)
        );
        assert_eq!(StrategySelector::from_content("Plain words here."), None);
    }

    #[test]
    fn test_plain_are_is_not_definitional() {
        assert_eq!(StrategySelector::from_content("Cats are cute. Dogs are loud."), None);
        assert_eq!(
            StrategySelector::from_content("Caches are a trade. Queues are the buffer."),
            Some(Strategy::DefinitionPreserving)
        );
    }

    #[test]
    fn test_override_wins() {
        let analysis = StructureAnalysis::fallback(None);
        let chosen = StrategySelector::select(
            &StrategyChoice::Explicit(Strategy::QaPairPreserving),
            &analysis,
            "Step 1: a\nStep 2: b",
        );
        assert_eq!(chosen, Strategy::QaPairPreserving);
    }

    #[test]
    fn test_unknown_override_is_simple() {
        let analysis = StructureAnalysis::empty(None);
        let chosen =
            StrategySelector::select(&StrategyChoice::Unknown("bogus".into()), &analysis, "text");
        assert_eq!(chosen, Strategy::Simple);
    }

    #[test]
    fn test_fallback_analysis_recommends_simple() {
        let analysis = StructureAnalysis::fallback(None);
        let chosen = StrategySelector::select(&StrategyChoice::Auto, &analysis, "Step 1: a\nStep 2: b");
        assert_eq!(chosen, Strategy::Simple);
    }

    #[test]
    fn test_auto_falls_through_to_default() {
        let analysis = StructureAnalysis::empty(None);
        let chosen = StrategySelector::select(&StrategyChoice::Auto, &analysis, "Just prose.");
        assert_eq!(chosen, Strategy::SemanticAdaptive);
    }
}
