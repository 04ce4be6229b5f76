//! Structural quality scoring and processing recommendations.
//!
//! ```text
//! overall = (heading + section + hierarchy + content_structure) / 4
//! well structured  <=>  overall >= 0.7
//! ```

use serde::Serialize;

use super::content::ContentStructures;
use super::headings::Heading;
use super::hierarchy::HierarchyTree;
use super::sections::{Section, SectionType};
use crate::Strategy;

/// Composite threshold for `is_well_structured`.
pub const WELL_STRUCTURED_THRESHOLD: f64 = 0.7;

/// Headings below this count trigger heading enhancement.
const MIN_HEADINGS: usize = 3;

/// How well a document's structure supports chunking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StructureQuality {
    /// Heading count and level consistency.
    pub heading_score: f64,
    /// Section count and classification coverage.
    pub section_score: f64,
    /// Hierarchy depth and breadth.
    pub hierarchy_score: f64,
    /// Variety of content structures.
    pub content_structure_score: f64,
    /// Unweighted mean of the four sub-scores.
    pub overall: f64,
    /// `overall >= 0.7`.
    pub is_well_structured: bool,
    /// No heading level jumps by more than one.
    pub heading_consistency: bool,
}

/// Extra handling a document needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialHandling {
    /// Too few or inconsistent headings; chunks need heading backfill.
    HeadingEnhancement,
    /// Fenced code must not be split.
    CodeBlocks,
    /// Tables must not be split.
    Tables,
    /// Lists are present.
    Lists,
}

/// What the analyzer recommends for chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingRecommendation {
    /// Default strategy for this document.
    pub chunking_strategy: Strategy,
    /// Whether structural spans should be protected.
    pub preserve_structure: bool,
    /// Extra handling flags.
    pub special_handling: Vec<SpecialHandling>,
}

impl Default for ProcessingRecommendation {
    fn default() -> Self {
        Self {
            chunking_strategy: Strategy::SemanticAdaptive,
            preserve_structure: false,
            special_handling: Vec::new(),
        }
    }
}

/// Whether heading levels never jump down by more than one.
pub fn headings_consistent(headings: &[Heading]) -> bool {
    headings
        .windows(2)
        .all(|pair| pair[1].level <= pair[0].level + 1)
}

/// Score a document's structure.
pub fn assess(
    headings: &[Heading],
    sections: &[Section],
    hierarchy: &HierarchyTree,
    content: &ContentStructures,
) -> StructureQuality {
    let heading_consistency = headings_consistent(headings);

    let heading_score = if headings.is_empty() {
        0.0
    } else {
        let count_part = headings.len().min(5) as f64 / 5.0;
        let transitions = headings.len().saturating_sub(1);
        let consistent = headings
            .windows(2)
            .filter(|pair| pair[1].level <= pair[0].level + 1)
            .count();
        let consistency_part = if transitions == 0 {
            1.0
        } else {
            consistent as f64 / transitions as f64
        };
        0.5 * count_part + 0.5 * consistency_part
    };

    let section_score = if sections.is_empty() {
        0.0
    } else {
        let typed = sections
            .iter()
            .filter(|s| s.section_type != SectionType::General)
            .count();
        0.6 * (sections.len().min(3) as f64 / 3.0) + 0.4 * (typed as f64 / sections.len() as f64)
    };

    let hierarchy_score = if hierarchy.is_empty() {
        0.0
    } else {
        let depth_part = if hierarchy.is_hierarchical() { 0.5 } else { 0.25 };
        depth_part + 0.5 * (hierarchy.nodes.len().min(10) as f64 / 10.0)
    };

    let content_structure_score = content.kinds_present() as f64 / 4.0;

    let overall =
        (heading_score + section_score + hierarchy_score + content_structure_score) / 4.0;

    StructureQuality {
        heading_score,
        section_score,
        hierarchy_score,
        content_structure_score,
        overall,
        is_well_structured: overall >= WELL_STRUCTURED_THRESHOLD,
        heading_consistency,
    }
}

/// Pick a default strategy and handling flags.
pub fn recommend(
    quality: &StructureQuality,
    headings: &[Heading],
    sections: &[Section],
    hierarchy: &HierarchyTree,
    content: &ContentStructures,
) -> ProcessingRecommendation {
    let structural_headings = headings.iter().filter(|h| h.pattern.is_structural()).count();

    let chunking_strategy = if hierarchy.is_hierarchical() && quality.hierarchy_score >= 0.5 {
        Strategy::StructurePreserving
    } else if sections.len() >= 2 {
        Strategy::SectionBased
    } else if structural_headings >= MIN_HEADINGS && quality.heading_consistency {
        Strategy::StructurePreserving
    } else {
        Strategy::SemanticAdaptive
    };

    let mut special_handling = Vec::new();
    if headings.len() < MIN_HEADINGS || !quality.heading_consistency {
        special_handling.push(SpecialHandling::HeadingEnhancement);
    }
    if !content.code_blocks.is_empty() {
        special_handling.push(SpecialHandling::CodeBlocks);
    }
    if !content.tables.is_empty() {
        special_handling.push(SpecialHandling::Tables);
    }
    if !content.lists.is_empty() {
        special_handling.push(SpecialHandling::Lists);
    }

    ProcessingRecommendation {
        chunking_strategy,
        preserve_structure: quality.is_well_structured
            || !content.code_blocks.is_empty()
            || !content.tables.is_empty(),
        special_handling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::headings::HeadingPattern;

    fn heading(level: u8, position: usize) -> Heading {
        Heading {
            text: format!("Heading {position}"),
            level,
            position,
            pattern: HeadingPattern::Markdown,
        }
    }

    #[test]
    fn test_consistency() {
        assert!(headings_consistent(&[heading(1, 0), heading(2, 10), heading(1, 20)]));
        assert!(!headings_consistent(&[heading(1, 0), heading(3, 10)]));
        assert!(headings_consistent(&[]));
    }

    #[test]
    fn test_empty_document_scores_zero() {
        let quality = assess(&[], &[], &HierarchyTree::default(), &ContentStructures::default());
        assert_eq!(quality.overall, 0.0);
        assert!(!quality.is_well_structured);
    }

    #[test]
    fn test_scores_in_unit_range() {
        let headings: Vec<_> = (0..8).map(|i| heading(1 + (i % 3) as u8, i * 10)).collect();
        let quality = assess(&headings, &[], &HierarchyTree::default(), &ContentStructures::default());
        for score in [
            quality.heading_score,
            quality.section_score,
            quality.hierarchy_score,
            quality.content_structure_score,
            quality.overall,
        ] {
            assert!((0.0..=1.0).contains(&score));
        }
        assert_eq!(quality.heading_score, 1.0);
    }

    #[test]
    fn test_recommendation_heading_based() {
        let headings = vec![heading(1, 0), heading(2, 10), heading(2, 20)];
        let quality = assess(&headings, &[], &HierarchyTree::default(), &ContentStructures::default());
        let rec = recommend(&quality, &headings, &[], &HierarchyTree::default(), &ContentStructures::default());
        assert_eq!(rec.chunking_strategy, Strategy::StructurePreserving);
        assert!(!rec.special_handling.contains(&SpecialHandling::HeadingEnhancement));
    }

    #[test]
    fn test_recommendation_flags_few_headings() {
        let quality = StructureQuality::default();
        let rec = recommend(&quality, &[], &[], &HierarchyTree::default(), &ContentStructures::default());
        assert_eq!(rec.chunking_strategy, Strategy::SemanticAdaptive);
        assert_eq!(rec.special_handling, vec![SpecialHandling::HeadingEnhancement]);
    }
}
