//! Document structure analysis.
//!
//! ## What Gets Detected
//!
//! ```text
//! # Guide                      heading (markdown, level 1)
//! Introduction                 section opener ──┐
//! This guide covers ...                          │ section_0 (general)
//! Installation                 section opener ──┤
//! 1. Download the archive      hierarchy node    │ section_1 (procedural)
//! 2. See also Usage            cross reference   │
//! ```
//! ```text
//! | flag | meaning |          table
//! ```
//!
//! Every detector runs independently over the same text, so a failure in one
//! cannot corrupt another's output. The only fallible step is compiling
//! caller-supplied heading patterns; when it fails the analyzer returns
//! [`StructureAnalysis::fallback`] instead of an error.

pub mod content;
pub mod headings;
pub mod hierarchy;
pub mod quality;
pub mod references;
pub mod sections;

use serde::Serialize;

use crate::config::StructureConfig;
use crate::{Result, Strategy};

pub use content::{CodeBlock, ContentStructures, DefinitionEntry, DefinitionStyle, ListBlock, TableBlock};
pub use headings::{CustomHeadingPattern, Heading, HeadingPattern};
pub use hierarchy::{HierarchyNode, HierarchyTree, NavigationNode, NavigationTree};
pub use quality::{ProcessingRecommendation, SpecialHandling, StructureQuality};
pub use references::{CrossReference, ReferenceKind};
pub use sections::{Section, SectionType};

/// Everything the analyzer learned about a document.
///
/// Positions are byte offsets into the analyzed text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureAnalysis {
    /// Headings sorted by position.
    pub headings: Vec<Heading>,
    /// Canonical sections.
    pub sections: Vec<Section>,
    /// Numbered and step elements.
    pub hierarchy: HierarchyTree,
    /// Lists, tables, code and definitions.
    pub content_structures: ContentStructures,
    /// References between parts of the document.
    pub cross_references: Vec<CrossReference>,
    /// Headings as a tree.
    pub navigation: NavigationTree,
    /// Structural quality scores.
    pub quality: StructureQuality,
    /// Chunking recommendation.
    pub recommendation: ProcessingRecommendation,
    /// Caller-provided document type.
    pub document_type: Option<String>,
    /// Set when analysis failed and this is the minimal substitute.
    pub fallback: bool,
}

impl StructureAnalysis {
    /// An analysis with nothing detected.
    #[must_use]
    pub fn empty(document_type: Option<&str>) -> Self {
        Self {
            document_type: document_type.map(str::to_string),
            ..Self::default()
        }
    }

    /// The minimal analysis returned when detection fails.
    #[must_use]
    pub fn fallback(document_type: Option<&str>) -> Self {
        Self {
            recommendation: ProcessingRecommendation {
                chunking_strategy: Strategy::Simple,
                ..ProcessingRecommendation::default()
            },
            fallback: true,
            ..Self::empty(document_type)
        }
    }

    /// Whether any headings or sections were found.
    #[must_use]
    pub fn has_structure(&self) -> bool {
        !self.headings.is_empty() || !self.sections.is_empty()
    }

    /// The last heading at or before `pos`.
    #[must_use]
    pub fn heading_before(&self, pos: usize) -> Option<&Heading> {
        self.headings.iter().take_while(|h| h.position <= pos).last()
    }

    /// The section containing `pos`.
    #[must_use]
    pub fn section_at(&self, pos: usize) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains(pos))
    }

    /// Whether every offset in this analysis is a char boundary of `content`
    /// and every span is ordered.
    ///
    /// An analysis computed for other text (a caller's own, or a cache entry
    /// that shares only a key) fails this check.
    #[must_use]
    pub fn fits(&self, content: &str) -> bool {
        let structures = &self.content_structures;
        let mut spans = self
            .sections
            .iter()
            .map(|s| (s.start, s.end))
            .chain(structures.lists.iter().map(|l| (l.start, l.end)))
            .chain(structures.protected_spans());
        let mut points = self
            .headings
            .iter()
            .map(|h| h.position)
            .chain(structures.definitions.iter().map(|d| d.position))
            .chain(self.cross_references.iter().map(|r| r.position))
            .chain(self.hierarchy.nodes.iter().map(|n| n.position))
            .chain(self.navigation.nodes.iter().map(|n| n.position));

        spans.all(|(start, end)| {
            start <= end && content.is_char_boundary(start) && content.is_char_boundary(end)
        }) && points.all(|pos| content.is_char_boundary(pos))
    }
}

/// Detects headings, sections, hierarchy and content structures.
#[derive(Debug, Clone, Default)]
pub struct StructureAnalyzer {
    config: StructureConfig,
}

impl StructureAnalyzer {
    /// Create an analyzer.
    #[must_use]
    pub fn new(config: StructureConfig) -> Self {
        Self { config }
    }

    /// Analyze `content`, falling back to a minimal analysis on failure.
    pub fn analyze(&self, content: &str, document_type: Option<&str>) -> StructureAnalysis {
        match self.try_analyze(content, document_type) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "structure analysis failed, using fallback");
                StructureAnalysis::fallback(document_type)
            }
        }
    }

    /// Analyze `content`, surfacing pattern errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructureAnalysis`](crate::Error::StructureAnalysis)
    /// when a custom heading pattern does not compile.
    pub fn try_analyze(&self, content: &str, document_type: Option<&str>) -> Result<StructureAnalysis> {
        let custom = self
            .config
            .custom_heading_patterns
            .iter()
            .map(|p| CustomHeadingPattern::new(p, self.config.custom_heading_level))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| crate::Error::StructureAnalysis(e.to_string()))?;

        let headings = headings::detect(content, &custom);
        let sections = sections::detect(
            content,
            self.config.min_section_length,
            self.config.min_section_words,
        );
        let content_structures = content::extract(content);
        let cross_references = references::detect(content, &headings);
        let hierarchy = hierarchy::build_hierarchy(content);
        let navigation = hierarchy::build_navigation(&headings);
        let quality = quality::assess(&headings, &sections, &hierarchy, &content_structures);
        let recommendation =
            quality::recommend(&quality, &headings, &sections, &hierarchy, &content_structures);

        tracing::debug!(
            headings = headings.len(),
            sections = sections.len(),
            overall = quality.overall,
            recommended = %recommendation.chunking_strategy,
            "structure analyzed"
        );

        Ok(StructureAnalysis {
            headings,
            sections,
            hierarchy,
            content_structures,
            cross_references,
            navigation,
            quality,
            recommendation,
            document_type: document_type.map(str::to_string),
            fallback: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str = "# Deployment Guide\n\n\
        ## Introduction\nThis guide explains how to deploy the service safely.\n\n\
        ## Installation\n1. Download the release archive.\n2. Extract it into the target directory.\n\n\
        ```bash\ntar xzf release.tgz\n```\n\n\
        ## Troubleshooting\nIf the service will not start, see section Installation again.\n";

    #[test]
    fn test_full_analysis() {
        let analysis = StructureAnalyzer::default().analyze(GUIDE, Some("manual"));
        assert!(!analysis.fallback);
        assert_eq!(analysis.document_type.as_deref(), Some("manual"));
        assert_eq!(analysis.headings.len(), 4);
        assert_eq!(analysis.sections.len(), 3);
        assert_eq!(analysis.content_structures.code_blocks.len(), 1);
        assert!(!analysis.cross_references.is_empty());
        assert_eq!(analysis.navigation.roots.len(), 1);
        assert_eq!(analysis.recommendation.chunking_strategy, Strategy::SectionBased);
        assert!(analysis
            .recommendation
            .special_handling
            .contains(&SpecialHandling::CodeBlocks));
    }

    #[test]
    fn test_lookup_helpers() {
        let analysis = StructureAnalyzer::default().analyze(GUIDE, None);
        let pos = GUIDE.find("Extract").unwrap();
        assert_eq!(analysis.heading_before(pos).unwrap().text, "Installation");
        assert_eq!(analysis.section_at(pos).unwrap().section_type, SectionType::Procedural);
        assert!(analysis.has_structure());
    }

    #[test]
    fn test_fits_own_text_only() {
        let analysis = StructureAnalyzer::default().analyze(GUIDE, None);
        assert!(analysis.fits(GUIDE));
        assert!(!analysis.fits(&GUIDE[..40]));
        assert!(StructureAnalysis::empty(None).fits(""));

        let mut shifted = analysis.clone();
        shifted.content_structures.code_blocks[0].start = GUIDE.len() + 10;
        assert!(!shifted.fits(GUIDE));

        let text = "日本語のテキスト";
        let mut split = StructureAnalysis::empty(None);
        split.content_structures.code_blocks = analysis.content_structures.code_blocks.clone();
        split.content_structures.code_blocks[0].start = 1;
        split.content_structures.code_blocks[0].end = 3;
        assert!(!split.fits(text));
    }

    #[test]
    fn test_malformed_pattern_falls_back() {
        let analyzer = StructureAnalyzer::new(StructureConfig {
            custom_heading_patterns: vec!["([unclosed".into()],
            ..StructureConfig::default()
        });
        assert!(analyzer.try_analyze(GUIDE, None).is_err());

        let analysis = analyzer.analyze(GUIDE, None);
        assert!(analysis.fallback);
        assert!(analysis.headings.is_empty());
        assert_eq!(analysis.recommendation.chunking_strategy, Strategy::Simple);
    }

    #[test]
    fn test_empty_content() {
        let analysis = StructureAnalyzer::default().analyze("", None);
        assert!(!analysis.fallback);
        assert!(!analysis.has_structure());
        assert_eq!(analysis.quality.overall, 0.0);
    }
}
