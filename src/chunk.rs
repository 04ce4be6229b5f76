//! The Chunk type: a bounded piece of a document with position and quality metadata.

use serde::Serialize;

use crate::quality::QualityBreakdown;
use crate::relationship::Relationship;
use crate::structure::SectionType;

/// Where a chunk sits in the document's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextualInfo {
    /// Caller-provided document type.
    pub document_type: Option<String>,
    /// Section type of the enclosing section, or of the chunk text itself.
    pub semantic_type: SectionType,
    /// Whether the document has numbered or step hierarchy.
    pub has_hierarchy: bool,
    /// Nearest preceding heading.
    pub heading: Option<String>,
    /// Enclosing section id.
    pub section_id: Option<String>,
}

impl Default for ContextualInfo {
    fn default() -> Self {
        Self {
            document_type: None,
            semantic_type: SectionType::General,
            has_hierarchy: false,
            heading: None,
            section_id: None,
        }
    }
}

impl ContextualInfo {
    /// Whether anything beyond the defaults is known.
    #[must_use]
    pub fn is_informative(&self) -> bool {
        self.document_type.is_some() || self.heading.is_some() || self.section_id.is_some()
    }
}

/// A chunk of a document.
///
/// ## Byte Offsets
///
/// `start_position` and `end_position` are byte offsets into the caller's
/// original content and delimit the chunk's own text:
///
/// ```rust
/// use strata::Chunk;
///
/// let text = "  Hello, world!";
/// let chunk = Chunk::new("Hello, world!", 2, 15, 0);
/// assert_eq!(&text[chunk.span()], chunk.content);
/// ```
///
/// ## Overlap
///
/// With overlap enabled, `content` carries sentences borrowed from the
/// neighbors while the offsets and `size` still describe the chunk's own span:
///
/// ```text
/// chunk 0 own:  "A. B. C."                       [0..8]
/// chunk 1 own:  "D. E. F."                       [9..17]
/// chunk 1 content: "B. C. D. E. F."  has_overlap_before = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Stable identifier derived from index and span.
    pub id: String,
    /// Chunk text, including any overlap.
    pub content: String,
    /// Byte offset where the chunk's own span starts.
    pub start_position: usize,
    /// Byte offset where the chunk's own span ends (exclusive).
    pub end_position: usize,
    /// Zero-based position in the sequence.
    pub index: usize,
    /// Length in bytes of the chunk's own span.
    pub size: usize,
    /// Composite quality in [0, 1].
    pub quality_score: f64,
    /// Relationships intersecting this chunk.
    pub relationships: Vec<Relationship>,
    /// Whether `content` starts with text from the previous chunk.
    pub has_overlap_before: bool,
    /// Whether `content` ends with text from the next chunk.
    pub has_overlap_after: bool,
    /// Structural context.
    pub contextual_info: ContextualInfo,
    /// Produced by the fixed-window fallback.
    pub fallback: bool,
    /// Whether the enhancer touched this chunk.
    pub enhanced: bool,
    /// Per-factor scores, when assessment succeeded.
    pub quality: Option<QualityBreakdown>,
}

impl Chunk {
    /// Create a chunk with default metadata.
    #[must_use]
    pub fn new(content: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            id: format!("chunk_{index}_{start}_{end}"),
            content: content.into(),
            start_position: start,
            end_position: end,
            index,
            size: end - start,
            quality_score: 0.0,
            relationships: Vec::new(),
            has_overlap_before: false,
            has_overlap_after: false,
            contextual_info: ContextualInfo::default(),
            fallback: false,
            enhanced: false,
            quality: None,
        }
    }

    /// The chunk's own byte span.
    #[must_use]
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start_position..self.end_position
    }

    /// Move the span by `offset` bytes, keeping the id in step.
    pub(crate) fn shift(&mut self, offset: usize) {
        self.start_position += offset;
        self.end_position += offset;
        self.id = format!("chunk_{}_{}_{}", self.index, self.start_position, self.end_position);
        for rel in &mut self.relationships {
            *rel = rel.shifted(offset);
        }
    }

    /// Whether any overlap was applied.
    #[must_use]
    pub fn has_overlap(&self) -> bool {
        self.has_overlap_before || self.has_overlap_after
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ index: {}, span: {}..{}, size: {}, quality: {:.2} }}",
            self.index, self.start_position, self.end_position, self.size, self.quality_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk() {
        let chunk = Chunk::new("abc", 4, 7, 2);
        assert_eq!(chunk.size, 3);
        assert_eq!(chunk.id, "chunk_2_4_7");
        assert_eq!(chunk.span(), 4..7);
        assert!(!chunk.has_overlap());
        assert_eq!(chunk.contextual_info.semantic_type, SectionType::General);
    }

    #[test]
    fn test_shift() {
        let mut chunk = Chunk::new("abc", 0, 3, 0);
        chunk.shift(5);
        assert_eq!(chunk.span(), 5..8);
        assert_eq!(chunk.id, "chunk_0_5_8");
    }

    #[test]
    fn test_display() {
        let chunk = Chunk::new("abc", 0, 3, 1);
        assert!(chunk.to_string().contains("span: 0..3"));
    }
}
