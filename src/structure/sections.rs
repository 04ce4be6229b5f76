//! Canonical section detection and classification.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sentence::{line_end, line_number, trimmed_span, word_count};
use crate::Error;

/// Semantic type of a section or chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Instructions and steps.
    Procedural,
    /// Questions and answers.
    Faq,
    /// Explanations and definitions.
    Conceptual,
    /// Worked examples.
    Example,
    /// Cautions and prohibitions.
    Warning,
    /// Anything else.
    #[default]
    General,
}

static PROCEDURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:step[ \t]*\d+|\d+[.)][ \t]+\S|first\b|then\b|next\b|finally\b)")
        .expect("procedural pattern")
});
static FAQ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)(?:\?[ \t]*$|^[ \t]*(?:q|question)[ \t]*\d*[ \t]*[:.])").expect("faq pattern")
});
static WARNING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:warning|caution|danger|important)\b").expect("warning pattern")
});
static EXAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bfor example\b|\bfor instance\b|\be\.g\.|\bexample[ \t]*\d*[ \t]*:)")
        .expect("example pattern")
});
static CONCEPTUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:is an?|refers to|means|is defined as|defined as)\b").expect("conceptual pattern")
});

impl SectionType {
    /// Every type.
    pub const ALL: [Self; 6] = [
        Self::Procedural,
        Self::Faq,
        Self::Conceptual,
        Self::Example,
        Self::Warning,
        Self::General,
    ];

    /// Classify text by the first matching family, in priority order.
    pub fn classify(text: &str) -> Self {
        if PROCEDURAL.is_match(text) {
            Self::Procedural
        } else if FAQ.is_match(text) {
            Self::Faq
        } else if WARNING.is_match(text) {
            Self::Warning
        } else if EXAMPLE.is_match(text) {
            Self::Example
        } else if CONCEPTUAL.is_match(text) {
            Self::Conceptual
        } else {
            Self::General
        }
    }

    /// The snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Procedural => "procedural",
            Self::Faq => "faq",
            Self::Conceptual => "conceptual",
            Self::Example => "example",
            Self::Warning => "warning",
            Self::General => "general",
        }
    }
}

impl FromStr for SectionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::invalid_config(format!("unknown section type: {s}")))
    }
}

/// Canonical openers, matched at line start with optional `#` or numbering.
pub(crate) static OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:#{1,6}[ \t]*)?(?:\d+(?:\.\d+)*\.?[ \t]+)?(?:introduction|overview|background|prerequisites|requirements|installation|setup|configuration|getting started|usage|examples?|troubleshooting|faq|frequently asked questions|summary|conclusion|references|appendix)\b[^\n]{0,60}$",
    )
    .expect("section opener pattern")
});

/// A document section delimited by canonical openers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Stable identifier, `section_N`.
    pub id: String,
    /// The opener line without markup.
    pub heading_text: String,
    /// Body text after the opener line.
    pub content: String,
    /// 1-based line of the opener.
    pub start_line: usize,
    /// 1-based last line of the section.
    pub end_line: usize,
    /// Byte offset of the opener line.
    pub start: usize,
    /// Byte offset one past the section's last char.
    pub end: usize,
    /// Words in `content`.
    pub word_count: usize,
    /// Content classification.
    pub section_type: SectionType,
}

impl Section {
    /// Whether `pos` falls within the section.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// Detect sections. Bodies shorter than `min_length` bytes or `min_words` words
/// are dropped.
pub fn detect(content: &str, min_length: usize, min_words: usize) -> Vec<Section> {
    let openers: Vec<usize> = OPENER.find_iter(content).map(|m| m.start()).collect();
    let mut sections = Vec::new();

    for (i, &start) in openers.iter().enumerate() {
        let next = openers.get(i + 1).copied().unwrap_or(content.len());
        let heading_end = line_end(content, start);
        let (body_start, body_end) = trimmed_span(content, (heading_end + 1).min(next), next);
        let body = &content[body_start..body_end];

        let words = word_count(body);
        if body.len() < min_length || words < min_words {
            continue;
        }

        let heading_text = content[start..heading_end]
            .trim()
            .trim_start_matches('#')
            .trim()
            .to_string();
        let end = body_end;
        sections.push(Section {
            id: format!("section_{}", sections.len()),
            heading_text,
            content: body.to_string(),
            start_line: line_number(content, start),
            end_line: line_number(content, end.saturating_sub(1)),
            start,
            end,
            word_count: words,
            section_type: SectionType::classify(body),
        });
    }

    sections
}
