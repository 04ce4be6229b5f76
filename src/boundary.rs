//! Candidate split points.
//!
//! ## Tiers
//!
//! | Strength | Weight | Patterns |
//! |----------|--------|----------|
//! | Strong | 1.0 | headings, horizontal rules, section openers, chapter/part |
//! | Medium | 0.6 | paragraph breaks, numbered items, steps, Q lines, code fences |
//! | Weak | 0.3 | sentence starts, single line breaks |
//!
//! Each pattern marks its split point with an empty `at` group, so the
//! position is exact even when the pattern needs context on both sides.
//!
//! ```text
//! "...the end.\n\n## Next"
//!                 ^ at: paragraph break (medium) and heading (strong)
//!                   deduplicated to one strong boundary
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::relationship::Relationship;
use crate::sentence::{ceil_char_boundary, floor_char_boundary, line_end, line_start};
use crate::structure::sections::OPENER;
use crate::structure::{HeadingPattern, StructureAnalysis};
use crate::StrategyConfig;

/// How strongly a boundary suggests a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryStrength {
    /// Sentence and line level.
    Weak,
    /// Paragraph and list level.
    Medium,
    /// Section level.
    Strong,
}

impl BoundaryStrength {
    /// Numeric weight used by the optimizer.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Strong => 1.0,
            Self::Medium => 0.6,
            Self::Weak => 0.3,
        }
    }
}

/// A candidate split point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    /// Byte offset; the next chunk would start here.
    pub position: usize,
    /// Tier.
    pub strength: BoundaryStrength,
    /// `strength.weight()`.
    pub weight: f64,
    /// Name of the pattern that produced it.
    pub pattern: &'static str,
    /// A few bytes of text following the position.
    pub snippet: String,
}

impl Boundary {
    /// `position` is clamped to a char boundary of `content`.
    fn new(content: &str, position: usize, strength: BoundaryStrength, pattern: &'static str) -> Self {
        let position = floor_char_boundary(content, position);
        let end = floor_char_boundary(content, position.saturating_add(SNIPPET_LEN));
        Self {
            position,
            strength,
            weight: strength.weight(),
            pattern,
            snippet: content[position..end].trim_end().to_string(),
        }
    }
}

const SNIPPET_LEN: usize = 40;

struct BoundaryPattern {
    name: &'static str,
    strength: BoundaryStrength,
    regex: Regex,
}

fn pattern(name: &'static str, strength: BoundaryStrength, re: &str) -> BoundaryPattern {
    BoundaryPattern {
        name,
        strength,
        regex: Regex::new(re).expect("built-in boundary pattern"),
    }
}

static PATTERNS: LazyLock<Vec<BoundaryPattern>> = LazyLock::new(|| {
    use BoundaryStrength::{Medium, Strong, Weak};
    vec![
        pattern("markdown_heading", Strong, r"(?m)^(?P<at>)[ \t]{0,3}#{1,6}[ \t]+\S"),
        pattern("horizontal_rule", Strong, r"(?m)^(?P<at>)[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$"),
        pattern(
            "chapter",
            Strong,
            r"(?mi)^(?P<at>)[ \t]*(?:chapter|part)[ \t]+(?:\d+|[ivxlc]+)\b",
        ),
        pattern("paragraph", Medium, r"\n[ \t]*\n\s*(?P<at>)\S"),
        pattern("numbered_item", Medium, r"(?m)^(?P<at>)[ \t]*\d+[.)][ \t]+\S"),
        pattern("step", Medium, r"(?mi)^(?P<at>)[ \t]*step[ \t]*\d+\b"),
        pattern("question", Medium, r"(?mi)^(?P<at>)[ \t]*(?:q|question)[ \t]*\d*[ \t]*[:.]"),
        pattern("sentence", Weak, r#"[.!?]["')\]]*[ \t]+(?P<at>)[A-Z]"#),
        pattern("line", Weak, r"[^\n]\n(?P<at>)[ \t]*\S"),
    ]
});

static STEP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ \t]*(?:step[ \t]*\d+\b|\d+[.)][ \t]+\S)").expect("step line pattern")
});

/// Finds and filters split points.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryDetector;

impl BoundaryDetector {
    /// Detect boundaries in `content`.
    ///
    /// The result is sorted, deduplicated by position (strongest wins) and
    /// always starts at 0 and ends at `content.len()`. No boundary lies
    /// strictly inside a relationship.
    pub fn detect(
        content: &str,
        relationships: &[Relationship],
        config: &StrategyConfig,
        analysis: &StructureAnalysis,
    ) -> Vec<Boundary> {
        let len = content.len();
        let mut by_position: BTreeMap<usize, Boundary> = BTreeMap::new();
        let mut keep = |b: Boundary| {
            let weaker_or_equal = matches!(
                by_position.get(&b.position),
                Some(existing) if existing.strength >= b.strength
            );
            if !weaker_or_equal {
                by_position.insert(b.position, b);
            }
        };

        for p in PATTERNS.iter() {
            for caps in p.regex.captures_iter(content) {
                if let Some(at) = caps.name("at") {
                    keep(Boundary::new(content, at.start(), p.strength, p.name));
                }
            }
        }
        for m in OPENER.find_iter(content) {
            keep(Boundary::new(content, m.start(), BoundaryStrength::Strong, "section_opener"));
        }
        for code in &analysis.content_structures.code_blocks {
            keep(Boundary::new(content, code.start, BoundaryStrength::Medium, "code_fence"));
            let after = ceil_char_boundary(content, code.end);
            keep(Boundary::new(content, after, BoundaryStrength::Medium, "code_fence"));
        }

        let heading_ends = heading_line_ends(content, analysis);
        let before = by_position.len();
        let mut boundaries: Vec<Boundary> = by_position
            .into_values()
            .filter(|b| b.position > 0 && b.position < len)
            .filter(|b| !relationships.iter().any(|r| r.strictly_contains(b.position)))
            .filter(|b| !(config.preserve.steps && between_step_lines(content, b.position)))
            .filter(|b| {
                !(config.preserve.structure && follows_heading(content, b.position, &heading_ends))
            })
            .collect();

        boundaries.insert(0, Boundary::new(content, 0, BoundaryStrength::Strong, "start"));
        if len > 0 {
            boundaries.push(Boundary::new(content, len, BoundaryStrength::Strong, "end"));
        }

        tracing::debug!(
            raw = before,
            kept = boundaries.len(),
            strategy = %config.strategy,
            "boundaries detected"
        );
        boundaries
    }
}

/// Whether the line at `pos` and the previous non-blank line are both step lines.
fn between_step_lines(content: &str, pos: usize) -> bool {
    let start = line_start(content, pos);
    let current = &content[start..line_end(content, start)];
    if !STEP_LINE.is_match(current) {
        return false;
    }
    content[..start]
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|prev| STEP_LINE.is_match(prev))
}

/// Byte offsets just past each heading line (and its underline, if any).
fn heading_line_ends(content: &str, analysis: &StructureAnalysis) -> Vec<(usize, usize)> {
    analysis
        .headings
        .iter()
        .filter(|h| h.position < content.len() && content.is_char_boundary(h.position))
        .map(|h| {
            let mut end = line_end(content, h.position);
            if h.pattern == HeadingPattern::Underlined && end < content.len() {
                end = line_end(content, end + 1);
            }
            (h.position, end)
        })
        .collect()
}

/// Whether only whitespace separates the end of a heading line from `pos`.
fn follows_heading(content: &str, pos: usize, heading_ends: &[(usize, usize)]) -> bool {
    heading_ends
        .iter()
        .any(|&(start, end)| start < pos && end <= pos && content[end..pos].trim().is_empty())
}
