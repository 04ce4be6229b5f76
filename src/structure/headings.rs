//! Heading detection.
//!
//! Patterns run in a fixed order over the whole text:
//!
//! | Family | Example | Level |
//! |--------|---------|-------|
//! | markdown | `## Install` | number of `#` |
//! | numeric | `2.1 Install` | dotted components |
//! | all-caps | `INSTALLATION` | 1 |
//! | underlined | `Install` over `-----` | `=` is 1, `-` is 2 |
//! | step | `Step 4: Restart` | 3 |
//! | section | `Section 2 Scope` | 3 |
//!
//! Results are deduplicated by `(text, position)` and sorted by position.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Deepest heading level.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Which pattern family produced a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingPattern {
    /// `#`-prefixed line.
    Markdown,
    /// `1.2.3 Title` line.
    Numeric,
    /// Short upper-case line.
    AllCaps,
    /// Line followed by `===` or `---`.
    Underlined,
    /// `Step N` line.
    Step,
    /// `Section N` line.
    Section,
    /// A caller-supplied pattern.
    Custom,
}

impl HeadingPattern {
    /// Whether this family describes document structure rather than a procedure.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        !matches!(self, Self::Step)
    }
}

/// A detected heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Heading text without markup.
    pub text: String,
    /// Nesting level, `1..=6`.
    pub level: u8,
    /// Byte offset of the heading line.
    pub position: usize,
    /// Pattern family that matched.
    pub pattern: HeadingPattern,
}

static MARKDOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]{0,3}(#{1,6})[ \t]+([^\n]+?)[ \t#]*$").expect("markdown heading pattern")
});

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d+(?:\.\d+)*)\.?[ \t]+([A-Z][^\n]{0,78}[^.\n:;,?!\s])[ \t]*$")
        .expect("numeric heading pattern")
});

static ALL_CAPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Z][A-Z0-9 &/,\-]{2,59})[ \t]*:?[ \t]*$").expect("all-caps heading pattern")
});

static UNDERLINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\S[^\n]{1,79})\n[ \t]*(=+|-+)[ \t]*$").expect("underlined heading pattern")
});

static STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*step[ \t]*\d+\b[^\n]*$").expect("step heading pattern")
});

static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*section[ \t]+\d+(?:\.\d+)*\b[^\n]*$").expect("section heading pattern")
});

/// A compiled caller-supplied heading pattern.
#[derive(Debug, Clone)]
pub struct CustomHeadingPattern {
    pub(crate) regex: Regex,
    pub(crate) level: u8,
}

impl CustomHeadingPattern {
    /// Compile `pattern`. Capture group 1, when present, is the heading text.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error.
    pub fn new(pattern: &str, level: u8) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            level: level.clamp(1, MAX_HEADING_LEVEL),
        })
    }
}

/// Detect headings in `content`.
pub fn detect(content: &str, custom: &[CustomHeadingPattern]) -> Vec<Heading> {
    let mut found = Vec::new();

    for caps in MARKDOWN.captures_iter(content) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        let level = caps.get(1).map_or(1, |m| m.as_str().len());
        push(&mut found, caps.get(2).map(|m| m.as_str()), level, whole, HeadingPattern::Markdown);
    }

    for caps in NUMERIC.captures_iter(content) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        let depth = caps.get(1).map_or(1, |m| m.as_str().split('.').count());
        let text = caps.get(0).map(|m| m.as_str());
        push(&mut found, text, depth, whole, HeadingPattern::Numeric);
    }

    for caps in ALL_CAPS.captures_iter(content) {
        let Some(text) = caps.get(1) else { continue };
        if text.as_str().chars().filter(char::is_ascii_alphabetic).count() < 3 {
            continue;
        }
        let whole = caps.get(0).map_or(0, |m| m.start());
        push(&mut found, Some(text.as_str()), 1, whole, HeadingPattern::AllCaps);
    }

    for caps in UNDERLINED.captures_iter(content) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        let level = match caps.get(2).map(|m| m.as_str().starts_with('=')) {
            Some(true) => 1,
            _ => 2,
        };
        push(&mut found, caps.get(1).map(|m| m.as_str()), level, whole, HeadingPattern::Underlined);
    }

    for m in STEP.find_iter(content) {
        push(&mut found, Some(m.as_str()), 3, m.start(), HeadingPattern::Step);
    }

    for m in SECTION.find_iter(content) {
        push(&mut found, Some(m.as_str()), 3, m.start(), HeadingPattern::Section);
    }

    for pattern in custom {
        for caps in pattern.regex.captures_iter(content) {
            let Some(whole) = caps.get(0) else { continue };
            let text = caps.get(1).unwrap_or(whole);
            push(
                &mut found,
                Some(text.as_str()),
                usize::from(pattern.level),
                whole.start(),
                HeadingPattern::Custom,
            );
        }
    }

    let mut seen = HashSet::new();
    found.retain(|h: &Heading| seen.insert((h.text.clone(), h.position)));
    found.sort_by_key(|h| h.position);
    found
}

fn push(
    found: &mut Vec<Heading>,
    text: Option<&str>,
    level: usize,
    position: usize,
    pattern: HeadingPattern,
) {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return;
    };
    found.push(Heading {
        text: text.to_string(),
        level: level.clamp(1, usize::from(MAX_HEADING_LEVEL)) as u8,
        position,
        pattern,
    });
}
