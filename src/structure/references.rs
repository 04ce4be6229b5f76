//! Cross-reference detection.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::headings::Heading;
use crate::sentence::line_end;

/// How a reference was expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// "see also", "refer to", ...
    Explicit,
    /// A later verbatim mention of a heading.
    HeadingMention,
}

/// A pointer from one place in the document to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    /// The matched text.
    pub text: String,
    /// What the reference points at.
    pub target: String,
    /// Byte offset of the reference.
    pub position: usize,
    /// Index into the heading list, when the target names a heading.
    pub heading_index: Option<usize>,
    /// How the reference was expressed.
    pub kind: ReferenceKind,
}

static EXPLICIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:see also|see (?:section|chapter|step|appendix|table|figure)|refer to|as described in|as shown in)\b[ \t:]*([^\n.;,)]{1,60})",
    )
    .expect("cross reference pattern")
});

/// Headings shorter than this are too generic to track as mentions.
const MIN_MENTION_LEN: usize = 8;

/// Find explicit references and later mentions of heading text.
pub fn detect(content: &str, headings: &[Heading]) -> Vec<CrossReference> {
    let mut refs = Vec::new();

    for caps in EXPLICIT.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        let target = caps.get(1).map_or("", |m| m.as_str()).trim();
        let text = whole.as_str().trim();
        let needle = text.to_lowercase();
        let target_lower = target.to_lowercase();
        let heading_index = headings.iter().position(|h| {
            let heading = h.text.to_lowercase();
            (!target_lower.is_empty() && heading.contains(&target_lower))
                || needle.contains(&heading)
        });
        refs.push(CrossReference {
            text: text.to_string(),
            target: target.to_string(),
            position: whole.start(),
            heading_index,
            kind: ReferenceKind::Explicit,
        });
    }

    for (index, heading) in headings.iter().enumerate() {
        if heading.text.len() < MIN_MENTION_LEN || !heading.text.contains(' ') {
            continue;
        }
        let after = line_end(content, heading.position);
        if let Some(offset) = content[after..].find(&heading.text) {
            refs.push(CrossReference {
                text: heading.text.clone(),
                target: heading.text.clone(),
                position: after + offset,
                heading_index: Some(index),
                kind: ReferenceKind::HeadingMention,
            });
        }
    }

    refs.sort_by_key(|r| r.position);
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::headings;

    #[test]
    fn test_explicit_reference_resolves_heading() {
        let text = "# Error Codes\nList.\n\n# Usage\nFor details see section Error Codes.";
        let found = headings::detect(text, &[]);
        let refs = detect(text, &found);
        let explicit: Vec<_> = refs.iter().filter(|r| r.kind == ReferenceKind::Explicit).collect();
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit[0].target, "Error Codes");
        assert_eq!(explicit[0].heading_index, Some(0));
    }

    #[test]
    fn test_heading_mentions() {
        let text = "## Backup Strategy\nDetails.\n\nLater we revisit the Backup Strategy again.";
        let found = headings::detect(text, &[]);
        let refs = detect(text, &found);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, ReferenceKind::HeadingMention);
        assert!(refs[0].position > found[0].position);
    }

    #[test]
    fn test_no_references() {
        assert!(detect("Plain text only.", &[]).is_empty());
    }
}
