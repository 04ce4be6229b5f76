//! Sentence and word segmentation with byte offsets.
//!
//! ## Scope
//!
//! Sentence detection uses Unicode Standard Annex #29 (UAX #29) through
//! `unicode-segmentation`. That handles decimals, ellipses and most URLs,
//! but not every abbreviation:
//!
//! ```text
//! "Dr. Smith went to Washington D.C. on Jan. 15th."
//!     ^                          ^       ^
//!     UAX #29 may report a boundary here
//! ```
//!
//! The heuristics built on top (terminal punctuation, transition words,
//! definitional phrasing) assume English prose. Other scripts segment
//! without panicking but score less meaningfully.
//!
//! All offsets are byte offsets and always land on char boundaries.

use unicode_segmentation::UnicodeSegmentation;

/// Non-empty sentences with the byte offset of their first non-whitespace char.
///
/// The returned slices are trimmed.
pub fn sentences(text: &str) -> Vec<(usize, &str)> {
    text.split_sentence_bound_indices()
        .filter_map(|(offset, s)| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            let leading_ws = s.len() - s.trim_start().len();
            Some((offset + leading_ws, trimmed))
        })
        .collect()
}

/// Byte offsets where a sentence begins, excluding offset 0.
pub fn sentence_starts(text: &str) -> Vec<usize> {
    sentences(text)
        .into_iter()
        .map(|(offset, _)| offset)
        .filter(|&offset| offset > 0)
        .collect()
}

/// Byte offsets of every non-whitespace char that follows whitespace.
pub fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut prev_ws = false;
    for (i, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        if prev_ws && !ws {
            starts.push(i);
        }
        prev_ws = ws;
    }
    starts
}

/// Words as defined by UAX #29 (punctuation dropped).
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.unicode_words()
}

/// Number of words in `text`.
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Shrink `start..end` so it excludes surrounding whitespace.
pub fn trimmed_span(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return (start, start);
    }
    (start + leading, end - trailing)
}

/// Length of `start..end` after trimming.
pub fn measured_len(text: &str, start: usize, end: usize) -> usize {
    let (s, e) = trimmed_span(text, start, end);
    e - s
}

/// Largest char boundary `<= index`.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary `>= index`.
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Whether `text` ends with sentence-terminal punctuation, allowing closing quotes
/// and brackets after it.
pub fn ends_with_terminal(text: &str) -> bool {
    let text = text.trim_end();
    if text.ends_with("```") {
        return true;
    }
    let trimmed = text.trim_end_matches(['"', '\'', ')', ']', '*', '`']);
    trimmed.ends_with(['.', '!', '?']) && !trimmed.ends_with("...")
}

/// 1-based line number of the byte at `pos`.
pub fn line_number(text: &str, pos: usize) -> usize {
    let pos = floor_char_boundary(text, pos);
    text[..pos].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Byte offset just past the end of the line containing `pos` (newline excluded).
pub fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

/// Byte offset of the start of the line containing `pos`.
pub fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_offsets() {
        let text = "Hello world. How are you? I am fine.";
        let found = sentences(text);
        assert_eq!(found.len(), 3);
        for (offset, s) in &found {
            assert_eq!(&text[*offset..offset + s.len()], *s);
        }
        assert_eq!(found[1].1, "How are you?");
    }

    #[test]
    fn test_sentence_starts_skip_zero() {
        let starts = sentence_starts("One. Two. Three.");
        assert_eq!(starts, vec![5, 10]);
    }

    #[test]
    fn test_word_starts() {
        assert_eq!(word_starts("ab  cd\nef"), vec![4, 7]);
        assert!(word_starts("").is_empty());
    }

    #[test]
    fn test_trimmed_span() {
        let text = "  abc  ";
        assert_eq!(trimmed_span(text, 0, text.len()), (2, 5));
        assert_eq!(measured_len(text, 0, 2), 0);
    }

    #[test]
    fn test_char_boundaries() {
        let text = "a日b";
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(ceil_char_boundary(text, 2), 4);
    }

    #[test]
    fn test_terminal_detection() {
        assert!(ends_with_terminal("A full sentence."));
        assert!(ends_with_terminal("He said \"stop.\""));
        assert!(!ends_with_terminal("A sentence cut in the"));
        assert!(!ends_with_terminal("Trailing off..."));
    }

    #[test]
    fn test_lines() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_number(text, 0), 1);
        assert_eq!(line_number(text, 5), 2);
        assert_eq!(line_start(text, 5), 4);
        assert_eq!(line_end(text, 5), 7);
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(word_count("The quick, brown fox."), 4);
        assert_eq!(word_count("   "), 0);
    }
}
