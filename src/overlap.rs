//! Sentence-level overlap between neighboring chunks.
//!
//! ```text
//! own:      [A. B. C.]  [D. E. F.]  [G. H.]
//! content:  [A. B. C. D. E.]
//!                 [B. C. D. E. F. G. H.]
//!                             [E. F. G. H.]
//! ```
//!
//! Overlap is taken from the pre-overlap text of each neighbor, so it never
//! compounds. When two sentences exceed the budget, one is tried, then the
//! words nearest the seam.

use crate::sentence::{sentences, word_starts};
use crate::Chunk;

/// Sentences borrowed from each neighbor, at most.
const MAX_OVERLAP_SENTENCES: usize = 2;

/// Adds overlap text to chunks.
#[derive(Debug, Clone, Copy)]
pub struct OverlapApplier {
    budget: usize,
}

impl OverlapApplier {
    /// Overlap at most `budget` bytes on each side; 0 disables overlap.
    #[must_use]
    pub const fn new(budget: usize) -> Self {
        Self { budget }
    }

    /// Apply overlap in place.
    pub fn apply(&self, chunks: &mut [Chunk]) {
        if self.budget == 0 || chunks.len() < 2 {
            return;
        }
        let originals: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        for (i, chunk) in chunks.iter_mut().enumerate() {
            let before = i
                .checked_sub(1)
                .and_then(|p| self.tail(&originals[p]))
                .filter(|s| !s.is_empty());
            let after = originals
                .get(i + 1)
                .and_then(|next| self.head(next))
                .filter(|s| !s.is_empty());

            let mut content = String::with_capacity(
                originals[i].len() + 2 * self.budget + 2,
            );
            if let Some(prefix) = before {
                content.push_str(prefix);
                content.push(' ');
                chunk.has_overlap_before = true;
            }
            content.push_str(&originals[i]);
            if let Some(suffix) = after {
                content.push(' ');
                content.push_str(suffix);
                chunk.has_overlap_after = true;
            }
            chunk.content = content;
        }
        tracing::debug!(chunks = chunks.len(), budget = self.budget, "overlap applied");
    }

    /// The last sentences (or words) of `text` that fit the budget.
    fn tail<'a>(&self, text: &'a str) -> Option<&'a str> {
        let found = sentences(text);
        let first = found.len().saturating_sub(MAX_OVERLAP_SENTENCES);
        for &(offset, _) in &found[first..] {
            let candidate = text[offset..].trim_end();
            if candidate.len() <= self.budget {
                return Some(candidate);
            }
        }
        let &(offset, _) = found.last()?;
        let sentence = text[offset..].trim_end();
        word_starts(sentence)
            .into_iter()
            .map(|w| &sentence[w..])
            .find(|rest| rest.len() <= self.budget)
    }

    /// The first sentences (or words) of `text` that fit the budget.
    fn head<'a>(&self, text: &'a str) -> Option<&'a str> {
        let found = sentences(text);
        for &(offset, sentence) in found.iter().take(MAX_OVERLAP_SENTENCES).rev() {
            let candidate = text[..offset + sentence.len()].trim_start();
            if candidate.len() <= self.budget {
                return Some(candidate);
            }
        }
        let &(offset, sentence) = found.first()?;
        let sentence = &text[offset..offset + sentence.len()];
        word_starts(sentence)
            .into_iter()
            .rev()
            .map(|w| sentence[..w].trim_end())
            .find(|lead| !lead.is_empty() && lead.len() <= self.budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        let mut pos = 0;
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let chunk = Chunk::new(*t, pos, pos + t.len(), i);
                pos += t.len() + 1;
                chunk
            })
            .collect()
    }

    #[test]
    fn test_two_sentences_each_side() {
        let mut cs = chunks(&["A one. B two. C three.", "D four. E five. F six.", "G seven. H eight."]);
        OverlapApplier::new(100).apply(&mut cs);

        assert!(!cs[0].has_overlap_before);
        assert!(cs[0].has_overlap_after);
        assert_eq!(cs[0].content, "A one. B two. C three. D four. E five.");
        assert_eq!(cs[1].content, "B two. C three. D four. E five. F six. G seven. H eight.");
        assert!(!cs[2].has_overlap_after);
        assert_eq!(cs[2].content, "E five. F six. G seven. H eight.");
    }

    #[test]
    fn test_budget_shrinks_to_one_sentence() {
        let mut cs = chunks(&["First sentence here. Second sentence.", "Third one. Fourth one."]);
        OverlapApplier::new(18).apply(&mut cs);
        assert_eq!(cs[1].content, "Second sentence. Third one. Fourth one.");
    }

    #[test]
    fn test_budget_shrinks_to_words() {
        let mut cs = chunks(&["One very long closing sentence without a break.", "Next."]);
        OverlapApplier::new(12).apply(&mut cs);
        assert_eq!(cs[1].content, "a break. Next.");
        assert!(cs[1].has_overlap_before);
    }

    #[test]
    fn test_positions_and_size_unchanged() {
        let mut cs = chunks(&["Alpha beta. Gamma.", "Delta epsilon. Zeta."]);
        let spans: Vec<_> = cs.iter().map(|c| (c.span(), c.size)).collect();
        OverlapApplier::new(50).apply(&mut cs);
        let after: Vec<_> = cs.iter().map(|c| (c.span(), c.size)).collect();
        assert_eq!(spans, after);
    }

    #[test]
    fn test_zero_budget_disables() {
        let mut cs = chunks(&["A. B.", "C. D."]);
        OverlapApplier::new(0).apply(&mut cs);
        assert_eq!(cs[0].content, "A. B.");
        assert!(!cs[0].has_overlap());
    }

    #[test]
    fn test_single_chunk_untouched() {
        let mut cs = chunks(&["Only one chunk."]);
        OverlapApplier::new(50).apply(&mut cs);
        assert!(!cs[0].has_overlap());
    }
}
