//! Fixed-size windows: the fallback that always succeeds.
//!
//! ## How It Works
//!
//! ```text
//! size = 10, overlap = 3
//!
//! Document: "abcdefghijklmnopqrstuvwxyz"
//!
//! Chunk 0: "abcdefghij"   [0..10]
//! Chunk 1: "hijklmnopq"   [7..17]   <- starts at 10 - 3 = 7
//! Chunk 2: "opqrstuvwx"   [14..24]  <- starts at 17 - 3 = 14
//! Chunk 3: "vwxyz"        [21..26]  <- final chunk may be shorter
//! ```
//!
//! Windows ignore sentences, relationships and structure entirely. The
//! pipeline reaches for this only when optimization fails, using windows of
//! the strategy's target size without overlap, and marks every chunk with
//! `fallback = true`.
//!
//! Windows never split a UTF-8 character, and each chunk is trimmed, so a
//! window of pure whitespace produces no chunk.

use crate::sentence::{ceil_char_boundary, floor_char_boundary, trimmed_span};
use crate::{Chunk, Chunker};

/// Fixed-size chunker with configurable overlap.
///
/// ## Example
///
/// ```rust
/// use strata::{Chunker, FixedChunker};
///
/// let chunker = FixedChunker::new(100, 20);
/// let text = "A".repeat(250);
/// let chunks = chunker.chunk(&text);
///
/// assert!(chunks.len() >= 3);
/// assert_eq!(chunks[0].size, 100);
/// assert_eq!(chunks[1].start_position, 80); // 100 - 20 overlap
/// assert!(chunks.iter().all(|c| c.fallback));
/// ```
#[derive(Debug, Clone)]
pub struct FixedChunker {
    size: usize,
    overlap: usize,
    quality_score: f64,
}

impl FixedChunker {
    /// Score given to every fallback chunk unless overridden.
    pub const FALLBACK_SCORE: f64 = 0.3;

    /// Create a new fixed-size chunker.
    ///
    /// # Arguments
    ///
    /// * `size` - Maximum chunk size in bytes
    /// * `overlap` - Bytes to overlap between adjacent chunks
    ///
    /// # Panics
    ///
    /// Panics if `size == 0` or `overlap >= size`.
    #[must_use]
    pub fn new(size: usize, overlap: usize) -> Self {
        assert!(size > 0, "chunk size must be > 0");
        assert!(overlap < size, "overlap must be < size");
        Self {
            size,
            overlap,
            quality_score: Self::FALLBACK_SCORE,
        }
    }

    /// Create a chunker with no overlap.
    #[must_use]
    pub fn no_overlap(size: usize) -> Self {
        Self::new(size, 0)
    }

    /// Score to assign to produced chunks, clamped to [0, 1].
    #[must_use]
    pub fn with_quality_score(mut self, score: f64) -> Self {
        self.quality_score = score.clamp(0.0, 1.0);
        self
    }

    /// The step size between chunk starts.
    #[must_use]
    fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Raw window spans, before trimming.
    #[must_use]
    pub fn windows(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::with_capacity(self.estimate_chunks(text.len()));
        let mut start = 0;
        while start < text.len() {
            let mut end = floor_char_boundary(text, start + self.size);
            if end <= start {
                // A single char wider than the window.
                end = ceil_char_boundary(text, start + 1);
            }
            spans.push((start, end));
            if end == text.len() {
                break;
            }
            let next = ceil_char_boundary(text, start + self.step()).min(end);
            start = if next > start { next } else { end };
        }
        spans
    }
}

impl Chunker for FixedChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.windows(text)
            .into_iter()
            .map(|(start, end)| trimmed_span(text, start, end))
            .filter(|(s, e)| s < e)
            .enumerate()
            .map(|(index, (s, e))| {
                let mut chunk = Chunk::new(&text[s..e], s, e, index);
                chunk.quality_score = self.quality_score;
                chunk.fallback = true;
                chunk
            })
            .collect()
    }

    fn estimate_chunks(&self, text_len: usize) -> usize {
        if text_len == 0 {
            return 0;
        }
        text_len.div_ceil(self.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_chunking() {
        let chunker = FixedChunker::new(10, 2);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(chunks[0].start_position, 0);
        assert_eq!(chunks[0].end_position, 10);

        assert_eq!(chunks[1].start_position, 8); // 10 - 2 overlap
        assert_eq!(chunks.last().unwrap().end_position, text.len());
    }

    #[test]
    fn test_empty_text() {
        let chunker = FixedChunker::new(10, 2);
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn test_text_smaller_than_chunk() {
        let chunks = FixedChunker::new(100, 20).chunk("small");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "small");
        assert_eq!(chunks[0].quality_score, 0.3);
    }

    #[test]
    fn test_windows_trimmed() {
        let chunks = FixedChunker::no_overlap(6).chunk("abc   def   ");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "abc");
        assert_eq!(chunks[1].content, "def");
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_unicode_boundaries() {
        let chunker = FixedChunker::new(5, 1);
        let text = "a日本語b"; // 'a' + 3 multibyte chars + 'b'
        let chunks = chunker.chunk(text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert_eq!(&text[chunk.span()], chunk.content);
        }
    }

    #[test]
    fn test_char_wider_than_window() {
        let chunks = FixedChunker::no_overlap(2).chunk("日本");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "日");
    }

    #[test]
    #[should_panic]
    fn test_zero_size_panics() {
        let _ = FixedChunker::new(0, 0);
    }

    #[test]
    #[should_panic]
    fn test_overlap_exceeds_size_panics() {
        let _ = FixedChunker::new(10, 10);
    }
}
