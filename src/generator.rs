//! Initial chunk generation between boundaries.
//!
//! ```text
//! boundaries:  0      40   55             180        260
//!              |------|----|---------------|----------|
//! measured:      40    15        125           80        (min = 50)
//!
//! 0..40   < min, nothing before it   -> held
//! 40..55  < min, still held
//! 55..180 >= min                     -> chunk 0..180 (absorbs the held start)
//! 180..260 >= min                    -> chunk 180..260
//! ```
//!
//! Fragments that follow an accepted chunk are appended to it instead of
//! being held. The output spans are contiguous: each starts where the
//! previous one ends.

use crate::boundary::Boundary;
use crate::sentence::measured_len;
use crate::{Error, Result, SizeLimits};

/// Turns boundaries into contiguous initial spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkGenerator;

impl ChunkGenerator {
    /// Generate spans covering `content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Chunking`] when the boundaries do not start at 0,
    /// end at `content.len()`, increase strictly and sit on char boundaries.
    pub fn generate(
        content: &str,
        boundaries: &[Boundary],
        limits: SizeLimits,
    ) -> Result<Vec<(usize, usize)>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }
        validate(content, boundaries)?;

        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut held: Option<usize> = None;
        for pair in boundaries.windows(2) {
            let (start, end) = (pair[0].position, pair[1].position);
            if measured_len(content, start, end) >= limits.min() {
                spans.push((held.take().unwrap_or(start), end));
            } else if let Some(last) = spans.last_mut() {
                last.1 = end;
            } else if held.is_none() {
                held = Some(start);
            }
        }
        if let Some(start) = held {
            // Nothing reached `min`: the whole document is one fragment.
            spans.push((start, content.len()));
        }

        tracing::debug!(spans = spans.len(), "initial chunks generated");
        Ok(spans)
    }
}

fn validate(content: &str, boundaries: &[Boundary]) -> Result<()> {
    let (Some(first), Some(last)) = (boundaries.first(), boundaries.last()) else {
        return Err(Error::chunking("no boundaries"));
    };
    if first.position != 0 || last.position != content.len() {
        return Err(Error::chunking(format!(
            "boundaries must span 0..{}, got {}..{}",
            content.len(),
            first.position,
            last.position
        )));
    }
    if let Some(pair) = boundaries
        .windows(2)
        .find(|pair| pair[0].position >= pair[1].position)
    {
        return Err(Error::chunking(format!(
            "boundaries out of order at {} -> {}",
            pair[0].position, pair[1].position
        )));
    }
    if let Some(b) = boundaries.iter().find(|b| !content.is_char_boundary(b.position)) {
        return Err(Error::chunking(format!("boundary {} splits a character", b.position)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryStrength;

    fn boundaries(positions: &[usize]) -> Vec<Boundary> {
        positions
            .iter()
            .map(|&position| Boundary {
                position,
                strength: BoundaryStrength::Weak,
                weight: 0.3,
                pattern: "test",
                snippet: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_held_fragments_join_next_chunk() {
        let text = "x".repeat(260);
        let limits = SizeLimits::new(50, 100, 200).unwrap();
        let spans =
            ChunkGenerator::generate(&text, &boundaries(&[0, 40, 55, 180, 260]), limits).unwrap();
        assert_eq!(spans, vec![(0, 180), (180, 260)]);
    }

    #[test]
    fn test_trailing_fragment_appends() {
        let text = "y".repeat(130);
        let limits = SizeLimits::new(50, 100, 200).unwrap();
        let spans = ChunkGenerator::generate(&text, &boundaries(&[0, 100, 130]), limits).unwrap();
        assert_eq!(spans, vec![(0, 130)]);
    }

    #[test]
    fn test_short_document_is_one_span() {
        let text = "tiny";
        let limits = SizeLimits::new(50, 100, 200).unwrap();
        let spans = ChunkGenerator::generate(text, &boundaries(&[0, 2, 4]), limits).unwrap();
        assert_eq!(spans, vec![(0, 4)]);
    }

    #[test]
    fn test_spans_are_contiguous() {
        let text = "z".repeat(1000);
        let limits = SizeLimits::new(50, 100, 200).unwrap();
        let positions: Vec<usize> = (0..=1000).step_by(37).chain([1000]).collect();
        let spans = ChunkGenerator::generate(&text, &boundaries(&positions), limits).unwrap();
        assert_eq!(spans.first().unwrap().0, 0);
        assert_eq!(spans.last().unwrap().1, 1000);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_invalid_boundaries() {
        let text = "x".repeat(100);
        let limits = SizeLimits::new(10, 20, 30).unwrap();
        assert!(ChunkGenerator::generate(&text, &[], limits).is_err());
        assert!(ChunkGenerator::generate(&text, &boundaries(&[0, 50]), limits).is_err());
        assert!(ChunkGenerator::generate(&text, &boundaries(&[0, 60, 40, 100]), limits).is_err());
        assert!(ChunkGenerator::generate("a日", &boundaries(&[0, 2, 4]), limits).is_err());
    }

    #[test]
    fn test_empty_content() {
        let limits = SizeLimits::new(10, 20, 30).unwrap();
        assert!(ChunkGenerator::generate("", &boundaries(&[0]), limits).unwrap().is_empty());
    }
}
