//! # strata
//!
//! Structure-aware document chunking for retrieval pipelines.
//!
//! ## The Problem
//!
//! Extracted documents are too long to embed whole, so they get split. Naive
//! splitting destroys exactly the parts a reader needs intact:
//!
//! - A procedure split between steps 3 and 4 answers neither half of the question
//! - A question in one chunk and its answer in the next retrieves as noise
//! - A term separated from its definition loses its meaning
//! - A heading stranded at the end of a chunk labels the wrong text
//!
//! `strata` detects the document's structure and its semantic groupings
//! first, then chooses split points that respect them while keeping every
//! chunk inside a size window.
//!
//! ## Pipeline
//!
//! ```text
//! 1. Structure   headings, sections, lists, tables, code, cross references
//! 2. Strategy    override -> structure recommendation -> content heuristics
//! 3. Relations   step sequences, Q&A pairs, definitions, examples, warnings
//! 4. Boundaries  strong / medium / weak split points, none inside relations
//! 5. Generate    one chunk per boundary pair, fragments merged
//! 6. Optimize    minimum-cost cuts within [min, max], snapped to sentences
//! 7. Overlap     up to two sentences borrowed from each neighbor
//! 8. Quality     completeness, coherence, context, readability
//! ```
//!
//! ## Strategies
//!
//! | Strategy | Target | Max | Min | Overlap | Preserves |
//! |----------|--------|-----|-----|---------|-----------|
//! | `semantic_adaptive` | 800 | 1200 | 200 | 100 | steps, Q&A, definitions |
//! | `procedure_preserving` | 600 | 1000 | 150 | 50 | steps |
//! | `qa_pair_preserving` | 500 | 900 | 100 | 0 | Q&A |
//! | `definition_preserving` | 600 | 1000 | 150 | 50 | definitions |
//! | `structure_preserving` | 1000 | 1500 | 200 | 100 | steps, structure |
//! | `section_based` | 900 | 1400 | 200 | 100 | structure |
//! | `simple` | 500 | 800 | 100 | 50 | nothing |
//!
//! Sizes are bytes of trimmed text.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::{Context, DocumentChunker};
//!
//! let chunker = DocumentChunker::default();
//! let text = "Q: How do I reset the device?\n\
//!             A: Hold the power button for ten seconds until the light blinks.";
//!
//! let result = chunker.chunk_document(Some(text), &Context::default());
//! assert_eq!(result.chunks.len(), 1);
//! assert!(result.chunks[0].quality_score <= 1.0);
//!
//! // Force a strategy by name; unknown names fall back to `simple`.
//! let ctx = Context::with_strategy("simple");
//! let result = chunker.chunk_document(Some(text), &ctx);
//! assert_eq!(result.metadata.strategy.as_str(), "simple");
//! ```
//!
//! ## Failure Handling
//!
//! [`DocumentChunker::chunk_document`] never returns an error and never
//! panics on input. Each stage degrades instead:
//!
//! | Stage fails | Result |
//! |-------------|--------|
//! | structure analysis | minimal analysis, strategy `simple` |
//! | generation / optimization | fixed windows, `quality_score = 0.3`, `fallback = true` |
//! | quality scoring | score 0.5 |
//!
//! ## Performance Considerations
//!
//! | Stage | Cost |
//! |-------|------|
//! | Structure, relations, boundaries | O(n) regex passes |
//! | Optimization | O(c × w), c candidates, w candidates per `max` bytes |
//! | Cache lookup | O(1), keyed on the first 1 KiB and the length |
//!
//! Caches are keyed by a prefix hash, so two documents that share their first
//! kilobyte and their length share a cache entry.

mod boundary;
pub mod cache;
mod capacity;
mod chunk;
mod config;
mod context;
mod error;
mod fixed;
mod generator;
mod optimizer;
mod overlap;
mod pipeline;
mod quality;
mod relationship;
mod sentence;
mod strategy;
pub mod structure;

pub use boundary::{Boundary, BoundaryDetector, BoundaryStrength};
pub use capacity::SizeLimits;
pub use chunk::{Chunk, ContextualInfo};
pub use config::{EngineConfig, QualityConfig, StructureConfig};
pub use context::{CacheKeyContext, Context, ProcessingOptions, ResolvedContext, SemanticHints};
pub use error::{Error, Result};
pub use fixed::FixedChunker;
pub use generator::ChunkGenerator;
pub use optimizer::{chunks_touched, ChunkOptimizer, Optimized, Relaxation};
pub use overlap::OverlapApplier;
pub use pipeline::{
    ChunkCacheKey, ChunkingMetadata, ChunkingResult, DocumentChunker, ProcessingStats,
    StructureCacheKey,
};
pub use quality::{QualityAssessor, QualityBreakdown};
pub use relationship::{Relationship, RelationshipIdentifier, RelationshipKind};
pub use strategy::{PreserveFlags, Strategy, StrategyChoice, StrategyConfig, StrategySelector};
pub use structure::{SectionType, StructureAnalysis, StructureAnalyzer};

/// A text chunking strategy.
///
/// Both the full pipeline and the fixed-window fallback implement this
/// trait:
///
/// ```rust
/// use strata::{Chunk, Chunker, DocumentChunker, FixedChunker};
///
/// fn chunk_document(chunker: &dyn Chunker, text: &str) -> Vec<Chunk> {
///     chunker.chunk(text)
/// }
///
/// let text = "Hello world. This is a test.";
/// let structured = chunk_document(&DocumentChunker::default(), text);
/// let windows = chunk_document(&FixedChunker::new(100, 20), text);
/// assert_eq!(structured.len(), windows.len());
/// ```
pub trait Chunker: Send + Sync {
    /// Split text into chunks.
    ///
    /// Each [`Chunk`] carries its text and byte offsets in `text`.
    fn chunk(&self, text: &str) -> Vec<Chunk>;

    /// Estimate the number of chunks for a given text length.
    ///
    /// Useful for pre-allocation. May be approximate.
    fn estimate_chunks(&self, text_len: usize) -> usize {
        // Conservative default
        (text_len / 500).max(1)
    }
}
