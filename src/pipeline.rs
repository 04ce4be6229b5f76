//! The chunking pipeline and its entry point.
//!
//! ```text
//! content ──trim──> StructureAnalyzer ──> StrategySelector
//!                        (cached)               │
//!            ┌──────────────────────────────────┘
//!            v
//!   RelationshipIdentifier ─> BoundaryDetector ─> ChunkGenerator
//!                                                       │
//!   QualityAssessor <─ OverlapApplier <─ ChunkOptimizer ┘
//!            │
//!            └──> ChunkingResult (cached)
//! ```
//!
//! Stage errors never reach the caller. A structure failure degrades to
//! [`StructureAnalysis::fallback`]; a generation or optimization failure
//! degrades to [`FixedChunker`] windows; a scoring failure degrades to the
//! default score.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::boundary::BoundaryDetector;
use crate::cache::{content_hash, CacheStats, EvictionPolicy, FifoEviction, ResultCache};
use crate::config::EngineConfig;
use crate::context::{CacheKeyContext, Context, ResolvedContext};
use crate::generator::ChunkGenerator;
use crate::optimizer::{chunks_touched, ChunkOptimizer, Optimized, Relaxation};
use crate::overlap::OverlapApplier;
use crate::quality::QualityAssessor;
use crate::relationship::RelationshipIdentifier;
use crate::structure::{StructureAnalysis, StructureAnalyzer, StructureQuality};
use crate::{Chunk, Chunker, FixedChunker, Result, Strategy, StrategyConfig, StrategySelector};

/// Summary of a chunking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkingMetadata {
    /// Strategy that produced the chunks.
    pub strategy: Strategy,
    /// Number of chunks.
    pub total_chunks: usize,
    /// Mean own-span size in bytes.
    pub average_chunk_size: f64,
    /// Mean quality score.
    pub average_quality: f64,
    /// Keep-together relationships spanning at most their allowed chunks.
    pub relationships_preserved: usize,
    /// Split points detected, excluding the start and end sentinels.
    pub boundaries_detected: usize,
    /// Whether fixed windows replaced the optimized chunks.
    pub fallback: bool,
}

/// Diagnostics for a chunking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    /// Input length in bytes.
    pub input_length: usize,
    /// Length after trimming.
    pub normalized_length: usize,
    /// Relationships identified.
    pub relationships_found: usize,
    /// Spans produced by the generator.
    pub initial_chunks: usize,
    /// Protection level the optimizer needed; absent for fallback runs.
    pub relaxation: Option<Relaxation>,
    /// Whether structure analysis fell back.
    pub structure_fallback: bool,
    /// Chunks touched by the enhancer.
    pub enhanced_chunks: usize,
    /// Chunks carrying overlap.
    pub overlapped_chunks: usize,
}

/// Everything [`DocumentChunker::chunk_document`] returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkingResult {
    /// Chunks in document order.
    pub chunks: Vec<Chunk>,
    /// Run summary.
    pub metadata: ChunkingMetadata,
    /// Structural quality of the document.
    pub quality_metrics: StructureQuality,
    /// Diagnostics.
    pub processing_stats: ProcessingStats,
}

impl ChunkingResult {
    fn empty(strategy: Strategy, quality_metrics: StructureQuality, input_length: usize) -> Self {
        Self {
            chunks: Vec::new(),
            metadata: ChunkingMetadata {
                strategy,
                total_chunks: 0,
                average_chunk_size: 0.0,
                average_quality: 0.0,
                relationships_preserved: 0,
                boundaries_detected: 0,
                fallback: false,
            },
            quality_metrics,
            processing_stats: ProcessingStats {
                input_length,
                ..ProcessingStats::default()
            },
        }
    }

    /// Whether no chunks were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Key of the chunking result cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkCacheKey {
    /// [`content_hash`] of the raw content.
    pub content: u64,
    /// Requested strategy name, or `auto`.
    pub strategy: String,
    /// Result-affecting context.
    pub context: CacheKeyContext,
}

/// Key of the structure analysis cache: content hash and document type.
pub type StructureCacheKey = (u64, Option<String>);

struct Segmented {
    chunks: Vec<Chunk>,
    relationships_found: usize,
    relationships_preserved: usize,
    boundaries_detected: usize,
    initial_chunks: usize,
    relaxation: Relaxation,
}

/// Document chunker with result caching.
///
/// ```rust
/// use strata::{Context, DocumentChunker};
///
/// let chunker = DocumentChunker::default();
/// let text = "Step 1: Open the panel.\nStep 2: Replace the filter.\nStep 3: Close the panel.";
/// let result = chunker.chunk_document(Some(text), &Context::default());
///
/// assert_eq!(result.chunks.len(), 1);
/// assert_eq!(result.metadata.strategy.as_str(), "procedure_preserving");
/// ```
pub struct DocumentChunker {
    config: EngineConfig,
    analyzer: StructureAnalyzer,
    optimizer: ChunkOptimizer,
    chunk_cache: Mutex<ResultCache<ChunkCacheKey, ChunkingResult>>,
    structure_cache: Mutex<ResultCache<StructureCacheKey, StructureAnalysis>>,
}

impl std::fmt::Debug for DocumentChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentChunker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for DocumentChunker {
    fn default() -> Self {
        Self::build(
            EngineConfig::default(),
            Box::new(FifoEviction::<ChunkCacheKey>::default()),
            Box::new(FifoEviction::<StructureCacheKey>::default()),
        )
    }
}

impl DocumentChunker {
    /// Create a chunker with FIFO caches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) when
    /// `config` fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_eviction(
            config,
            Box::new(FifoEviction::<ChunkCacheKey>::default()),
            Box::new(FifoEviction::<StructureCacheKey>::default()),
        )
    }

    /// Create a chunker with custom eviction policies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) when
    /// `config` fails validation.
    pub fn with_eviction(
        config: EngineConfig,
        chunk_policy: Box<dyn EvictionPolicy<ChunkCacheKey>>,
        structure_policy: Box<dyn EvictionPolicy<StructureCacheKey>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, chunk_policy, structure_policy))
    }

    fn build(
        config: EngineConfig,
        chunk_policy: Box<dyn EvictionPolicy<ChunkCacheKey>>,
        structure_policy: Box<dyn EvictionPolicy<StructureCacheKey>>,
    ) -> Self {
        Self {
            analyzer: StructureAnalyzer::new(config.structure.clone()),
            optimizer: ChunkOptimizer::new(config.snap_tolerance),
            chunk_cache: Mutex::new(ResultCache::with_boxed_policy(
                config.chunk_cache_capacity,
                chunk_policy,
            )),
            structure_cache: Mutex::new(ResultCache::with_boxed_policy(
                config.structure_cache_capacity,
                structure_policy,
            )),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Chunk a document.
    ///
    /// Never fails: `None` yields an empty result, and every internal
    /// failure yields a degraded but valid one.
    pub fn chunk_document(&self, content: Option<&str>, ctx: &Context) -> ChunkingResult {
        let resolved = ResolvedContext::resolve(ctx, &self.config);
        let Some(raw) = content else {
            tracing::debug!("no content supplied");
            let analysis = StructureAnalysis::empty(resolved.document_type.as_deref());
            let strategy = StrategySelector::select(&resolved.choice, &analysis, "");
            return ChunkingResult::empty(strategy, analysis.quality, 0);
        };

        let key = ChunkCacheKey {
            content: content_hash(raw),
            strategy: resolved.choice.key_name().to_string(),
            context: resolved.cache_key_context(),
        };
        if let Some(hit) = lock(&self.chunk_cache).get(&key) {
            tracing::debug!(strategy = %hit.metadata.strategy, "chunk cache hit");
            return hit;
        }

        let result = self.run(raw, ctx, &resolved);
        lock(&self.chunk_cache).insert(key, result.clone());
        result
    }

    /// Analyze structure, consulting the structure cache.
    ///
    /// `content` is trimmed first, so offsets in the result are relative to
    /// `content.trim()`, matching what [`chunk_document`](Self::chunk_document)
    /// analyzes.
    pub fn analyze_structure(&self, content: &str, document_type: Option<&str>) -> StructureAnalysis {
        let content = content.trim();
        let key = (content_hash(content), document_type.map(str::to_string));
        let cached = lock(&self.structure_cache).get(&key);
        match cached {
            Some(hit) if hit.fits(content) => {
                tracing::debug!("structure cache hit");
                return hit;
            }
            Some(_) => tracing::debug!("cached structure belongs to other text, re-analyzing"),
            None => {}
        }
        let analysis = self.analyzer.analyze(content, document_type);
        lock(&self.structure_cache).insert(key, analysis.clone());
        analysis
    }

    /// Counters of the chunking result cache.
    #[must_use]
    pub fn chunk_cache_stats(&self) -> CacheStats {
        lock(&self.chunk_cache).stats()
    }

    /// Counters of the structure analysis cache.
    #[must_use]
    pub fn structure_cache_stats(&self) -> CacheStats {
        lock(&self.structure_cache).stats()
    }

    /// Empty both caches.
    pub fn clear_caches(&self) {
        lock(&self.chunk_cache).clear();
        lock(&self.structure_cache).clear();
    }

    fn run(&self, raw: &str, ctx: &Context, resolved: &ResolvedContext) -> ChunkingResult {
        let normalized = raw.trim();
        let offset = raw.len() - raw.trim_start().len();

        let analysis = match &ctx.structure {
            Some(supplied) if supplied.fits(normalized) => supplied.clone(),
            Some(_) => {
                tracing::warn!("supplied structure does not match the content, re-analyzing");
                self.analyze_structure(normalized, resolved.document_type.as_deref())
            }
            None => self.analyze_structure(normalized, resolved.document_type.as_deref()),
        };
        let strategy = StrategySelector::select(&resolved.choice, &analysis, normalized);
        let config = resolved.strategy_config(strategy);
        tracing::debug!(
            strategy = %strategy,
            bytes = normalized.len(),
            structure_fallback = analysis.fallback,
            "strategy selected"
        );

        if normalized.is_empty() {
            return ChunkingResult::empty(strategy, analysis.quality, raw.len());
        }

        let assessor = QualityAssessor::new(self.config.quality.clone(), resolved.target_quality_score);
        let optimizer = self.optimizer.with_semantic_hint(resolved.semantic_hint);
        let (mut chunks, segmented) = match Self::segment(normalized, &analysis, &config, optimizer, &assessor) {
            Ok(mut s) => (std::mem::take(&mut s.chunks), Some(s)),
            Err(e) => {
                tracing::warn!(error = %e, strategy = %strategy, "chunking failed, using fixed windows");
                (self.fallback_chunks(normalized, &config, &analysis), None)
            }
        };
        for chunk in &mut chunks {
            chunk.shift(offset);
        }

        let n = chunks.len();
        let mean = |f: fn(&Chunk) -> f64| {
            if n == 0 {
                0.0
            } else {
                chunks.iter().map(f).sum::<f64>() / n as f64
            }
        };
        let metadata = ChunkingMetadata {
            strategy,
            total_chunks: n,
            average_chunk_size: mean(|c| c.size as f64),
            average_quality: mean(|c| c.quality_score),
            relationships_preserved: segmented.as_ref().map_or(0, |s| s.relationships_preserved),
            boundaries_detected: segmented.as_ref().map_or(0, |s| s.boundaries_detected),
            fallback: segmented.is_none(),
        };
        let processing_stats = ProcessingStats {
            input_length: raw.len(),
            normalized_length: normalized.len(),
            relationships_found: segmented.as_ref().map_or(0, |s| s.relationships_found),
            initial_chunks: segmented.as_ref().map_or(0, |s| s.initial_chunks),
            relaxation: segmented.as_ref().map(|s| s.relaxation),
            structure_fallback: analysis.fallback,
            enhanced_chunks: chunks.iter().filter(|c| c.enhanced).count(),
            overlapped_chunks: chunks.iter().filter(|c| c.has_overlap()).count(),
        };

        tracing::debug!(
            chunks = n,
            average_quality = metadata.average_quality,
            fallback = metadata.fallback,
            "document chunked"
        );
        ChunkingResult {
            chunks,
            metadata,
            quality_metrics: analysis.quality,
            processing_stats,
        }
    }

    fn segment(
        content: &str,
        analysis: &StructureAnalysis,
        config: &StrategyConfig,
        optimizer: ChunkOptimizer,
        assessor: &QualityAssessor,
    ) -> Result<Segmented> {
        let relationships = RelationshipIdentifier::identify(content, config);
        let boundaries = BoundaryDetector::detect(content, &relationships, config, analysis);
        let spans = ChunkGenerator::generate(content, &boundaries, config.limits)?;
        let Optimized {
            mut chunks,
            relaxation,
        } = optimizer.optimize(content, &spans, &boundaries, &relationships, analysis, config)?;

        OverlapApplier::new(config.overlap_size).apply(&mut chunks);
        assessor.process(&mut chunks, analysis, |c| &content[c.span()]);

        let relationships_preserved = relationships
            .iter()
            .filter(|r| r.keep_together && chunks_touched(r, &chunks) <= r.max_separation)
            .count();
        Ok(Segmented {
            chunks,
            relationships_found: relationships.len(),
            relationships_preserved,
            boundaries_detected: boundaries.len().saturating_sub(2),
            initial_chunks: spans.len(),
            relaxation,
        })
    }

    fn fallback_chunks(&self, content: &str, config: &StrategyConfig, analysis: &StructureAnalysis) -> Vec<Chunk> {
        let mut chunks = FixedChunker::no_overlap(config.limits.target())
            .with_quality_score(self.config.quality.fallback_score)
            .chunk(content);
        for chunk in &mut chunks {
            chunk.contextual_info.document_type.clone_from(&analysis.document_type);
        }
        chunks
    }
}

impl Chunker for DocumentChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.chunk_document(Some(text), &Context::default()).chunks
    }

    fn estimate_chunks(&self, text_len: usize) -> usize {
        let target = Strategy::default().config().limits.target();
        text_len.div_ceil(target).max(usize::from(text_len > 0))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
