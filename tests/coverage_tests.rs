//! Coverage, overlap and caching tests.
//!
//! These tests verify that own spans cover the input, that overlap text
//! comes from neighbors without moving positions, and that the caches
//! behave under injected policies.

use strata::cache::{LruEviction, ResultCache};
use strata::{
    Chunk, ChunkCacheKey, Chunker, Context, DocumentChunker, EngineConfig, Error, FixedChunker,
    ProcessingOptions, StructureCacheKey,
};

// =============================================================================
// Helpers
// =============================================================================

fn uncached() -> DocumentChunker {
    DocumentChunker::new(EngineConfig::uncached()).expect("default config is valid")
}

/// Every non-whitespace byte of `text` lies in exactly one own span.
fn covers_once(chunks: &[Chunk], text: &str) -> bool {
    let mut owners = vec![0u8; text.len()];
    for chunk in chunks {
        for owner in &mut owners[chunk.span()] {
            *owner += 1;
        }
    }
    text.bytes()
        .zip(&owners)
        .all(|(b, &n)| if b.is_ascii_whitespace() { n <= 1 } else { n == 1 })
}

fn bounds_valid(chunks: &[Chunk], text: &str) -> bool {
    chunks
        .iter()
        .all(|c| c.start_position < c.end_position && c.end_position <= text.len())
}

/// Opt-in log output: `RUST_LOG=strata=debug cargo test -- --nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Coverage: own spans cover the entire input
// =============================================================================

#[test]
fn document_chunker_full_coverage() {
    init_tracing();
    let texts = [
        "Hello, world!".to_string(),
        "The quick brown fox jumps over the lazy dog.".to_string(),
        "A".repeat(3000),
        " Leading and trailing spaces ".to_string(),
        "Multiple\n\nParagraphs\n\nHere".to_string(),
        "Pack my box with five dozen liquor jugs. ".repeat(80),
        "# Guide\n\n## Setup\nInstall the tool.\n\n## Usage\nRun the tool.\n".repeat(30),
    ];

    for text in &texts {
        let result = uncached().chunk_document(Some(text), &Context::default());
        assert!(
            covers_once(&result.chunks, text),
            "coverage failed for: {:?}",
            &text[..text.len().min(50)]
        );
        assert!(bounds_valid(&result.chunks, text));
    }
}

#[test]
fn fixed_chunker_full_coverage() {
    for text in ["Hello, world!", "Multiple\n\nParagraphs\n\nHere", &"B".repeat(1000)] {
        let chunks = FixedChunker::no_overlap(50).chunk(text);
        assert!(covers_once(&chunks, text));
    }
}

// =============================================================================
// Overlap
// =============================================================================

#[test]
fn overlap_does_not_move_positions() {
    let text = "Pack my box with five dozen liquor jugs. ".repeat(80);
    let without = {
        let ctx = Context {
            processing_options: ProcessingOptions {
                overlap_size: Some(0),
                ..ProcessingOptions::default()
            },
            ..Context::default()
        };
        uncached().chunk_document(Some(&text), &ctx)
    };
    let with = uncached().chunk_document(Some(&text), &Context::default());

    let spans = |chunks: &[Chunk]| chunks.iter().map(Chunk::span).collect::<Vec<_>>();
    assert_eq!(spans(&without.chunks), spans(&with.chunks));
    assert!(without.chunks.iter().all(|c| !c.has_overlap()));
    assert!(with.chunks.iter().any(Chunk::has_overlap));
}

#[test]
fn overlap_text_comes_from_neighbors() {
    let text: String = (0..60)
        .map(|i| format!("Sentence {i} describes crate {i} of the shipment. "))
        .collect();
    let result = uncached().chunk_document(Some(&text), &Context::default());
    assert!(result.chunks.len() >= 2);

    for pair in result.chunks.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        let own_first = &text[first.span()];
        let own_second = &text[second.span()];

        let at = first.content.find(own_first).expect("own text present");
        let borrowed_after = first.content[at + own_first.len()..].trim_start();
        assert_eq!(first.has_overlap_after, !borrowed_after.is_empty());
        assert!(own_second.starts_with(borrowed_after));

        let at = second.content.find(own_second).expect("own text present");
        let borrowed_before = second.content[..at].trim_end();
        assert_eq!(second.has_overlap_before, !borrowed_before.is_empty());
        assert!(own_first.ends_with(borrowed_before));
    }
}

#[test]
fn fixed_chunker_overlap_property() {
    let text = "The quick brown fox jumps over the lazy dog. Pack my box.";

    for overlap in [0, 5, 10, 20] {
        let chunks = FixedChunker::new(30, overlap).chunk(text);
        for window in chunks.windows(2) {
            let (first, second) = (&window[0], &window[1]);
            if second.start_position < first.end_position {
                let actual = first.end_position - second.start_position;
                assert!(actual <= overlap, "overlap {actual} exceeds requested {overlap}");
            }
        }
    }
}

// =============================================================================
// Caching
// =============================================================================

#[test]
fn lru_policy_can_be_injected() {
    let config = EngineConfig {
        chunk_cache_capacity: 2,
        ..EngineConfig::default()
    };
    let chunker = DocumentChunker::with_eviction(
        config,
        Box::new(LruEviction::<ChunkCacheKey>::default()),
        Box::new(LruEviction::<StructureCacheKey>::default()),
    )
    .expect("valid config");

    let ctx = Context::default();
    let (a, b, c) = ("Alpha text here.", "Bravo text here.", "Charlie text here.");
    chunker.chunk_document(Some(a), &ctx);
    chunker.chunk_document(Some(b), &ctx);
    chunker.chunk_document(Some(a), &ctx); // hit; `a` becomes most recent
    chunker.chunk_document(Some(c), &ctx); // evicts `b`
    chunker.chunk_document(Some(a), &ctx); // hit

    let stats = chunker.chunk_cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.len, 2);
}

#[test]
fn structure_cache_is_shared_across_strategies() {
    let chunker = DocumentChunker::default();
    let text = "# Notes\n\nSome text under a heading.";
    chunker.chunk_document(Some(text), &Context::default());
    chunker.chunk_document(Some(text), &Context::with_strategy("simple"));

    let stats = chunker.structure_cache_stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[test]
fn clear_caches_resets_counters() {
    let chunker = DocumentChunker::default();
    chunker.chunk_document(Some("Cached once."), &Context::default());
    chunker.clear_caches();

    let stats = chunker.chunk_cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.len), (0, 0, 0));
    assert_eq!(chunker.structure_cache_stats().len, 0);
}

#[test]
fn result_cache_generic_use() {
    let mut cache: ResultCache<u32, String> = ResultCache::new(1);
    cache.insert(1, "one".into());
    cache.insert(2, "two".into());
    assert!(cache.get(&1).is_none());
    assert_eq!(cache.get(&2).as_deref(), Some("two"));
    assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn config_from_partial_json() {
    let config = EngineConfig::from_json(
        r#"{"chunk_cache_capacity": 5, "quality": {"domain_keywords": ["widget"]}}"#,
    )
    .expect("valid json");
    assert_eq!(config.chunk_cache_capacity, 5);
    assert_eq!(config.quality.domain_keywords, vec!["widget".to_string()]);
    assert_eq!(config.target_quality_score, 0.7);
}

#[test]
fn config_errors_are_typed() {
    assert!(matches!(EngineConfig::from_json("{not json"), Err(Error::ConfigParse(_))));
    assert!(matches!(
        EngineConfig::from_json(r#"{"target_quality_score": 1.5}"#),
        Err(Error::InvalidConfig(_))
    ));
}

// =============================================================================
// Edge cases
// =============================================================================

#[test]
fn chunker_handles_only_whitespace() {
    let text = "   \n\n\t\t  ";
    assert!(uncached().chunk(text).is_empty());
    assert!(FixedChunker::new(50, 10).chunk(text).is_empty());
}

#[test]
fn chunker_handles_mixed_scripts() {
    let text = "Grüße aus Köln. 東京は大きい都市です。 Привет, мир! ".repeat(50);
    let result = uncached().chunk_document(Some(&text), &Context::default());
    assert!(covers_once(&result.chunks, &text));
    for chunk in &result.chunks {
        assert!(text.is_char_boundary(chunk.start_position));
        assert!(text.is_char_boundary(chunk.end_position));
    }
}

#[test]
fn invalid_override_is_ignored() {
    let text = "Pack my box with five dozen liquor jugs. ".repeat(40);
    let ctx = Context {
        processing_options: ProcessingOptions {
            min_size: Some(10_000),
            ..ProcessingOptions::default()
        },
        ..Context::default()
    };
    let overridden = uncached().chunk_document(Some(&text), &ctx);
    let plain = uncached().chunk_document(Some(&text), &Context::default());
    assert_eq!(overridden.chunks, plain.chunks);
}
