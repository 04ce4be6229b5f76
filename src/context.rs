//! Caller context and its resolved form.
//!
//! [`Context`] is what a caller may supply; every field is optional.
//! [`ResolvedContext`] is computed once per call and is the only thing the
//! pipeline stages read, so an invalid override is reported in one place.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::structure::{SectionType, StructureAnalysis};
use crate::{Strategy, StrategyChoice, StrategyConfig};

/// Semantic hints from an upstream classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticHints {
    /// Dominant content type, a [`SectionType`] name such as `"procedural"`.
    /// Chunks that classify as `general` take this type instead.
    pub primary_type: Option<String>,
}

/// Per-call overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Strategy name; unknown names select `simple`.
    pub strategy: Option<String>,
    /// Target chunk size in bytes.
    pub target_size: Option<usize>,
    /// Maximum chunk size in bytes.
    pub max_size: Option<usize>,
    /// Minimum chunk size in bytes.
    pub min_size: Option<usize>,
    /// Overlap budget in bytes.
    pub overlap_size: Option<usize>,
    /// Enhancement threshold in [0, 1].
    pub target_quality_score: Option<f64>,
}

/// Everything a caller can tell the chunker about a document.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Document type label carried into chunk metadata.
    pub document_type: Option<String>,
    /// A precomputed analysis; skips structure detection when present.
    pub structure: Option<StructureAnalysis>,
    /// Upstream semantic hints.
    pub semantics: Option<SemanticHints>,
    /// Per-call overrides.
    pub processing_options: ProcessingOptions,
}

impl Context {
    /// Context with a document type.
    #[must_use]
    pub fn with_document_type(document_type: impl Into<String>) -> Self {
        Self {
            document_type: Some(document_type.into()),
            ..Self::default()
        }
    }

    /// Context forcing a strategy by name.
    #[must_use]
    pub fn with_strategy(strategy: impl Into<String>) -> Self {
        Self {
            processing_options: ProcessingOptions {
                strategy: Some(strategy.into()),
                ..ProcessingOptions::default()
            },
            ..Self::default()
        }
    }
}

/// The flat part of the context that can change a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKeyContext {
    /// Document type.
    pub document_type: Option<String>,
    /// Semantic primary type.
    pub semantic_type: Option<String>,
    /// Size overrides as given.
    pub target_size: Option<usize>,
    /// Size overrides as given.
    pub max_size: Option<usize>,
    /// Size overrides as given.
    pub min_size: Option<usize>,
    /// Overlap override as given.
    pub overlap_size: Option<usize>,
    /// Quality threshold bits.
    pub target_quality_bits: u64,
    /// Whether the caller supplied its own analysis.
    pub supplied_structure: bool,
}

/// A [`Context`] resolved against the engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    /// Requested strategy.
    pub choice: StrategyChoice,
    /// Document type.
    pub document_type: Option<String>,
    /// Semantic primary type as given.
    pub semantic_type: Option<String>,
    /// `semantic_type` parsed; `None` when absent or unknown.
    pub semantic_hint: Option<SectionType>,
    /// Enhancement threshold.
    pub target_quality_score: f64,
    options: ProcessingOptions,
    supplied_structure: bool,
}

impl ResolvedContext {
    /// Resolve `ctx`. Invalid values are logged and ignored.
    #[must_use]
    pub fn resolve(ctx: &Context, config: &EngineConfig) -> Self {
        let options = &ctx.processing_options;
        let choice = match options.strategy.as_deref() {
            None => StrategyChoice::Auto,
            Some(name) => name.parse::<Strategy>().map_or_else(
                |_| StrategyChoice::Unknown(name.to_string()),
                StrategyChoice::Explicit,
            ),
        };
        let target_quality_score = match options.target_quality_score {
            Some(score) if (0.0..=1.0).contains(&score) => score,
            Some(score) => {
                tracing::warn!(score, "ignoring target_quality_score outside [0, 1]");
                config.target_quality_score
            }
            None => config.target_quality_score,
        };
        let semantic_type = ctx.semantics.as_ref().and_then(|s| s.primary_type.clone());
        let semantic_hint = semantic_type.as_deref().and_then(|name| match name.parse::<SectionType>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring semantic primary type");
                None
            }
        });
        Self {
            choice,
            document_type: ctx
                .document_type
                .clone()
                .or_else(|| ctx.structure.as_ref().and_then(|s| s.document_type.clone())),
            semantic_type,
            semantic_hint,
            target_quality_score,
            options: options.clone(),
            supplied_structure: ctx.structure.is_some(),
        }
    }

    /// The strategy's configuration with size and overlap overrides applied.
    #[must_use]
    pub fn strategy_config(&self, strategy: Strategy) -> StrategyConfig {
        let base = strategy.config();
        let o = &self.options;
        let config = match base.limits.with_overrides(o.min_size, o.target_size, o.max_size) {
            Ok(limits) => base.with_limits(limits),
            Err(e) => {
                tracing::warn!(error = %e, strategy = %strategy, "ignoring size overrides");
                base
            }
        };
        match o.overlap_size {
            Some(overlap) if overlap < config.limits.max() => config.with_overlap(overlap),
            Some(overlap) => {
                tracing::warn!(overlap, "ignoring overlap_size not below max size");
                config
            }
            None => config,
        }
    }

    /// The cache key for this context.
    #[must_use]
    pub fn cache_key_context(&self) -> CacheKeyContext {
        CacheKeyContext {
            document_type: self.document_type.clone(),
            semantic_type: self.semantic_type.clone(),
            target_size: self.options.target_size,
            max_size: self.options.max_size,
            min_size: self.options.min_size,
            overlap_size: self.options.overlap_size,
            target_quality_bits: self.target_quality_score.to_bits(),
            supplied_structure: self.supplied_structure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(ctx: &Context) -> ResolvedContext {
        ResolvedContext::resolve(ctx, &EngineConfig::default())
    }

    #[test]
    fn test_default_context() {
        let resolved = resolve(&Context::default());
        assert_eq!(resolved.choice, StrategyChoice::Auto);
        assert_eq!(resolved.target_quality_score, 0.7);
        assert_eq!(
            resolved.strategy_config(Strategy::Simple),
            Strategy::Simple.config()
        );
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            resolve(&Context::with_strategy("qa_pair_preserving")).choice,
            StrategyChoice::Explicit(Strategy::QaPairPreserving)
        );
        assert_eq!(
            resolve(&Context::with_strategy("nonsense")).choice,
            StrategyChoice::Unknown("nonsense".into())
        );
    }

    #[test]
    fn test_size_overrides() {
        let ctx = Context {
            processing_options: ProcessingOptions {
                target_size: Some(400),
                max_size: Some(600),
                overlap_size: Some(0),
                ..ProcessingOptions::default()
            },
            ..Context::default()
        };
        let config = resolve(&ctx).strategy_config(Strategy::SemanticAdaptive);
        assert_eq!(config.limits.target(), 400);
        assert_eq!(config.limits.max(), 600);
        assert_eq!(config.limits.min(), 200);
        assert_eq!(config.overlap_size, 0);
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let ctx = Context {
            processing_options: ProcessingOptions {
                min_size: Some(5000),
                overlap_size: Some(100_000),
                target_quality_score: Some(3.0),
                ..ProcessingOptions::default()
            },
            ..Context::default()
        };
        let resolved = resolve(&ctx);
        assert_eq!(resolved.target_quality_score, 0.7);
        assert_eq!(
            resolved.strategy_config(Strategy::Simple),
            Strategy::Simple.config()
        );
    }

    #[test]
    fn test_semantic_hint_parsed() {
        let hinted = |name: &str| Context {
            semantics: Some(SemanticHints {
                primary_type: Some(name.into()),
            }),
            ..Context::default()
        };
        assert_eq!(resolve(&hinted("procedural")).semantic_hint, Some(SectionType::Procedural));
        let unknown = resolve(&hinted("poetry"));
        assert_eq!(unknown.semantic_hint, None);
        assert_eq!(unknown.semantic_type.as_deref(), Some("poetry"));
        assert_eq!(resolve(&Context::default()).semantic_hint, None);
    }

    #[test]
    fn test_cache_key_tracks_overrides() {
        let plain = resolve(&Context::default()).cache_key_context();
        let typed = resolve(&Context::with_document_type("manual")).cache_key_context();
        assert_ne!(plain, typed);
        assert_eq!(plain, resolve(&Context::default()).cache_key_context());
    }
}
