//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```rust
//! use strata::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{"target_quality_score": 0.6}"#).unwrap();
//! assert_eq!(config.target_quality_score, 0.6);
//! assert_eq!(config.chunk_cache_capacity, 200);
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level configuration for [`DocumentChunker`](crate::DocumentChunker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunks scoring below this are passed through the enhancer.
    pub target_quality_score: f64,
    /// Capacity of the chunking result cache.
    pub chunk_cache_capacity: usize,
    /// Capacity of the structure analysis cache.
    pub structure_cache_capacity: usize,
    /// How far (bytes) a split point may move to reach a sentence start.
    pub snap_tolerance: usize,
    /// Quality scoring constants.
    pub quality: QualityConfig,
    /// Structure analysis settings.
    pub structure: StructureConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_quality_score: 0.7,
            chunk_cache_capacity: 200,
            structure_cache_capacity: 1000,
            snap_tolerance: 80,
            quality: QualityConfig::default(),
            structure: StructureConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration with caching disabled, for tests and one-shot runs.
    pub fn uncached() -> Self {
        Self {
            chunk_cache_capacity: 0,
            structure_cache_capacity: 0,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for malformed JSON and
    /// [`Error::InvalidConfig`] when validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.target_quality_score) {
            return Err(Error::invalid_config(format!(
                "target_quality_score ({}) must be within [0, 1]",
                self.target_quality_score
            )));
        }
        self.quality.validate()?;
        if self.structure.custom_heading_level == 0 {
            return Err(Error::invalid_config("custom_heading_level must be >= 1"));
        }
        Ok(())
    }
}

/// Constants used by [`QualityAssessor`](crate::QualityAssessor).
///
/// The defaults reproduce the usual ordering of chunks (complete beats
/// truncated, coherent beats scattered); only their relative effect is
/// meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Weight of the completeness factor.
    pub completeness_weight: f64,
    /// Weight of the coherence factor.
    pub coherence_weight: f64,
    /// Weight of the context factor.
    pub context_weight: f64,
    /// Weight of the readability factor.
    pub readability_weight: f64,
    /// Starting value for completeness and coherence.
    pub base_score: f64,
    /// Completeness bonus for ending on a full sentence.
    pub sentence_bonus: f64,
    /// Completeness bonus for an unbroken step sequence.
    pub steps_bonus: f64,
    /// Completeness bonus for intact definitions.
    pub definition_bonus: f64,
    /// Coherence bonus for a repetition ratio inside the sweet spot.
    pub repetition_bonus: f64,
    /// Coherence bonus for a repetition ratio near the sweet spot.
    pub near_repetition_bonus: f64,
    /// Coherence bonus for transition words.
    pub transition_bonus: f64,
    /// Score bump for domain vocabulary during enhancement.
    pub domain_bonus: f64,
    /// Score used when assessment fails.
    pub default_score: f64,
    /// Score given to fallback chunks.
    pub fallback_score: f64,
    /// Keywords that mark domain-relevant text.
    pub domain_keywords: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            completeness_weight: 0.30,
            coherence_weight: 0.25,
            context_weight: 0.25,
            readability_weight: 0.20,
            base_score: 0.3,
            sentence_bonus: 0.3,
            steps_bonus: 0.2,
            definition_bonus: 0.2,
            repetition_bonus: 0.4,
            near_repetition_bonus: 0.2,
            transition_bonus: 0.3,
            domain_bonus: 0.05,
            default_score: 0.5,
            fallback_score: 0.3,
            domain_keywords: [
                "install", "configure", "configuration", "deploy", "api", "database", "error",
                "security", "server", "network", "authentication", "performance",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

impl QualityConfig {
    /// Validate configuration.
    ///
    /// Non-finite weights are left for the assessor to report, so that a
    /// misconfigured score degrades a chunk instead of rejecting the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for negative weights or default
    /// scores outside [0, 1].
    pub fn validate(&self) -> Result<()> {
        let weights = [
            self.completeness_weight,
            self.coherence_weight,
            self.context_weight,
            self.readability_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(Error::invalid_config("quality weights must be >= 0"));
        }
        for (name, score) in [
            ("default_score", self.default_score),
            ("fallback_score", self.fallback_score),
        ] {
            if !(0.0..=1.0).contains(&score) {
                return Err(Error::invalid_config(format!("{name} ({score}) must be within [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Settings for [`StructureAnalyzer`](crate::StructureAnalyzer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Extra heading regexes; capture group 1 is the heading text.
    pub custom_heading_patterns: Vec<String>,
    /// Level assigned to custom headings.
    pub custom_heading_level: u8,
    /// Minimum section body length in bytes.
    pub min_section_length: usize,
    /// Minimum section body word count.
    pub min_section_words: usize,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            custom_heading_patterns: Vec::new(),
            custom_heading_level: 2,
            min_section_length: 20,
            min_section_words: 5,
        }
    }
}
