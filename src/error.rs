//! Error types for strata.
//!
//! None of these escape [`DocumentChunker::chunk_document`](crate::DocumentChunker::chunk_document):
//! each stage error is converted into its degraded result there. They are
//! visible to callers that drive individual stages directly.

/// Errors that can occur inside the chunking pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A structural pattern failed to compile or match.
    #[error("structure analysis failed: {0}")]
    StructureAnalysis(String),

    /// Chunk generation or optimization could not produce valid chunks.
    #[error("chunking failed: {0}")]
    Chunking(String),

    /// A quality score could not be computed.
    #[error("quality assessment failed: {0}")]
    QualityAssessment(String),

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A regular expression failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl Error {
    /// Create a chunking error.
    pub fn chunking(msg: impl Into<String>) -> Self {
        Self::Chunking(msg.into())
    }

    /// Create an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a quality assessment error.
    pub fn quality(msg: impl Into<String>) -> Self {
        Self::QualityAssessment(msg.into())
    }
}

/// Result type for strata operations.
pub type Result<T> = std::result::Result<T, Error>;
