use thiserror::Error;

/// Rejected pipeline configuration. Raised at construction time, never from the hot path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cache capacity must be at least 1 (got {0})")]
    InvalidCapacity(usize),

    #[error("batch size must be at least 1 (got {0})")]
    InvalidBatchSize(usize),

    #[error("max attempts must be at least 1")]
    InvalidAttempts,

    #[error("cache key prefix length must be at least 1")]
    InvalidKeyLength,

    #[error("cleanup watermarks must satisfy 0 <= low <= high <= 1 (high {high}, low {low})")]
    InvalidWatermarks { high: f64, low: f64 },

    #[error("interval `{0}` must be greater than zero")]
    InvalidInterval(&'static str),

    #[error("invalid text pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("dictionary identifiers must be non-empty")]
    EmptyIdentifier,

    #[error("unsupported dictionary format `{0}` (expected .json or .toml)")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON dictionary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML dictionary: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure raised while transforming a single input. Always recovered by the retry executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("pattern handler `{pattern}` failed: {reason}")]
    Handler { pattern: String, reason: String },

    #[error("transform panicked: {0}")]
    Panicked(String),
}

impl TransformError {
    pub fn kind(&self) -> TransformErrorKind {
        match self {
            TransformError::Handler { .. } => TransformErrorKind::Handler,
            TransformError::Panicked(_) => TransformErrorKind::Panicked,
        }
    }
}

/// Discriminant of [`TransformError`], used to key error recovery methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformErrorKind {
    Handler,
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("target method `{0}` not found")]
    NotFound(String),

    #[error("hook `{name}` rejected: {reason}")]
    Rejected { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("periodic tasks must be started inside a tokio runtime")]
    NoRuntime,

    #[error("periodic tasks are already running")]
    AlreadyRunning,
}
