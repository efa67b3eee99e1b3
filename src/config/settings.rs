use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::{
    BATCH_FLUSH_INTERVAL_MS, BATCH_SIZE, CACHE_KEY_PREFIX_LEN, CACHE_SIZE_LIMIT,
    CLEANUP_HIGH_WATERMARK, CLEANUP_INTERVAL_SECS, CLEANUP_LOW_WATERMARK, MAX_ATTEMPTS,
    MAX_TEXT_LENGTH, MIN_TEXT_LENGTH, MONITOR_INTERVAL_MS,
};
use crate::error::ConfigError;

/// How the cache fingerprints a raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    // First `cache_key_prefix_len` characters; distinct inputs sharing a prefix collide
    Prefix,

    // Whole input, exact but keeps a second copy of every cached input alive
    Content,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cache_size: usize,
    pub cache_key: KeyStrategy,
    pub cache_key_prefix_len: usize,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub deferred_cache_writes: bool,

    pub cleanup_interval_secs: u64,
    pub cleanup_high_watermark: f64,
    pub cleanup_low_watermark: f64,
    pub monitor_interval_ms: u64,
    pub batch_flush_interval_ms: u64,

    /// Inputs must start with this to be considered for transformation (e.g. `TEXT_ID`).
    pub required_prefix: Option<String>,
    pub min_text_length: usize,
    pub max_text_length: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_size: CACHE_SIZE_LIMIT,
            cache_key: KeyStrategy::Prefix,
            cache_key_prefix_len: CACHE_KEY_PREFIX_LEN,
            batch_size: BATCH_SIZE,
            max_attempts: MAX_ATTEMPTS,
            deferred_cache_writes: false,
            cleanup_interval_secs: CLEANUP_INTERVAL_SECS,
            cleanup_high_watermark: CLEANUP_HIGH_WATERMARK,
            cleanup_low_watermark: CLEANUP_LOW_WATERMARK,
            monitor_interval_ms: MONITOR_INTERVAL_MS,
            batch_flush_interval_ms: BATCH_FLUSH_INTERVAL_MS,
            required_prefix: None,
            min_text_length: MIN_TEXT_LENGTH,
            max_text_length: Some(MAX_TEXT_LENGTH),
        }
    }
}

impl PipelineConfig {
    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_size < 1 {
            return Err(ConfigError::InvalidCapacity(self.cache_size));
        }

        if self.batch_size < 1 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if self.max_attempts < 1 {
            return Err(ConfigError::InvalidAttempts);
        }

        if self.cache_key == KeyStrategy::Prefix && self.cache_key_prefix_len < 1 {
            return Err(ConfigError::InvalidKeyLength);
        }

        let (high, low) = (self.cleanup_high_watermark, self.cleanup_low_watermark);
        if !(0.0..=1.0).contains(&high) || !(0.0..=1.0).contains(&low) || low > high {
            return Err(ConfigError::InvalidWatermarks { high, low });
        }

        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval("cleanup_interval_secs"));
        }
        if self.monitor_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval("monitor_interval_ms"));
        }
        if self.batch_flush_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval("batch_flush_interval_ms"));
        }

        Ok(())
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn batch_flush_interval(&self) -> Duration {
        Duration::from_millis(self.batch_flush_interval_ms)
    }

    /// Occupancy above which the cleanup task shrinks the cache.
    pub fn cleanup_threshold(&self) -> usize {
        (self.cache_size as f64 * self.cleanup_high_watermark) as usize
    }

    /// Size the cleanup task shrinks the cache down to.
    pub fn cleanup_target(&self) -> usize {
        (self.cache_size as f64 * self.cleanup_low_watermark) as usize
    }
}
