use super::PassthroughReason;
use crate::config::PipelineConfig;

/// Cheap checks deciding whether an input is worth parsing at all.
#[derive(Debug, Clone, Default)]
pub struct TextGate {
    required_prefix: Option<String>,
    min_length: usize,
    max_length: Option<usize>,
}

impl TextGate {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            required_prefix: config.required_prefix.clone(),
            min_length: config.min_text_length,
            max_length: config.max_text_length,
        }
    }

    pub fn check(&self, text: &str) -> Option<PassthroughReason> {
        if text.chars().take(self.min_length).count() < self.min_length {
            return Some(PassthroughReason::TooShort);
        }
        // Byte length bounds the char count from above
        if let Some(max) = self.max_length {
            if text.len() > max && text.chars().count() > max {
                return Some(PassthroughReason::TooLong);
            }
        }

        if let Some(prefix) = &self.required_prefix {
            if !text.starts_with(prefix.as_str()) {
                return Some(PassthroughReason::MissingPrefix);
            }
        }

        None
    }
}
