use std::sync::Arc;

use regex::Regex;

use crate::error::{ConfigError, TransformError};

/// Handler run on content matching a registered pattern. An `Err` carries the reason the
/// handler gave up and is retried like any other transform failure.
pub type PatternHandler = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

#[derive(Clone)]
struct TextPattern {
    regex: Regex,
    handler: PatternHandler,
}

/// Ordered list of `(pattern, handler)` pairs consulted before record substitution.
#[derive(Clone, Default)]
pub struct TextPatterns {
    patterns: Vec<TextPattern>,
}

impl TextPatterns {
    pub fn add<F>(&mut self, pattern: &str, handler: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        self.patterns.push(TextPattern {
            regex,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Run handlers in registration order. The first matching handler whose output differs
    /// from `content` wins; `Ok(None)` means no handler changed anything.
    pub fn apply(&self, content: &str) -> Result<Option<(String, &str)>, TransformError> {
        for pattern in &self.patterns {
            if !pattern.regex.is_match(content) {
                continue;
            }

            let processed =
                (pattern.handler)(content).map_err(|reason| TransformError::Handler {
                    pattern: pattern.regex.as_str().to_string(),
                    reason,
                })?;

            if processed != content {
                return Ok(Some((processed, pattern.regex.as_str())));
            }
        }

        Ok(None)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
