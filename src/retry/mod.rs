//! Bounded, immediate retries around a fallible transform.
//!
//! Transforms are pure and in-memory, so a failure is retried straight away without
//! backoff. Once every attempt failed the caller gets the original input back; nothing
//! is ever raised past the executor.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::TransformError;
use crate::pipeline::PipelineMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Succeeded {
        output: T,
        attempts: u32,
    },
    ExhaustedFallback {
        fallback: String,
        attempts: u32,
        last_error: TransformError,
    },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. }
            | RetryOutcome::ExhaustedFallback { attempts, .. } => *attempts,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryOutcome::ExhaustedFallback { .. })
    }
}

impl RetryOutcome<String> {
    /// Usable text in every state: the transform output or the untouched input.
    pub fn into_output(self) -> String {
        match self {
            RetryOutcome::Succeeded { output, .. } => output,
            RetryOutcome::ExhaustedFallback { fallback, .. } => fallback,
        }
    }
}

#[derive(Clone)]
pub struct RetryingExecutor {
    max_attempts: u32,
    metrics: Arc<PipelineMetrics>,
}

impl RetryingExecutor {
    pub fn new(max_attempts: u32, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            metrics,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Call `f(input)` at most `max_attempts` times.
    ///
    /// Every failed attempt, whether an `Err` or a panic, bumps the failure counter. When
    /// the last attempt fails the counter is bumped once more for the exhaustion itself and
    /// the original `input` is handed back as the fallback.
    pub fn execute<T, F>(&self, input: &str, mut f: F) -> RetryOutcome<T>
    where
        F: FnMut(&str) -> Result<T, TransformError>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                self.metrics.record_retry();
                tracing::debug!(attempt = attempt + 1, "Retrying text processing");
            }

            let result = catch_unwind(AssertUnwindSafe(|| f(input)))
                .unwrap_or_else(|payload| Err(TransformError::Panicked(panic_message(payload))));

            match result {
                Ok(output) => {
                    return RetryOutcome::Succeeded {
                        output,
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    self.metrics.record_failure();
                    tracing::warn!(
                        error = %e,
                        "Error processing text (attempt {} of {})",
                        attempt + 1,
                        self.max_attempts
                    );
                    last_error = Some(e);
                }
            }
        }

        self.metrics.record_failure();
        self.metrics.record_fallback();
        tracing::warn!(
            "Max attempts ({}) reached, returning original text",
            self.max_attempts
        );

        RetryOutcome::ExhaustedFallback {
            fallback: input.to_string(),
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or(TransformError::Panicked(
                "no attempt was made".to_string(),
            )),
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
