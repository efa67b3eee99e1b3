//! The interception pipeline: cache lookup, transform with retries, cache store.

pub mod hooks;
pub mod metrics;
pub mod monitor;
pub mod stats;

pub use hooks::{HookReport, Interceptor, InterceptorRegistry, RecoveryFn};
pub use metrics::PipelineMetrics;
pub use monitor::{HealthAlert, HealthMonitor};
pub use stats::StatsSnapshot;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Instant;

use crate::cache::{BoundedCache, fingerprint};
use crate::config::PipelineConfig;
use crate::encoding;
use crate::error::{ConfigError, PipelineError, TransformError, TransformErrorKind};
use crate::retry::{RetryOutcome, RetryingExecutor, panic_message};
use crate::scheduler::{BatchItem, BatchScheduler, PeriodicTask};
use crate::transform::{
    Dictionary, PassthroughReason, RecordTransformer, TextGate, TextPatterns, TransformKind,
    TransformOutput,
};

/// How a single input was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    CacheHit,
    Skipped(PassthroughReason),
    Transformed {
        kind: TransformKind,
        attempts: u32,
    },
    Fallback {
        error: TransformError,
        attempts: u32,
        recovered: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub text: String,
    pub resolution: Resolution,
}

struct PipelineInner {
    config: PipelineConfig,
    cache: BoundedCache,
    transformer: RecordTransformer,
    gate: TextGate,
    patterns: RwLock<Arc<TextPatterns>>,
    executor: RetryingExecutor,
    batch: BatchScheduler,
    metrics: Arc<PipelineMetrics>,
    active_hooks: Mutex<HashSet<String>>,
    recoveries: RwLock<HashMap<TransformErrorKind, RecoveryFn>>,
    tasks: Mutex<Vec<PeriodicTask>>,
    started_at: Instant,
}

/// Handle to a text interception pipeline. Clones share the same cache, counters and
/// periodic tasks.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Pipeline {
    pub fn new(config: PipelineConfig, dictionary: Dictionary) -> Result<Self, PipelineError> {
        config.validate()?;

        let metrics = Arc::new(PipelineMetrics::default());
        let inner = PipelineInner {
            cache: BoundedCache::new(config.cache_size)?,
            transformer: RecordTransformer::new(dictionary),
            gate: TextGate::from_config(&config),
            patterns: RwLock::new(Arc::new(TextPatterns::default())),
            executor: RetryingExecutor::new(config.max_attempts, metrics.clone()),
            batch: BatchScheduler::new(config.batch_size),
            metrics,
            active_hooks: Mutex::new(HashSet::new()),
            recoveries: RwLock::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            started_at: Instant::now(),
            config,
        };

        tracing::info!(
            entries = inner.transformer.dictionary().len(),
            cache_size = inner.config.cache_size,
            "Translation pipeline initialized"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &BoundedCache {
        &self.inner.cache
    }

    pub fn batch(&self) -> &BatchScheduler {
        &self.inner.batch
    }

    /// Transform one intercepted value. Never fails: the worst case is the input itself.
    pub fn transform(&self, raw: &str) -> String {
        self.process(raw).text
    }

    /// Same as [`Pipeline::transform`], also reporting which path produced the text.
    pub fn process(&self, raw: &str) -> Processed {
        let inner = &self.inner;
        inner.metrics.record_processed();

        if let Some(reason) = inner.gate.check(raw) {
            return Processed {
                text: raw.to_string(),
                resolution: Resolution::Skipped(reason),
            };
        }

        let key = fingerprint(raw, inner.config.cache_key, inner.config.cache_key_prefix_len);
        if let Some(cached) = inner.cache.get(&key) {
            inner.metrics.record_cache_hit();
            if cached != raw {
                inner.metrics.record_success();
            }
            return Processed {
                text: cached,
                resolution: Resolution::CacheHit,
            };
        }

        match inner.executor.execute(raw, |text| self.run_transform(text)) {
            RetryOutcome::Succeeded { output, attempts } => {
                let TransformOutput { text, kind } = output;

                if text != raw {
                    inner.metrics.record_success();
                    tracing::debug!(?kind, "Applied translation");
                    self.store(key, text.clone());
                }

                Processed {
                    text,
                    resolution: Resolution::Transformed { kind, attempts },
                }
            }
            RetryOutcome::ExhaustedFallback {
                fallback,
                attempts,
                last_error,
            } => {
                let recovery = self
                    .inner
                    .recoveries
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&last_error.kind())
                    .cloned();

                let (text, recovered) = match recovery {
                    Some(recover) => {
                        tracing::info!(kind = ?last_error.kind(), "Recovering from transform error");
                        match catch_unwind(AssertUnwindSafe(|| recover(&fallback))) {
                            Ok(recovered) => (recovered, true),
                            Err(payload) => {
                                tracing::error!(
                                    kind = ?last_error.kind(),
                                    "Error recovery method panicked: {}",
                                    panic_message(payload)
                                );
                                (fallback, false)
                            }
                        }
                    }
                    None => (fallback, false),
                };

                Processed {
                    text,
                    resolution: Resolution::Fallback {
                        error: last_error,
                        attempts,
                        recovered,
                    },
                }
            }
        }
    }

    /// Transform a raw byte buffer in place of its decoded text. Buffers that are not
    /// UTF-8/ASCII, or that nothing changed, come back as they are.
    pub fn transform_bytes<'a>(&self, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        let decoded = match encoding::decode(bytes) {
            Ok(decoded) => decoded,
            Err(fallback) => {
                tracing::debug!(?fallback, len = bytes.len(), "Passing through undecodable text");
                return Cow::Borrowed(bytes);
            }
        };

        let transformed = self.transform(decoded.text);
        if transformed == decoded.text {
            return Cow::Borrowed(bytes);
        }

        let mut out = Vec::with_capacity(decoded.bom.len() + transformed.len());
        out.extend_from_slice(decoded.bom);
        out.extend_from_slice(transformed.as_bytes());
        Cow::Owned(out)
    }

    fn run_transform(&self, text: &str) -> Result<TransformOutput, TransformError> {
        let patterns = self
            .inner
            .patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some((processed, pattern)) = patterns.apply(text)? {
            return Ok(TransformOutput {
                text: processed,
                kind: TransformKind::Pattern {
                    pattern: pattern.to_string(),
                },
            });
        }

        Ok(self.inner.transformer.transform(text))
    }

    fn store(&self, key: String, value: String) {
        if !self.inner.config.deferred_cache_writes {
            self.inner.cache.set(key, value);
            return;
        }

        let cache = self.inner.cache.clone();
        self.inner.batch.add(BatchItem::new("cache write", move || {
            cache.set(key, value);
            Ok(())
        }));
    }

    /// Queue a side effect on the pipeline's batch scheduler.
    pub fn defer(&self, item: BatchItem) {
        self.inner.batch.add(item);
    }

    /// Register a handler consulted before record substitution.
    pub fn add_text_pattern<F>(&self, pattern: &str, handler: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        let mut patterns = self
            .inner
            .patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut updated = TextPatterns::clone(&patterns);
        updated.add(pattern, handler)?;
        *patterns = Arc::new(updated);
        Ok(())
    }

    pub fn register_error_recovery<F>(&self, kind: TransformErrorKind, recovery: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.inner
            .recoveries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, Arc::new(recovery));
    }

    /// Install this pipeline's transform under each method name. Failures are reported per
    /// method and do not stop the remaining registrations.
    pub fn attach<R>(&self, registry: &mut R, methods: &[&str]) -> Vec<HookReport>
    where
        R: InterceptorRegistry + ?Sized,
    {
        methods
            .iter()
            .map(|&method| {
                let pipeline = self.clone();
                let interceptor: Interceptor = Arc::new(move |text: &str| pipeline.transform(text));

                match registry.register_interceptor(method, interceptor) {
                    Ok(()) => {
                        lock(&self.inner.active_hooks).insert(method.to_string());
                        tracing::info!("Successfully hooked method: {}", method);
                        HookReport::attached(method)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to hook method {}", method);
                        HookReport::failed(method, &e)
                    }
                }
            })
            .collect()
    }

    pub fn detach(&self, method: &str) -> bool {
        lock(&self.inner.active_hooks).remove(method)
    }

    /// Shrink the cache to the low watermark once it grows past the high watermark.
    /// Returns the number of evicted entries.
    pub fn cleanup(&self) -> usize {
        let cache = &self.inner.cache;
        let threshold = self.inner.config.cleanup_threshold();

        if cache.len() <= threshold {
            return 0;
        }

        tracing::info!("Performing cache cleanup...");
        let evicted = cache.shrink_to(self.inner.config.cleanup_target());
        tracing::info!("Cache cleaned up to {} entries", cache.len());
        evicted
    }

    pub fn stats(&self) -> StatsSnapshot {
        let metrics = &self.inner.metrics;

        StatsSnapshot {
            uptime_secs: self.inner.started_at.elapsed().as_secs(),
            total_processed: metrics.total_processed.load(Ordering::Relaxed),
            successful_transforms: metrics.successful_transforms.load(Ordering::Relaxed),
            failed_transforms: metrics.failed_transforms.load(Ordering::Relaxed),
            cache_hits: metrics.cache_hits.load(Ordering::Relaxed),
            retries: metrics.retries.load(Ordering::Relaxed),
            fallbacks: metrics.fallbacks.load(Ordering::Relaxed),
            success_rate: metrics.success_rate(),
            cache_hit_rate: metrics.cache_hit_rate(),
            active_hooks: lock(&self.inner.active_hooks).len(),
            error_recovery_methods: self
                .inner
                .recoveries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            batch_pending: self.inner.batch.pending(),
            cache: self.inner.cache.stats(),
        }
    }

    /// Spawn the cache cleanup, health monitor and batch flush tasks on the current tokio
    /// runtime.
    pub fn start(&self) -> Result<(), PipelineError> {
        let mut tasks = lock(&self.inner.tasks);
        if !tasks.is_empty() {
            return Err(PipelineError::AlreadyRunning);
        }

        let config = &self.inner.config;

        // Tasks hold weak handles so dropping the last Pipeline also cancels them
        let weak = Arc::downgrade(&self.inner);
        let cleanup = PeriodicTask::spawn("cache-cleanup", config.cleanup_interval(), move || {
            if let Some(pipeline) = upgrade(&weak) {
                pipeline.cleanup();
            }
        })?;

        let weak = Arc::downgrade(&self.inner);
        let mut monitor = HealthMonitor::new();
        let health = PeriodicTask::spawn("health-monitor", config.monitor_interval(), move || {
            if let Some(pipeline) = upgrade(&weak) {
                monitor.check(pipeline.stats());
            }
        })?;

        let batch = self.inner.batch.clone();
        let flush = PeriodicTask::spawn("batch-flush", config.batch_flush_interval(), move || {
            batch.flush();
        })?;

        *tasks = vec![cleanup, health, flush];
        tracing::info!("Started monitoring system");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !lock(&self.inner.tasks).is_empty()
    }

    /// Stop every periodic task and run whatever is still queued. No periodic callback
    /// runs after this returns.
    pub async fn stop(&self) {
        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        if tasks.is_empty() {
            return;
        }

        for task in tasks {
            task.stop().await;
        }

        let drained = self.inner.batch.drain();
        tracing::info!(drained, "Stopped monitoring system");
    }
}

fn upgrade(weak: &Weak<PipelineInner>) -> Option<Pipeline> {
    weak.upgrade().map(|inner| Pipeline { inner })
}
