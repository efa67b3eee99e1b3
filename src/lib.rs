pub mod cache;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod transform;

pub use cache::BoundedCache;
pub use config::PipelineConfig;
pub use pipeline::{Pipeline, Processed, Resolution};
pub use retry::{RetryOutcome, RetryingExecutor};
pub use scheduler::{BatchItem, BatchScheduler};
pub use transform::{Dictionary, RecordTransformer};
