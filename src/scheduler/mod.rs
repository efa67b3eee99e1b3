pub mod batch;
pub mod periodic;

pub use batch::{BatchItem, BatchJob, BatchScheduler};
pub use periodic::PeriodicTask;
