pub mod constants;
pub mod settings;

pub use settings::{KeyStrategy, PipelineConfig};
