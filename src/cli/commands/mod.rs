mod transform;
mod validate;

pub use transform::TransformCommand;
pub use validate::ValidateCommand;

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::ConfigError;

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    match path {
        Some(path) => PipelineConfig::load(path),
        None => Ok(PipelineConfig::default()),
    }
}
