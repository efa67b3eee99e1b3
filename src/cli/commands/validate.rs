use std::path::PathBuf;

use clap::Parser;

use super::load_config;
use crate::{
    cli::types::LogArgs, config::KeyStrategy, logging::configure_global_tracing,
    transform::Dictionary,
};

#[derive(Parser, Debug)]
#[command(about = "Check a dictionary and pipeline configuration without running anything")]
pub struct ValidateCommand {
    #[arg(short, long, help = "Dictionary file (.json or .toml)")]
    pub dictionary: PathBuf,

    #[arg(short, long, help = "Pipeline configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LogArgs,
}

impl ValidateCommand {
    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let _guard = configure_global_tracing(self.logging.to_config())?;

        let config = load_config(self.config.as_deref())?;
        config.validate()?;
        let dictionary = Dictionary::load(&self.dictionary)?;

        println!();
        println!("Configuration:");
        println!("  → Cache Size: {}", config.cache_size);
        println!(
            "  → Cache Key: {}",
            match config.cache_key {
                KeyStrategy::Prefix => format!("first {} chars", config.cache_key_prefix_len),
                KeyStrategy::Content => "full content".to_string(),
            }
        );
        println!("  → Batch Size: {}", config.batch_size);
        println!("  → Max Attempts: {}", config.max_attempts);
        println!(
            "  → Cleanup: every {}s above {} entries, down to {}",
            config.cleanup_interval_secs,
            config.cleanup_threshold(),
            config.cleanup_target()
        );
        if let Some(prefix) = &config.required_prefix {
            println!("  → Required Prefix: {}", prefix);
        }
        println!();
        println!("Dictionary:");
        println!("  → File: {}", self.dictionary.display());
        println!("  → Entries: {}", dictionary.len());
        println!();

        if dictionary.is_empty() {
            tracing::warn!("Dictionary is empty; every record will pass through unchanged");
        }

        Ok(())
    }
}
