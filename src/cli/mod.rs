mod commands;
pub mod types;

pub use commands::{TransformCommand, ValidateCommand};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "text-interceptor",
    version = env!("CARGO_PKG_VERSION"),
    author = "dosquisd",
    about = "Rewrite intercepted game text records through a translation dictionary",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Transform(TransformCommand),
    Validate(ValidateCommand),
}

impl Commands {
    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self {
            Commands::Transform(cmd) => cmd.execute().await,
            Commands::Validate(cmd) => cmd.execute().await,
        }
    }
}
