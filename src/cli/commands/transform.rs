use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::load_config;
use crate::{
    cli::types::LogArgs,
    logging::configure_global_tracing,
    pipeline::Pipeline,
    transform::Dictionary,
};

#[derive(Parser, Debug)]
#[command(about = "Run intercepted text through the translation pipeline")]
pub struct TransformCommand {
    #[arg(
        short,
        long,
        help = "Dictionary file (.json or .toml) mapping identifiers to replacement text"
    )]
    pub dictionary: PathBuf,

    #[arg(short, long, help = "Pipeline configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(help = "Files to transform, each treated as one intercepted text (stdin if none)")]
    pub inputs: Vec<PathBuf>,

    #[arg(
        short,
        long,
        conflicts_with = "output_dir",
        help = "Write the result to this file instead of stdout (single input only)"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Write one result per input into this directory, keeping file names")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Override the cache capacity")]
    pub cache_size: Option<usize>,

    #[arg(long, help = "Override the number of transform attempts per text")]
    pub max_attempts: Option<u32>,

    #[arg(long, help = "Only transform texts starting with this prefix")]
    pub required_prefix: Option<String>,

    #[command(flatten)]
    pub logging: LogArgs,
}

impl TransformCommand {
    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let _guard = configure_global_tracing(self.logging.to_config())?;

        let mut config = load_config(self.config.as_deref())?;
        if let Some(cache_size) = self.cache_size {
            config.cache_size = cache_size;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(prefix) = &self.required_prefix {
            config.required_prefix = Some(prefix.clone());
        }

        let destinations = self.destinations()?;
        let dictionary = Dictionary::load(&self.dictionary)?;
        let pipeline = Pipeline::new(config, dictionary)?;
        pipeline.start()?;

        let mut results = Vec::with_capacity(destinations.len());
        if self.inputs.is_empty() {
            let mut raw = Vec::new();
            tokio::io::stdin().read_to_end(&mut raw).await?;
            results.push(pipeline.transform_bytes(&raw).into_owned());
        } else {
            for input in &self.inputs {
                let raw = tokio::fs::read(input).await?;
                tracing::debug!(path = %input.display(), len = raw.len(), "Transforming input");
                results.push(pipeline.transform_bytes(&raw).into_owned());
            }
        }

        pipeline.stop().await;

        if let Some(dir) = &self.output_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        for (destination, output) in destinations.iter().zip(&results) {
            match destination {
                Destination::File(path) => tokio::fs::write(path, output).await?,
                Destination::Stdout => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(output).await?;
                    stdout.flush().await?;
                }
            }
        }

        eprintln!("{}", serde_json::to_string_pretty(&pipeline.stats())?);
        Ok(())
    }

    /// Where each result goes, in input order. Several inputs are never written into one
    /// stream: they need `--output-dir`.
    fn destinations(&self) -> Result<Vec<Destination>, String> {
        let Some(dir) = &self.output_dir else {
            if self.inputs.len() > 1 {
                return Err(format!(
                    "{} input files given; use --output-dir to write one result per input",
                    self.inputs.len()
                ));
            }

            return Ok(vec![match &self.output {
                Some(path) => Destination::File(path.clone()),
                None => Destination::Stdout,
            }]);
        };

        if self.inputs.is_empty() {
            return Err("--output-dir needs at least one input file".to_string());
        }

        let mut seen = HashSet::new();
        self.inputs
            .iter()
            .map(|input| {
                let name = input
                    .file_name()
                    .ok_or_else(|| format!("input {} has no file name", input.display()))?;
                if !seen.insert(name) {
                    return Err(format!(
                        "two inputs share the file name {:?} and would overwrite each other",
                        name
                    ));
                }
                Ok(Destination::File(dir.join(name)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn parse(args: &[&str]) -> TransformCommand {
        let cli = Cli::try_parse_from(
            ["text-interceptor", "transform", "--dictionary", "dict.json"]
                .iter()
                .chain(args),
        )
        .unwrap();

        match cli.command {
            Commands::Transform(cmd) => cmd,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn single_input_goes_to_output_file() {
        let cmd = parse(&["a.txt", "--output", "out.txt"]);
        assert_eq!(
            cmd.destinations().unwrap(),
            vec![Destination::File(PathBuf::from("out.txt"))]
        );
    }

    #[test]
    fn stdin_goes_to_stdout() {
        assert_eq!(parse(&[]).destinations().unwrap(), vec![Destination::Stdout]);
    }

    #[test]
    fn several_inputs_require_output_dir() {
        assert!(parse(&["a.txt", "b.txt"]).destinations().is_err());
        assert!(parse(&["a.txt", "b.txt", "--output", "out.txt"]).destinations().is_err());

        let cmd = parse(&["in/a.txt", "in/b.txt", "--output-dir", "out"]);
        assert_eq!(
            cmd.destinations().unwrap(),
            vec![
                Destination::File(PathBuf::from("out/a.txt")),
                Destination::File(PathBuf::from("out/b.txt")),
            ]
        );
    }

    #[test]
    fn output_dir_rejects_clashing_names() {
        let cmd = parse(&["one/a.txt", "two/a.txt", "--output-dir", "out"]);
        assert!(cmd.destinations().is_err());
    }

    #[test]
    fn output_and_output_dir_conflict() {
        let result = Cli::try_parse_from([
            "text-interceptor",
            "transform",
            "--dictionary",
            "dict.json",
            "--output",
            "out.txt",
            "--output-dir",
            "out",
        ]);
        assert!(result.is_err());
    }
}
