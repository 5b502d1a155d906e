mod aggregate;
mod carriers;
mod rate;

use std::io::Read;
use std::path::Path;

use freightline_core::RatingConfig;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// What a command hands back to `main` for rendering.
pub struct CommandOutcome {
    pub body: Value,
    /// Some carriers failed while others answered.
    pub partial_failure: bool,
}

impl CommandOutcome {
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            partial_failure: false,
        }
    }

    pub fn with_partial_failure(mut self, partial_failure: bool) -> Self {
        self.partial_failure = partial_failure;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutcome, CliError> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Rate(args) => rate::run(args, config).await,
        Command::Aggregate(args) => aggregate::run(args, config).await,
        Command::Carriers(args) => carriers::run(args, &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<RatingConfig, CliError> {
    let config = match path {
        Some(path) => RatingConfig::from_path(path)?.with_env_overrides()?,
        None => RatingConfig::from_env()?,
    };
    Ok(config)
}

/// Reads a JSON request document from `path`, or from stdin when `path` is `-`.
fn read_request(path: &Path) -> Result<Value, CliError> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };

    parse_request(&raw)
}

fn parse_request(raw: &str) -> Result<Value, CliError> {
    if raw.trim().is_empty() {
        return Err(CliError::Request(String::from("document is empty")));
    }
    serde_json::from_str(raw).map_err(|error| CliError::Request(error.to_string()))
}
