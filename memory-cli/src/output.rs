//! Structured one-line success/failure summaries for every subcommand.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable summary line.
    Human,
    /// A single JSON object.
    Json,
}

/// Render a result to stdout in the requested format. `human` builds the
/// one-line summary; `data` is what gets serialized for `--format json`.
pub fn print_result<T: Serialize>(format: OutputFormat, data: &T, human: impl FnOnce(&T) -> String) {
    match format {
        OutputFormat::Human => println!("{}", human(data)),
        OutputFormat::Json => match serde_json::to_string(data) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize output: {e}"),
        },
    }
}
