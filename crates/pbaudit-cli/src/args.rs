use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "pbaudit",
    version,
    about = "Heuristic QA audit for PBIP projects"
)]
pub struct Args {
    /// Path to the PBIP project folder or .pbip manifest file
    pub project: PathBuf,

    /// Output format for stdout
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Directory to write inventory/signals/findings artifacts
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Run AI summarization (requires OPENAI_API_KEY)
    #[arg(long)]
    pub ai: bool,

    /// Optional git commit hash for tool metadata
    #[arg(long)]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
