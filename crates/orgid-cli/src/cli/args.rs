use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct MatchArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Read queries from this file instead of stdin. Blank lines are skipped.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Dataset tag to select from the gold standard.
    pub dataset: String,
    /// Gold-standard URL or local CSV path for this run only.
    #[arg(long, value_name = "URL_OR_PATH")]
    pub gold: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
}
