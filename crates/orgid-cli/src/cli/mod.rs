use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{BatchArgs, EvalArgs, MatchArgs, ServeArgs};

#[derive(Debug, Parser)]
#[command(name = "orgid")]
#[command(about = "Resolve affiliation strings to research institutions", version)]
pub struct Cli {
    /// TOML config file; `ORGID_*` environment variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Institution CSV, overriding config and environment.
    #[arg(long, global = true)]
    pub institutions: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match one affiliation string.
    Match(MatchArgs),
    /// Match one affiliation string per input line.
    Batch(BatchArgs),
    /// Score a gold-standard dataset.
    Eval(EvalArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}
