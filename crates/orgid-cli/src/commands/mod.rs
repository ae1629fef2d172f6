use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use orgid_core::{AppConfig, GoldStandardSource, OrgId};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Cli, Commands, EvalArgs, ServeArgs};

const DEFAULT_LOG_FILTER: &str = "info";

/// Logs go to stderr so stdout stays pure JSON.
pub(crate) fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();
}

pub(crate) fn run(cli: Cli) -> Result<()> {
    let mut config = resolve_config(&cli)?;

    match cli.command {
        Commands::Match(args) => {
            let orgid = boot(&config)?;
            print_json(&orgid.match_query(&args.query))?;
        }
        Commands::Batch(args) => {
            let queries = read_queries(&args)?;
            let orgid = boot(&config)?;
            print_json(&orgid.match_batch(&queries))?;
        }
        Commands::Eval(args) => {
            let orgid = boot(&config)?;
            print_json(&run_eval(&orgid, &config, &args)?)?;
        }
        Commands::Serve(args) => {
            apply_serve_overrides(&mut config, args);
            let orgid = boot(&config)?;
            orgid_web::serve_web(orgid, &config.server.host, config.server.port)?;
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("failed to load config {}", path.display()),
        None => "failed to load config from environment".to_string(),
    })?;
    if let Some(path) = &cli.institutions {
        config.institutions_path.clone_from(path);
    }
    Ok(config)
}

fn apply_serve_overrides(config: &mut AppConfig, args: ServeArgs) {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
}

fn boot(config: &AppConfig) -> Result<OrgId> {
    OrgId::open(config).with_context(|| {
        format!(
            "failed to boot from institution source {}",
            config.institutions_path.display()
        )
    })
}

fn run_eval(
    orgid: &OrgId,
    config: &AppConfig,
    args: &EvalArgs,
) -> Result<orgid_core::models::EvalReport> {
    let report = match args.gold.as_deref() {
        Some(location) => {
            let source = GoldStandardSource::new(location, &config.gold_standard)
                .with_context(|| format!("invalid gold standard location {location}"))?;
            orgid.run_eval_from(&source, &args.dataset)?
        }
        None => orgid.run_eval(&args.dataset)?,
    };
    info!(
        dataset = %report.dataset,
        run_id = %report.run_id,
        passing = report.metrics.passing,
        total = report.metrics.total,
        "evaluation finished"
    );
    Ok(report)
}

fn read_queries(args: &BatchArgs) -> Result<Vec<String>> {
    let raw = match args.file.as_deref() {
        Some(path) => read_file(path)?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut raw)
                .context("failed to read queries from stdin")?;
            raw
        }
    };
    Ok(parse_query_lines(&raw))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_query_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
