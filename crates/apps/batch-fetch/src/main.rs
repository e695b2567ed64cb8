//! batch-fetch - fetch Gmail messages through the batch endpoint
//!
//! Runs the pipeline once for the given message IDs and prints the result
//! as JSON on stdout.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use gmail_batch::{BatchConfig, BatchFetcher, JobLabels, MessageQuery, UreqTransport};

#[derive(Parser)]
#[command(name = "batch-fetch")]
#[command(about = "Fetch Gmail messages in batches and print them as JSON", long_about = None)]
struct Cli {
    /// OAuth access token with gmail.readonly scope
    #[arg(long, env = "GMAIL_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Gmail message IDs to fetch
    ids: Vec<String>,

    /// File with one message ID per line
    #[arg(long)]
    ids_file: Option<PathBuf>,

    /// Batch config file (defaults to ~/.config/gmail-batch/batch.json)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    job_name: Option<String>,

    #[arg(long)]
    workspace_id: Option<String>,

    #[arg(long)]
    account_id: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();

    let batch_config = match &cli.config {
        Some(path) => BatchConfig::from_file(path)?,
        None => BatchConfig::load()?,
    };

    let ids = collect_ids(&cli)?;
    if ids.is_empty() {
        bail!("No message IDs given; pass them as arguments or with --ids-file");
    }

    let queries: Vec<MessageQuery> = ids.iter().map(|id| MessageQuery::raw_message(id)).collect();
    let labels = JobLabels {
        job_name: Some(cli.job_name.clone().unwrap_or_else(|| "batch-fetch".to_string())),
        workspace_id: cli.workspace_id.clone(),
        connected_account_id: cli.account_id.clone(),
    };

    info!(
        "Fetching {} messages from {}",
        queries.len(),
        batch_config.endpoint
    );

    let transport = UreqTransport::new(&batch_config);
    let fetcher = BatchFetcher::new(transport, batch_config);
    let result = fetcher
        .fetch_all_messages(&queries, &cli.token, &labels)
        .context("Batch fetch failed")?;

    info!(
        "Fetched {} messages with {} errors",
        result.messages.len(),
        result.errors.len()
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Message IDs from the command line and the IDs file, in that order
fn collect_ids(cli: &Cli) -> Result<Vec<String>> {
    let mut ids = cli.ids.clone();

    if let Some(path) = &cli.ids_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read IDs file: {}", path.display()))?;
        ids.extend(parse_ids(&content));
    }

    Ok(ids)
}

/// One ID per line; blank lines and `#` comments are skipped
fn parse_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let ids = parse_ids("18c1\n\n# comment\n  18c2  \n");
        assert_eq!(ids, vec!["18c1", "18c2"]);
    }

    #[test]
    fn test_cli_parses_ids_and_labels() {
        let cli = Cli::try_parse_from([
            "batch-fetch",
            "--token",
            "abc",
            "--job-name",
            "sync",
            "m1",
            "m2",
        ])
        .unwrap();
        assert_eq!(cli.token, "abc");
        assert_eq!(cli.ids, vec!["m1", "m2"]);
        assert_eq!(cli.job_name.as_deref(), Some("sync"));
    }
}
