use std::path::PathBuf;

use clap::Parser;
use resay_engine::{ConfigLoader, CorrectionProcessor};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod repl;

#[derive(Parser)]
#[command(
    name = "resay",
    version,
    about = "Chat-line correction bot: sed-style s/// and y/// over recent messages"
)]
struct Args {
    /// Config file (defaults to ./resay.yaml, then ~/.resay/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transcript file to replay instead of reading stdin
    #[arg(long)]
    file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the channel announcements.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };
    info!(
        history_capacity = config.history_capacity,
        deadline_ms = config.deadline_ms,
        workers = config.workers,
        "starting correction engine"
    );

    let processor = CorrectionProcessor::new(&config);

    if let Some(path) = args.file {
        repl::run_file(&processor, &path).await
    } else {
        repl::run_repl(&processor).await
    }
}
