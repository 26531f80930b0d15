use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use pipeline_infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "glyphtrace-ingest")]
#[command(about = "Glyphtrace telemetry ingestion worker", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("GLYPHTRACE_CONFIG", config);
    }

    let config = AppConfig::load().await?;
    let _guard = init_tracing(&config.log_format);
    match &config.loaded_from {
        Some(path) => info!("configuration loaded from {}", path),
        None => warn!("config file not found, using defaults"),
    }

    pipeline_bootstrap::run_standalone(config).await
}

fn init_tracing(log_format: &str) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    if log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    guard
}
