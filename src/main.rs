mod logging;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calbuild_core::config::BuildConfig;
use calbuild_core::pipeline::Pipeline;
use calbuild_core::report::TracingReporter;
use clap::Parser;

use render::Render;

#[derive(Parser)]
#[command(name = "calbuild")]
#[command(
    about = "Merge JSON, YAML and .ics event files into events.json and calendar.ics"
)]
struct Cli {
    /// Config file (defaults to ./calbuild.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with event files (overrides source_dir)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Directory to write the artifacts to (overrides output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// IANA time zone for wall-clock times, e.g. "Europe/Berlin"
    #[arg(short, long)]
    timezone: Option<String>,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = load_config(&cli)?;
    let reporter = TracingReporter;
    tracing::debug!(?config, "Resolved configuration");
    let pipeline = Pipeline::new(config, &reporter).context("Invalid configuration")?;
    tracing::debug!(zone = %pipeline.zone(), "Using time zone");

    let summary = pipeline.run().await.context("Failed to write events feed")?;
    println!("{}", summary.render());

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BuildConfig> {
    let mut config = match cli.config {
        Some(ref path) => BuildConfig::load_from(path, true)?,
        None => BuildConfig::load()?,
    };

    if let Some(ref source) = cli.source {
        config.source_dir = source.clone();
    }
    if let Some(ref output) = cli.output {
        config.output_dir = output.clone();
    }
    if let Some(ref timezone) = cli.timezone {
        config.timezone = Some(timezone.clone());
    }

    Ok(config)
}
