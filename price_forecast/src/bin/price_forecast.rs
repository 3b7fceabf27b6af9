use anyhow::{Context, Result};
use clap::Parser;
use price_forecast::config::PipelineConfig;
use price_forecast::forecast::Horizon;
use price_forecast::pipeline::TrainingPipeline;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "price_forecast",
    about = "Train a price model on wide CSV tables and forecast each region",
    version
)]
struct Cli {
    /// Source CSV files, later files override earlier ones
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Days to forecast (1-180)
    #[arg(long, default_value_t = Horizon::MAX)]
    horizon: u32,

    /// Forecast a single region
    #[arg(short, long)]
    region: Option<String>,

    /// Forecast CSV destination, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the trained artifacts as JSON
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();

    info!(version = price_forecast::VERSION, "starting");

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let horizon = Horizon::new(cli.horizon)?;

    let pipeline = TrainingPipeline::new(config.clone())?;
    let mut artifacts = pipeline.run_files(&cli.files, config.random_forest())?;
    info!(
        rmse = artifacts.metrics.rmse,
        mape = artifacts.metrics.mape,
        regions = artifacts.regions().len(),
        "evaluation"
    );

    let forecast = if cli.region.is_none() && horizon.days() == config.default_horizon {
        artifacts.forecast.clone()
    } else {
        artifacts.forecast(horizon, cli.region.as_deref())?
    };

    if let Some(path) = &cli.artifacts {
        artifacts
            .save_json(path)
            .with_context(|| format!("failed to write artifacts {}", path.display()))?;
    }

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);
    for point in forecast.points() {
        writer.serialize(point)?;
    }
    writer.flush()?;

    info!(points = forecast.len(), "forecast written");
    Ok(())
}
