//! Time-lapse Stabilization CLI
//!
//! Reads a multi-page TIFF, removes rigid frame-to-frame motion and writes
//! the stabilized stack next to the input as `<stem>_fixed.tif`.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use timelapse_stabilizer::{
    config::StabilizerConfig,
    metrics::{MetricsRegistry, MetricsSnapshot},
    pipeline::{StabilizationReport, Stabilizer},
    stack::{output_path_for, read_tiff_stack, write_tiff_stack},
    StabilizeError,
};
use tracing::{error, info};

/// Stabilize a time-lapse TIFF stack against rigid motion.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Multi-page grayscale TIFF to stabilize.
    input: PathBuf,

    /// Output path (default: `<input stem>_fixed.tif` next to the input).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Register every N-th frame.
    #[arg(long, value_name = "N")]
    sampling_rate: Option<usize>,

    /// Median filter half-width in frames.
    #[arg(long, value_name = "N")]
    smoothing_width: Option<usize>,

    /// First frame to process.
    #[arg(long, value_name = "N")]
    start_frame: Option<usize>,

    /// One past the last frame to process.
    #[arg(long, value_name = "N")]
    end_frame: Option<usize>,

    /// Estimate translation only.
    #[arg(long)]
    no_rotation: bool,

    /// Write a TOML run report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Write Prometheus text-format metrics to this path.
    #[arg(long, value_name = "PATH")]
    metrics_out: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<StabilizerConfig, StabilizeError> {
        let mut config = match &self.config {
            Some(path) => StabilizerConfig::from_file(path)?,
            None => StabilizerConfig::default(),
        };

        if let Some(rate) = self.sampling_rate {
            config.sampling.rate = rate;
        }
        if let Some(width) = self.smoothing_width {
            config.smoothing.width = width;
        }
        if self.start_frame.is_some() {
            config.range.start_frame = self.start_frame;
        }
        if self.end_frame.is_some() {
            config.range.end_frame = self.end_frame;
        }
        if self.no_rotation {
            config.registration.estimate_rotation = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Time-lapse stabilizer v{}", timelapse_stabilizer::VERSION);

    if let Err(e) = run(&cli) {
        match e.downcast_ref::<StabilizeError>() {
            Some(err) => error!(stage = %err.stage(), frame = ?err.frame_index(), "{err}"),
            None => error!("{e}"),
        }
        let mut source = e.source();
        while let Some(cause) = source {
            error!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.load_config()?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| output_path_for(&cli.input));

    let stack = read_tiff_stack(&cli.input).map_err(StabilizeError::from)?;
    info!(
        frames = stack.len(),
        width = stack.geometry().width,
        height = stack.geometry().height,
        "Loaded stack"
    );

    let stabilizer = Stabilizer::from_config(config.clone())?;
    let result = stabilizer.run(&stack)?;

    // Render everything before touching the filesystem
    let report = match &cli.report {
        Some(path) => {
            let report = StabilizationReport::from_run(&result, &config)
                .with_paths(&cli.input, &output_path);
            Some((path, report.to_toml_string().map_err(StabilizeError::from)?))
        }
        None => None,
    };
    let metrics = match &cli.metrics_out {
        Some(path) => {
            let registry = MetricsRegistry::new()?;
            registry.update(&MetricsSnapshot::from_run(&result));
            Some((path, registry.encode()?))
        }
        None => None,
    };

    write_tiff_stack(&output_path, &result.output).map_err(StabilizeError::from)?;

    if let Some((path, text)) = report {
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Wrote run report");
    }
    if let Some((path, text)) = metrics {
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Wrote metrics");
    }

    info!(
        output = %output_path.display(),
        max_angle = result.estimate.smoothed.max_abs_angle(),
        max_translation = result.estimate.smoothed.max_translation(),
        "Done"
    );

    Ok(())
}
