use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use echo_telemetry::batch::run_batch;
use echo_telemetry::config::{PipelineConfig, UploadConfig};
use echo_telemetry::data::filter::LowPass;
use echo_telemetry::discover::discover;
use echo_telemetry::logging;
use echo_telemetry::render::Renderer;
use echo_telemetry::storage::{upload_artifacts, LocalFolderStorage};

#[derive(Parser)]
#[command(name = "echo-telemetry")]
#[command(about = "Post-test telemetry alignment, filtering and plotting")]
#[command(version)]
struct Cli {
    /// Folder to search for CSV recordings and videos
    #[arg(short = 'p', long)]
    path: PathBuf,

    /// Show every plot in a window before saving it
    #[arg(short, long, conflicts_with = "automatic")]
    interactive: bool,

    /// Save plots without showing them (default)
    #[arg(short, long)]
    automatic: bool,

    /// Log debug-level detail
    #[arg(short, long)]
    verbose: bool,

    /// Also append log lines to FILE (default: ./echo.log)
    #[arg(short, long, value_name = "FILE", num_args = 0..=1, default_missing_value = "echo.log")]
    log: Option<PathBuf>,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder for generated PDFs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Explicit T0 in seconds (ignores any marker file)
    #[arg(long, allow_negative_numbers = true)]
    t0: Option<f64>,

    /// Only show (-TRIM, TRIM) seconds around T0
    #[arg(long)]
    trim: Option<f64>,

    /// Butterworth low-pass order
    #[arg(long)]
    order: Option<usize>,

    /// Butterworth cutoff as a fraction of the Nyquist frequency
    #[arg(long)]
    cutoff: Option<f64>,

    /// Moving-average window length in samples
    #[arg(long)]
    interval: Option<usize>,

    /// Extra overlay plot, as comma-separated series names (repeatable)
    #[arg(long, value_name = "A,B,...")]
    overlay: Vec<String>,

    /// Copy finished plots and videos into this directory
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Folder name created inside the upload directory
    #[arg(long)]
    upload_folder: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log.as_deref())?;

    if !cli.path.is_dir() {
        bail!(
            "{} does not exist, is not a directory, or is not readable",
            cli.path.display()
        );
    }

    let config = build_config(&cli)?;
    std::fs::create_dir_all(&config.output_folder)
        .with_context(|| format!("creating {}", config.output_folder.display()))?;

    log::info!("Welcome to Echo.");
    log::debug!("Configuration: {config:?}");

    let found = discover(&cli.path)?;
    log::info!(
        "Found {} CSV files and {} videos in {}",
        found.data_files.len(),
        found.video_files.len(),
        cli.path.display()
    );

    let renderer = Renderer::new(&config.output_folder, config.interactive);
    let report = run_batch(&config, &found.data_files, &renderer);

    if let Some(upload) = &config.upload {
        let folder = upload
            .folder_name
            .clone()
            .unwrap_or_else(|| default_folder_name(&cli.path));
        let mut artifacts = Vec::new();
        for path in report.outputs.iter().chain(&found.video_files) {
            if !artifacts.contains(path) {
                artifacts.push(path.clone());
            }
        }

        let mut store = LocalFolderStorage::new(&upload.destination);
        let summary = upload_artifacts(&mut store, &folder, &artifacts);
        log::info!(
            "Uploaded {} files, {} failed",
            summary.uploaded.len(),
            summary.failed.len()
        );
    }

    if report.outputs.is_empty() && !report.failures.is_empty() {
        bail!("no plots were produced ({} items failed)", report.failures.len());
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if cli.interactive {
        config.interactive = true;
    }
    if cli.automatic {
        config.interactive = false;
    }
    if let Some(output) = &cli.output {
        config.output_folder = output.clone();
    }
    if cli.t0.is_some() {
        config.t0_override = cli.t0;
    }
    if cli.trim.is_some() {
        config.trim = cli.trim;
    }
    if cli.interval.is_some() {
        config.smoothing_interval = cli.interval;
    }

    config.lowpass = match (cli.order, cli.cutoff, config.lowpass) {
        (None, None, existing) => existing,
        (Some(order), Some(cutoff), _) => Some(LowPass { order, cutoff }),
        (Some(order), None, Some(lp)) => Some(LowPass { order, ..lp }),
        (None, Some(cutoff), Some(lp)) => Some(LowPass { cutoff, ..lp }),
        _ => bail!("--order and --cutoff must be given together"),
    };

    for group in &cli.overlay {
        let names: Vec<String> = group
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        if !names.is_empty() {
            config.overlays.push(names);
        }
    }

    if let Some(destination) = &cli.upload_dir {
        config.upload = Some(UploadConfig {
            destination: destination.clone(),
            folder_name: cli.upload_folder.clone(),
        });
    } else if let (Some(upload), Some(name)) = (config.upload.as_mut(), &cli.upload_folder) {
        upload.folder_name = Some(name.clone());
    }

    config.validate()?;
    Ok(config)
}

fn default_folder_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "echo".to_string())
}
