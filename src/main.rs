use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use specimen_scan::{Channel, Pipeline, PipelineConfig, ThresholdMode, process_folder};

#[derive(Parser)]
#[command(name = "specimen-scan")]
#[command(about = "Threshold a specimen photograph at several levels and annotate the regions found")]
struct Cli {
    /// Image file, or a folder of images to process as one scan
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory receiving the mask and annotated images
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// JSON configuration file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lowest threshold level
    #[arg(long)]
    low: Option<i32>,

    /// Highest threshold level
    #[arg(long)]
    high: Option<i32>,

    /// Number of threshold levels (at least 2)
    #[arg(short = 'n', long)]
    levels: Option<usize>,

    /// Intensity plane: red, green, blue or gray
    #[arg(long)]
    channel: Option<String>,

    /// Fraction of each dimension kept by the center crop
    #[arg(long)]
    crop_ratio: Option<f64>,

    /// Gaussian kernel size of the detail enhancer (odd, >= 3)
    #[arg(long)]
    kernel: Option<u32>,

    /// Minimum enclosed contour area in pixels
    #[arg(long)]
    min_area: Option<f64>,

    /// Raise thresholds towards the image corners by this amount
    #[arg(long, value_name = "OFFSET")]
    radial_offset: Option<f32>,

    /// Save intermediate planes to directory (must be empty, single image only)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Images processed concurrently when INPUT is a folder
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(low) = self.low {
            config.threshold_range.low = low;
        }
        if let Some(high) = self.high {
            config.threshold_range.high = high;
        }
        if let Some(levels) = self.levels {
            config.levels = levels;
        }
        if let Some(channel) = &self.channel {
            config.channel = channel.parse::<Channel>()?;
        }
        if let Some(ratio) = self.crop_ratio {
            config.crop_ratio = ratio;
        }
        if let Some(kernel) = self.kernel {
            config.blur_kernel = kernel;
        }
        if let Some(min_area) = self.min_area {
            config.min_contour_area = min_area;
        }
        if let Some(edge_offset) = self.radial_offset {
            config.threshold_mode = ThresholdMode::Radial { edge_offset };
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = args.pipeline_config()?;
    if args.input.is_dir() && args.debug_out.is_some() {
        anyhow::bail!("--debug-out is only supported when INPUT is a single image");
    }
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    if args.input.is_dir() {
        let jobs = args.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let runtime = tokio::runtime::Runtime::new()?;
        let summary = runtime.block_on(process_folder(&args.input, &args.output, config, jobs))?;

        let manifest = args.output.join(format!("scan_{}.json", summary.scan_id));
        write_manifest(&summary, &manifest)?;

        let failed = summary.failed_files().count();
        if failed > 0 {
            log::warn!("{} of {} images failed", failed, summary.files.len());
        }
    } else {
        let mut pipeline = Pipeline::from_config(config)?;
        if let Some(debug_dir) = args.debug_out {
            pipeline = pipeline.with_debug(debug_dir)?;
        }
        let report = pipeline
            .process_image(&args.input, &args.output)
            .with_context(|| format!("Failed to process {}", args.input.display()))?;

        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let manifest = args.output.join(format!("{}_manifest.json", stem));
        write_manifest(&report, &manifest)?;

        for failure in &report.failures {
            log::warn!(
                "Level {} (threshold {}) was not written: {}",
                failure.level_index,
                failure.threshold,
                failure.message
            );
        }
    }

    Ok(())
}

/// Print the manifest as JSON and keep a copy next to the outputs
fn write_manifest<T: Serialize>(manifest: &T, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    println!("{}", json);
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest {}", path.display()))?;
    Ok(())
}
