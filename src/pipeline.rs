use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ColorType, DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage};
use log::{debug, info, warn};

use crate::analysis::annotate::{AnnotatedLevel, RegionAnnotator};
use crate::analysis::crop::crop_center;
use crate::analysis::steps::*;
use crate::analysis::threshold::{MultiLevelThresholder, ThresholdLevel};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::models::{LevelFailure, ProcessedFileRecord, ProcessingReport};

/// Data that flows through the preprocessing steps
#[derive(Clone)]
pub struct PipelineData {
    /// Current working image (color before channel selection, a single plane after)
    pub image: DynamicImage,

    /// The decoded input, shared by all steps
    pub original: Arc<RgbImage>,
}

impl PipelineData {
    pub fn from_image(image: RgbImage) -> Self {
        let original = Arc::new(image);
        Self {
            image: DynamicImage::ImageRgb8(original.as_ref().clone()),
            original,
        }
    }

    /// Replace the working image, keeping the shared original
    pub fn with_image(self, image: DynamicImage) -> Self {
        Self {
            image,
            original: self.original,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Directory receiving one image per preprocessing step
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// One preprocessing stage of the analysis plane
pub trait PipelineStep: Send + Sync {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name, also used for debug file names
    fn name(&self) -> &str;
}

/// Preprocessing chain plus the per-level threshold/annotate loop
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
    config: PipelineConfig,
    thresholder: MultiLevelThresholder,
    annotator: RegionAnnotator,
}

impl Pipeline {
    /// Build the standard pipeline. Fails if the configuration is invalid.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let thresholder = MultiLevelThresholder::from_config(&config)?;
        let annotator = RegionAnnotator::new(config.padding, config.line_thickness);

        let steps: Vec<Arc<dyn PipelineStep>> = vec![
            Arc::new(ChannelSelectionStep {
                channel: config.channel,
                weights: config.gray_weights,
            }),
            Arc::new(BrightnessNormalizationStep {
                clahe: config.clahe,
            }),
            Arc::new(DetailEnhancementStep {
                kernel_size: config.blur_kernel,
            }),
            Arc::new(CenterCropStep {
                ratio: config.crop_ratio,
            }),
        ];

        Ok(Self {
            steps,
            context: PipelineContext::default(),
            config,
            thresholder,
            annotator,
        })
    }

    /// Enable debug dumps of every preprocessing step.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(Error::Config(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        self.context.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Run channel selection, normalization, enhancement and cropping.
    /// Returns the cropped analysis plane.
    pub fn prepare(&self, input: RgbImage) -> Result<GrayImage> {
        let mut data = PipelineData::from_image(input);
        self.save_debug(0, "input", &data.image);

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!("Running step: {}", step.name());
            data = step.process(data, &self.context)?;
            self.save_debug(step_idx + 1, step.name(), &data.image);
        }

        Ok(data.image.to_luma8())
    }

    /// Threshold the analysis plane at every level and annotate each level on
    /// a copy of `color`, which must already be cropped like the plane.
    pub fn analyze<'a>(
        &'a self,
        plane: &'a GrayImage,
        color: &'a RgbImage,
    ) -> impl Iterator<Item = (ThresholdLevel, AnnotatedLevel)> + 'a {
        self.thresholder.levels(plane).map(move |level| {
            let annotated = self.annotator.annotate(color, plane, &level.contours);
            (level, annotated)
        })
    }

    /// Run the whole pipeline on one image file and write two images per level
    /// into `output_dir`.
    ///
    /// Decoding failures abort without output. A level whose images cannot be
    /// written is reported in [`ProcessingReport::failures`] and the remaining
    /// levels still run. An input too small to leave a non-empty center crop
    /// yields an empty report.
    pub fn process_image<P, Q>(&self, image_path: P, output_dir: Q) -> Result<ProcessingReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let image_path = image_path.as_ref();
        let output_dir = output_dir.as_ref();

        info!("Loading image: {}", image_path.display());
        let input = load_image(image_path)?;
        debug!("Image loaded: {}x{}", input.width(), input.height());

        std::fs::create_dir_all(output_dir).map_err(|source| Error::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let color = crop_center(&input, self.config.crop_ratio)?;
        let plane = self.prepare(input)?;
        if plane.width() == 0 || plane.height() == 0 {
            warn!(
                "Center crop of {} is empty, nothing to threshold",
                image_path.display()
            );
            return Ok(ProcessingReport::default());
        }

        let names = OutputNames::new(image_path);
        let mut report = ProcessingReport::default();
        let mut seen = HashSet::new();

        for (level, annotated) in self.analyze(&plane, &color) {
            let threshold = level.threshold_int();
            if !seen.insert(threshold) {
                warn!(
                    "Level {} truncates to threshold {} like an earlier level, its files overwrite the earlier ones",
                    level.index, threshold
                );
            }
            info!(
                "Threshold {:.2}: {} contours retained",
                level.value,
                level.contours.len()
            );

            let mask_name = names.mask(threshold);
            let annotated_name = names.annotated(threshold);
            let written = save_output(DynamicImage::ImageLuma8(level.mask), output_dir, &mask_name)
                .and_then(|()| {
                    save_output(
                        DynamicImage::ImageRgb8(annotated.image),
                        output_dir,
                        &annotated_name,
                    )
                });

            match written {
                Ok(()) => report.records.push(ProcessedFileRecord {
                    original: names.original.clone(),
                    threshold,
                    threshold_image: mask_name,
                    contour_image: annotated_name,
                    gradients: annotated.gradients,
                }),
                Err((path, message)) => {
                    warn!("Failed to write level {} output {}: {}", level.index, path.display(), message);
                    report.failures.push(LevelFailure {
                        level_index: level.index,
                        threshold,
                        path,
                        message,
                    });
                }
            }
        }

        info!(
            "Processed {}: {} records, {} failed levels",
            image_path.display(),
            report.records.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn save_debug(&self, index: usize, name: &str, image: &DynamicImage) {
        let Some(debug_config) = &self.context.debug else {
            return;
        };
        let filename = format!("{:02}_{}.png", index, name.to_lowercase().replace(' ', "_"));
        let path = debug_config.output_dir.join(&filename);
        match image.save(&path) {
            Ok(()) => debug!("Debug: saved {}", filename),
            Err(e) => warn!("Failed to save debug image {}: {}", path.display(), e),
        }
    }
}

/// Validate `config`, then run the standard pipeline on one image.
pub fn process_image<P, Q>(image_path: P, output_dir: Q, config: &PipelineConfig) -> Result<ProcessingReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Pipeline::from_config(config.clone())?.process_image(image_path, output_dir)
}

/// Decode an image file into 8-bit RGB
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let to_load_error = |source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)
        .map_err(|e| to_load_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| to_load_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_load_error)?;
    Ok(img.to_rgb8())
}

/// File names of the two outputs of a level, derived from the input name
struct OutputNames {
    original: String,
    stem: String,
    extension: String,
}

impl OutputNames {
    fn new(image_path: &Path) -> Self {
        let original = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = image_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| ".png".to_string());
        Self {
            original,
            stem,
            extension,
        }
    }

    fn mask(&self, threshold: i32) -> String {
        format!("{}_threshold_{}{}", self.stem, threshold, self.extension)
    }

    fn annotated(&self, threshold: i32) -> String {
        format!("{}_contours_{}{}", self.stem, threshold, self.extension)
    }
}

/// Write `image` under `dir`, converting to RGB when the format chosen by the
/// extension cannot store a single gray channel.
fn save_output(image: DynamicImage, dir: &Path, name: &str) -> std::result::Result<(), (PathBuf, String)> {
    let path = dir.join(name);
    let image = match ImageFormat::from_path(&path) {
        Ok(ImageFormat::Gif) if image.color() != ColorType::Rgb8 => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        _ => image,
    };
    image.save(&path).map_err(|e| (path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_follow_input_name() {
        let names = OutputNames::new(Path::new("/uploads/scan_01.jpg"));
        assert_eq!(names.original, "scan_01.jpg");
        assert_eq!(names.mask(135), "scan_01_threshold_135.jpg");
        assert_eq!(names.annotated(100), "scan_01_contours_100.jpg");
    }

    #[test]
    fn output_names_default_to_png() {
        let names = OutputNames::new(Path::new("specimen"));
        assert_eq!(names.mask(7), "specimen_threshold_7.png");
    }
}
