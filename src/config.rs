use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::channel::{Channel, GrayWeights};
use crate::error::{Error, Result};

/// Inclusive threshold range sampled by the multi-level thresholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub low: i32,
    pub high: i32,
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self { low: 100, high: 170 }
    }
}

/// How a level's threshold is applied across the plane.
///
/// `Uniform` compares every pixel against the level value. `Radial` raises the
/// threshold linearly with the distance from the plane center, reaching
/// `value + edge_offset` at the corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ThresholdMode {
    #[default]
    Uniform,
    Radial { edge_offset: f32 },
}

/// Adaptive histogram equalization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheConfig {
    pub clip_limit: f32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl Default for ClaheConfig {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles_x: 8,
            tiles_y: 8,
        }
    }
}

/// Full configuration of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub threshold_range: ThresholdRange,
    pub levels: usize,
    pub channel: Channel,
    pub gray_weights: GrayWeights,
    pub clahe: ClaheConfig,
    /// Gaussian kernel size used by the detail enhancer (odd, >= 3)
    pub blur_kernel: u32,
    pub crop_ratio: f64,
    /// Contours must enclose strictly more than this area to be kept
    pub min_contour_area: f64,
    pub padding: u32,
    pub threshold_mode: ThresholdMode,
    pub line_thickness: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_range: ThresholdRange::default(),
            levels: 5,
            channel: Channel::Gray,
            gray_weights: GrayWeights::default(),
            clahe: ClaheConfig::default(),
            blur_kernel: 33,
            crop_ratio: 0.70,
            min_contour_area: 10_000.0,
            padding: 10,
            threshold_mode: ThresholdMode::Uniform,
            line_thickness: 2,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Check every configuration constraint. Called before any image is loaded.
    pub fn validate(&self) -> Result<()> {
        let ThresholdRange { low, high } = self.threshold_range;
        if low >= high {
            return Err(Error::InvalidThresholdRange { low, high });
        }
        if self.levels < 2 {
            return Err(Error::InvalidLevelCount(self.levels));
        }
        if !(self.crop_ratio > 0.0 && self.crop_ratio <= 1.0) {
            return Err(Error::InvalidCropRatio(self.crop_ratio));
        }
        if self.blur_kernel < 3 || self.blur_kernel % 2 == 0 {
            return Err(Error::InvalidKernelSize(self.blur_kernel));
        }
        if self.clahe.tiles_x == 0 || self.clahe.tiles_y == 0 {
            return Err(Error::InvalidTileGrid(self.clahe.tiles_x, self.clahe.tiles_y));
        }
        if !self.clahe.clip_limit.is_finite() || self.clahe.clip_limit < 0.0 {
            return Err(Error::InvalidClipLimit(self.clahe.clip_limit));
        }
        if let ThresholdMode::Radial { edge_offset } = self.threshold_mode {
            if !edge_offset.is_finite() {
                return Err(Error::Config(format!(
                    "radial edge offset must be finite, got {}",
                    edge_offset
                )));
            }
        }
        Ok(())
    }
}
