use std::path::PathBuf;

/// Fatal errors surfaced by the scan pipeline.
///
/// Per-level write failures are not represented here; they are collected in
/// [`crate::models::ProcessingReport::failures`] and never abort a run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input image could not be opened or decoded.
    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Unknown channel selector.
    #[error("Invalid channel '{0}', expected one of red, green, blue, gray")]
    InvalidChannel(String),

    /// Crop ratio outside of (0, 1].
    #[error("Invalid crop ratio {0}, expected a value in (0, 1]")]
    InvalidCropRatio(f64),

    /// Blur kernel that is even or smaller than 3.
    #[error("Invalid blur kernel size {0}, expected an odd value >= 3")]
    InvalidKernelSize(u32),

    /// Fewer than two threshold levels requested.
    #[error("Invalid threshold level count {0}, at least 2 levels are required")]
    InvalidLevelCount(usize),

    /// Threshold range with `low >= high`.
    #[error("Invalid threshold range [{low}, {high}], expected low < high")]
    InvalidThresholdRange { low: i32, high: i32 },

    /// CLAHE tile grid with a zero dimension.
    #[error("Invalid tile grid {0}x{1}, both dimensions must be positive")]
    InvalidTileGrid(u32, u32),

    /// CLAHE clip limit that is negative or not finite.
    #[error("Invalid clip limit {0}, expected a finite non-negative value")]
    InvalidClipLimit(f32),

    /// Configuration file could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Output directory could not be created.
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by the configuration rather than the input data.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidChannel(_)
                | Error::InvalidCropRatio(_)
                | Error::InvalidKernelSize(_)
                | Error::InvalidLevelCount(_)
                | Error::InvalidThresholdRange { .. }
                | Error::InvalidTileGrid(..)
                | Error::InvalidClipLimit(_)
                | Error::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
