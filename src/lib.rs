pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;

pub use analysis::channel::{Channel, GrayWeights};
pub use batch::{FileOutcome, ScanSummary, process_folder};
pub use config::{ClaheConfig, PipelineConfig, ThresholdMode, ThresholdRange};
pub use error::{Error, Result};
pub use models::{
    BoundingRegion, Contour, GradientSample, LevelFailure, ProcessedFileRecord, ProcessingReport,
};
pub use pipeline::{Pipeline, PipelineContext, PipelineData, PipelineStep, process_image};
