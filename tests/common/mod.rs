#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from specimen_scan for tests
pub use specimen_scan::{
    BoundingRegion, Channel, Error, GradientSample, Pipeline, PipelineConfig, ProcessedFileRecord,
    ProcessingReport, ThresholdMode, ThresholdRange,
};

/// Configuration of the documented end-to-end scenario: gray, [100, 170], 3 levels.
pub fn three_level_config() -> PipelineConfig {
    PipelineConfig {
        threshold_range: ThresholdRange { low: 100, high: 170 },
        levels: 3,
        channel: Channel::Gray,
        ..PipelineConfig::default()
    }
}
