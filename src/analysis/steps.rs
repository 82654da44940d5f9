use image::DynamicImage;

use crate::analysis::channel::{Channel, GrayWeights, select_channel};
use crate::analysis::crop::crop_center;
use crate::analysis::enhance::enhance_detail;
use crate::analysis::equalize::equalize_brightness;
use crate::config::ClaheConfig;
use crate::error::Result;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};

/// Extract the configured intensity plane from the original color image
pub struct ChannelSelectionStep {
    pub channel: Channel,
    pub weights: GrayWeights,
}

impl PipelineStep for ChannelSelectionStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let plane = select_channel(&data.original, self.channel, self.weights);
        Ok(data.with_image(DynamicImage::ImageLuma8(plane)))
    }

    fn name(&self) -> &str {
        "Channel Selection"
    }
}

/// Adaptive local histogram equalization
pub struct BrightnessNormalizationStep {
    pub clahe: ClaheConfig,
}

impl PipelineStep for BrightnessNormalizationStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let plane = data.image.to_luma8();
        let equalized = equalize_brightness(&plane, &self.clahe);
        Ok(data.with_image(DynamicImage::ImageLuma8(equalized)))
    }

    fn name(&self) -> &str {
        "Brightness Normalization"
    }
}

/// Unsharp-style detail enhancement with a large Gaussian kernel
pub struct DetailEnhancementStep {
    pub kernel_size: u32,
}

impl PipelineStep for DetailEnhancementStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let plane = data.image.to_luma8();
        let enhanced = enhance_detail(&plane, self.kernel_size)?;
        Ok(data.with_image(DynamicImage::ImageLuma8(enhanced)))
    }

    fn name(&self) -> &str {
        "Detail Enhancement"
    }
}

/// Keep only the centered region of the plane
pub struct CenterCropStep {
    pub ratio: f64,
}

impl PipelineStep for CenterCropStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let plane = data.image.to_luma8();
        let cropped = crop_center(&plane, self.ratio)?;
        Ok(data.with_image(DynamicImage::ImageLuma8(cropped)))
    }

    fn name(&self) -> &str {
        "Center Crop"
    }
}
