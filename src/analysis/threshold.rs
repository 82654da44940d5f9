use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

use crate::config::{PipelineConfig, ThresholdMode, ThresholdRange};
use crate::error::{Error, Result};
use crate::models::Contour;

/// Output of thresholding the analysis plane at one level
#[derive(Debug, Clone)]
pub struct ThresholdLevel {
    pub index: usize,
    pub value: f64,
    /// 255 where the pixel is strictly above the (possibly radial) threshold
    pub mask: GrayImage,
    /// Outer contours enclosing more than the minimum area
    pub contours: Vec<Contour>,
}

impl ThresholdLevel {
    /// Threshold value as used in output names
    pub fn threshold_int(&self) -> i32 {
        self.value.trunc() as i32
    }
}

/// Samples `levels` evenly spaced thresholds from a range and extracts the
/// large outer contours at each of them.
#[derive(Debug, Clone)]
pub struct MultiLevelThresholder {
    range: ThresholdRange,
    levels: usize,
    min_area: f64,
    mode: ThresholdMode,
}

impl MultiLevelThresholder {
    pub fn new(
        range: ThresholdRange,
        levels: usize,
        min_area: f64,
        mode: ThresholdMode,
    ) -> Result<Self> {
        if range.low >= range.high {
            return Err(Error::InvalidThresholdRange {
                low: range.low,
                high: range.high,
            });
        }
        if levels < 2 {
            return Err(Error::InvalidLevelCount(levels));
        }
        Ok(Self {
            range,
            levels,
            min_area,
            mode,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(
            config.threshold_range,
            config.levels,
            config.min_contour_area,
            config.threshold_mode,
        )
    }

    /// Threshold value of level `index`
    pub fn value(&self, index: usize) -> f64 {
        let low = self.range.low as f64;
        let span = (self.range.high - self.range.low) as f64;
        low + span * index as f64 / (self.levels - 1) as f64
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.levels).map(|i| self.value(i))
    }

    /// Lazily threshold `plane` at every level. Each call starts from scratch.
    pub fn levels<'a>(&'a self, plane: &'a GrayImage) -> ThresholdLevels<'a> {
        ThresholdLevels {
            thresholder: self,
            plane,
            next: 0,
        }
    }

    /// Threshold `plane` at a single level.
    pub fn apply(&self, plane: &GrayImage, index: usize) -> ThresholdLevel {
        let value = self.value(index);
        let mask = self.mask(plane, value);
        let contours = outer_contours(&mask, self.min_area);
        ThresholdLevel {
            index,
            value,
            mask,
            contours,
        }
    }

    /// Binary mask of the pixels strictly above the level threshold
    pub fn mask(&self, plane: &GrayImage, value: f64) -> GrayImage {
        let (width, height) = plane.dimensions();
        match self.mode {
            ThresholdMode::Uniform => GrayImage::from_fn(width, height, |x, y| {
                binary(plane.get_pixel(x, y).0[0] as f64 > value)
            }),
            ThresholdMode::Radial { edge_offset } => {
                let cx = (width / 2) as f64;
                let cy = (height / 2) as f64;
                let max_dist = (cx * cx + cy * cy).sqrt();
                GrayImage::from_fn(width, height, |x, y| {
                    let dx = x as f64 - cx;
                    let dy = y as f64 - cy;
                    let scale = if max_dist > 0.0 {
                        (dx * dx + dy * dy).sqrt() / max_dist
                    } else {
                        0.0
                    };
                    let local = value + scale * edge_offset as f64;
                    binary(plane.get_pixel(x, y).0[0] as f64 > local)
                })
            }
        }
    }
}

fn binary(on: bool) -> Luma<u8> {
    Luma([if on { 255 } else { 0 }])
}

/// Outermost borders of the foreground regions of `mask` whose enclosed area
/// is strictly greater than `min_area`. Holes and regions nested in holes are
/// not reported.
///
/// The mask is traced inside a one pixel background frame so regions touching
/// the image edge are still outer borders; points are returned in mask
/// coordinates.
pub fn outer_contours(mask: &GrayImage, min_area: f64) -> Vec<Contour> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut framed, mask, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            Contour::new(
                c.points
                    .into_iter()
                    .map(|p| Point::new(p.x - 1, p.y - 1))
                    .collect(),
            )
        })
        .filter(|c| c.area() > min_area)
        .collect()
}

/// Iterator over the levels of a [`MultiLevelThresholder`]
#[derive(Debug, Clone)]
pub struct ThresholdLevels<'a> {
    thresholder: &'a MultiLevelThresholder,
    plane: &'a GrayImage,
    next: usize,
}

impl Iterator for ThresholdLevels<'_> {
    type Item = ThresholdLevel;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.thresholder.levels {
            return None;
        }
        let level = self.thresholder.apply(self.plane, self.next);
        self.next += 1;
        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.thresholder.levels - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ThresholdLevels<'_> {}
