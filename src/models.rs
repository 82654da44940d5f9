use std::path::PathBuf;

use imageproc::point::Point;
use serde::Serialize;

/// Closed outer boundary of a connected foreground region in a mask
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Enclosed area of the boundary polygon (shoelace formula, absolute value)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area = 0i64;
        for (i, p) in self.points.iter().enumerate() {
            let q = self.points[(i + 1) % n];
            twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }
        twice_area.abs() as f64 / 2.0
    }

    /// Tight axis-aligned bounds as `(x, y, width, height)`, both ends inclusive
    pub fn bounding_rect(&self) -> Option<(i32, i32, i32, i32)> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}

/// Padded, clamped rectangle enclosing a contour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRegion {
    /// Expand the tight bounds of `contour` by `padding` on each side and clamp
    /// the result to an image of `image_width` x `image_height`.
    pub fn from_contour(
        contour: &Contour,
        padding: u32,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let (x, y, w, h) = contour.bounding_rect()?;
        let pad = padding as i64;
        let (x, y, w, h) = (x as i64, y as i64, w as i64, h as i64);

        let x0 = (x - pad).clamp(0, image_width as i64);
        let y0 = (y - pad).clamp(0, image_height as i64);
        let x1 = (x + w + pad).clamp(0, image_width as i64);
        let y1 = (y + h + pad).clamp(0, image_height as i64);

        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0).max(0) as u32,
            height: (y1 - y0).max(0) as u32,
        })
    }
}

/// Horizontal first differences of the analysis plane inside one bounding region.
///
/// Each row holds `region.width - 1` values equal to `right - left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradientSample {
    pub region: BoundingRegion,
    pub rows: Vec<Vec<i16>>,
}

/// Outputs produced for one (input image, threshold level) pair
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFileRecord {
    pub original: String,
    pub threshold: i32,
    pub threshold_image: String,
    pub contour_image: String,
    pub gradients: Vec<GradientSample>,
}

/// A threshold level whose output images could not be written
#[derive(Debug, Clone, Serialize)]
pub struct LevelFailure {
    pub level_index: usize,
    pub threshold: i32,
    pub path: PathBuf,
    pub message: String,
}

/// Result of one pipeline invocation: complete records plus the levels that failed
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingReport {
    pub records: Vec<ProcessedFileRecord>,
    pub failures: Vec<LevelFailure>,
}

impl ProcessingReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
