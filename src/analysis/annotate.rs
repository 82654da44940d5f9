use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::models::{BoundingRegion, Contour, GradientSample};

/// Bounding rectangle color (magenta)
pub const REGION_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
/// Contour outline color (green)
pub const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Annotated copy of the cropped color image for one threshold level
#[derive(Debug, Clone)]
pub struct AnnotatedLevel {
    pub image: RgbImage,
    pub regions: Vec<BoundingRegion>,
    pub gradients: Vec<GradientSample>,
}

/// Draws padded bounding regions and contour outlines, and samples the
/// horizontal gradient of the analysis plane inside each region.
#[derive(Debug, Clone, Copy)]
pub struct RegionAnnotator {
    pub padding: u32,
    pub thickness: u32,
}

impl Default for RegionAnnotator {
    fn default() -> Self {
        Self {
            padding: 10,
            thickness: 2,
        }
    }
}

impl RegionAnnotator {
    pub fn new(padding: u32, thickness: u32) -> Self {
        Self { padding, thickness }
    }

    /// Annotate a copy of `color`; `plane` must share its geometry.
    pub fn annotate(&self, color: &RgbImage, plane: &GrayImage, contours: &[Contour]) -> AnnotatedLevel {
        let mut canvas = color.clone();
        let (width, height) = canvas.dimensions();

        let mut regions = Vec::with_capacity(contours.len());
        let mut gradients = Vec::with_capacity(contours.len());
        for contour in contours {
            let Some(region) = BoundingRegion::from_contour(contour, self.padding, width, height) else {
                continue;
            };
            draw_region(&mut canvas, region, self.thickness, REGION_COLOR);
            gradients.push(sample_gradient(plane, region));
            regions.push(region);
        }

        for contour in contours {
            draw_contour(&mut canvas, contour, self.thickness, CONTOUR_COLOR);
        }

        AnnotatedLevel {
            image: canvas,
            regions,
            gradients,
        }
    }
}

/// Right-minus-left differences of `plane` for every row of `region`.
///
/// The last column has no right neighbour, so rows hold `width - 1` values.
pub fn sample_gradient(plane: &GrayImage, region: BoundingRegion) -> GradientSample {
    let y_end = (region.y + region.height).min(plane.height());
    let x_end = (region.x + region.width).min(plane.width());

    let rows = (region.y..y_end)
        .map(|y| {
            (region.x..x_end.saturating_sub(1))
                .map(|x| {
                    let left = plane.get_pixel(x, y).0[0] as i16;
                    let right = plane.get_pixel(x + 1, y).0[0] as i16;
                    right - left
                })
                .collect()
        })
        .collect();

    GradientSample { region, rows }
}

fn draw_region(canvas: &mut RgbImage, region: BoundingRegion, thickness: u32, color: Rgb<u8>) {
    for t in 0..thickness.max(1) {
        let inset = 2 * t;
        if region.width <= inset || region.height <= inset {
            break;
        }
        let rect = Rect::at((region.x + t) as i32, (region.y + t) as i32)
            .of_size(region.width - inset, region.height - inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Outline `contour` with a stroke of `thickness` pixels centred on the boundary.
fn draw_contour(canvas: &mut RgbImage, contour: &Contour, thickness: u32, color: Rgb<u8>) {
    let n = contour.points.len();
    let thickness = thickness.max(1) as i32;
    let offsets = -(thickness - 1) / 2..thickness / 2 + 1;
    for (i, p) in contour.points.iter().enumerate() {
        let q = contour.points[(i + 1) % n];
        for dy in offsets.clone() {
            for dx in offsets.clone() {
                draw_line_segment_mut(
                    canvas,
                    ((p.x + dx) as f32, (p.y + dy) as f32),
                    ((q.x + dx) as f32, (q.y + dy) as f32),
                    color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::point::Point;

    fn square(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        Contour::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn gradient_rows_exclude_last_column() {
        let plane = GrayImage::from_fn(10, 4, |x, _| Luma([(x * x) as u8]));
        let region = BoundingRegion { x: 2, y: 1, width: 4, height: 2 };
        let sample = sample_gradient(&plane, region);
        assert_eq!(sample.rows.len(), 2);
        assert_eq!(sample.rows[0], vec![5, 7, 9]);
        assert!(sample.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn gradient_values_can_be_negative() {
        let plane = GrayImage::from_fn(3, 1, |x, _| Luma([255 - (x * 100) as u8]));
        let region = BoundingRegion { x: 0, y: 0, width: 3, height: 1 };
        assert_eq!(sample_gradient(&plane, region).rows, vec![vec![-100, -100]]);
    }

    #[test]
    fn draws_region_and_contour_on_a_copy() {
        let color = RgbImage::from_pixel(100, 100, Rgb([10, 10, 10]));
        let plane = GrayImage::from_pixel(100, 100, Luma([50]));
        let annotator = RegionAnnotator::default();
        let out = annotator.annotate(&color, &plane, &[square(30, 30, 60, 60)]);

        assert_eq!(color.get_pixel(20, 20), &Rgb([10, 10, 10]));
        assert_eq!(out.regions, vec![BoundingRegion { x: 20, y: 20, width: 51, height: 51 }]);
        assert_eq!(out.image.get_pixel(20, 45), &REGION_COLOR);
        assert_eq!(out.image.get_pixel(30, 45), &CONTOUR_COLOR);
        assert_eq!(out.image.get_pixel(45, 45), &Rgb([10, 10, 10]));
        assert_eq!(out.gradients.len(), 1);
        assert!(out.gradients[0].rows.iter().all(|r| r.len() == 50 && r.iter().all(|&g| g == 0)));
    }

    #[test]
    fn odd_contour_stroke_straddles_the_boundary() {
        let color = RgbImage::from_pixel(100, 100, Rgb([10, 10, 10]));
        let plane = GrayImage::new(100, 100);
        let out = RegionAnnotator::new(10, 3).annotate(&color, &plane, &[square(30, 30, 60, 60)]);

        for x in [29, 30, 31, 59, 60, 61] {
            assert_eq!(out.image.get_pixel(x, 45), &CONTOUR_COLOR, "x = {}", x);
        }
        assert_eq!(out.image.get_pixel(28, 45), &Rgb([10, 10, 10]));
        assert_eq!(out.image.get_pixel(32, 45), &Rgb([10, 10, 10]));
        assert_eq!(out.image.get_pixel(62, 45), &Rgb([10, 10, 10]));
    }

    #[test]
    fn regions_touching_edges_stay_in_bounds() {
        let color = RgbImage::new(40, 30);
        let plane = GrayImage::new(40, 30);
        let out = RegionAnnotator::default().annotate(&color, &plane, &[square(0, 0, 39, 29)]);
        let region = out.regions[0];
        assert_eq!(region, BoundingRegion { x: 0, y: 0, width: 40, height: 30 });
        assert_eq!(out.gradients[0].rows.len(), 30);
        assert!(out.gradients[0].rows.iter().all(|r| r.len() == 39));
    }

    #[test]
    fn no_contours_leaves_plain_copy() {
        let color = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let plane = GrayImage::new(8, 8);
        let out = RegionAnnotator::default().annotate(&color, &plane, &[]);
        assert_eq!(out.image, color);
        assert!(out.gradients.is_empty());
    }
}
