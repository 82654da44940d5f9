use image::{GrayImage, Luma};

use crate::config::ClaheConfig;

const BINS: usize = 256;

/// Contrast-limited adaptive histogram equalization.
///
/// The plane is split into `tiles_x` x `tiles_y` tiles (capped at one pixel per
/// tile), each tile gets its own clipped-histogram lookup table, and every
/// pixel is mapped by bilinear blending of the four nearest tile tables.
pub fn equalize_brightness(img: &GrayImage, config: &ClaheConfig) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let grid_x = config.tiles_x.clamp(1, width) as usize;
    let grid_y = config.tiles_y.clamp(1, height) as usize;
    let tile_w = width as f32 / grid_x as f32;
    let tile_h = height as f32 / grid_y as f32;

    let tile_of = |coord: u32, size: f32, grid: usize| ((coord as f32 / size) as usize).min(grid - 1);

    let mut histograms = vec![[0u32; BINS]; grid_x * grid_y];
    for (x, y, p) in img.enumerate_pixels() {
        let tx = tile_of(x, tile_w, grid_x);
        let ty = tile_of(y, tile_h, grid_y);
        histograms[ty * grid_x + tx][p.0[0] as usize] += 1;
    }

    let luts: Vec<[u8; BINS]> = histograms
        .iter_mut()
        .map(|hist| tile_lut(hist, config.clip_limit))
        .collect();

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, fx) = neighbours(x, tile_w, grid_x);
        let (ty0, ty1, fy) = neighbours(y, tile_h, grid_y);
        let v = img.get_pixel(x, y).0[0] as usize;

        let top = luts[ty0 * grid_x + tx0][v] as f32 * (1.0 - fx)
            + luts[ty0 * grid_x + tx1][v] as f32 * fx;
        let bottom = luts[ty1 * grid_x + tx0][v] as f32 * (1.0 - fx)
            + luts[ty1 * grid_x + tx1][v] as f32 * fx;
        let blended = top * (1.0 - fy) + bottom * fy;
        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Indices of the two tiles whose centers bracket `coord`, and the blend weight
/// of the second one.
fn neighbours(coord: u32, tile_size: f32, grid: usize) -> (usize, usize, f32) {
    let pos = (coord as f32 + 0.5) / tile_size - 0.5;
    let lower = pos.floor();
    let frac = pos - lower;
    let lower = lower as isize;
    let last = grid as isize - 1;
    let t0 = lower.clamp(0, last) as usize;
    let t1 = (lower + 1).clamp(0, last) as usize;
    (t0, t1, frac)
}

fn tile_lut(hist: &mut [u32; BINS], clip_limit: f32) -> [u8; BINS] {
    let area: u32 = hist.iter().sum();
    let mut lut = [0u8; BINS];
    if area == 0 {
        return lut;
    }

    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }

        let per_bin = excess / BINS as u32;
        let mut residual = (excess % BINS as u32) as usize;
        for bin in hist.iter_mut() {
            *bin += per_bin;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for bin in hist.iter_mut().step_by(step) {
                if residual == 0 {
                    break;
                }
                *bin += 1;
                residual -= 1;
            }
        }
    }

    let scale = (BINS - 1) as f32 / area as f32;
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *entry = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_dimensions() {
        let img = GrayImage::from_fn(80, 60, |x, y| Luma([((x + y) % 256) as u8]));
        let out = equalize_brightness(&img, &ClaheConfig::default());
        assert_eq!(out.dimensions(), (80, 60));
    }

    #[test]
    fn uniform_plane_stays_uniform() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        let out = equalize_brightness(&img, &ClaheConfig::default());
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn stretches_low_contrast_checkerboard() {
        let img = GrayImage::from_fn(256, 256, |x, y| {
            Luma([if (x + y) % 2 == 0 { 120 } else { 130 }])
        });
        let config = ClaheConfig {
            clip_limit: 40.0,
            ..ClaheConfig::default()
        };
        let out = equalize_brightness(&img, &config);
        let (min, max) = out
            .pixels()
            .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        assert!(max - min > 30, "range {}..{} was not stretched", min, max);
    }

    #[test]
    fn tiny_and_empty_planes_are_handled() {
        let tiny = GrayImage::from_pixel(3, 2, Luma([42]));
        assert_eq!(equalize_brightness(&tiny, &ClaheConfig::default()).dimensions(), (3, 2));

        let empty = GrayImage::new(0, 0);
        assert_eq!(equalize_brightness(&empty, &ClaheConfig::default()).dimensions(), (0, 0));
    }

    #[test]
    fn clipped_histogram_keeps_total_mass() {
        let mut hist = [0u32; BINS];
        hist[10] = 1000;
        hist[200] = 24;
        let lut = tile_lut(&mut hist, 2.0);
        assert_eq!(hist.iter().sum::<u32>(), 1024);
        assert_eq!(lut[255], 255);
    }
}
