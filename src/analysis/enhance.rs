use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;

use crate::error::{Error, Result};

/// Sigma used for a `ksize`-tap Gaussian when none is given explicitly
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian kernel with exactly `ksize` taps
pub fn gaussian_kernel(ksize: u32) -> Result<Vec<f32>> {
    if ksize < 3 || ksize % 2 == 0 {
        return Err(Error::InvalidKernelSize(ksize));
    }
    let sigma = sigma_for_kernel(ksize);
    let radius = (ksize / 2) as f32;
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    Ok(kernel)
}

/// Separable Gaussian blur with a `ksize` x `ksize` kernel.
///
/// Both passes run on an `f32` copy of the plane through
/// [`separable_filter_equal`], which replicates edge pixels; the result is
/// rounded once.
pub fn gaussian_blur(img: &GrayImage, ksize: u32) -> Result<GrayImage> {
    let kernel = gaussian_kernel(ksize)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Ok(img.clone());
    }

    let plane: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([img.get_pixel(x, y).0[0] as f32]));
    let blurred = separable_filter_equal(&plane, &kernel);

    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([blurred.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
    }))
}

/// Boost local detail by re-adding the blurred high-pass residue.
///
/// `out = sat(img + blur(sat(img - blur(img))))`, where `sat` clamps to [0, 255].
pub fn enhance_detail(img: &GrayImage, ksize: u32) -> Result<GrayImage> {
    let blurred = gaussian_blur(img, ksize)?;

    let mut residue = img.clone();
    for (r, b) in residue.pixels_mut().zip(blurred.pixels()) {
        r.0[0] = r.0[0].saturating_sub(b.0[0]);
    }
    let residue = gaussian_blur(&residue, ksize)?;

    let mut out = img.clone();
    for (o, r) in out.pixels_mut().zip(residue.pixels()) {
        o.0[0] = o.0[0].saturating_add(r.0[0]);
    }
    Ok(out)
}
