use image::{ImageBuffer, Pixel, imageops};

use crate::error::{Error, Result};

/// Centered rectangle `(x, y, width, height)` covering `ratio` of each dimension
pub fn center_rect(width: u32, height: u32, ratio: f64) -> Result<(u32, u32, u32, u32)> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(Error::InvalidCropRatio(ratio));
    }
    let crop_w = (width as f64 * ratio) as u32;
    let crop_h = (height as f64 * ratio) as u32;
    Ok(((width - crop_w) / 2, (height - crop_h) / 2, crop_w, crop_h))
}

/// Copy out the centered sub-image covering `ratio` of each dimension.
///
/// Tiny inputs may produce an empty image; that is not an error.
pub fn crop_center<P>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
    ratio: f64,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (x, y, w, h) = center_rect(img.width(), img.height(), ratio)?;
    Ok(imageops::crop_imm(img, x, y, w, h).to_image())
}
