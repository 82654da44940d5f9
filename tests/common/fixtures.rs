use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

/// Creates a black square image with a centered filled disk of the given
/// intensity in every channel.
pub fn disk_image(size: u32, radius: u32, value: u8) -> RgbImage {
    let center = size as i64 / 2;
    let r2 = (radius as i64).pow(2);
    RgbImage::from_fn(size, size, |x, y| {
        let dx = x as i64 - center;
        let dy = y as i64 - center;
        if dx * dx + dy * dy <= r2 {
            Rgb([value, value, value])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Creates a square image of a single color.
pub fn flat_image(size: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb(color))
}

/// Saves `img` as PNG under `dir` and returns the path.
pub fn write_png(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

/// Saves `img` under `dir` in the format implied by the extension of `name`.
pub fn write_image(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("Failed to save test image");
    path
}

/// Writes bytes that no image decoder accepts.
pub fn write_broken_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"definitely not an image").expect("Failed to write broken image");
    path
}

/// Names of the files currently in `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
