use std::fmt;
use std::str::FromStr;

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Intensity plane extracted from the color input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
    Gray,
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Channel::Red),
            "green" => Ok(Channel::Green),
            "blue" => Ok(Channel::Blue),
            "gray" | "grey" => Ok(Channel::Gray),
            _ => Err(Error::InvalidChannel(s.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Gray => "gray",
        };
        f.write_str(name)
    }
}

/// Weights of the red and blue planes in the gray composite.
///
/// The default (red 0, blue 1) reproduces the historical composite, which is
/// effectively the blue plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrayWeights {
    pub red: f32,
    pub blue: f32,
}

impl Default for GrayWeights {
    fn default() -> Self {
        Self { red: 0.0, blue: 1.0 }
    }
}

/// Extract a single intensity plane from a color image.
pub fn select_channel(img: &RgbImage, channel: Channel, weights: GrayWeights) -> GrayImage {
    let (width, height) = img.dimensions();
    match channel {
        Channel::Red => plane(img, 0),
        Channel::Green => plane(img, 1),
        Channel::Blue => plane(img, 2),
        Channel::Gray => GrayImage::from_fn(width, height, |x, y| {
            let [r, _, b] = img.get_pixel(x, y).0;
            let v = weights.red * r as f32 + weights.blue * b as f32;
            Luma([v.round().clamp(0.0, 255.0) as u8])
        }),
    }
}

fn plane(img: &RgbImage, index: usize) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| Luma([img.get_pixel(x, y).0[index]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn parses_known_selectors_case_insensitively() {
        assert_eq!("RED".parse::<Channel>().ok(), Some(Channel::Red));
        assert_eq!(" gray ".parse::<Channel>().ok(), Some(Channel::Gray));
        assert!(matches!(
            "purple".parse::<Channel>(),
            Err(Error::InvalidChannel(s)) if s == "purple"
        ));
    }

    #[test]
    fn default_gray_composite_is_blue_plane() {
        let img = RgbImage::from_pixel(4, 4, Rgb([200, 50, 10]));
        let gray = select_channel(&img, Channel::Gray, GrayWeights::default());
        assert!(gray.pixels().all(|p| p.0[0] == 10));
    }

    #[test]
    fn weighted_composite_saturates() {
        let img = RgbImage::from_pixel(2, 2, Rgb([200, 0, 200]));
        let weights = GrayWeights { red: 1.0, blue: 1.0 };
        let gray = select_channel(&img, Channel::Gray, weights);
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }
}
