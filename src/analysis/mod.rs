//! Numerical core: plane extraction, normalization, enhancement, cropping,
//! multi-level thresholding and region annotation.

pub mod annotate;
pub mod channel;
pub mod crop;
pub mod enhance;
pub mod equalize;
pub mod steps;
pub mod threshold;
