//! Individual pipeline steps

pub mod annotate;
pub mod approx;
pub mod color;
pub mod contours;
pub mod detect;
pub mod grayscale;
pub mod order;
pub mod threshold;
pub mod warp;
