use super::order::PageCorners;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::warn;

/// Warp the page onto a `width` x `height` canvas
///
/// Corners map by slot onto (0,0), (W,0), (0,H), (W,H). Returns `None` when the
/// corners admit no projective transform (collinear or coincident points).
pub fn apply(image: &RgbImage, corners: &PageCorners, width: u32, height: u32) -> Option<RgbImage> {
    let (w, h) = (width as f32, height as f32);
    let target = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];

    let Some(projection) = Projection::from_control_points(corners.control_points(), target) else {
        warn!(corners = ?corners.to_pairs(), "Degenerate page corners; no projective transform");
        return None;
    };

    let mut output = RgbImage::new(width, height);
    warp_into(image, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut output);
    Some(output)
}
