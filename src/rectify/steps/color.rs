use crate::error::RectifyError;
use image::{Rgb, RgbImage};
use serde::Serialize;

/// Order of the three channels in incoming pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Red, green, blue (what the `image` crate decodes to)
    #[default]
    Rgb,
    /// Blue, green, red (typical camera frame layout)
    Bgr,
}

/// Re-express `image` in RGB order
///
/// Rejects empty images: every later step assumes at least one pixel.
pub fn apply(image: &RgbImage, order: ChannelOrder) -> Result<RgbImage, RectifyError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RectifyError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            width, height
        )));
    }

    Ok(match order {
        ChannelOrder::Rgb => image.clone(),
        ChannelOrder::Bgr => RgbImage::from_fn(width, height, |x, y| {
            let [b, g, r] = image.get_pixel(x, y).0;
            Rgb([r, g, b])
        }),
    })
}
