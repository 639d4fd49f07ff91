use image::{GrayImage, Luma, RgbImage};

/// Convert an RGB image to grayscale with BT.601 luma weights
/// (0.299 R + 0.587 G + 0.114 B, rounded to nearest)
pub fn apply(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([luma as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_grayscale_uses_bt601_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0])); // Red
        img.put_pixel(1, 0, Rgb([0, 255, 0])); // Green
        img.put_pixel(2, 0, Rgb([0, 0, 255])); // Blue

        let gray = apply(&img);

        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 29);
    }

    #[test]
    fn test_grayscale_keeps_white_and_dimensions() {
        let img = RgbImage::from_pixel(100, 50, Rgb([255, 255, 255]));
        let gray = apply(&img);
        assert_eq!(gray.dimensions(), (100, 50));
        assert_eq!(gray.get_pixel(99, 49).0[0], 255);
    }
}
