use image::{GrayImage, Luma};

/// Binarize with a global threshold picked by Otsu's method
///
/// Pixels strictly brighter than the threshold become 255, the rest 0.
/// Returns the binary image together with the chosen threshold.
pub fn apply(gray: &GrayImage) -> (GrayImage, u8) {
    let threshold = otsu_level(gray);
    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });
    (binary, threshold)
}

/// Threshold that maximizes the between-class variance of the histogram
///
/// A single-intensity image has no separable classes; its intensity is
/// returned so that binarization leaves nothing in the foreground.
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 0;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background = 0.0f64;
    let mut weight_background = 0u64;
    let mut max_variance = 0.0f64;
    let mut best_threshold: Option<u8> = None;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = Some(t as u8);
        }
    }

    best_threshold.unwrap_or_else(|| brightest(&histogram))
}

fn brightest(histogram: &[u64; 256]) -> u8 {
    histogram
        .iter()
        .rposition(|&count| count > 0)
        .map(|i| i as u8)
        .unwrap_or(0)
}
