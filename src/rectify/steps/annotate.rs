use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::point::Point;

/// Copy of `image` with the closed polygon `outline` stroked on top, joining
/// the vertices in the order given
pub fn apply(image: &RgbImage, outline: &[Point<i32>], color: [u8; 3], thickness: u32) -> RgbImage {
    let mut annotated = image.clone();
    let color = Rgb(color);

    // Stroke is centred on the edge: offsets -t/2 .. t - t/2
    let first = -(thickness as i32 / 2);
    let offsets = first..first + thickness as i32;

    for i in 0..outline.len() {
        let p1 = outline[i];
        let p2 = outline[(i + 1) % outline.len()];
        let (x1, y1) = (p1.x as f32, p1.y as f32);
        let (x2, y2) = (p2.x as f32, p2.y as f32);

        for t in offsets.clone() {
            let offset = t as f32;
            draw_line_segment_mut(&mut annotated, (x1 + offset, y1), (x2 + offset, y2), color);
            draw_line_segment_mut(&mut annotated, (x1, y1 + offset), (x2, y2 + offset), color);
        }
    }

    annotated
}
