use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// A foreground region that passed the area filter
#[derive(Debug, Clone)]
pub struct Region {
    pub points: Vec<Point<i32>>,
    pub area: f64,
    pub perimeter: f64,
}

/// Outer boundaries of the top-level foreground regions, most recently
/// discovered first
///
/// The raster scan finds regions top to bottom, so the list runs bottom to
/// top. Hole borders and regions nested inside other regions are dropped.
pub fn external(binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
    let mut outer: Vec<Vec<Point<i32>>> = find_contours::<i32>(binary)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .map(|contour| contour.points)
        .collect();
    outer.reverse();
    outer
}

/// Keep contours whose enclosed area is strictly greater than `min_area`,
/// preserving their order
pub fn filter_by_area(contours: Vec<Vec<Point<i32>>>, min_area: f64) -> Vec<Region> {
    contours
        .into_iter()
        .filter_map(|points| {
            let area = polygon_area(&points);
            if area > min_area {
                let perimeter = closed_perimeter(&points);
                Some(Region {
                    points,
                    area,
                    perimeter,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Shoelace area of a closed polygon
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let n = points.len();
    let mut twice_area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as f64 * points[j].y as f64;
        twice_area -= points[j].x as f64 * points[i].y as f64;
    }
    twice_area.abs() / 2.0
}

/// Length of the polygon outline including the closing edge
pub fn closed_perimeter(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }

    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            let dx = (points[j].x - points[i].x) as f64;
            let dy = (points[j].y - points[i].y) as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}
