use imageproc::point::Point;

/// Four page corners in `[top-left, top-right, bottom-left, bottom-right]` order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCorners(pub [Point<i32>; 4]);

impl PageCorners {
    pub fn top_left(&self) -> Point<i32> {
        self.0[0]
    }

    pub fn top_right(&self) -> Point<i32> {
        self.0[1]
    }

    pub fn bottom_left(&self) -> Point<i32> {
        self.0[2]
    }

    pub fn bottom_right(&self) -> Point<i32> {
        self.0[3]
    }

    /// Corners as floating-point control points, in slot order
    pub fn control_points(&self) -> [(f32, f32); 4] {
        self.0.map(|p| (p.x as f32, p.y as f32))
    }

    pub fn to_pairs(&self) -> [[i32; 2]; 4] {
        self.0.map(|p| [p.x, p.y])
    }
}

/// Put four quadrilateral vertices into page-slot order
///
/// Four fixed passes of adjacent swaps sort by `y` (strict comparison, so
/// equal rows keep their incoming order), then each of the top and bottom
/// pairs is swapped so the smaller `x` comes first. Assumes a roughly
/// upright page; a page rotated near 45 degrees can land in the wrong slots.
pub fn apply(vertices: [Point<i32>; 4]) -> PageCorners {
    let mut corners = vertices;

    for _ in 0..4 {
        for j in 0..3 {
            if corners[j].y > corners[j + 1].y {
                corners.swap(j, j + 1);
            }
        }
    }

    if corners[0].x > corners[1].x {
        corners.swap(0, 1);
    }
    if corners[2].x > corners[3].x {
        corners.swap(2, 3);
    }

    PageCorners(corners)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: [(i32, i32); 4]) -> [Point<i32>; 4] {
        raw.map(|(x, y)| Point::new(x, y))
    }

    fn assert_slot_order(corners: &PageCorners) {
        let [p0, p1, p2, p3] = corners.0;
        assert!(p0.y <= p2.y && p1.y <= p3.y, "top pair above bottom pair: {:?}", corners);
        assert!(p0.x <= p1.x && p2.x <= p3.x, "left before right: {:?}", corners);
    }

    #[test]
    fn test_counter_clockwise_input_is_ordered() {
        let corners = apply(pts([(10, 10), (12, 300), (200, 305), (205, 8)]));
        assert_eq!(corners.top_left(), Point::new(10, 10));
        assert_eq!(corners.top_right(), Point::new(205, 8));
        assert_eq!(corners.bottom_left(), Point::new(12, 300));
        assert_eq!(corners.bottom_right(), Point::new(200, 305));
        assert_slot_order(&corners);
    }

    #[test]
    fn test_every_rotation_of_the_input_gives_the_same_slots() {
        let base = [(100, 100), (299, 100), (299, 399), (100, 399)];
        let expected = pts([(100, 100), (299, 100), (100, 399), (299, 399)]);
        for shift in 0..4 {
            let mut rotated = base;
            rotated.rotate_left(shift);
            let corners = apply(pts(rotated));
            assert_eq!(corners.0, expected, "rotation {}", shift);
            assert_slot_order(&corners);
        }
    }

    #[test]
    fn test_equal_rows_keep_incoming_order_before_x_fixup() {
        // Three vertices share y = 0; the strict comparison never swaps them,
        // so the third one ends up in the bottom pair.
        let corners = apply(pts([(50, 0), (0, 0), (25, 0), (10, 20)]));
        assert_eq!(corners.top_left(), Point::new(0, 0));
        assert_eq!(corners.top_right(), Point::new(50, 0));
        assert_eq!(corners.bottom_left(), Point::new(10, 20));
        assert_eq!(corners.bottom_right(), Point::new(25, 0));
    }

    #[test]
    fn test_diamond_is_a_known_mis_ordering() {
        // A page rotated by 45 degrees: top and bottom are single points
        let corners = apply(pts([(50, 0), (100, 50), (50, 100), (0, 50)]));
        assert_eq!(corners.top_left(), Point::new(50, 0));
        assert_eq!(corners.top_right(), Point::new(100, 50));
        assert_eq!(corners.bottom_left(), Point::new(0, 50));
        assert_eq!(corners.bottom_right(), Point::new(50, 100));
    }

    #[test]
    fn test_control_points_follow_slot_order() {
        let corners = apply(pts([(10, 10), (0, 0), (0, 10), (10, 0)]));
        assert_eq!(
            corners.control_points(),
            [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]
        );
    }
}
