use super::approx::approximate_closed;
use super::contours::Region;
use imageproc::point::Point;
use tracing::debug;

/// A region whose approximation collapsed to exactly four vertices
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCandidate {
    /// Vertices in the order the approximation produced them
    pub vertices: [Point<i32>; 4],
    /// Tolerance fraction (of the region perimeter) that produced the quad
    pub tolerance: f64,
    /// Index of the accepted region in the filtered list
    pub region_index: usize,
    /// Number of refinement passes run, including the successful one
    pub passes: u32,
}

/// Search for a page quadrilateral by progressively tightening the
/// approximation tolerance.
///
/// Every pass halves the tolerance scalar and approximates each region in
/// order; the first four-vertex result wins. Once the scalar drops below
/// `min_tolerance` the search gives up and returns `None`.
pub fn find_page_quad(
    regions: &[Region],
    initial_tolerance: f64,
    min_tolerance: f64,
) -> Option<QuadCandidate> {
    if regions.is_empty() {
        debug!("No regions survived the area filter");
        return None;
    }

    let mut scalar = initial_tolerance;
    let mut passes = 0u32;

    loop {
        scalar *= 0.5;
        if scalar < min_tolerance {
            debug!(passes, "Tolerance exhausted without a quadrilateral");
            return None;
        }
        passes += 1;

        for (region_index, region) in regions.iter().enumerate() {
            let polygon = approximate_closed(&region.points, scalar * region.perimeter);
            if let Ok(vertices) = <[Point<i32>; 4]>::try_from(polygon) {
                debug!(
                    passes,
                    tolerance = scalar,
                    region_index,
                    "Quadrilateral found"
                );
                return Some(QuadCandidate {
                    vertices,
                    tolerance: scalar,
                    region_index,
                    passes,
                });
            }
        }

        debug!(pass = passes, tolerance = scalar, "No quadrilateral at this tolerance");
    }
}
