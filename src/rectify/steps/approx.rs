//! Closed-curve Douglas-Peucker polygon approximation
//!
//! The curve is split at two far-apart anchor points, each half is simplified
//! with an explicit work stack, and a final pass drops vertices that sit on a
//! nearly straight run between their neighbours.

use imageproc::point::Point;

/// Rounds of farthest-point search used to pick the two anchors
const ANCHOR_ROUNDS: usize = 3;

/// Approximate a closed contour by a polygon whose edges stay within
/// `epsilon` of the original points.
pub fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut start = 0usize;
    let (mut end, mut span_sq) = farthest_from(points, start);
    for _ in 1..ANCHOR_ROUNDS {
        start = end;
        (end, span_sq) = farthest_from(points, start);
    }

    if span_sq <= epsilon * epsilon {
        return vec![points[start]];
    }

    let forward = cyclic_chain(points, start, end);
    let backward = cyclic_chain(points, end, start);

    let mut polygon = simplify_open(&forward, epsilon);
    polygon.pop();
    let mut tail = simplify_open(&backward, epsilon);
    tail.pop();
    polygon.extend(tail);

    drop_straight_vertices(&polygon, epsilon)
}

/// Index of the point farthest from `points[from]` and its squared distance;
/// ties keep the earliest index
fn farthest_from(points: &[Point<i32>], from: usize) -> (usize, f64) {
    let origin = points[from];
    let mut best = (from, 0.0f64);
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as f64;
        let dy = (p.y - origin.y) as f64;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > best.1 {
            best = (i, dist_sq);
        }
    }
    best
}

/// Points from `from` to `to` inclusive, walking forward with wrap-around
fn cyclic_chain(points: &[Point<i32>], from: usize, to: usize) -> Vec<Point<i32>> {
    let n = points.len();
    let len = (to + n - from) % n + 1;
    (0..len).map(|k| points[(from + k) % n]).collect()
}

/// Open-curve Douglas-Peucker keeping both endpoints
fn simplify_open(chain: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if chain.len() <= 2 {
        return chain.to_vec();
    }

    let last = chain.len() - 1;
    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }

        let mut max_dist = 0.0f64;
        let mut max_index = start;
        for i in (start + 1)..end {
            let dist = distance_to_chord(chain[i], chain[start], chain[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((max_index, end));
            stack.push((start, max_index));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(*p))
        .collect()
}

/// Perpendicular distance from `p` to the line through `a` and `b`, or the
/// plain distance to `a` when the two coincide
fn distance_to_chord(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let px = (p.x - a.x) as f64;
    let py = (p.y - a.y) as f64;
    let chord_sq = dx * dx + dy * dy;
    if chord_sq == 0.0 {
        return (px * px + py * py).sqrt();
    }
    (px * dy - py * dx).abs() / chord_sq.sqrt()
}

/// Single cyclic pass removing vertices that lie between their neighbours
/// and within `epsilon / sqrt(2)` of the chord joining them
///
/// Survivors are compacted in place, so a chord that wraps past the start
/// reads the already rewritten slots. The vertex following a removal is kept
/// without being tested, and only diagonal chords can absorb a vertex.
fn drop_straight_vertices(polygon: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = polygon.len();
    if n <= 2 {
        return polygon.to_vec();
    }

    let mut vertices = polygon.to_vec();
    let mut remaining = n;
    let mut read = 1 % n;
    let mut write = 0usize;
    let mut prev = vertices[n - 1];
    let mut current = vertices[0];

    let mut i = 0usize;
    while i < n && remaining > 2 {
        let next = vertices[read];
        read = (read + 1) % n;

        if is_on_straight_run(prev, current, next, epsilon) {
            remaining -= 1;
            vertices[write] = next;
            write = (write + 1) % n;
            prev = next;
            current = vertices[read];
            read = (read + 1) % n;
            i += 2;
            continue;
        }

        vertices[write] = current;
        write = (write + 1) % n;
        prev = current;
        current = next;
        i += 1;
    }

    vertices.truncate(remaining);
    vertices
}

fn is_on_straight_run(prev: Point<i32>, current: Point<i32>, next: Point<i32>, epsilon: f64) -> bool {
    let dx = (next.x - prev.x) as f64;
    let dy = (next.y - prev.y) as f64;
    if dx == 0.0 || dy == 0.0 {
        return false;
    }
    let chord_sq = dx * dx + dy * dy;

    let ax = (current.x - prev.x) as f64;
    let ay = (current.y - prev.y) as f64;
    let cross = ax * dy - ay * dx;
    let inner = ax * (next.x - current.x) as f64 + ay * (next.y - current.y) as f64;

    cross * cross <= 0.5 * epsilon * epsilon * chord_sq && inner >= 0.0
}
