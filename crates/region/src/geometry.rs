//! Polygon geometry

use crate::{Point, POLYGON_CORNERS};

/// Ray-casting point-in-polygon test.
///
/// A horizontal ray is cast from `point` towards +x. An edge counts as a
/// crossing when `min(y1, y2) < y <= max(y1, y2)` and the ray meets it at or
/// beyond `point.x`. Horizontal edges can never satisfy the half-open y test,
/// so the intersection formula is only evaluated for edges with `y1 != y2`.
/// Vertical edges intersect at their own x. Points exactly on the boundary
/// get a deterministic, but unspecified, answer.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }

    let x = point.x as f64;
    let y = point.y as f64;
    let mut inside = false;

    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];
        let (x1, y1) = (p1.x as f64, p1.y as f64);
        let (x2, y2) = (p2.x as f64, p2.y as f64);

        if y <= y1.min(y2) || y > y1.max(y2) || x > x1.max(x2) {
            continue;
        }

        let crosses = if p1.x == p2.x {
            true
        } else {
            // y1 != y2 is guaranteed by the half-open y test above
            let x_intersect = (y - y1) * (x2 - x1) / (y2 - y1) + x1;
            x <= x_intersect
        };

        if crosses {
            inside = !inside;
        }
    }

    inside
}

/// Minimum distance from `point` to the lines through the polygon's edges.
///
/// Returns `f64::INFINITY` while the region is not calibrated (fewer than
/// four corners). Each edge contributes `|A*x + B*y + C| / sqrt(A^2 + B^2)`
/// with `A = y2 - y1`, `B = x1 - x2`, `C = x2*y1 - x1*y2`.
///
/// This measures distance to the infinite line through each edge, not the
/// clipped segment: a point near an edge's extension reads as close even if
/// it is far from the segment itself. For a small, roughly rectangular
/// region the two only differ outside the corners. Degenerate edges (both
/// endpoints equal) define no line and are skipped.
pub fn distance_to_boundary(point: Point, polygon: &[Point]) -> f64 {
    if polygon.len() < POLYGON_CORNERS {
        return f64::INFINITY;
    }

    let x = point.x as f64;
    let y = point.y as f64;
    let n = polygon.len();

    (0..n)
        .filter_map(|i| {
            let p1 = polygon[i];
            let p2 = polygon[(i + 1) % n];
            let a = (p2.y - p1.y) as f64;
            let b = (p1.x - p2.x) as f64;
            let c = p2.x as f64 * p1.y as f64 - p1.x as f64 * p2.y as f64;
            let norm = (a * a + b * b).sqrt();
            (norm > 0.0).then(|| (a * x + b * y + c).abs() / norm)
        })
        .fold(f64::INFINITY, f64::min)
}
