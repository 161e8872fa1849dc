// src/utils/geometry.rs
// Polygon helpers that work on directed edges.

use crate::bsp::Point2D;

/// Twice the signed area of triangle (a, b, p); positive when `p` is left of
/// the directed line a -> b.
pub fn is_left(a: &Point2D, b: &Point2D, p: &Point2D) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

/// Winding number of `point` with respect to a set of directed edges.
///
/// Counter-clockwise loops contribute +1 around their interior, clockwise
/// loops -1. The result is meaningless for points lying on an edge.
pub fn winding_number<I>(edges: I, point: &Point2D) -> i32
where
    I: IntoIterator<Item = (Point2D, Point2D)>,
{
    let mut wn = 0;
    for (start, end) in edges {
        if start.y <= point.y {
            if end.y > point.y && is_left(&start, &end, point) > 0.0 {
                wn += 1;
            }
        } else if end.y <= point.y && is_left(&start, &end, point) < 0.0 {
            wn -= 1;
        }
    }
    wn
}

/// Shoelace sum over directed edges. Positive for counter-clockwise loops.
pub fn signed_area<I>(edges: I) -> f64
where
    I: IntoIterator<Item = (Point2D, Point2D)>,
{
    let twice: f64 = edges
        .into_iter()
        .map(|(s, e)| s.x * e.y - e.x * s.y)
        .sum();
    twice * 0.5
}
