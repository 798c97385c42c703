//! SVG path command generators for the four link shapes.
//!
//! All generators take points already translated into the coordinate space
//! of the element that draws them.

use crate::geometry::Point;

/// Control points of the horizontal S-curve between `start` and `end`.
///
/// Both control points sit halfway along the horizontal delta, one at the
/// start's height and one at the end's height.
pub fn curve_points(start: Point, end: Point) -> [Point; 4] {
    let factor = 0.5;
    let dx = end.x - start.x;
    [
        start,
        Point::new(end.x - dx * factor, start.y),
        Point::new(start.x + dx * factor, end.y),
        end,
    ]
}

/// Generate SVG path command for a straight link
///
/// # Returns
/// SVG path command string (e.g., "M 10 20 L 140 80")
pub fn generate_line_path(start: Point, end: Point) -> String {
    format!("M {} {} L {} {}", start.x, start.y, end.x, end.y)
}

/// Generate SVG path command for a cubic bezier link
///
/// # Arguments
/// * `points` - Start, first control, second control and end point (see [`curve_points`])
///
/// # Returns
/// SVG path command string (e.g., "M 0 0 C 50 0 50 80 100 80")
pub fn generate_curve_path(points: [Point; 4]) -> String {
    let [p0, p1, p2, p3] = points;
    format!(
        "M {} {} C {} {} {} {} {} {}",
        p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y
    )
}

/// Generate SVG path command for an axis-aligned polyline
///
/// With `rounded`, every interior vertex is replaced by a short cubic whose
/// reach along each neighbouring segment is `min(corner_radius, segment / 2)`.
///
/// # Arguments
/// * `points` - Polyline vertices, start first
/// * `rounded` - Smooth interior corners
/// * `corner_radius` - Largest corner reach
///
/// # Returns
/// SVG path command string, empty for an empty polyline
pub fn generate_polyline_path(points: &[Point], rounded: bool, corner_radius: f32) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };

    let mut path = format!("M {} {}", first.x, first.y);
    for (i, p) in points.iter().enumerate().skip(1) {
        match points.get(i + 1) {
            Some(next) if rounded => {
                let prev = points[i - 1];
                let before = corner_shift(prev, *p, corner_radius);
                let after = corner_shift(*p, *next, corner_radius);
                path.push_str(&format!(
                    " L {} {} C {} {} {} {} {} {}",
                    p.x - before.x,
                    p.y - before.y,
                    p.x,
                    p.y,
                    p.x,
                    p.y,
                    p.x + after.x,
                    p.y + after.y
                ));
            }
            _ => path.push_str(&format!(" L {} {}", p.x, p.y)),
        }
    }
    path
}

/// Signed reach of a rounded corner along the segment `from -> to`.
fn corner_shift(from: Point, to: Point, radius: f32) -> Point {
    let reach = |a: f32, b: f32| sign(b - a) * radius.min((b - a).abs() / 2.0);
    Point::new(reach(from.x, to.x), reach(from.y, to.y))
}

/// Sign that maps zero to zero, unlike `f32::signum`.
pub(crate) fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
