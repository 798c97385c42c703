//! Link routing: from two anchored endpoints to a drawable path.
//!
//! Routing picks the shape from the link's [`LineType`]. Angular and rounded
//! links become a polyline: a Z (two bends) when the end facings are exactly
//! opposite, otherwise an L (one bend). A Z's middle segment is registered in
//! [`LineReservations`] so two links never share the same bend line.

use crate::collision::LineReservations;
use crate::config::GraphConfig;
use crate::decoration::{EndKinds, Glyph};
use crate::error::Result;
use crate::geometry::{Facing, Point, Rect};
use crate::ids::LinkId;
use crate::link::{LineType, LinkOptions};
use crate::path::{
    curve_points, generate_curve_path, generate_line_path, generate_polyline_path, sign,
};

/// Bend coordinates closer than this count as the same line.
const BEND_EPSILON: f32 = 0.001;

/// Everything needed to route one link, in canvas-local coordinates.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    pub link: LinkId,
    pub start: Point,
    pub end: Point,
    pub start_facing: Facing,
    pub end_facing: Facing,
    pub end1: Option<&'a str>,
    pub end2: Option<&'a str>,
    pub options: &'a LinkOptions,
}

/// An end decoration positioned on a routed link.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPlacement {
    pub kind: String,
    pub glyph: Glyph,
    /// Base of the glyph, relative to the link's bounds.
    pub origin: Point,
    /// Rotation in degrees; the glyph points back at its port.
    pub angle: f32,
}

impl GlyphPlacement {
    /// SVG transform that places the glyph's path.
    pub fn transform(&self) -> String {
        format!(
            "translate({} {}) rotate({})",
            self.origin.x, self.origin.y, self.angle
        )
    }
}

/// Result of routing one link.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedLink {
    /// Path vertices in canvas-local coordinates (Bézier control points for curves).
    pub points: Vec<Point>,
    /// SVG path commands relative to `bounds.x`/`bounds.y`.
    pub commands: String,
    /// Box of the rendered element, padded.
    pub bounds: Rect,
    pub glyphs: Vec<GlyphPlacement>,
    /// Anchor positions before end decorations pull the line back.
    pub start: Point,
    pub end: Point,
}

/// Route a link.
///
/// Releases the link's previous bend reservations before routing. Returns
/// `Ok(None)` when the geometry is degenerate (an endpoint was never measured,
/// or a coordinate is not finite); the caller keeps its previous render, so the
/// link keeps its previous reservations too. Fails only for an unknown end
/// decoration kind.
pub fn route_link(
    input: &RouteInput<'_>,
    reservations: &mut LineReservations,
    kinds: &EndKinds,
    config: &GraphConfig,
) -> Result<Option<RoutedLink>> {
    let glyph1 = kinds.resolve(input.end1)?;
    let glyph2 = kinds.resolve(input.end2)?;

    if !input.start.is_finite() || !input.end.is_finite() {
        return Ok(None);
    }
    let previous = reservations.held_lines(input.link);
    reservations.release(input.link);

    let mut glyphs = Vec::new();
    let mut start = input.start;
    let mut end = input.end;
    if let (Some(kind), Some(glyph)) = (input.end1, glyph1) {
        start = pull_back(start, input.start_facing, glyph);
        glyphs.push(place(kind, glyph, start, input.start_facing));
    }
    if let (Some(kind), Some(glyph)) = (input.end2, glyph2) {
        end = pull_back(end, input.end_facing, glyph);
        glyphs.push(place(kind, glyph, end, input.end_facing));
    }

    let points = match input.options.line_type {
        LineType::Line => vec![start, end],
        LineType::Curve => curve_points(start, end).to_vec(),
        LineType::Angular | LineType::Rounded => polyline(input, start, end, reservations),
    };

    let padding = glyphs
        .iter()
        .map(|g| g.glyph.width.max(g.glyph.height))
        .fold(config.min_padding, f32::max);
    let Some(bounds) = Rect::bounding(
        points
            .iter()
            .copied()
            .chain([input.start, input.end]),
    ) else {
        reservations.reinstate(input.link, previous);
        return Ok(None);
    };
    let bounds = bounds.inflate(padding);
    if !bounds.is_finite() || points.iter().any(|p| !p.is_finite()) {
        log::trace!("link {}: degenerate geometry, keeping previous render", input.link);
        reservations.reinstate(input.link, previous);
        return Ok(None);
    }

    let local = |p: Point| Point::new(p.x - bounds.x, p.y - bounds.y);
    let relative: Vec<Point> = points.iter().copied().map(local).collect();
    let commands = match input.options.line_type {
        LineType::Line => generate_line_path(relative[0], relative[1]),
        LineType::Curve => {
            generate_curve_path([relative[0], relative[1], relative[2], relative[3]])
        }
        LineType::Angular => generate_polyline_path(&relative, false, config.corner_radius),
        LineType::Rounded => generate_polyline_path(&relative, true, config.corner_radius),
    };
    for g in &mut glyphs {
        g.origin = local(g.origin);
    }

    Ok(Some(RoutedLink {
        points,
        commands,
        bounds,
        glyphs,
        start: input.start,
        end: input.end,
    }))
}

/// Move an endpoint outwards along its facing by the glyph's length.
fn pull_back(p: Point, facing: Facing, glyph: &Glyph) -> Point {
    Point::new(p.x + facing.x * glyph.width, p.y + facing.y * glyph.width)
}

fn place(kind: &str, glyph: &Glyph, origin: Point, facing: Facing) -> GlyphPlacement {
    GlyphPlacement {
        kind: kind.to_string(),
        glyph: glyph.clone(),
        origin,
        angle: facing.opposite().angle_degrees(),
    }
}

/// Z or L polyline between two endpoints, reserving the Z's bend line.
fn polyline(
    input: &RouteInput<'_>,
    start: Point,
    end: Point,
    reservations: &mut LineReservations,
) -> Vec<Point> {
    let (sf, ef) = (input.start_facing, input.end_facing);
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    // flips the facing when the other end lies behind it
    let flip_x = sign(sf.x) * sign(dx);
    let flip_y = sign(sf.y) * sign(dy);

    if sf.is_opposite_of(ef) {
        let mut x1 = start.x + flip_x * sf.x * (dx / 2.0).abs();
        let mut x2 = end.x + flip_x * ef.x * (dx / 2.0).abs();
        let mut y1 = start.y + flip_y * sf.y * (dy / 2.0).abs();
        let mut y2 = end.y + flip_y * ef.y * (dy / 2.0).abs();

        if sf.x != 0.0 && (x1 - x2).abs() < BEND_EPSILON {
            let x = reservations.reserve_vertical(input.link, x1, start.y, dy);
            x1 = x;
            x2 = x;
        } else if sf.y != 0.0 && (y1 - y2).abs() < BEND_EPSILON {
            let y = reservations.reserve_horizontal(input.link, y1, start.x, dx);
            y1 = y;
            y2 = y;
        }
        vec![start, Point::new(x1, y1), Point::new(x2, y2), end]
    } else {
        let corner = Point::new(
            start.x + flip_x * sf.x * dx.abs(),
            start.y + flip_y * sf.y * dy.abs(),
        );
        vec![start, corner, end]
    }
}
