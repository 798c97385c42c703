//! Small geometry vocabulary shared by placement, routing and hit testing.

use crate::port::Edge;
use serde::{Deserialize, Serialize};

/// A point in either screen or canvas-local space (the type does not say which).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Smallest rectangle containing every point, or `None` for an empty iterator.
    ///
    /// `f32::min`/`max` skip NaN, so callers must reject non-finite points first.
    pub fn bounding<I>(points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Grow the rectangle by `pad` on every side.
    pub fn inflate(&self, pad: f32) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.width + pad * 2.0, self.height + pad * 2.0)
    }
}

/// Unit direction a port points away from its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    pub x: f32,
    pub y: f32,
}

impl Facing {
    pub const RIGHT: Facing = Facing { x: 1.0, y: 0.0 };
    pub const LEFT: Facing = Facing { x: -1.0, y: 0.0 };
    pub const UP: Facing = Facing { x: 0.0, y: -1.0 };
    pub const DOWN: Facing = Facing { x: 0.0, y: 1.0 };

    pub fn from_edge(edge: Edge) -> Self {
        match edge {
            Edge::Right => Self::RIGHT,
            Edge::Left => Self::LEFT,
            Edge::Top => Self::UP,
            Edge::Bottom => Self::DOWN,
        }
    }

    pub fn opposite(self) -> Self {
        Facing { x: -self.x, y: -self.y }
    }

    pub fn is_opposite_of(self, other: Facing) -> bool {
        self.x == -other.x && self.y == -other.y
    }

    /// Angle in degrees, in the range (-180, 180].
    pub fn angle_degrees(self) -> f32 {
        let angle = self.y.atan2(self.x).to_degrees();
        // atan2(-0.0, -1.0) is -180
        if angle <= -180.0 {
            angle + 360.0
        } else {
            angle
        }
    }
}

/// Pan/zoom state of the canvas; converts between screen and canvas-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0 }
    }
}

impl Viewport {
    fn effective_zoom(&self) -> f32 {
        if self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    pub fn to_local(&self, screen: Point) -> Point {
        let z = self.effective_zoom();
        Point::new((screen.x - self.pan_x) / z, (screen.y - self.pan_y) / z)
    }

    pub fn to_screen(&self, local: Point) -> Point {
        let z = self.effective_zoom();
        Point::new(local.x * z + self.pan_x, local.y * z + self.pan_y)
    }

    pub fn rect_to_screen(&self, local: Rect) -> Rect {
        let z = self.effective_zoom();
        let origin = self.to_screen(Point::new(local.x, local.y));
        Rect::new(origin.x, origin.y, local.width * z, local.height * z)
    }

    pub fn rect_to_local(&self, screen: Rect) -> Rect {
        let z = self.effective_zoom();
        let origin = self.to_local(Point::new(screen.x, screen.y));
        Rect::new(origin.x, origin.y, screen.width / z, screen.height / z)
    }
}
