//! Connector geometry.
//!
//! Connectors are drawn center to center between two shapes, then clipped so
//! each end sits on the shape's bounding box expanded by a small padding. The
//! functions here are pure: identical inputs give identical floating point
//! outputs.

use serde::Serialize;

/// Gap left between a connector end and the shape it touches.
pub const DEFAULT_PADDING: f64 = 5.0;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in absolute canvas coordinates.
///
/// Shapes without dimensions are zero-size rectangles located at their origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width (zero for point-like elements).
    pub width: f64,
    /// Height (zero for point-like elements).
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Translate the rectangle by an offset.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Endpoints and bounding box of a clipped connector.
///
/// `points` is relative to `start`, which is how the canvas server expects
/// linear elements to be described.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorGeometry {
    /// Clipped start point (on the source shape boundary).
    pub start: Point,
    /// Clipped end point (on the target shape boundary).
    pub end: Point,
    /// Horizontal extent of the connector.
    pub width: f64,
    /// Vertical extent of the connector.
    pub height: f64,
    /// Two-point path relative to `start`.
    pub points: [[f64; 2]; 2],
}

/// Find where the ray from `center` toward `target` leaves `rect` grown by `pad`.
///
/// Returns `center` unchanged when the ray has zero length or no padded edge is
/// crossed.
#[must_use]
pub fn clip_to_rect(center: Point, target: Point, rect: Rect, pad: f64) -> Point {
    let dx = target.x - center.x;
    let dy = target.y - center.y;

    if dx == 0.0 && dy == 0.0 {
        return center;
    }

    let left = rect.x - pad;
    let right = rect.x + rect.width + pad;
    let top = rect.y - pad;
    let bottom = rect.y + rect.height + pad;

    let mut best: Option<(f64, Point)> = None;
    let mut consider = |t: f64, p: Point| {
        if t > 0.0 && best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, p));
        }
    };

    if dx > 0.0 {
        let t = (right - center.x) / dx;
        let y_at = center.y + t * dy;
        if (top..=bottom).contains(&y_at) {
            consider(t, Point::new(right, y_at));
        }
    }

    if dx < 0.0 {
        let t = (left - center.x) / dx;
        let y_at = center.y + t * dy;
        if (top..=bottom).contains(&y_at) {
            consider(t, Point::new(left, y_at));
        }
    }

    if dy > 0.0 {
        let t = (bottom - center.y) / dy;
        let x_at = center.x + t * dx;
        if (left..=right).contains(&x_at) {
            consider(t, Point::new(x_at, bottom));
        }
    }

    if dy < 0.0 {
        let t = (top - center.y) / dy;
        let x_at = center.x + t * dx;
        if (left..=right).contains(&x_at) {
            consider(t, Point::new(x_at, top));
        }
    }

    best.map_or(center, |(_, p)| p)
}

/// Compute the geometry of a connector between two shapes.
///
/// Both ends are clipped with the same padding so the connector touches each
/// shape's boundary instead of overlapping its interior.
#[must_use]
pub fn connector_geometry(from: Rect, to: Rect, pad: f64) -> ConnectorGeometry {
    let from_center = from.center();
    let to_center = to.center();

    let start = clip_to_rect(from_center, to_center, from, pad);
    let end = clip_to_rect(to_center, from_center, to, pad);

    let dx = end.x - start.x;
    let dy = end.y - start.y;

    ConnectorGeometry {
        start,
        end,
        width: dx.abs(),
        height: dy.abs(),
        points: [[0.0, 0.0], [dx, dy]],
    }
}
