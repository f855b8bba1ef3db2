//! Reconstruction of glyph outlines as cubic Bézier segments.
//!
//! TrueType contours are sequences of on-curve and off-curve points describing quadratic
//! curves, with some points left implicit. This module fills in the implied points, groups the
//! result into quadratic segments and elevates each one to an equivalent cubic segment
//! (`ControlQuad`). Outlines can then be replayed into an `OutlineSink` or flattened into
//! polylines with the `flatten` module.

pub mod flatten;

use pathfinder_geometry::line_segment::LineSegment2F;
use pathfinder_geometry::transform2d::Transform2F;
use pathfinder_geometry::vector::{vec2f, Vector2F};

use crate::error::ParseError;
use crate::tables::glyf::Point;

/// The four control points of one cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlQuad {
    pub first: Vector2F,
    pub second: Vector2F,
    pub third: Vector2F,
    pub fourth: Vector2F,
}

/// A receiver of drawing operations.
pub trait OutlineSink {
    /// Start a new contour at `to`.
    fn move_to(&mut self, to: Vector2F);

    /// Draw a cubic curve from the current point to `to`, with control points `ctrl.from()` and
    /// `ctrl.to()`.
    fn cubic_curve_to(&mut self, ctrl: LineSegment2F, to: Vector2F);

    /// Close the current contour.
    fn close(&mut self);
}

/// A contour point after implied points have been made explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CurvePoint {
    on_curve: bool,
    position: Vector2F,
}

impl ControlQuad {
    /// Degree elevate the quadratic segment from `start` to `end` with control point `control`.
    ///
    /// The resulting cubic traces exactly the same curve.
    pub fn elevate(start: Vector2F, control: Vector2F, end: Vector2F) -> ControlQuad {
        ControlQuad {
            first: start,
            second: start + (control - start) * (2. / 3.),
            third: end + (control - end) * (2. / 3.),
            fourth: end,
        }
    }

    /// Evaluate the curve at `t` in `0..=1` by repeated linear interpolation.
    pub fn evaluate(&self, t: f32) -> Vector2F {
        let a = self.first.lerp(self.second, t);
        let b = self.second.lerp(self.third, t);
        let c = self.third.lerp(self.fourth, t);
        let d = a.lerp(b, t);
        let e = b.lerp(c, t);
        d.lerp(e, t)
    }

    pub fn transform(&self, transform: Transform2F) -> ControlQuad {
        ControlQuad {
            first: transform * self.first,
            second: transform * self.second,
            third: transform * self.third,
            fourth: transform * self.fourth,
        }
    }
}

impl CurvePoint {
    fn from_point(point: &Point) -> Self {
        CurvePoint {
            on_curve: point.on_curve,
            position: vec2f(point.x as f32, point.y as f32),
        }
    }

    fn midpoint(self, other: CurvePoint) -> Vector2F {
        self.position.lerp(other.position, 0.5)
    }
}

/// Turn a contour of a simple glyph into cubic segments.
///
/// Between two consecutive on-curve points an off-curve point is inserted at their midpoint,
/// making the segment a straight quadratic. Between two consecutive off-curve points the implied
/// on-curve midpoint is inserted. The resulting points alternate strictly between on and off
/// curve, so they group into (on, off, on) triples that wrap around to close the contour.
///
/// A contour that starts with two off-curve points is rejected with
/// `ParseError::MalformedContour`.
pub fn reconstruct_contour(points: &[Point]) -> Result<Vec<ControlQuad>, ParseError> {
    if let [first, second, ..] = points {
        if !first.on_curve && !second.on_curve {
            return Err(ParseError::MalformedContour);
        }
    }

    let points = fill_missing_points(points);
    let len = points.len();
    if len == 0 {
        return Ok(Vec::new());
    }
    if len % 2 != 0 {
        return Err(ParseError::MalformedContour);
    }

    // Start on an on-curve point. After filling, if the first point is off-curve the last one is
    // on-curve and anchors the first segment.
    let start = if points[0].on_curve { 0 } else { len - 1 };
    (0..len / 2)
        .map(|segment| {
            let index = start + 2 * segment;
            let anchor = points[index % len];
            let control = points[(index + 1) % len];
            let end = points[(index + 2) % len];
            if !anchor.on_curve || control.on_curve || !end.on_curve {
                return Err(ParseError::MalformedContour);
            }
            Ok(ControlQuad::elevate(
                anchor.position,
                control.position,
                end.position,
            ))
        })
        .collect()
}

/// Insert the implied points between consecutive points of the same kind, treating the contour
/// as closed.
fn fill_missing_points(points: &[Point]) -> Vec<CurvePoint> {
    let mut filled = Vec::with_capacity(points.len() * 2);
    for (i, point) in points.iter().enumerate() {
        let current = CurvePoint::from_point(point);
        let next = CurvePoint::from_point(&points[(i + 1) % points.len()]);
        filled.push(current);
        if current.on_curve == next.on_curve {
            filled.push(CurvePoint {
                on_curve: !current.on_curve,
                position: current.midpoint(next),
            });
        }
    }
    filled
}

/// Replay `contours` into `sink`, applying `transform` to every point.
pub fn visit_contours<S: OutlineSink>(
    contours: &[Vec<ControlQuad>],
    transform: Transform2F,
    sink: &mut S,
) {
    for contour in contours {
        let Some(first) = contour.first() else {
            continue;
        };
        sink.move_to(transform * first.first);
        for quad in contour {
            let quad = quad.transform(transform);
            sink.cubic_curve_to(LineSegment2F::new(quad.second, quad.third), quad.fourth);
        }
        sink.close();
    }
}
