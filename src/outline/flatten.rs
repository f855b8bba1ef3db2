//! Approximate cubic segments with polylines.

use pathfinder_geometry::vector::Vector2F;

use crate::outline::ControlQuad;

/// Number of samples taken along each segment.
pub const GRANULARITY: usize = 100;

/// Sample `quad` at `GRANULARITY` evenly spaced parameter values, both end points included.
pub fn flatten(quad: &ControlQuad) -> Vec<Vector2F> {
    flatten_with(quad, GRANULARITY)
}

/// Sample `quad` at `granularity` evenly spaced parameter values, both end points included.
///
/// A granularity below 2 is treated as 2, yielding just the end points.
pub fn flatten_with(quad: &ControlQuad, granularity: usize) -> Vec<Vector2F> {
    let granularity = granularity.max(2);
    let last = (granularity - 1) as f32;
    (0..granularity)
        .map(|i| match i {
            0 => quad.first,
            i if i == granularity - 1 => quad.fourth,
            i => quad.evaluate(i as f32 / last),
        })
        .collect()
}

/// Flatten a whole contour into one closed polyline.
///
/// Shared end points between consecutive segments appear once, and the final point, which
/// coincides with the first, is omitted.
pub fn flatten_contour(contour: &[ControlQuad], granularity: usize) -> Vec<Vector2F> {
    let mut polyline = Vec::new();
    for quad in contour {
        let samples = flatten_with(quad, granularity);
        // The first sample repeats the end of the previous segment
        let skip = if polyline.is_empty() { 0 } else { 1 };
        polyline.extend(samples.into_iter().skip(skip));
    }
    if polyline.len() > 1 {
        polyline.pop();
    }
    polyline
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_geometry::vector::vec2f;

    fn line(from: Vector2F, to: Vector2F) -> ControlQuad {
        ControlQuad::elevate(from, from.lerp(to, 0.5), to)
    }

    #[test]
    fn sample_count_and_end_points() {
        let quad = ControlQuad::elevate(vec2f(0., 0.), vec2f(50., 100.), vec2f(100., 0.));
        let samples = flatten(&quad);
        assert_eq!(samples.len(), GRANULARITY);
        assert_eq!(samples[0], vec2f(0., 0.));
        assert_eq!(samples[GRANULARITY - 1], vec2f(100., 0.));
    }

    #[test]
    fn samples_lie_on_curve() {
        let quad = ControlQuad::elevate(vec2f(0., 0.), vec2f(50., 100.), vec2f(100., 0.));
        let samples = flatten_with(&quad, 3);
        assert_eq!(samples.len(), 3);
        // The apex of a symmetric quadratic is half way to its control point
        assert!((samples[1] - vec2f(50., 50.)).length() < 1e-4);
    }

    #[test]
    fn minimum_granularity() {
        let quad = line(vec2f(1., 1.), vec2f(3., 3.));
        assert_eq!(flatten_with(&quad, 0), vec![vec2f(1., 1.), vec2f(3., 3.)]);
    }

    #[test]
    fn flatten_closed_contour() {
        let a = vec2f(0., 0.);
        let b = vec2f(10., 0.);
        let c = vec2f(10., 10.);
        let contour = [line(a, b), line(b, c), line(c, a)];
        let polyline = flatten_contour(&contour, 2);
        assert_eq!(polyline, vec![a, b, c]);

        let polyline = flatten_contour(&contour, 5);
        assert_eq!(polyline.len(), 3 * 4);
        assert_eq!(polyline[4], b);
        assert_eq!(polyline[8], c);
        assert!(flatten_contour(&[], 5).is_empty());
    }
}
