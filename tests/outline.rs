mod common;

use common::builder::{self, FontBuilder};

use trueglyph::outline::flatten::GRANULARITY;
use trueglyph::outline::OutlineSink;
use trueglyph::pathfinder_geometry::line_segment::LineSegment2F;
use trueglyph::pathfinder_geometry::vector::{vec2f, Vector2F};
use trueglyph::{FontManager, LoadMode};

#[derive(Default)]
struct PathCounter {
    contours: usize,
    curves: usize,
    current: Vector2F,
    ends: Vec<Vector2F>,
}

impl OutlineSink for PathCounter {
    fn move_to(&mut self, to: Vector2F) {
        self.contours += 1;
        self.current = to;
    }

    fn cubic_curve_to(&mut self, _ctrl: LineSegment2F, to: Vector2F) {
        self.curves += 1;
        self.current = to;
    }

    fn close(&mut self) {
        self.ends.push(self.current);
    }
}

fn ring() -> Vec<u8> {
    // An outer contour of mostly off-curve points and an inner square
    builder::simple_glyph(&[
        &[
            (true, 0, 50),
            (false, 0, 100),
            (false, 100, 100),
            (false, 100, 0),
            (false, 0, 0),
        ],
        &[
            (true, 25, 25),
            (true, 25, 75),
            (true, 75, 75),
            (true, 75, 25),
        ],
    ])
}

#[test]
fn outline_of_ring() {
    let data = FontBuilder::new()
        .glyph(ring())
        .glyph(builder::composite_glyph(&[(0, 100, 0)]))
        .build();
    let mut manager = FontManager::load(data, LoadMode::Synchronous);
    let glyph = manager.glyph(0).unwrap();

    let mut counter = PathCounter::default();
    glyph.visit(&mut counter);
    assert_eq!(counter.contours, 2);
    assert_eq!(counter.curves, 8);
    // Every contour ends where it started
    assert_eq!(counter.ends, vec![vec2f(0., 50.), vec2f(25., 25.)]);

    let composite = manager.glyph(1).unwrap();
    let mut counter = PathCounter::default();
    composite.visit(&mut counter);
    assert_eq!(counter.ends, vec![vec2f(100., 50.), vec2f(125., 25.)]);
}

#[test]
fn polylines_of_ring() {
    let data = FontBuilder::new().glyph(ring()).build();
    let mut manager = FontManager::load(data, LoadMode::Concurrent);
    manager.wait();
    let glyph = manager.glyph(0).unwrap();

    let polylines = glyph.polylines(GRANULARITY);
    assert_eq!(polylines.len(), 2);
    assert_eq!(polylines[0].len(), 4 * (GRANULARITY - 1));
    assert_eq!(polylines[1].len(), 4 * (GRANULARITY - 1));
    assert_eq!(polylines[0][0], vec2f(0., 50.));
    for point in &polylines[0] {
        assert!(point.x() > -0.01 && point.x() < 100.01);
        assert!(point.y() > -0.01 && point.y() < 100.01);
    }
    assert!(polylines[1].contains(&vec2f(75., 75.)));
}
