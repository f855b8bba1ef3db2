#![warn(rust_2018_idioms)]

//! # TrueType glyph decoding
//!
//! `trueglyph` decodes the outlines of TrueType fonts into cubic Bézier contours and maps
//! Unicode code points to glyphs through `cmap` format 4 subtables.
//!
//! ## Overview
//!
//! * `tables` parses the table directory and the `head`, `maxp`, `loca`, `glyf`, `hhea`,
//!   `hmtx` and `cmap` tables.
//! * `outline` reconstructs implied points, elevates quadratic segments to cubic and flattens
//!   them into polylines.
//! * `font::Font` ties the tables together and builds the geometry of individual glyphs.
//! * `font_manager::FontManager` builds every glyph of a font, optionally in parallel, and
//!   answers lookups by glyph index or code point.
//!
//! ## Features
//!
//! * `concurrent` (enabled by default) builds glyphs on the rayon thread pool when
//!   `LoadMode::Concurrent` is requested.

/// Reading of binary data.
pub mod binary;
pub mod error;
pub mod font;
pub mod font_manager;
pub mod outline;
pub mod size;
pub mod tables;
pub mod tag;

pub use pathfinder_geometry;

pub use font::{Font, Geometry};
pub use font_manager::{FontManager, LoadMode, Lookup};
