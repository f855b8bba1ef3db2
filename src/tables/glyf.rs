//! Parsing of the `glyf` table.
//!
//! > This table contains information that describes the glyphs in the font in the TrueType outline
//! > format. Information regarding the rasterizer (scaler) refers to the TrueType rasterizer.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>
//!
//! Glyphs are decoded into absolute coordinate contours (simple glyphs) or lists of transformed
//! references to other glyphs (composite glyphs). Hinting instructions are skipped.

use std::iter;

use bitflags::bitflags;
use itertools::Itertools;
use log::warn;
use pathfinder_geometry::transform2d::{Matrix2x2F, Transform2F};
use pathfinder_geometry::vector::{vec2f, Vector2F};

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be};
use crate::error::ParseError;
use crate::tables::loca::LocaTable;
use crate::tables::F2Dot14;

/// Maximum depth of nested composite glyphs that will be resolved.
pub const COMPOSITE_GLYPH_RECURSION_LIMIT: u8 = 16;

/// Threshold used when deciding whether to double the component offset divisor.
const OFFSET_NORMALIZATION_THRESHOLD: f32 = 33.0 / 65536.0;

bitflags! {
    #[rustfmt::skip]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT                       = 0b00000001;
        const X_SHORT_VECTOR                       = 0b00000010;
        const Y_SHORT_VECTOR                       = 0b00000100;
        const REPEAT_FLAG                          = 0b00001000;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0b00010000;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0b00100000;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct CompositeGlyphFlag: u16 {
        /// Bit 0: If this is set, the arguments are 16-bit (uint16 or int16); otherwise, they are
        /// bytes (uint8 or int8).
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        /// Bit 1: If this is set, the arguments are signed xy values; otherwise, they are unsigned
        /// point numbers.
        const ARGS_ARE_XY_VALUES = 0x0002;
        /// Bit 2: For the xy values if the preceding is true.
        const ROUND_XY_TO_GRID = 0x0004;
        /// Bit 3: This indicates that there is a simple scale for the component. Otherwise,
        /// scale = 1.0.
        const WE_HAVE_A_SCALE = 0x0008;
        /// Bit 5: Indicates at least one more glyph after this one.
        const MORE_COMPONENTS = 0x0020;
        /// Bit 6: The x direction will use a different scale from the y direction.
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        /// Bit 7: There is a 2 by 2 transformation that will be used to scale the component.
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        /// Bit 8: Following the last component are instructions for the composite character.
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        /// Bit 9: If set, this forces the aw and lsb (and rsb) for the composite to be equal to
        /// those from this original glyph.
        const USE_MY_METRICS = 0x0200;
        /// Bit 10: If set, the components of the compound glyph overlap.
        const OVERLAP_COMPOUND = 0x0400;
        /// Bit 11: The composite is designed to have the component offset scaled.
        const SCALED_COMPONENT_OFFSET = 0x0800;
        /// Bit 12: The composite is designed not to have the component offset scaled.
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// View of the `glyf` table, located through the `loca` table.
#[derive(Debug, Clone, Copy)]
pub struct GlyfTable<'a> {
    scope: ReadScope<'a>,
    loca: &'a LocaTable,
}

/// The undecoded data of a single glyph.
#[derive(Debug, PartialEq, Clone)]
pub enum GlyfRecord<'a> {
    Empty,
    Present {
        number_of_contours: i16,
        scope: ReadScope<'a>,
    },
}

/// A point of a simple glyph in absolute font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub on_curve: bool,
    pub x: i32,
    pub y: i32,
}

/// A closed loop of points. The last point connects back to the first.
pub type Contour = Vec<Point>;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct BoundingBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// A decoded glyph, prior to outline reconstruction.
#[derive(Debug, PartialEq, Clone)]
pub struct RawGlyphRecord {
    pub index: u16,
    pub bounding_box: BoundingBox,
    pub body: GlyphBody,
}

#[derive(Debug, PartialEq, Clone)]
pub enum GlyphBody {
    Simple(Vec<Contour>),
    Composite(Vec<Component>),
}

/// The points and flags of a simple glyph, with coordinates resolved to absolute values.
#[derive(Debug, PartialEq, Clone)]
pub struct SimpleGlyph {
    pub end_pts_of_contours: Vec<u16>,
    pub flags: Vec<SimpleGlyphFlag>,
    pub coordinates: Vec<Point>,
}

/// A component of a composite glyph as stored in the font.
#[derive(Debug, PartialEq, Clone)]
pub struct CompositeGlyph {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    pub argument1: CompositeGlyphArgument,
    pub argument2: CompositeGlyphArgument,
    pub scale: Option<CompositeGlyphScale>,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphArgument {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphScale {
    Scale(F2Dot14),
    XY { x_scale: F2Dot14, y_scale: F2Dot14 },
    Matrix([[F2Dot14; 2]; 2]),
}

/// A reference from a composite glyph to a child glyph.
#[derive(Debug, PartialEq, Clone)]
pub struct Component {
    pub glyph_index: u16,
    pub flags: CompositeGlyphFlag,
    pub transform: ComponentTransform,
}

/// Affine transform of a component.
///
/// A point `(x, y)` of the child maps to `(a·x + c·y + e, b·x + d·y + f)`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ComponentTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

struct CompositeGlyphs {
    glyphs: Vec<CompositeGlyph>,
}

impl<'a> GlyfTable<'a> {
    /// `scope` is the data of the `glyf` table.
    pub fn new(scope: ReadScope<'a>, loca: &'a LocaTable) -> Result<Self, ParseError> {
        if loca.offsets.is_empty() {
            return Err(ParseError::BadIndex);
        }
        Ok(GlyfTable { scope, loca })
    }

    pub fn num_glyphs(&self) -> usize {
        self.loca.num_glyphs()
    }

    /// Locate the data of `glyph_index`.
    pub fn record(&self, glyph_index: u16) -> Result<GlyfRecord<'a>, ParseError> {
        let range = self.loca.glyph_range(glyph_index)?;
        self.record_at(glyph_index, range.start, range.end)
    }

    /// Locate the data of every glyph, in glyph index order.
    pub fn records(&self) -> impl Iterator<Item = Result<GlyfRecord<'a>, ParseError>> + '_ {
        self.loca
            .offsets
            .iter()
            .tuple_windows()
            .zip(0u16..)
            .map(move |((&start, &end), glyph_index)| {
                if end < start {
                    return Err(ParseError::BadOffset);
                }
                let start = usize::try_from(start)?;
                let end = usize::try_from(end)?;
                self.record_at(glyph_index, start, end)
            })
    }

    /// Decode `glyph_index` into contours or components.
    pub fn read_glyph(&self, glyph_index: u16) -> Result<RawGlyphRecord, ParseError> {
        self.record(glyph_index)?.parse(glyph_index)
    }

    fn record_at(
        &self,
        glyph_index: u16,
        start: usize,
        end: usize,
    ) -> Result<GlyfRecord<'a>, ParseError> {
        if start == end {
            return Ok(GlyfRecord::Empty);
        }
        let scope = match self.scope.offset_length(start, end - start) {
            Ok(scope) => scope,
            Err(ParseError::BadEof) => {
                // The length specified by `loca` runs past the end of the `glyf` table. Some
                // fonts get the final offset wrong while the glyph data itself is intact, so
                // try parsing without the length limit.
                warn!("glyph {} length out of bounds, trying to parse", glyph_index);
                self.scope.offset(start)
            }
            Err(err) => return Err(err),
        };
        let number_of_contours = scope.read::<I16Be>()?;
        Ok(GlyfRecord::Present {
            number_of_contours,
            scope,
        })
    }
}

impl<'a> GlyfRecord<'a> {
    pub fn number_of_contours(&self) -> i16 {
        match self {
            GlyfRecord::Empty => 0,
            GlyfRecord::Present {
                number_of_contours, ..
            } => *number_of_contours,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.number_of_contours() < 0
    }

    pub fn parse(&self, glyph_index: u16) -> Result<RawGlyphRecord, ParseError> {
        match self {
            GlyfRecord::Empty => Ok(RawGlyphRecord::empty(glyph_index)),
            GlyfRecord::Present { scope, .. } => scope.read_dep::<RawGlyphRecord>(glyph_index),
        }
    }
}

impl RawGlyphRecord {
    /// A glyph with no outline, such as the space glyph.
    pub fn empty(index: u16) -> Self {
        RawGlyphRecord {
            index,
            bounding_box: BoundingBox::default(),
            body: GlyphBody::Simple(Vec::new()),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.body, GlyphBody::Composite(_))
    }
}

impl ReadBinaryDep for RawGlyphRecord {
    type Args<'a> = u16;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, index: u16) -> Result<Self, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;

        let body = if number_of_contours >= 0 {
            // Cast is safe as we've checked value is positive above
            let glyph = ctxt.read_dep::<SimpleGlyph>(number_of_contours as u16)?;
            GlyphBody::Simple(glyph.contours())
        } else {
            // Instructions following the components are not needed and not read.
            let composite = ctxt.read::<CompositeGlyphs>()?;
            GlyphBody::Composite(composite.glyphs.iter().map(Component::from).collect())
        };

        Ok(RawGlyphRecord {
            index,
            bounding_box,
            body,
        })
    }
}

impl SimpleGlyph {
    /// Split the points into contours using the contour end points.
    pub fn contours(&self) -> Vec<Contour> {
        self.end_pts_of_contours
            .iter()
            .scan(0, move |i, &end| {
                let start = *i;
                let end = usize::from(end);
                *i = end + 1;
                self.coordinates.get(start..=end).map(<[Point]>::to_vec)
            })
            .collect()
    }
}

impl ReadBinaryDep for SimpleGlyph {
    type Args<'a> = u16;
    type HostType<'a> = Self;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, number_of_contours: u16) -> Result<Self, ParseError> {
        let number_of_contours = usize::from(number_of_contours);
        let end_pts_of_contours = ctxt.read_array::<U16Be>(number_of_contours)?.to_vec();
        ctxt.check(
            end_pts_of_contours
                .iter()
                .tuple_windows()
                .all(|(prev, next)| prev < next),
        )?;
        let instruction_length = ctxt.read_u16be()?;
        ctxt.skip(usize::from(instruction_length))?;
        // end_pts_of_contours stores the index of the end points.
        // Therefore the number of coordinates is the last index + 1
        let number_of_coordinates = end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1);

        // Read all the flags
        let mut flags = Vec::with_capacity(number_of_coordinates);
        while flags.len() < number_of_coordinates {
            let flag = ctxt.read::<SimpleGlyphFlag>()?;
            if flag.is_repeated() {
                let count = usize::from(ctxt.read_u8()?) + 1; // + 1 to include the current entry
                flags.extend(iter::repeat(flag).take(count));
            } else {
                flags.push(flag);
            }
        }
        // A repeat count is allowed to overshoot; the surplus describes no points.
        flags.truncate(number_of_coordinates);

        // The coordinates are stored as deltas against the previous point, with the first one
        // being implicitly against (0, 0). The running position carries across contours.
        let mut x = 0;
        let xs = flags
            .iter()
            .map(|flag| -> Result<i32, ParseError> {
                x += read_delta(ctxt, flag.x_is_short(), flag.x_is_same_or_positive())?;
                Ok(x)
            })
            .collect::<Result<Vec<i32>, ParseError>>()?;

        let mut y = 0;
        let mut coordinates = Vec::with_capacity(number_of_coordinates);
        for (flag, x) in flags.iter().zip(xs) {
            y += read_delta(ctxt, flag.y_is_short(), flag.y_is_same_or_positive())?;
            coordinates.push(Point {
                on_curve: flag.is_on_curve(),
                x,
                y,
            });
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            flags,
            coordinates,
        })
    }
}

/// Read one coordinate delta, the encoding of which is selected by the two flag bits of its axis.
fn read_delta(
    ctxt: &mut ReadCtxt<'_>,
    short: bool,
    same_or_positive: bool,
) -> Result<i32, ParseError> {
    let delta = if short {
        let magnitude = i32::from(ctxt.read_u8()?);
        if same_or_positive {
            magnitude
        } else {
            -magnitude
        }
    } else if same_or_positive {
        0
    } else {
        i32::from(ctxt.read_i16be()?)
    };
    Ok(delta)
}

impl ReadFrom for SimpleGlyphFlag {
    type ReadType = crate::binary::U8;

    fn read_from(flag: u8) -> Self {
        SimpleGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinary for CompositeGlyphs {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let mut glyphs = Vec::new();
        loop {
            let flags = ctxt.read::<CompositeGlyphFlag>()?;
            let data = ctxt.read_dep::<CompositeGlyph>(flags)?;
            glyphs.push(data);

            if !flags.more_components() {
                break;
            }
        }

        Ok(CompositeGlyphs { glyphs })
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self.contains(Self::ON_CURVE_POINT)
    }

    pub fn x_is_short(self) -> bool {
        self.contains(Self::X_SHORT_VECTOR)
    }

    pub fn y_is_short(self) -> bool {
        self.contains(Self::Y_SHORT_VECTOR)
    }

    pub fn is_repeated(self) -> bool {
        self.contains(Self::REPEAT_FLAG)
    }

    pub fn x_is_same_or_positive(self) -> bool {
        self.contains(Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR)
    }

    pub fn y_is_same_or_positive(self) -> bool {
        self.contains(Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR)
    }
}

impl ReadFrom for CompositeGlyphFlag {
    type ReadType = U16Be;

    fn read_from(flag: u16) -> Self {
        CompositeGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinaryDep for CompositeGlyphArgument {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        flags: CompositeGlyphFlag,
    ) -> Result<Self, ParseError> {
        let arg = match (flags.arg_1_and_2_are_words(), flags.args_are_xy_values()) {
            (true, true) => CompositeGlyphArgument::I16(ctxt.read_i16be()?),
            (true, false) => CompositeGlyphArgument::U16(ctxt.read_u16be()?),
            (false, true) => CompositeGlyphArgument::I8(ctxt.read_i8()?),
            (false, false) => CompositeGlyphArgument::U8(ctxt.read_u8()?),
        };

        Ok(arg)
    }
}

impl ReadBinaryDep for CompositeGlyph {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        flags: CompositeGlyphFlag,
    ) -> Result<Self, ParseError> {
        let glyph_index = ctxt.read_u16be()?;
        let argument1 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;
        let argument2 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;

        let scale = if flags.we_have_a_scale() {
            Some(CompositeGlyphScale::Scale(ctxt.read::<F2Dot14>()?))
        } else if flags.we_have_an_x_and_y_scale() {
            Some(CompositeGlyphScale::XY {
                x_scale: ctxt.read::<F2Dot14>()?,
                y_scale: ctxt.read::<F2Dot14>()?,
            })
        } else if flags.we_have_a_two_by_two() {
            Some(CompositeGlyphScale::Matrix([
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
            ]))
        } else {
            None
        };

        Ok(CompositeGlyph {
            flags,
            glyph_index,
            argument1,
            argument2,
            scale,
        })
    }
}

impl CompositeGlyph {
    /// The transform applied to the child glyph.
    ///
    /// The offsets are divided by the scale factors derived from the matrix, following the
    /// composite offset normalization described in Apple's TrueType reference manual.
    pub fn transform(&self) -> ComponentTransform {
        let (a, b, c, d) = match self.scale {
            None => (1., 0., 0., 1.),
            Some(CompositeGlyphScale::Scale(scale)) => {
                let scale = f32::from(scale);
                (scale, 0., 0., scale)
            }
            Some(CompositeGlyphScale::XY { x_scale, y_scale }) => {
                (f32::from(x_scale), 0., 0., f32::from(y_scale))
            }
            Some(CompositeGlyphScale::Matrix([[a, b], [c, d]])) => {
                (f32::from(a), f32::from(b), f32::from(c), f32::from(d))
            }
        };

        // Point numbers are accepted but anchoring to them is not supported; such components
        // are placed without an offset.
        let (raw_x, raw_y) = if self.flags.args_are_xy_values() {
            (
                i32::from(self.argument1) as f32,
                i32::from(self.argument2) as f32,
            )
        } else {
            (0., 0.)
        };

        let mut m = a.abs().max(b.abs());
        let mut n = c.abs().max(d.abs());
        if (a.abs() - c.abs()).abs() <= OFFSET_NORMALIZATION_THRESHOLD {
            m *= 2.;
        }
        if (b.abs() - d.abs()).abs() <= OFFSET_NORMALIZATION_THRESHOLD {
            n *= 2.;
        }

        ComponentTransform {
            a,
            b,
            c,
            d,
            e: normalize_offset(raw_x, m),
            f: normalize_offset(raw_y, n),
        }
    }

    /// The point numbers used for anchoring, if this component is positioned that way.
    pub fn point_numbers(&self) -> Option<(u16, u16)> {
        match (self.argument1, self.argument2) {
            (CompositeGlyphArgument::U8(p1), CompositeGlyphArgument::U8(p2)) => {
                Some((u16::from(p1), u16::from(p2)))
            }
            (CompositeGlyphArgument::U16(p1), CompositeGlyphArgument::U16(p2)) => Some((p1, p2)),
            _ => None,
        }
    }
}

fn normalize_offset(offset: f32, divisor: f32) -> f32 {
    // A degenerate (all zero) matrix leaves nothing to normalize against.
    if divisor == 0. {
        offset
    } else {
        offset / divisor
    }
}

impl From<&CompositeGlyph> for Component {
    fn from(glyph: &CompositeGlyph) -> Self {
        Component {
            glyph_index: glyph.glyph_index,
            flags: glyph.flags,
            transform: glyph.transform(),
        }
    }
}

impl ComponentTransform {
    pub const IDENTITY: ComponentTransform = ComponentTransform {
        a: 1.,
        b: 0.,
        c: 0.,
        d: 1.,
        e: 0.,
        f: 0.,
    };

    /// Map a point of the child glyph into the parent's coordinate space.
    pub fn apply(&self, point: Vector2F) -> Vector2F {
        vec2f(
            self.a * point.x() + self.c * point.y() + self.e,
            self.b * point.x() + self.d * point.y() + self.f,
        )
    }

    pub fn to_transform2f(&self) -> Transform2F {
        Transform2F {
            matrix: Matrix2x2F::row_major(self.a, self.c, self.b, self.d),
            vector: vec2f(self.e, self.f),
        }
    }
}

impl Default for ComponentTransform {
    fn default() -> Self {
        ComponentTransform::IDENTITY
    }
}

impl CompositeGlyphFlag {
    pub fn arg_1_and_2_are_words(self) -> bool {
        self.contains(Self::ARG_1_AND_2_ARE_WORDS)
    }

    pub fn args_are_xy_values(self) -> bool {
        self.contains(Self::ARGS_ARE_XY_VALUES)
    }

    pub fn we_have_a_scale(self) -> bool {
        self.contains(Self::WE_HAVE_A_SCALE)
    }

    pub fn we_have_an_x_and_y_scale(self) -> bool {
        self.contains(Self::WE_HAVE_AN_X_AND_Y_SCALE)
    }

    pub fn we_have_a_two_by_two(self) -> bool {
        self.contains(Self::WE_HAVE_A_TWO_BY_TWO)
    }

    pub fn more_components(self) -> bool {
        self.contains(Self::MORE_COMPONENTS)
    }
}

impl ReadFrom for BoundingBox {
    type ReadType = ((I16Be, I16Be), (I16Be, I16Be));

    fn read_from(((x_min, y_min), (x_max, y_max)): ((i16, i16), (i16, i16))) -> Self {
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

impl BoundingBox {
    /// Calculate xMin, xMax and yMin, yMax from a collection of `Points`
    ///
    /// Returns `None` if `points` is empty or a coordinate does not fit in 16 bits.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (x_min, y_min, x_max, y_max) = rest.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(x_min, y_min, x_max, y_max), point| {
                (
                    x_min.min(point.x),
                    y_min.min(point.y),
                    x_max.max(point.x),
                    y_max.max(point.y),
                )
            },
        );
        Some(BoundingBox {
            x_min: i16::try_from(x_min).ok()?,
            y_min: i16::try_from(y_min).ok()?,
            x_max: i16::try_from(x_max).ok()?,
            y_max: i16::try_from(y_max).ok()?,
        })
    }
}

impl From<CompositeGlyphArgument> for i32 {
    fn from(arg: CompositeGlyphArgument) -> Self {
        match arg {
            CompositeGlyphArgument::U8(value) => i32::from(value),
            CompositeGlyphArgument::I8(value) => i32::from(value),
            CompositeGlyphArgument::U16(value) => i32::from(value),
            CompositeGlyphArgument::I16(value) => i32::from(value),
        }
    }
}
