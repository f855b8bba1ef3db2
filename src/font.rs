//! Loading a font and building glyph geometry from it.
//!
//! `Font` parses the tables needed to locate glyphs once, keeping its own copy of the font data
//! so that it can be shared between threads. Geometry is built per glyph on demand with
//! `Font::build_glyph`.

use std::ops::Range;
use std::sync::Arc;

use log::{debug, warn};
use pathfinder_geometry::transform2d::Transform2F;
use pathfinder_geometry::vector::Vector2F;
use rustc_hash::FxHashMap;

use crate::binary::read::ReadScope;
use crate::error::ParseError;
use crate::outline::flatten::flatten_contour;
use crate::outline::{reconstruct_contour, visit_contours, ControlQuad, OutlineSink};
use crate::tables::cmap::{Cmap, CmapFormat4};
use crate::tables::glyf::{
    BoundingBox, ComponentTransform, GlyfTable, GlyphBody, COMPOSITE_GLYPH_RECURSION_LIMIT,
};
use crate::tables::loca::LocaTable;
use crate::tables::{HeadTable, HheaTable, HmtxTable, MaxpTable, TableDirectory};
use crate::tag::{self, DisplayTag};

/// A parsed TrueType font.
#[derive(Debug, Clone)]
pub struct Font {
    data: Arc<[u8]>,
    glyf_range: Range<usize>,
    head: HeadTable,
    loca: LocaTable,
    hmtx: Option<HmtxTable>,
    cmap: Option<CmapFormat4>,
    index_space: GlyphIndexSpace,
}

/// The two numberings of glyphs.
///
/// Glyph indices are the font's own numbering. Insertion indices number the simple glyphs
/// first, in glyph index order, followed by the composite glyphs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphIndexSpace {
    simple: Vec<u16>,
    composite: Vec<u16>,
}

/// Outline of a glyph made of its own contours.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphGeometry {
    pub index: u16,
    pub bounding_box: BoundingBox,
    pub advance_width: u16,
    pub left_side_bearing: i16,
    pub contours: Vec<Vec<ControlQuad>>,
}

/// Outline of a glyph assembled from transformed child glyphs.
///
/// The transforms are not applied to the children; renderers apply them per child. A child
/// used more than once is shared between its uses.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeGeometry {
    pub index: u16,
    pub bounding_box: BoundingBox,
    pub advance_width: u16,
    pub left_side_bearing: i16,
    pub children: Vec<(ComponentTransform, Arc<Geometry>)>,
}

/// Glyphs finished during one build, with their heights.
type BuiltGlyphs = FxHashMap<u16, (Arc<Geometry>, usize)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Simple(GlyphGeometry),
    Composite(CompositeGeometry),
}

impl Font {
    /// Parse the font in `data`.
    ///
    /// The `head`, `maxp`, `loca` and `glyf` tables are required. `hhea`/`hmtx` and `cmap` are
    /// optional, but a `cmap` whose Unicode subtable is not format 4 is an error.
    pub fn load(data: impl Into<Arc<[u8]>>) -> Result<Font, ParseError> {
        let data = data.into();
        let scope = ReadScope::new(&data);
        let directory = scope.read::<TableDirectory>()?;
        debug!(
            "table directory: {}",
            directory
                .table_records
                .iter()
                .map(|record| DisplayTag(record.table_tag).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let head = directory
            .require_table(&scope, tag::HEAD)?
            .read::<HeadTable>()?;
        let maxp = directory
            .require_table(&scope, tag::MAXP)?
            .read::<MaxpTable>()?;
        let loca = directory
            .require_table(&scope, tag::LOCA)?
            .read_dep::<LocaTable>((maxp.num_glyphs, head.index_to_loc_format))?;
        let glyf_scope = directory.require_table(&scope, tag::GLYF)?;
        let glyf_range = glyf_scope.base()..glyf_scope.base() + glyf_scope.data().len();
        let index_space = GlyphIndexSpace::new(&GlyfTable::new(glyf_scope, &loca)?);
        debug!(
            "{} glyphs: {} simple, {} composite",
            maxp.num_glyphs,
            index_space.simple.len(),
            index_space.composite.len()
        );

        let hmtx = read_hmtx(&directory, &scope, maxp.num_glyphs);
        let cmap = read_cmap(&directory, &scope)?;

        Ok(Font {
            glyf_range,
            head,
            loca,
            hmtx,
            cmap,
            index_space,
            data,
        })
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    pub fn num_glyphs(&self) -> usize {
        self.loca.num_glyphs()
    }

    pub fn index_space(&self) -> &GlyphIndexSpace {
        &self.index_space
    }

    pub fn cmap(&self) -> Option<&CmapFormat4> {
        self.cmap.as_ref()
    }

    /// Advance width and left side bearing of `glyph_index`, 0 when the font has no metrics.
    pub fn horizontal_metrics(&self, glyph_index: u16) -> (u16, i16) {
        self.hmtx
            .as_ref()
            .and_then(|hmtx| hmtx.metrics(glyph_index).ok())
            .unwrap_or((0, 0))
    }

    fn glyf_table(&self) -> Result<GlyfTable<'_>, ParseError> {
        let scope = ReadScope::new(&self.data)
            .offset_length(self.glyf_range.start, self.glyf_range.len())?;
        GlyfTable::new(scope, &self.loca)
    }

    /// Build the geometry of the glyph in slot `insertion_index` of the glyph index space.
    pub fn build_glyph(&self, insertion_index: usize) -> Result<Geometry, ParseError> {
        let glyph_index = self
            .index_space
            .insertion_index_to_glyph_index(insertion_index)
            .ok_or(ParseError::BadIndex)?;
        self.build_glyph_index(glyph_index)
    }

    /// Build the geometry of `glyph_index`.
    ///
    /// A child referenced more than once, directly or through other composites, is built once
    /// and shared.
    pub fn build_glyph_index(&self, glyph_index: u16) -> Result<Geometry, ParseError> {
        let mut visiting = Vec::new();
        let mut built = BuiltGlyphs::default();
        let (geometry, _height) =
            self.build_glyph_recursive(glyph_index, &mut visiting, &mut built)?;
        drop(built);
        Ok(Arc::unwrap_or_clone(geometry))
    }

    /// Returns the geometry along with its height: the number of composite levels below the
    /// glyph, including itself.
    fn build_glyph_recursive(
        &self,
        glyph_index: u16,
        visiting: &mut Vec<u16>,
        built: &mut BuiltGlyphs,
    ) -> Result<(Arc<Geometry>, usize), ParseError> {
        if visiting.contains(&glyph_index) {
            return Err(ParseError::CompositeCycle(glyph_index));
        }
        let limit = usize::from(COMPOSITE_GLYPH_RECURSION_LIMIT);
        if let Some((geometry, height)) = built.get(&glyph_index) {
            // The deepest glyph below sits `height` levels further down
            if visiting.len() + height > limit {
                return Err(ParseError::LimitExceeded);
            }
            return Ok((Arc::clone(geometry), *height));
        }
        if visiting.len() > limit {
            return Err(ParseError::LimitExceeded);
        }

        let record = self.glyf_table()?.read_glyph(glyph_index)?;
        let (advance_width, left_side_bearing) = self.horizontal_metrics(glyph_index);

        let (geometry, height) = match record.body {
            GlyphBody::Simple(contours) => {
                let contours = contours
                    .iter()
                    .map(|contour| reconstruct_contour(contour))
                    .collect::<Result<Vec<_>, _>>()?;
                let geometry = Geometry::Simple(GlyphGeometry {
                    index: glyph_index,
                    bounding_box: record.bounding_box,
                    advance_width,
                    left_side_bearing,
                    contours,
                });
                (geometry, 0)
            }
            GlyphBody::Composite(components) => {
                visiting.push(glyph_index);
                let mut height = 0;
                let mut children = Vec::with_capacity(components.len());
                for component in &components {
                    let (child, child_height) =
                        self.build_glyph_recursive(component.glyph_index, visiting, built)?;
                    height = height.max(child_height + 1);
                    children.push((component.transform, child));
                }
                visiting.pop();
                let geometry = Geometry::Composite(CompositeGeometry {
                    index: glyph_index,
                    bounding_box: record.bounding_box,
                    advance_width,
                    left_side_bearing,
                    children,
                });
                (geometry, height)
            }
        };

        let geometry = Arc::new(geometry);
        built.insert(glyph_index, (Arc::clone(&geometry), height));
        Ok((geometry, height))
    }
}

fn read_hmtx(
    directory: &TableDirectory,
    scope: &ReadScope<'_>,
    num_glyphs: u16,
) -> Option<HmtxTable> {
    let tables = directory
        .read_table(scope, tag::HHEA)
        .and_then(|hhea| Ok((hhea, directory.read_table(scope, tag::HMTX)?)));
    let hmtx = match tables {
        Ok((Some(hhea), Some(hmtx))) => hhea.read::<HheaTable>().and_then(|hhea| {
            hmtx.read_dep::<HmtxTable>((
                usize::from(num_glyphs),
                usize::from(hhea.num_h_metrics),
            ))
        }),
        Ok(_) => {
            warn!("font has no horizontal metrics, using 0 advance and side bearing");
            return None;
        }
        Err(err) => Err(err),
    };
    match hmtx {
        Ok(hmtx) => Some(hmtx),
        Err(err) => {
            warn!("unable to read horizontal metrics: {}", err);
            None
        }
    }
}

fn read_cmap(
    directory: &TableDirectory,
    scope: &ReadScope<'_>,
) -> Result<Option<CmapFormat4>, ParseError> {
    let Some(cmap_scope) = directory.read_table(scope, tag::CMAP)? else {
        warn!("font has no 'cmap' table, code points will not be mapped");
        return Ok(None);
    };
    let cmap = cmap_scope.read::<Cmap<'_>>()?;
    match cmap.find_unicode_subtable() {
        Some(record) => cmap.read_format4(record).map(Some),
        None => {
            warn!("font has no Unicode 'cmap' subtable, code points will not be mapped");
            Ok(None)
        }
    }
}

impl GlyphIndexSpace {
    /// Sort the glyphs of `glyf` into simple and composite glyphs.
    ///
    /// Glyphs whose data can't be located are treated as simple, so that building them fails
    /// on its own without affecting the numbering of the others.
    pub fn new(glyf: &GlyfTable<'_>) -> Self {
        let mut space = GlyphIndexSpace::default();
        for (glyph_index, record) in (0u16..).zip(glyf.records()) {
            match record {
                Ok(record) if record.is_composite() => space.composite.push(glyph_index),
                _ => space.simple.push(glyph_index),
            }
        }
        space
    }

    pub fn len(&self) -> usize {
        self.simple.len() + self.composite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_composite(&self, insertion_index: usize) -> bool {
        insertion_index >= self.simple.len() && insertion_index < self.len()
    }

    pub fn insertion_index_to_glyph_index(&self, insertion_index: usize) -> Option<u16> {
        match insertion_index.checked_sub(self.simple.len()) {
            None => self.simple.get(insertion_index).copied(),
            Some(composite_index) => self.composite.get(composite_index).copied(),
        }
    }

    pub fn glyph_index_to_insertion_index(&self, glyph_index: u16) -> Option<usize> {
        self.simple
            .iter()
            .position(|&index| index == glyph_index)
            .or_else(|| {
                self.composite
                    .iter()
                    .position(|&index| index == glyph_index)
                    .map(|position| self.simple.len() + position)
            })
    }

    /// Glyph indices in insertion order.
    pub fn glyph_indices(&self) -> impl Iterator<Item = u16> + '_ {
        self.simple.iter().chain(self.composite.iter()).copied()
    }
}

impl Geometry {
    pub fn index(&self) -> u16 {
        match self {
            Geometry::Simple(glyph) => glyph.index,
            Geometry::Composite(glyph) => glyph.index,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Geometry::Simple(glyph) => glyph.bounding_box,
            Geometry::Composite(glyph) => glyph.bounding_box,
        }
    }

    pub fn advance_width(&self) -> u16 {
        match self {
            Geometry::Simple(glyph) => glyph.advance_width,
            Geometry::Composite(glyph) => glyph.advance_width,
        }
    }

    pub fn left_side_bearing(&self) -> i16 {
        match self {
            Geometry::Simple(glyph) => glyph.left_side_bearing,
            Geometry::Composite(glyph) => glyph.left_side_bearing,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Geometry::Composite(_))
    }

    /// All contours of the glyph with component transforms applied.
    pub fn contours(&self) -> Vec<Vec<ControlQuad>> {
        let mut contours = Vec::new();
        self.collect_contours(Transform2F::default(), &mut contours);
        contours
    }

    fn collect_contours(&self, transform: Transform2F, contours: &mut Vec<Vec<ControlQuad>>) {
        match self {
            Geometry::Simple(glyph) => {
                contours.extend(glyph.contours.iter().map(|contour| {
                    contour
                        .iter()
                        .map(|quad| quad.transform(transform))
                        .collect()
                }))
            }
            Geometry::Composite(glyph) => {
                for (component, child) in &glyph.children {
                    child.collect_contours(transform * component.to_transform2f(), contours);
                }
            }
        }
    }

    /// Replay the outline into `sink`.
    pub fn visit<S: OutlineSink>(&self, sink: &mut S) {
        visit_contours(&self.contours(), Transform2F::default(), sink)
    }

    /// One closed polyline per contour, sampling each segment `granularity` times.
    pub fn polylines(&self, granularity: usize) -> Vec<Vec<Vector2F>> {
        self.contours()
            .iter()
            .map(|contour| flatten_contour(contour, granularity))
            .collect()
    }
}
