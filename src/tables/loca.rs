//! Parsing of the `loca` table.
//!
//! > The indexToLoc table stores the offsets to the locations of the glyphs in the font, relative
//! > to the beginning of the glyphData table.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>

use std::ops::Range;

use crate::binary::read::{ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
///
/// Offsets are stored resolved to byte offsets into the `glyf` table, regardless of whether the
/// font uses the short or long form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocaTable {
    pub offsets: Vec<u32>,
}

impl ReadBinaryDep for LocaTable {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font. The value for `num_glyphs` is found in
    ///   the 'maxp' table.
    /// * `index_to_loc_format` specifies whether the offsets in the `loca` table are short or
    ///   long. This value can be read from the `head` table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        // The number of offsets is numGlyphs + 1, the last marking the end of the last glyph.
        let count = usize::from(num_glyphs) + 1;
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => ctxt
                .read_array::<U16Be>(count)?
                .iter()
                // The actual local offset divided by 2 is stored.
                .map(|offset| u32::from(offset) * 2)
                .collect(),
            IndexToLocFormat::Long => ctxt.read_array::<U32Be>(count)?.to_vec(),
        };

        Ok(LocaTable { offsets })
    }
}

impl LocaTable {
    /// The number of glyphs described by this table.
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// The byte range of `glyph_index` within the `glyf` table.
    ///
    /// An empty range means the glyph has no outline.
    pub fn glyph_range(&self, glyph_index: u16) -> Result<Range<usize>, ParseError> {
        let index = usize::from(glyph_index);
        let start = self.offsets.get(index).ok_or(ParseError::BadIndex)?;
        let end = self.offsets.get(index + 1).ok_or(ParseError::BadIndex)?;
        if end < start {
            return Err(ParseError::BadOffset);
        }
        Ok(usize::try_from(*start)?..usize::try_from(*end)?)
    }
}
