//! Parsing of the `cmap` table and lookup through format 4 subtables.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/cmap>

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::size;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
}

/// The `cmap` header and its encoding records.
pub struct Cmap<'a> {
    pub scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

/// A segment mapping to delta values subtable.
///
/// The segments are kept in the parallel arrays they are stored in, ordered by ascending
/// `end_codes`. The final segment ends at `0xFFFF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapFormat4 {
    pub language: u16,
    pub end_codes: Vec<u16>,
    pub start_codes: Vec<u16>,
    pub id_deltas: Vec<i16>,
    pub id_range_offsets: Vec<u16>,
    pub glyph_id_array: Vec<u16>,
}

impl ReadBinary for Cmap<'_> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Cmap<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;
        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl<'a> Cmap<'a> {
    pub fn encoding_records(&self) -> impl Iterator<Item = EncodingRecord> + 'a {
        self.encoding_records.iter()
    }

    pub fn find_subtable_for_platform(&self, platform_id: PlatformId) -> Option<EncodingRecord> {
        self.encoding_records
            .iter()
            .find(|record| record.platform_id == platform_id.0)
    }

    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        self.encoding_records.iter().find(|record| {
            record.platform_id == platform_id.0 && record.encoding_id == encoding_id.0
        })
    }

    /// Pick the subtable used for Unicode lookups.
    ///
    /// Windows Unicode BMP is preferred, then any Unicode platform subtable, then Windows symbol.
    pub fn find_unicode_subtable(&self) -> Option<EncodingRecord> {
        self.find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            .or_else(|| self.find_subtable_for_platform(PlatformId::UNICODE))
            .or_else(|| self.find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_SYMBOL))
    }

    /// Read the format 4 subtable referenced by `record`.
    ///
    /// Any other subtable format is rejected with `ParseError::UnsupportedFormat`.
    pub fn read_format4(&self, record: EncodingRecord) -> Result<CmapFormat4, ParseError> {
        let offset = usize::try_from(record.offset)?;
        let subtable = self.scope.offset(offset);
        let format = subtable.read::<U16Be>()?;
        if format != 4 {
            return Err(ParseError::UnsupportedFormat(format));
        }
        subtable.read::<CmapFormat4>()
    }
}

impl ReadBinary for CmapFormat4 {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let format = ctxt.read_u16be()?;
        if format != 4 {
            return Err(ParseError::UnsupportedFormat(format));
        }
        let length = usize::from(ctxt.read_u16be()?);
        let language = ctxt.read_u16be()?;
        let seg_count_x2 = usize::from(ctxt.read_u16be()?);
        ctxt.check((seg_count_x2 & 1) == 0)?;
        let seg_count = seg_count_x2 >> 1;
        let _search_range = ctxt.read_u16be()?;
        let _entry_selector = ctxt.read_u16be()?;
        let _range_shift = ctxt.read_u16be()?;
        let end_codes = ctxt.read_array::<U16Be>(seg_count)?.to_vec();
        let _reserved_pad = ctxt.read_u16be()?;
        let start_codes = ctxt.read_array::<U16Be>(seg_count)?.to_vec();
        let id_deltas = ctxt.read_array::<I16Be>(seg_count)?.to_vec();
        let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?.to_vec();
        // The glyph id array fills whatever the declared length leaves after the fixed fields.
        let header_size = (8 + (4 * seg_count)) * size::U16;
        ctxt.check(length >= header_size)?;
        let remaining = length - header_size;
        ctxt.check((remaining & 1) == 0)?;
        let glyph_id_array = ctxt.read_array::<U16Be>(remaining >> 1)?.to_vec();
        Ok(CmapFormat4 {
            language,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_id_array,
        })
    }
}

impl CmapFormat4 {
    pub fn seg_count(&self) -> usize {
        self.end_codes.len()
    }

    /// Map `code_point` to a glyph index.
    ///
    /// Returns 0, the missing glyph, for code points not covered by any segment. An error is
    /// returned when a segment addresses outside the glyph id array.
    pub fn resolve(&self, code_point: u32) -> Result<u16, ParseError> {
        let code_point = match u16::try_from(code_point) {
            Ok(code_point) => code_point,
            Err(_) => return Ok(0),
        };
        // Segments are sorted by end code, so the first one ending at or after the code point is
        // the only one that can contain it.
        let i = self.end_codes.partition_point(|&end| end < code_point);
        let (start_code, id_delta, id_range_offset) = match (
            self.start_codes.get(i),
            self.id_deltas.get(i),
            self.id_range_offsets.get(i),
        ) {
            (Some(&start), Some(&delta), Some(&offset)) => (start, delta, offset),
            _ => return Ok(0),
        };
        if code_point < start_code {
            return Ok(0);
        }

        // idDelta arithmetic is modulo 65536.
        let id_delta = id_delta as u16;
        if id_range_offset == 0 {
            return Ok(code_point.wrapping_add(id_delta));
        }

        // id_range_offset is a byte offset from its own slot in the id_range_offsets array.
        // Resolve that to an index into glyph_id_array, which immediately follows the array.
        if id_range_offset & 1 != 0 {
            return Err(ParseError::BadIndex);
        }
        let index = (usize::from(id_range_offset / 2) + usize::from(code_point - start_code))
            .checked_sub(self.seg_count() - i)
            .ok_or(ParseError::BadIndex)?;
        let glyph_id = *self
            .glyph_id_array
            .get(index)
            .ok_or(ParseError::BadIndex)?;
        if glyph_id == 0 {
            Ok(0)
        } else {
            Ok(glyph_id.wrapping_add(id_delta))
        }
    }
}
