//! TrueType font table parsing.

pub mod cmap;
pub mod glyf;
pub mod loca;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::size;
use crate::tag;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Value of `magicNumber` in the `head` table.
const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// The F2DOT14 format consists of a signed, 2’s complement integer and an unsigned fraction.
///
/// To compute the actual value, take the integer and add the fraction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct F2Dot14(u16);

/// The size of the offsets in the `loca` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

/// The table directory at the start of the font, locating each table in the font buffer.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>
#[derive(Debug, Clone, PartialEq)]
pub struct TableDirectory {
    pub sfnt_version: u32,
    pub table_records: Vec<TableRecord>,
}

/// An entry in the table directory
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table
///
/// Only the fields needed to locate and scale glyphs are retained.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub flags: u16,
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub index_to_loc_format: IndexToLocFormat,
}

/// maxp - Maximum profile
///
/// Both version 0.5 and 1.0 start with `numGlyphs`, which is all that is needed here.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/maxp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash)]
pub struct MaxpTable {
    pub version: u32,
    pub num_glyphs: u16,
}

/// `hhea` horizontal header table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, PartialEq, PartialOrd, Hash)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub num_h_metrics: u16,
}

/// `hmtx` horizontal metrics table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx>
#[derive(Debug, Clone, PartialEq)]
pub struct HmtxTable {
    pub h_metrics: Vec<LongHorMetric>,
    pub left_side_bearings: Vec<i16>,
}

/// A `longHorMetric` record in the `hmtx` table.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

impl ReadBinary for TableDirectory {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        ctxt.check_version(sfnt_version == TTF_MAGIC || sfnt_version == tag::TRUE)?;
        let num_tables = ctxt.read_u16be()?;
        let _search_range = ctxt.read_u16be()?;
        let _entry_selector = ctxt.read_u16be()?;
        let _range_shift = ctxt.read_u16be()?;
        let table_records = ctxt
            .read_array::<TableRecord>(usize::from(num_tables))?
            .to_vec();
        Ok(TableDirectory {
            sfnt_version,
            table_records,
        })
    }
}

impl TableDirectory {
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|record| record.table_tag == tag)
            .copied()
    }

    /// Returns the bounds checked data of the table identified by `tag`, if present.
    pub fn read_table<'a>(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<Option<ReadScope<'a>>, ParseError> {
        match self.find_table_record(tag) {
            Some(table_record) => table_record.read_table(scope).map(Some),
            None => Ok(None),
        }
    }

    /// Like `read_table` but a missing table is an error.
    pub fn require_table<'a>(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<ReadScope<'a>, ParseError> {
        self.read_table(scope, tag)?
            .ok_or(ParseError::MissingTable(tag))
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));
    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl TableRecord {
    pub const SIZE: usize = 4 * size::U32;

    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        scope.offset_length(offset, length)
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        let _font_revision = ctxt.read_u32be()?;
        let _check_sum_adjustment = ctxt.read_u32be()?;
        let magic_number = ctxt.read_u32be()?;
        ctxt.check(magic_number == HEAD_MAGIC)?;
        let flags = ctxt.read_u16be()?;
        let units_per_em = ctxt.read_u16be()?;
        // created and modified, LONGDATETIME each
        ctxt.skip(16)?;
        let x_min = ctxt.read_i16be()?;
        let y_min = ctxt.read_i16be()?;
        let x_max = ctxt.read_i16be()?;
        let y_max = ctxt.read_i16be()?;
        let mac_style = ctxt.read_u16be()?;
        let lowest_rec_ppem = ctxt.read_u16be()?;
        let _font_direction_hint = ctxt.read_i16be()?;
        let index_to_loc_format = ctxt.read::<IndexToLocFormat>()?;
        let _glyph_data_format = ctxt.read_i16be()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            flags,
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            index_to_loc_format,
        })
    }
}

impl ReadBinary for MaxpTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        let num_glyphs = ctxt.read_u16be()?;
        Ok(MaxpTable {
            version,
            num_glyphs,
        })
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        // min/max bearings, extent, caret slope and offset, then four reserved words
        ctxt.skip(10 * size::I16)?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            num_h_metrics,
        })
    }
}

impl ReadBinaryDep for HmtxTable {
    type Args<'a> = (usize, usize); // num_glyphs, num_h_metrics
    type HostType<'a> = Self;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, num_h_metrics): (usize, usize),
    ) -> Result<Self, ParseError> {
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?.to_vec();
        let left_side_bearings = ctxt
            .read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?
            .to_vec();
        Ok(HmtxTable {
            h_metrics,
            left_side_bearings,
        })
    }
}

impl HmtxTable {
    /// Returns the advance width and left side bearing of `glyph_id`.
    pub fn metrics(&self, glyph_id: u16) -> Result<(u16, i16), ParseError> {
        let index = usize::from(glyph_id);
        match self.h_metrics.get(index) {
            Some(metric) => Ok((metric.advance_width, metric.lsb)),
            None => {
                // As an optimization, the number of records can be less than the number of
                // glyphs, in which case the advance width value of the last record applies to
                // all remaining glyph IDs.
                let last = self.h_metrics.last().ok_or(ParseError::BadIndex)?;
                let lsb = self
                    .left_side_bearings
                    .get(index - self.h_metrics.len())
                    .copied()
                    .ok_or(ParseError::BadIndex)?;
                Ok((last.advance_width, lsb))
            }
        }
    }
}

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);
    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl ReadFrom for F2Dot14 {
    type ReadType = U16Be;

    fn read_from(value: u16) -> Self {
        F2Dot14(value)
    }
}

impl ReadFrom for IndexToLocFormat {
    type ReadType = I16Be;

    fn read_from(index_to_loc_format: i16) -> Self {
        match index_to_loc_format {
            0 => IndexToLocFormat::Short,
            _ => IndexToLocFormat::Long,
        }
    }
}

impl From<F2Dot14> for f32 {
    fn from(value: F2Dot14) -> Self {
        // The raw value is the number scaled by 2^14, stored as two's complement.
        f32::from(value.0 as i16) / 16384.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    fn head_table(index_to_loc_format: i16) -> Vec<u8> {
        writer::convert(&[
            UInt16(1),
            UInt16(0),
            UInt32(0x00010000), // fontRevision
            UInt32(0),          // checkSumAdjustment
            UInt32(HEAD_MAGIC),
            UInt16(0),    // flags
            UInt16(2048), // unitsPerEm
            Raw(&[0; 16]),
            Int16(-100),
            Int16(-200),
            Int16(1000),
            Int16(1800),
            UInt16(0),
            UInt16(8),
            Int16(2),
            Int16(index_to_loc_format),
            Int16(0),
        ])
    }

    #[test]
    fn read_head_table() {
        let data = head_table(0);
        assert_eq!(data.len(), 54);
        let head = ReadScope::new(&data).read::<HeadTable>().unwrap();
        assert_eq!(head.units_per_em, 2048);
        assert_eq!(head.x_min, -100);
        assert_eq!(head.y_max, 1800);
        assert_eq!(head.index_to_loc_format, IndexToLocFormat::Short);
    }

    #[test]
    fn any_non_zero_index_to_loc_format_is_long() {
        for format in [1, 2, -1] {
            let data = head_table(format);
            let head = ReadScope::new(&data).read::<HeadTable>().unwrap();
            assert_eq!(head.index_to_loc_format, IndexToLocFormat::Long);
        }
    }

    #[test]
    fn head_table_bad_magic() {
        let mut data = head_table(0);
        data[12] = 0;
        assert_eq!(
            ReadScope::new(&data).read::<HeadTable>(),
            Err(ParseError::BadValue)
        );
    }

    #[test]
    fn read_table_directory() {
        let data = writer::convert(&[
            TrueTypeMagic,
            UInt16(2),
            UInt16(32),
            UInt16(1),
            UInt16(0),
            Raw(b"head"),
            UInt32(0),
            UInt32(44),
            UInt32(4),
            Raw(b"maxp"),
            UInt32(0),
            UInt32(48),
            UInt32(6),
            UInt32(0xDEADBEEF), // head data
            UInt32(0x00005000), // maxp
            UInt16(7),
        ]);
        let scope = ReadScope::new(&data);
        let directory = scope.read::<TableDirectory>().unwrap();
        assert_eq!(directory.table_records.len(), 2);
        assert_eq!(
            directory.find_table_record(tag::HEAD).map(|record| record.offset),
            Some(44)
        );
        assert_eq!(directory.find_table_record(tag::GLYF), None);

        let maxp = directory
            .require_table(&scope, tag::MAXP)
            .unwrap()
            .read::<MaxpTable>()
            .unwrap();
        assert_eq!(maxp.num_glyphs, 7);

        assert_eq!(
            directory.require_table(&scope, tag::LOCA),
            Err(ParseError::MissingTable(tag::LOCA))
        );
    }

    #[test]
    fn table_record_out_of_bounds() {
        let record = TableRecord {
            table_tag: tag::GLYF,
            checksum: 0,
            offset: 4,
            length: 10,
        };
        let data = [0; 8];
        assert_eq!(
            record.read_table(&ReadScope::new(&data)),
            Err(ParseError::BadEof)
        );
    }

    #[test]
    fn hmtx_metrics() {
        let data = writer::convert(&[
            UInt16(500),
            Int16(10),
            UInt16(600),
            Int16(20),
            Int16(30),
            Int16(-40),
        ]);
        let hmtx = ReadScope::new(&data)
            .read_dep::<HmtxTable>((4, 2))
            .unwrap();
        assert_eq!(hmtx.metrics(0), Ok((500, 10)));
        assert_eq!(hmtx.metrics(1), Ok((600, 20)));
        assert_eq!(hmtx.metrics(2), Ok((600, 30)));
        assert_eq!(hmtx.metrics(3), Ok((600, -40)));
        assert_eq!(hmtx.metrics(4), Err(ParseError::BadIndex));
    }

    #[test]
    fn f32_from_f2dot14() {
        // Examples from https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types
        assert_close(f32::from(F2Dot14(0x7fff)), 1.999939);
        assert_close(f32::from(F2Dot14(0x7000)), 1.75);
        assert_close(f32::from(F2Dot14(0x4000)), 1.0);
        assert_close(f32::from(F2Dot14(0x0001)), 0.000061);
        assert_close(f32::from(F2Dot14(0x0000)), 0.0);
        assert_close(f32::from(F2Dot14(0xffff)), -0.000061);
        assert_close(f32::from(F2Dot14(0x8000)), -2.0);
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "{:?} != {:?}",
            actual,
            expected,
        );
    }
}
