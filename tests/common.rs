pub mod writer {
    //! Serialization of big-endian values for building test data.
    #![allow(dead_code)]

    // The writer module is derived from ttf-parser, licenced under Apache-2.0.
    // https://github.com/RazrFalcon/ttf-parser/blob/439aaaebd50eb8aed66302e3c1b51fae047f85b2/src/writer.rs

    #[allow(missing_debug_implementations)]
    #[derive(Clone, Copy)]
    pub enum TtfType<'a> {
        Raw(&'a [u8]),
        TrueTypeMagic,
        Int8(i8),
        UInt8(u8),
        Int16(i16),
        UInt16(u16),
        Int32(i32),
        UInt32(u32),
    }

    pub fn convert(values: &[TtfType<'_>]) -> Vec<u8> {
        let mut data = Vec::with_capacity(256);
        for v in values {
            convert_type(*v, &mut data);
        }

        data
    }

    pub fn convert_type(value: TtfType<'_>, data: &mut Vec<u8>) {
        match value {
            TtfType::Raw(bytes) => {
                data.extend_from_slice(bytes);
            }
            TtfType::TrueTypeMagic => {
                data.extend_from_slice(&[0x00, 0x01, 0x00, 0x00]);
            }
            TtfType::Int8(n) => {
                data.extend_from_slice(&i8::to_be_bytes(n));
            }
            TtfType::UInt8(n) => {
                data.extend_from_slice(&u8::to_be_bytes(n));
            }
            TtfType::Int16(n) => {
                data.extend_from_slice(&i16::to_be_bytes(n));
            }
            TtfType::UInt16(n) => {
                data.extend_from_slice(&u16::to_be_bytes(n));
            }
            TtfType::Int32(n) => {
                data.extend_from_slice(&i32::to_be_bytes(n));
            }
            TtfType::UInt32(n) => {
                data.extend_from_slice(&u32::to_be_bytes(n));
            }
        }
    }

    #[derive(Debug)]
    pub struct Writer {
        pub data: Vec<u8>,
    }

    impl Writer {
        pub fn new() -> Self {
            Writer {
                data: Vec::with_capacity(256),
            }
        }

        pub fn offset(&self) -> usize {
            self.data.len()
        }

        pub fn write(&mut self, value: TtfType<'_>) {
            convert_type(value, &mut self.data);
        }

        pub fn write_all(&mut self, values: &[TtfType<'_>]) {
            for value in values {
                self.write(*value);
            }
        }

        /// Pad with zeros until the length is a multiple of `alignment`.
        pub fn align(&mut self, alignment: usize) {
            while self.data.len() % alignment != 0 {
                self.data.push(0);
            }
        }
    }
}

pub mod builder {
    //! Synthetic TrueType fonts, assembled table by table.
    #![allow(dead_code)]

    use super::writer::{TtfType::*, Writer};

    const HEAD_MAGIC: u32 = 0x5F0F3CF5;

    const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
    const ARGS_ARE_XY_VALUES: u16 = 0x0002;
    const MORE_COMPONENTS: u16 = 0x0020;

    fn tag(bytes: &[u8; 4]) -> u32 {
        u32::from_be_bytes(*bytes)
    }

    /// One segment of a cmap format 4 subtable.
    #[derive(Debug, Clone, Copy)]
    pub struct Segment {
        pub start_code: u16,
        pub end_code: u16,
        pub id_delta: i16,
        pub id_range_offset: u16,
    }

    impl Segment {
        pub fn delta(start_code: u16, end_code: u16, id_delta: i16) -> Self {
            Segment {
                start_code,
                end_code,
                id_delta,
                id_range_offset: 0,
            }
        }

        pub fn range(start_code: u16, end_code: u16, id_range_offset: u16) -> Self {
            Segment {
                start_code,
                end_code,
                id_delta: 0,
                id_range_offset,
            }
        }
    }

    /// A format 4 cmap subtable.
    pub fn cmap_format4(segments: &[Segment], glyph_ids: &[u16]) -> Vec<u8> {
        let seg_count = segments.len();
        let length = (8 + 4 * seg_count + glyph_ids.len()) * 2;
        let mut entry_selector = 0;
        while (2 << entry_selector) <= seg_count {
            entry_selector += 1;
        }
        let search_range = 2 * (1 << entry_selector);

        let mut w = Writer::new();
        w.write_all(&[
            UInt16(4),
            UInt16(length as u16),
            UInt16(0), // language
            UInt16(2 * seg_count as u16),
            UInt16(search_range as u16),
            UInt16(entry_selector as u16),
            UInt16((2 * seg_count).saturating_sub(search_range) as u16),
        ]);
        for segment in segments {
            w.write(UInt16(segment.end_code));
        }
        w.write(UInt16(0)); // reservedPad
        for segment in segments {
            w.write(UInt16(segment.start_code));
        }
        for segment in segments {
            w.write(Int16(segment.id_delta));
        }
        for segment in segments {
            w.write(UInt16(segment.id_range_offset));
        }
        for &glyph_id in glyph_ids {
            w.write(UInt16(glyph_id));
        }
        w.data
    }

    /// A cmap format 4 subtable mapping each `(char, glyph_id)` pair through its own segment.
    pub fn cmap_format4_for_chars(chars: &[(char, u16)]) -> Vec<u8> {
        let mut mappings = chars.to_vec();
        mappings.sort_by_key(|&(ch, _)| ch);
        let mut segments = mappings
            .iter()
            .map(|&(ch, glyph_id)| {
                let code = ch as u16;
                Segment::delta(code, code, glyph_id.wrapping_sub(code) as i16)
            })
            .collect::<Vec<_>>();
        segments.push(Segment::delta(0xFFFF, 0xFFFF, 1));
        cmap_format4(&segments, &[])
    }

    /// A cmap table with one encoding record per `(platform_id, encoding_id, subtable)`.
    pub fn cmap_table(subtables: &[(u16, u16, &[u8])]) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_all(&[UInt16(0), UInt16(subtables.len() as u16)]);
        let mut offset = 4 + 8 * subtables.len();
        for (platform_id, encoding_id, subtable) in subtables {
            w.write_all(&[
                UInt16(*platform_id),
                UInt16(*encoding_id),
                UInt32(offset as u32),
            ]);
            offset += subtable.len();
        }
        for (_, _, subtable) in subtables {
            w.write(Raw(subtable));
        }
        w.data
    }

    /// A simple glyph whose points are given as `(on_curve, x, y)` in absolute coordinates.
    ///
    /// Coordinates are written as 16-bit deltas and the data padded to an even length.
    pub fn simple_glyph(contours: &[&[(bool, i16, i16)]]) -> Vec<u8> {
        let points = contours.iter().flat_map(|c| c.iter()).collect::<Vec<_>>();
        let bbox = points.iter().fold(None::<(i16, i16, i16, i16)>, |bbox, &&(_, x, y)| match bbox {
            None => Some((x, y, x, y)),
            Some((x_min, y_min, x_max, y_max)) => Some((
                x.min(x_min),
                y.min(y_min),
                x.max(x_max),
                y.max(y_max),
            )),
        });
        let (x_min, y_min, x_max, y_max) = bbox.unwrap_or((0, 0, 0, 0));

        let mut w = Writer::new();
        w.write_all(&[
            Int16(contours.len() as i16),
            Int16(x_min),
            Int16(y_min),
            Int16(x_max),
            Int16(y_max),
        ]);
        let mut end = 0;
        for contour in contours {
            end += contour.len();
            w.write(UInt16(end as u16 - 1));
        }
        w.write(UInt16(0)); // instructionLength
        for &&(on_curve, _, _) in &points {
            w.write(UInt8(u8::from(on_curve)));
        }
        let mut prev = 0;
        for &&(_, x, _) in &points {
            w.write(Int16(x - prev));
            prev = x;
        }
        let mut prev = 0;
        for &&(_, _, y) in &points {
            w.write(Int16(y - prev));
            prev = y;
        }
        w.align(2);
        w.data
    }

    /// A composite glyph placing each `(glyph_index, dx, dy)` with an identity transform.
    pub fn composite_glyph(components: &[(u16, i16, i16)]) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_all(&[Int16(-1), Int16(0), Int16(0), Int16(0), Int16(0)]);
        for (i, &(glyph_index, dx, dy)) in components.iter().enumerate() {
            let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
            if i + 1 < components.len() {
                flags |= MORE_COMPONENTS;
            }
            w.write_all(&[UInt16(flags), UInt16(glyph_index), Int16(dx), Int16(dy)]);
        }
        w.data
    }

    /// Builder of a minimal TrueType font.
    #[derive(Debug, Clone)]
    pub struct FontBuilder {
        units_per_em: u16,
        long_loca: bool,
        glyphs: Vec<Vec<u8>>,
        metrics: Option<Vec<(u16, i16)>>,
        cmap: Option<Vec<u8>>,
        omitted: Vec<u32>,
    }

    impl FontBuilder {
        pub fn new() -> Self {
            FontBuilder {
                units_per_em: 1000,
                long_loca: false,
                glyphs: Vec::new(),
                metrics: None,
                cmap: None,
                omitted: Vec::new(),
            }
        }

        pub fn units_per_em(mut self, units_per_em: u16) -> Self {
            self.units_per_em = units_per_em;
            self
        }

        /// Append a glyph. Empty data makes an empty glyph.
        pub fn glyph(mut self, data: Vec<u8>) -> Self {
            self.glyphs.push(data);
            self
        }

        pub fn long_loca(mut self) -> Self {
            self.long_loca = true;
            self
        }

        /// Add `hhea` and `hmtx` tables with one `(advance_width, lsb)` record per entry.
        pub fn metrics(mut self, metrics: Vec<(u16, i16)>) -> Self {
            self.metrics = Some(metrics);
            self
        }

        pub fn cmap(mut self, cmap: Vec<u8>) -> Self {
            self.cmap = Some(cmap);
            self
        }

        pub fn without_table(mut self, tag: u32) -> Self {
            self.omitted.push(tag);
            self
        }

        pub fn build(&self) -> Vec<u8> {
            let num_glyphs = self.glyphs.len() as u16;

            let mut glyf = Writer::new();
            let mut offsets = vec![0];
            for glyph in &self.glyphs {
                glyf.write(Raw(glyph));
                glyf.align(2);
                offsets.push(glyf.offset());
            }
            let mut loca = Writer::new();
            for offset in offsets {
                if self.long_loca {
                    loca.write(UInt32(offset as u32));
                } else {
                    loca.write(UInt16((offset / 2) as u16));
                }
            }

            let mut maxp = Writer::new();
            maxp.write_all(&[UInt32(0x00005000), UInt16(num_glyphs)]);

            let mut tables = vec![
                (tag(b"head"), self.head()),
                (tag(b"maxp"), maxp.data),
                (tag(b"loca"), loca.data),
                (tag(b"glyf"), glyf.data),
            ];

            if let Some(metrics) = &self.metrics {
                let mut hhea = Writer::new();
                let advance_width_max = metrics.iter().map(|&(advance, _)| advance).max();
                hhea.write_all(&[
                    UInt16(1),
                    UInt16(0),
                    Int16(800),
                    Int16(-200),
                    Int16(0),
                    UInt16(advance_width_max.unwrap_or(0)),
                ]);
                for _ in 0..10 {
                    hhea.write(Int16(0));
                }
                hhea.write_all(&[Int16(0), UInt16(metrics.len() as u16)]);
                tables.push((tag(b"hhea"), hhea.data));

                let mut hmtx = Writer::new();
                for &(advance_width, lsb) in metrics {
                    hmtx.write_all(&[UInt16(advance_width), Int16(lsb)]);
                }
                for _ in metrics.len()..usize::from(num_glyphs) {
                    hmtx.write(Int16(0));
                }
                tables.push((tag(b"hmtx"), hmtx.data));
            }
            if let Some(cmap) = &self.cmap {
                tables.push((tag(b"cmap"), cmap.clone()));
            }

            tables.retain(|(tag, _)| !self.omitted.contains(tag));
            tables.sort_by_key(|(tag, _)| *tag);
            sfnt(&tables)
        }

        fn head(&self) -> Vec<u8> {
            let mut w = Writer::new();
            w.write_all(&[
                UInt16(1),
                UInt16(0),
                UInt32(0x00010000), // fontRevision
                UInt32(0),          // checkSumAdjustment
                UInt32(HEAD_MAGIC),
                UInt16(0), // flags
                UInt16(self.units_per_em),
                Raw(&[0; 16]), // created, modified
                Int16(0),
                Int16(0),
                Int16(0),
                Int16(0),
                UInt16(0), // macStyle
                UInt16(8), // lowestRecPPEM
                Int16(2),  // fontDirectionHint
                Int16(i16::from(self.long_loca)),
                Int16(0), // glyphDataFormat
            ]);
            w.data
        }
    }

    impl Default for FontBuilder {
        fn default() -> Self {
            FontBuilder::new()
        }
    }

    /// Assemble `tables` into an sfnt with a table directory. Checksums are left as 0.
    pub fn sfnt(tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
        let num_tables = tables.len();
        let mut entry_selector = 0;
        while (2 << entry_selector) <= num_tables {
            entry_selector += 1;
        }
        let search_range = 16 * (1 << entry_selector);

        let mut w = Writer::new();
        w.write_all(&[
            TrueTypeMagic,
            UInt16(num_tables as u16),
            UInt16(search_range as u16),
            UInt16(entry_selector as u16),
            UInt16((16 * num_tables).saturating_sub(search_range) as u16),
        ]);
        let mut offset = 12 + 16 * num_tables;
        for (tag, data) in tables {
            w.write_all(&[
                UInt32(*tag),
                UInt32(0),
                UInt32(offset as u32),
                UInt32(data.len() as u32),
            ]);
            offset += (data.len() + 3) & !3;
        }
        for (_, data) in tables {
            w.write(Raw(data));
            w.align(4);
        }
        w.data
    }
}
