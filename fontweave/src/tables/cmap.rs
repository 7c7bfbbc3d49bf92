//! The [cmap](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap) table

use types::{GlyphId, Tag};

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_UNICODE_BMP: u16 = 1;
const WINDOWS_UNICODE_FULL: u16 = 10;

/// The character to glyph mapping.
///
/// Only the first Windows platform Unicode subtable is retained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmap {
    subtable: Option<CmapSubtable>,
}

/// A supported cmap subtable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CmapSubtable {
    Format4(Cmap4),
    Format12(Cmap12),
}

/// [cmap Format 4](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values): Segment mapping to delta values
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmap4 {
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_id_array: Vec<u16>,
}

/// [cmap Format 12](https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#format-12-segmented-coverage): Segmented coverage
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmap12 {
    groups: Vec<SequentialMapGroup>,
}

/// A run of consecutive codepoints mapped to consecutive glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl TopLevelTable for Cmap {
    const TAG: Tag = Tag::new(b"cmap");
}

impl FontRead<'_> for Cmap {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let _version: u16 = cursor.read()?;
        let num_tables: u16 = cursor.read()?;
        for _ in 0..num_tables {
            let platform_id: u16 = cursor.read()?;
            let encoding_id: u16 = cursor.read()?;
            let offset: u32 = cursor.read()?;
            if platform_id != WINDOWS_PLATFORM
                || !matches!(encoding_id, WINDOWS_UNICODE_BMP | WINDOWS_UNICODE_FULL)
            {
                continue;
            }
            let subtable_data = data
                .split_off(offset as usize)
                .ok_or(ReadError::OutOfBounds)?;
            let format: u16 = subtable_data.read_at(0)?;
            let subtable = match format {
                4 => CmapSubtable::Format4(Cmap4::read(subtable_data)?),
                12 => CmapSubtable::Format12(Cmap12::read(subtable_data)?),
                other => {
                    log::debug!("skipping cmap ({platform_id}, {encoding_id}) format {other}");
                    continue;
                }
            };
            return Ok(Cmap {
                subtable: Some(subtable),
            });
        }
        Ok(Cmap::default())
    }
}

impl Cmap {
    /// The selected subtable, if the font has a usable Windows-Unicode one.
    pub fn subtable(&self) -> Option<&CmapSubtable> {
        self.subtable.as_ref()
    }

    /// Maps a codepoint to a glyph identifier, returning `.notdef` if the
    /// codepoint is not covered.
    pub fn map_codepoint(&self, codepoint: impl Into<u32>) -> GlyphId {
        let codepoint = codepoint.into();
        let gid = match &self.subtable {
            Some(CmapSubtable::Format4(cmap4)) => cmap4.map_codepoint(codepoint),
            Some(CmapSubtable::Format12(cmap12)) => cmap12.map_codepoint(codepoint),
            None => None,
        };
        gid.unwrap_or(GlyphId::NOTDEF)
    }

    /// Returns all (codepoint, glyph) pairs with a non-zero glyph.
    pub fn mappings(&self) -> Vec<(u32, GlyphId)> {
        match &self.subtable {
            Some(CmapSubtable::Format4(cmap4)) => cmap4.mappings(),
            Some(CmapSubtable::Format12(cmap12)) => cmap12.mappings(),
            None => Vec::new(),
        }
    }
}

impl Cmap4 {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let length = data.read_at::<u16>(2)? as usize;
        let seg_count_x2 = data.read_at::<u16>(6)? as usize;
        if seg_count_x2 % 2 != 0 {
            return Err(ReadError::MalformedData("odd segCountX2 in cmap format 4"));
        }
        let seg_count = seg_count_x2 / 2;
        let mut cursor = data.cursor();
        // format, length, language, segCountX2, searchRange, entrySelector, rangeShift
        cursor.advance_by(14);
        let end_codes = cursor.read_array(seg_count)?;
        let _reserved_pad: u16 = cursor.read()?;
        let start_codes = cursor.read_array(seg_count)?;
        let id_deltas = cursor.read_array(seg_count)?;
        let id_range_offsets = cursor.read_array(seg_count)?;
        // the glyph id array runs to the end of the subtable
        let array_start = cursor.position()?;
        let array_end = length.min(data.len()).max(array_start);
        let glyph_id_array = data.read_array(array_start, (array_end - array_start) / 2)?;
        Ok(Cmap4 {
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_id_array,
        })
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: impl Into<u32>) -> Option<GlyphId> {
        let codepoint = u16::try_from(codepoint.into()).ok()?;
        // the first segment whose end code is at or above the codepoint
        let index = self.end_codes.partition_point(|end| *end < codepoint);
        let start_code = *self.start_codes.get(index)?;
        if codepoint < start_code {
            return None;
        }
        self.lookup_glyph_id(codepoint, index, start_code)
    }

    fn lookup_glyph_id(&self, codepoint: u16, index: usize, start_code: u16) -> Option<GlyphId> {
        let delta = *self.id_deltas.get(index)?;
        let range_offset = *self.id_range_offsets.get(index)? as usize;
        if range_offset == 0 {
            return Some(GlyphId::new(codepoint).wrapping_add_signed(delta));
        }
        // range_offset is relative to its own position in the id_range_offsets
        // array, which immediately precedes the glyph id array
        let offset = (range_offset / 2 + (codepoint - start_code) as usize)
            .checked_sub(self.id_range_offsets.len() - index)?;
        let gid = *self.glyph_id_array.get(offset)?;
        (gid != 0).then(|| GlyphId::new(gid).wrapping_add_signed(delta))
    }

    fn mappings(&self) -> Vec<(u32, GlyphId)> {
        let mut result = Vec::new();
        for (index, (start, end)) in self.start_codes.iter().zip(&self.end_codes).enumerate() {
            for codepoint in *start..=*end {
                if codepoint == 0xFFFF {
                    break;
                }
                match self.lookup_glyph_id(codepoint, index, *start) {
                    Some(gid) if gid != GlyphId::NOTDEF => result.push((codepoint as u32, gid)),
                    _ => (),
                }
            }
        }
        result
    }
}

impl Cmap12 {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        // format, reserved, length, language
        cursor.advance_by(12);
        let num_groups: u32 = cursor.read()?;
        if num_groups as usize > cursor.remaining_bytes() / 12 {
            return Err(ReadError::OutOfBounds);
        }
        let groups = (0..num_groups)
            .map(|_| {
                Ok(SequentialMapGroup {
                    start_char_code: cursor.read()?,
                    end_char_code: cursor.read()?,
                    start_glyph_id: cursor.read()?,
                })
            })
            .collect::<Result<Vec<_>, ReadError>>()?;
        let ordered = groups.iter().all(|g| g.start_char_code <= g.end_char_code)
            && groups
                .windows(2)
                .all(|pair| pair[0].end_char_code < pair[1].start_char_code);
        if !ordered {
            return Err(ReadError::MalformedData("cmap format 12 groups out of order"));
        }
        Ok(Cmap12 { groups })
    }

    /// Maps a codepoint to a nominal glyph identifier.
    pub fn map_codepoint(&self, codepoint: impl Into<u32>) -> Option<GlyphId> {
        let codepoint = codepoint.into();
        let index = self
            .groups
            .partition_point(|group| group.end_char_code < codepoint);
        let group = self.groups.get(index)?;
        (codepoint >= group.start_char_code).then(|| group.glyph_for(codepoint))
    }

    fn mappings(&self) -> Vec<(u32, GlyphId)> {
        self.groups
            .iter()
            .flat_map(|group| {
                (group.start_char_code..=group.end_char_code)
                    .map(move |codepoint| (codepoint, group.glyph_for(codepoint)))
            })
            .filter(|(_, gid)| *gid != GlyphId::NOTDEF)
            .collect()
    }
}

impl SequentialMapGroup {
    fn glyph_for(&self, codepoint: u32) -> GlyphId {
        let gid = self
            .start_glyph_id
            .wrapping_add(codepoint.wrapping_sub(self.start_char_code));
        GlyphId::new(gid as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::cmap as test_data;
    use rstest::rstest;

    fn format4_cmap() -> Cmap {
        let data = test_data::windows_unicode_cmap(&test_data::simple_cmap4());
        Cmap::read(FontData::new(&data)).unwrap()
    }

    #[rstest]
    #[case('A', 3)]
    #[case('B', 4)]
    #[case('Z', 28)]
    #[case('a', 40)]
    #[case('c', 42)]
    #[case('d', 0)]
    #[case('~', 0)]
    #[case('\u{E000}', 0)]
    #[case('\u{1F600}', 0)]
    fn format4_delta_and_indirect(#[case] c: char, #[case] expected: u16) {
        assert_eq!(format4_cmap().map_codepoint(c), GlyphId::new(expected));
    }

    #[test]
    fn format4_indirect_zero_is_missing() {
        // the glyph id array maps 'b' to 0
        let cmap = format4_cmap();
        assert_eq!(cmap.map_codepoint('b'), GlyphId::NOTDEF);
        let mappings = cmap.mappings();
        assert!(mappings.contains(&(0x61, GlyphId::new(40))));
        assert!(!mappings.iter().any(|(cp, _)| *cp == 0x62));
        assert_eq!(mappings.len(), 26 + 2);
    }

    #[test]
    fn wrapping_delta() {
        let data = test_data::windows_unicode_cmap(&test_data::wrapping_cmap4());
        let cmap = Cmap::read(FontData::new(&data)).unwrap();
        // 0x20 + 0xFFE1 (i.e. -31) wraps to 1
        assert_eq!(cmap.map_codepoint(' '), GlyphId::new(1));
    }

    #[test]
    fn format12() {
        let data = test_data::windows_unicode_cmap(&test_data::simple_cmap12());
        let cmap = Cmap::read(FontData::new(&data)).unwrap();
        assert!(matches!(cmap.subtable(), Some(CmapSubtable::Format12(_))));
        assert_eq!(cmap.map_codepoint('a'), GlyphId::new(10));
        assert_eq!(cmap.map_codepoint('e'), GlyphId::new(14));
        assert_eq!(cmap.map_codepoint(0x1F600u32), GlyphId::new(50));
        assert_eq!(cmap.map_codepoint('f'), GlyphId::NOTDEF);
    }

    #[test]
    fn first_windows_unicode_subtable_wins() {
        let data = test_data::cmap_with_records(&[
            (0, 3, test_data::simple_cmap12().to_vec()),
            (3, 0, test_data::simple_cmap12().to_vec()),
            (3, 1, test_data::simple_cmap4().to_vec()),
            (3, 10, test_data::simple_cmap12().to_vec()),
        ]);
        let cmap = Cmap::read(FontData::new(&data)).unwrap();
        assert!(matches!(cmap.subtable(), Some(CmapSubtable::Format4(_))));
    }

    #[test]
    fn no_windows_unicode_subtable() {
        let data = test_data::cmap_with_records(&[(1, 0, test_data::simple_cmap4().to_vec())]);
        let cmap = Cmap::read(FontData::new(&data)).unwrap();
        assert!(cmap.subtable().is_none());
        assert_eq!(cmap.map_codepoint('A'), GlyphId::NOTDEF);
        assert!(cmap.mappings().is_empty());
    }
}
