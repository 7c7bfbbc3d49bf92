//! The [loca (Index to Location)][loca] table
//!
//! [loca]: https://docs.microsoft.com/en-us/typography/opentype/spec/loca

use std::ops::Range;

use types::{GlyphId, Tag};

use crate::{font_data::FontData, read::ReadError};

/// 'loca'
pub const TAG: Tag = Tag::new(b"loca");

/// Glyph data offsets into the `glyf` table, normalized to bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Loca {
    offsets: Vec<u32>,
}

impl Loca {
    /// Read `num_glyphs + 1` offsets.
    pub fn read(data: FontData, is_long: bool, num_glyphs: u16) -> Result<Self, ReadError> {
        let count = num_glyphs as usize + 1;
        let offsets = if is_long {
            data.read_array::<u32>(0, count)?
        } else {
            data.read_array::<u16>(0, count)?
                .into_iter()
                .map(|off| off as u32 * 2)
                .collect()
        };
        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ReadError::MalformedData("loca offsets are not ascending"));
        }
        Ok(Loca { offsets })
    }

    /// The number of glyphs described.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte range of the glyph in `glyf`. Equal offsets describe an
    /// empty glyph.
    pub fn glyph_range(&self, gid: GlyphId) -> Option<Range<usize>> {
        let idx = gid.to_u16() as usize;
        let start = *self.offsets.get(idx)?;
        let end = *self.offsets.get(idx + 1)?;
        Some(start as usize..end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::BeBuffer;

    #[test]
    fn short_offsets_are_doubled() {
        let data = BeBuffer::new().extend([0u16, 10, 10, 24]);
        let loca = Loca::read(FontData::new(&data), false, 3).unwrap();
        assert_eq!(loca.len(), 3);
        assert_eq!(loca.glyph_range(GlyphId::new(0)), Some(0..20));
        assert_eq!(loca.glyph_range(GlyphId::new(1)), Some(20..20));
        assert_eq!(loca.glyph_range(GlyphId::new(2)), Some(20..48));
        assert_eq!(loca.glyph_range(GlyphId::new(3)), None);
    }

    #[test]
    fn long_offsets() {
        let data = BeBuffer::new().extend([0u32, 100_000]);
        let loca = Loca::read(FontData::new(&data), true, 1).unwrap();
        assert_eq!(loca.glyph_range(GlyphId::new(0)), Some(0..100_000));
    }

    #[test]
    fn descending_offsets() {
        let data = BeBuffer::new().extend([0u16, 10, 4]);
        assert!(Loca::read(FontData::new(&data), false, 2).is_err());
    }
}
