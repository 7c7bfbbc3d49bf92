//! The [hhea (Horizontal Header)](https://docs.microsoft.com/en-us/typography/opentype/spec/hhea) table

use types::Tag;

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

/// Horizontal layout metrics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    /// Number of entries in the `hmtx` long metrics array.
    pub number_of_h_metrics: u16,
}

impl Hhea {
    /// The recommended distance between consecutive baselines.
    pub fn line_space(&self) -> i32 {
        self.ascender as i32 - self.descender as i32 + self.line_gap as i32
    }
}

impl TopLevelTable for Hhea {
    const TAG: Tag = Tag::new(b"hhea");
}

impl FontRead<'_> for Hhea {
    fn read(data: FontData) -> Result<Self, ReadError> {
        Ok(Hhea {
            ascender: data.read_at(4)?,
            descender: data.read_at(6)?,
            line_gap: data.read_at(8)?,
            advance_width_max: data.read_at(10)?,
            number_of_h_metrics: data.read_at(34)?,
        })
    }
}
