//! The [maxp (Maximum Profile)](https://docs.microsoft.com/en-us/typography/opentype/spec/maxp) table

use types::Tag;

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

/// The maximum profile; only the glyph count is of interest here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Maxp {
    pub num_glyphs: u16,
}

impl TopLevelTable for Maxp {
    const TAG: Tag = Tag::new(b"maxp");
}

impl FontRead<'_> for Maxp {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let version: u32 = data.read_at(0)?;
        if version != 0x00005000 && version != 0x00010000 {
            return Err(ReadError::InvalidFormat(version as _));
        }
        Ok(Maxp {
            num_glyphs: data.read_at(4)?,
        })
    }
}
