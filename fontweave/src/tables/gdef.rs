//! the [GDEF](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef) table

use types::{GlyphId, Tag};

use super::layout::{read_optional, ClassDef, CoverageTable};
use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

/// Glyph classes from the GDEF glyph class definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphClassDef {
    Unclassified,
    Base,
    Ligature,
    Mark,
    Component,
}

impl From<u16> for GlyphClassDef {
    fn from(class: u16) -> Self {
        match class {
            1 => Self::Base,
            2 => Self::Ligature,
            3 => Self::Mark,
            4 => Self::Component,
            _ => Self::Unclassified,
        }
    }
}

/// [GDEF](https://docs.microsoft.com/en-us/typography/opentype/spec/gdef#gdef-header) 1.0-1.3
///
/// Only the parts used to filter glyphs during substitution are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gdef {
    pub glyph_class_def: Option<ClassDef>,
    pub mark_attach_class_def: Option<ClassDef>,
    pub mark_glyph_sets: Vec<CoverageTable>,
}

impl TopLevelTable for Gdef {
    const TAG: Tag = Tag::new(b"GDEF");
}

impl FontRead<'_> for Gdef {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let major: u16 = data.read_at(0)?;
        let minor: u16 = data.read_at(2)?;
        if major != 1 {
            return Err(ReadError::InvalidFormat(major as _));
        }
        let glyph_class_def = read_optional(data, 4)?;
        let mark_attach_class_def = read_optional(data, 10)?;
        let mark_glyph_sets = if minor >= 2 {
            match data.resolve_offset::<u16>(12) {
                Ok(sets) => read_mark_glyph_sets(sets)?,
                Err(ReadError::NullOffset) => Vec::new(),
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };
        Ok(Gdef {
            glyph_class_def,
            mark_attach_class_def,
            mark_glyph_sets,
        })
    }
}

fn read_mark_glyph_sets(data: FontData) -> Result<Vec<CoverageTable>, ReadError> {
    let format: u16 = data.read_at(0)?;
    if format != 1 {
        return Err(ReadError::InvalidFormat(format as _));
    }
    let count: u16 = data.read_at(2)?;
    (0..count as usize)
        .map(|i| CoverageTable::read(data.resolve_offset::<u32>(4 + i * 4)?))
        .collect()
}

impl Gdef {
    pub fn glyph_class(&self, gid: GlyphId) -> GlyphClassDef {
        self.glyph_class_def
            .as_ref()
            .map(|class_def| class_def.get(gid).into())
            .unwrap_or(GlyphClassDef::Unclassified)
    }

    /// The mark attachment class of `gid`, or 0.
    pub fn mark_attach_class(&self, gid: GlyphId) -> u16 {
        self.mark_attach_class_def
            .as_ref()
            .map(|class_def| class_def.get(gid))
            .unwrap_or(0)
    }

    /// `true` if `gid` is in the mark glyph set at `set_index`.
    pub fn is_in_mark_glyph_set(&self, set_index: u16, gid: GlyphId) -> bool {
        self.mark_glyph_sets
            .get(set_index as usize)
            .is_some_and(|coverage| coverage.contains(gid))
    }
}
