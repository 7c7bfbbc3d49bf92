//! OpenType Layout common table formats

#[path = "./layout/lookup_flag.rs"]
mod lookup_flag;

pub use lookup_flag::LookupFlag;

#[cfg(test)]
#[path = "../tests/layout.rs"]
mod tests;

use types::{GlyphId, Tag};

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError},
};

/// Tag of the default script.
pub const DFLT_SCRIPT: Tag = Tag::new(b"DFLT");

/// Resolve the Offset16 at `pos`, returning `None` for a null offset.
pub(crate) fn read_optional<'a, T: FontRead<'a>>(
    data: FontData<'a>,
    pos: usize,
) -> Result<Option<T>, ReadError> {
    match data.resolve_offset::<u16>(pos) {
        Ok(sub) => T::read(sub).map(Some),
        Err(ReadError::NullOffset) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read a u16 count at `pos` followed by that many Offset16s, resolving each.
///
/// Null offsets resolve to `T::default()`.
pub(crate) fn read_offset_array<'a, T: FontRead<'a> + Default>(
    data: FontData<'a>,
    pos: usize,
) -> Result<Vec<T>, ReadError> {
    let count: u16 = data.read_at(pos)?;
    read_offsets(data, pos + 2, count as usize)
}

/// Resolve `count` consecutive Offset16s starting at `pos`.
pub(crate) fn read_offsets<'a, T: FontRead<'a> + Default>(
    data: FontData<'a>,
    pos: usize,
    count: usize,
) -> Result<Vec<T>, ReadError> {
    (0..count)
        .map(|i| read_optional(data, pos + i * 2).map(Option::unwrap_or_default))
        .collect()
}

/// [Coverage Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoverageTable {
    Format1(CoverageFormat1),
    Format2(CoverageFormat2),
}

/// [Coverage Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-1): Individual glyph indices
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageFormat1 {
    glyph_array: Vec<GlyphId>,
}

/// [Coverage Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-2): Range of glyphs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageFormat2 {
    range_records: Vec<RangeRecord>,
}

/// Used in [CoverageFormat2]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeRecord {
    pub start_glyph_id: GlyphId,
    pub end_glyph_id: GlyphId,
    /// Coverage index of the first glyph in the range.
    pub start_coverage_index: u16,
}

impl Default for CoverageTable {
    fn default() -> Self {
        CoverageTable::Format1(CoverageFormat1::default())
    }
}

impl FontRead<'_> for CoverageTable {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => {
                let count: u16 = data.read_at(2)?;
                let glyph_array: Vec<GlyphId> = data.read_array(4, count as usize)?;
                if glyph_array.windows(2).any(|pair| pair[0] >= pair[1]) {
                    return Err(ReadError::MalformedData("coverage glyphs are not sorted"));
                }
                Ok(CoverageTable::Format1(CoverageFormat1 { glyph_array }))
            }
            2 => {
                let count: u16 = data.read_at(2)?;
                let mut cursor = data.cursor();
                cursor.advance_by(4);
                let mut range_records: Vec<RangeRecord> = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let record = RangeRecord {
                        start_glyph_id: cursor.read()?,
                        end_glyph_id: cursor.read()?,
                        start_coverage_index: cursor.read()?,
                    };
                    let out_of_order = range_records
                        .last()
                        .is_some_and(|prev| prev.end_glyph_id >= record.start_glyph_id);
                    if record.start_glyph_id > record.end_glyph_id || out_of_order {
                        return Err(ReadError::MalformedData("coverage ranges are not sorted"));
                    }
                    range_records.push(record);
                }
                Ok(CoverageTable::Format2(CoverageFormat2 { range_records }))
            }
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

impl CoverageTable {
    /// Create a format 1 table from glyphs, which are sorted and deduplicated.
    pub fn from_glyphs(glyphs: impl IntoIterator<Item = GlyphId>) -> Self {
        let mut glyph_array: Vec<_> = glyphs.into_iter().collect();
        glyph_array.sort_unstable();
        glyph_array.dedup();
        CoverageTable::Format1(CoverageFormat1 { glyph_array })
    }

    /// If this glyph is in the coverage table, returns its coverage index.
    pub fn get(&self, gid: GlyphId) -> Option<u16> {
        match self {
            CoverageTable::Format1(sub) => sub.get(gid),
            CoverageTable::Format2(sub) => sub.get(gid),
        }
    }

    pub fn contains(&self, gid: GlyphId) -> bool {
        self.get(gid).is_some()
    }

    /// Iterate over the covered glyphs in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId> + '_ {
        // all one expression so that we have a single return type
        let (iter1, iter2) = match self {
            CoverageTable::Format1(t) => (Some(t.glyph_array.iter().copied()), None),
            CoverageTable::Format2(t) => {
                let iter = t.range_records.iter().flat_map(RangeRecord::iter);
                (None, Some(iter))
            }
        };
        iter1
            .into_iter()
            .flatten()
            .chain(iter2.into_iter().flatten())
    }
}

impl CoverageFormat1 {
    pub fn get(&self, gid: GlyphId) -> Option<u16> {
        self.glyph_array
            .binary_search(&gid)
            .ok()
            .map(|ix| ix as u16)
    }
}

impl CoverageFormat2 {
    pub fn get(&self, gid: GlyphId) -> Option<u16> {
        let ix = self
            .range_records
            .partition_point(|record| record.end_glyph_id < gid);
        let record = self.range_records.get(ix)?;
        (record.start_glyph_id <= gid).then(|| {
            record
                .start_coverage_index
                .wrapping_add(gid.to_u16() - record.start_glyph_id.to_u16())
        })
    }
}

impl RangeRecord {
    fn iter(&self) -> impl Iterator<Item = GlyphId> + '_ {
        (self.start_glyph_id.to_u16()..=self.end_glyph_id.to_u16()).map(GlyphId::new)
    }
}

/// [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassDef {
    Format1(ClassDefFormat1),
    Format2(ClassDefFormat2),
}

/// [Class Definition Table Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDefFormat1 {
    pub start_glyph_id: GlyphId,
    pub class_value_array: Vec<u16>,
}

/// [Class Definition Table Format 2](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table-format-2)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassDefFormat2 {
    class_range_records: Vec<ClassRangeRecord>,
}

/// Used in [ClassDefFormat2]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph_id: GlyphId,
    pub end_glyph_id: GlyphId,
    pub class: u16,
}

impl Default for ClassDef {
    fn default() -> Self {
        ClassDef::Format2(ClassDefFormat2::default())
    }
}

impl FontRead<'_> for ClassDef {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => {
                let start_glyph_id = data.read_at(2)?;
                let count: u16 = data.read_at(4)?;
                let class_value_array = data.read_array(6, count as usize)?;
                Ok(ClassDef::Format1(ClassDefFormat1 {
                    start_glyph_id,
                    class_value_array,
                }))
            }
            2 => {
                let count: u16 = data.read_at(2)?;
                let mut cursor = data.cursor();
                cursor.advance_by(4);
                let mut class_range_records = (0..count)
                    .map(|_| {
                        Ok(ClassRangeRecord {
                            start_glyph_id: cursor.read()?,
                            end_glyph_id: cursor.read()?,
                            class: cursor.read()?,
                        })
                    })
                    .collect::<Result<Vec<_>, ReadError>>()?;
                // binary search needs ranges ordered by start glyph
                class_range_records.sort_by_key(|record| record.start_glyph_id);
                Ok(ClassDef::Format2(ClassDefFormat2 {
                    class_range_records,
                }))
            }
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

impl ClassDef {
    /// Get the class for this glyph id; glyphs not listed are class 0.
    pub fn get(&self, gid: GlyphId) -> u16 {
        match self {
            ClassDef::Format1(table) => table.get(gid),
            ClassDef::Format2(table) => table.get(gid),
        }
    }
}

impl ClassDefFormat1 {
    pub fn get(&self, gid: GlyphId) -> u16 {
        let Some(ix) = gid.to_u16().checked_sub(self.start_glyph_id.to_u16()) else {
            return 0;
        };
        self.class_value_array
            .get(ix as usize)
            .copied()
            .unwrap_or(0)
    }
}

impl ClassDefFormat2 {
    pub fn get(&self, gid: GlyphId) -> u16 {
        let ix = self
            .class_range_records
            .partition_point(|record| record.start_glyph_id <= gid);
        ix.checked_sub(1)
            .map(|ix| self.class_range_records[ix])
            .filter(|record| gid <= record.end_glyph_id)
            .map(|record| record.class)
            .unwrap_or(0)
    }
}

/// [Script List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-list-table-and-script-record)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptList {
    pub script_records: Vec<ScriptRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptRecord {
    pub script_tag: Tag,
    pub script: Script,
}

/// [Script Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#script-table-and-language-system-record)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub default_lang_sys: Option<LangSys>,
    pub lang_sys_records: Vec<(Tag, LangSys)>,
}

/// [Language System Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#language-system-table)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LangSys {
    /// Index of a feature required for this language system, if any.
    pub required_feature_index: Option<u16>,
    pub feature_indices: Vec<u16>,
}

impl FontRead<'_> for ScriptList {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(0)?;
        let script_records = (0..count as usize)
            .map(|i| {
                let record_pos = 2 + i * 6;
                let script_tag = data.read_at(record_pos)?;
                let script = read_optional(data, record_pos + 4)?.unwrap_or_default();
                Ok(ScriptRecord { script_tag, script })
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(ScriptList { script_records })
    }
}

impl ScriptList {
    pub fn get(&self, tag: Tag) -> Option<&Script> {
        self.script_records
            .iter()
            .find(|record| record.script_tag == tag)
            .map(|record| &record.script)
    }
}

impl FontRead<'_> for Script {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let default_lang_sys = read_optional(data, 0)?;
        let count: u16 = data.read_at(2)?;
        let lang_sys_records = (0..count as usize)
            .map(|i| {
                let record_pos = 4 + i * 6;
                let tag = data.read_at(record_pos)?;
                let lang_sys = read_optional(data, record_pos + 4)?.unwrap_or_default();
                Ok((tag, lang_sys))
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(Script {
            default_lang_sys,
            lang_sys_records,
        })
    }
}

impl Script {
    /// The language system for `language`, if it is listed.
    pub fn lang_sys(&self, language: Tag) -> Option<&LangSys> {
        self.lang_sys_records
            .iter()
            .find(|(tag, _)| *tag == language)
            .map(|(_, lang_sys)| lang_sys)
    }
}

impl FontRead<'_> for LangSys {
    fn read(data: FontData) -> Result<Self, ReadError> {
        // lookupOrderOffset is reserved
        let required: u16 = data.read_at(2)?;
        let count: u16 = data.read_at(4)?;
        let feature_indices = data.read_array(6, count as usize)?;
        Ok(LangSys {
            required_feature_index: (required != 0xFFFF).then_some(required),
            feature_indices,
        })
    }
}

/// [Feature List Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-list-table)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureList {
    pub feature_records: Vec<FeatureRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureRecord {
    pub feature_tag: Tag,
    pub feature: Feature,
}

/// [Feature Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#feature-table)
///
/// Feature parameters are not retained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feature {
    pub lookup_list_indices: Vec<u16>,
}

impl FontRead<'_> for FeatureList {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(0)?;
        let feature_records = (0..count as usize)
            .map(|i| {
                let record_pos = 2 + i * 6;
                let feature_tag = data.read_at(record_pos)?;
                let feature = read_optional(data, record_pos + 4)?.unwrap_or_default();
                Ok(FeatureRecord {
                    feature_tag,
                    feature,
                })
            })
            .collect::<Result<_, ReadError>>()?;
        Ok(FeatureList { feature_records })
    }
}

impl FontRead<'_> for Feature {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(2)?;
        let lookup_list_indices = data.read_array(4, count as usize)?;
        Ok(Feature {
            lookup_list_indices,
        })
    }
}

impl FeatureList {
    pub fn get(&self, index: u16) -> Option<&FeatureRecord> {
        self.feature_records.get(index as usize)
    }
}

/// [Lookup Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-table)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup<T> {
    pub lookup_type: u16,
    pub lookup_flag: LookupFlag,
    pub subtables: Vec<T>,
    pub mark_filtering_set: Option<u16>,
}

impl<T> Lookup<T> {
    /// Read a lookup, parsing each subtable with `read_subtable`, which is
    /// passed the lookup type and the subtable's data.
    pub fn read_with<'a>(
        data: FontData<'a>,
        mut read_subtable: impl FnMut(u16, FontData<'a>) -> Result<T, ReadError>,
    ) -> Result<Self, ReadError> {
        let lookup_type: u16 = data.read_at(0)?;
        let lookup_flag: LookupFlag = data.read_at(2)?;
        let count: u16 = data.read_at(4)?;
        let subtables = (0..count as usize)
            .map(|i| read_subtable(lookup_type, data.resolve_offset::<u16>(6 + i * 2)?))
            .collect::<Result<Vec<_>, _>>()?;
        let mark_filtering_set = if lookup_flag.contains(LookupFlag::USE_MARK_FILTERING_SET) {
            Some(data.read_at(6 + count as usize * 2)?)
        } else {
            None
        };
        Ok(Lookup {
            lookup_type,
            lookup_flag,
            subtables,
            mark_filtering_set,
        })
    }
}

/// Read a [Lookup List](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-list-table).
pub fn read_lookup_list<'a, T>(
    data: FontData<'a>,
    mut read_subtable: impl FnMut(u16, FontData<'a>) -> Result<T, ReadError>,
) -> Result<Vec<Lookup<T>>, ReadError> {
    let count: u16 = data.read_at(0)?;
    (0..count as usize)
        .map(|i| Lookup::read_with(data.resolve_offset::<u16>(2 + i * 2)?, &mut read_subtable))
        .collect()
}

/// [Sequence Lookup Record](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#sequence-lookup-record)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceLookupRecord {
    /// Index into the matched input sequence.
    pub sequence_index: u16,
    pub lookup_list_index: u16,
}

impl SequenceLookupRecord {
    pub(crate) fn read_array(
        cursor: &mut crate::font_data::Cursor,
        count: usize,
    ) -> Result<Vec<Self>, ReadError> {
        (0..count)
            .map(|_| {
                Ok(SequenceLookupRecord {
                    sequence_index: cursor.read()?,
                    lookup_list_index: cursor.read()?,
                })
            })
            .collect()
    }
}
