//! the [GSUB] table
//!
//! [GSUB]: https://docs.microsoft.com/en-us/typography/opentype/spec/gsub

use types::{GlyphId, Tag};

use super::layout::{
    read_lookup_list, read_offset_array, read_optional, ClassDef, CoverageTable,
    FeatureList, Lookup, ScriptList, SequenceLookupRecord,
};
use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

#[cfg(test)]
#[path = "../tests/gsub.rs"]
mod tests;

/// Lookup type values.
pub mod lookup_type {
    pub const SINGLE: u16 = 1;
    pub const MULTIPLE: u16 = 2;
    pub const ALTERNATE: u16 = 3;
    pub const LIGATURE: u16 = 4;
    pub const CONTEXT: u16 = 5;
    pub const CHAIN_CONTEXT: u16 = 6;
    pub const EXTENSION: u16 = 7;
    pub const REVERSE_CHAIN_SINGLE: u16 = 8;
}

/// A GSUB lookup; extension lookups are stored with their inner type.
pub type SubstitutionLookup = Lookup<SubstitutionSubtable>;

/// [GSUB](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#gsub-header)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gsub {
    pub script_list: ScriptList,
    pub feature_list: FeatureList,
    pub lookup_list: Vec<SubstitutionLookup>,
}

impl TopLevelTable for Gsub {
    const TAG: Tag = Tag::new(b"GSUB");
}

impl FontRead<'_> for Gsub {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let major: u16 = data.read_at(0)?;
        if major != 1 {
            return Err(ReadError::InvalidFormat(major as _));
        }
        let script_list = read_optional(data, 4)?.unwrap_or_default();
        let feature_list = read_optional(data, 6)?.unwrap_or_default();
        let lookup_list = match data.resolve_offset::<u16>(8) {
            Ok(list) => read_lookup_list(list, read_subtable_or_drop)?,
            Err(ReadError::NullOffset) => Vec::new(),
            Err(e) => return Err(e),
        };
        let lookup_list = lookup_list
            .into_iter()
            .map(|mut lookup| {
                if lookup.lookup_type == lookup_type::EXTENSION {
                    if let Some(inner) = lookup.subtables.first() {
                        lookup.lookup_type = inner.lookup_type();
                    }
                }
                lookup
            })
            .collect();
        Ok(Gsub {
            script_list,
            feature_list,
            lookup_list,
        })
    }
}

/// Read a subtable, keeping a malformed one as a placeholder so the rest of
/// the table stays usable.
fn read_subtable_or_drop(lookup_type: u16, data: FontData) -> Result<SubstitutionSubtable, ReadError> {
    Ok(SubstitutionSubtable::read(lookup_type, data).unwrap_or_else(|error| {
        let format = data.read_at(0).unwrap_or_default();
        log::debug!("malformed GSUB subtable: type {lookup_type} format {format}: {error}");
        SubstitutionSubtable::Malformed {
            lookup_type,
            format,
            error,
        }
    }))
}

impl Gsub {
    /// Every subtable that failed to parse, as `(lookup index, lookup type, format, error)`.
    pub fn malformed_subtables(&self) -> impl Iterator<Item = (usize, u16, u16, &ReadError)> + '_ {
        self.lookup_list
            .iter()
            .enumerate()
            .flat_map(|(ix, lookup)| {
                lookup.subtables.iter().filter_map(move |subtable| match subtable {
                    SubstitutionSubtable::Malformed {
                        lookup_type,
                        format,
                        error,
                    } => Some((ix, *lookup_type, *format, error)),
                    _ => None,
                })
            })
    }

    /// Every subtable the engine cannot apply, as `(lookup index, lookup type, format)`.
    pub fn unimplemented_subtables(&self) -> impl Iterator<Item = (usize, u16, u16)> + '_ {
        self.lookup_list
            .iter()
            .enumerate()
            .flat_map(|(ix, lookup)| {
                lookup.subtables.iter().filter_map(move |subtable| match subtable {
                    SubstitutionSubtable::Unimplemented {
                        lookup_type,
                        format,
                    } => Some((ix, *lookup_type, *format)),
                    _ => None,
                })
            })
    }
}

/// A GSUB subtable of any supported type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubstitutionSubtable {
    Single(SingleSubst),
    Multiple(MultipleSubstFormat1),
    Alternate(AlternateSubstFormat1),
    Ligature(LigatureSubstFormat1),
    Context(SequenceContext),
    ChainContext(ChainedSequenceContext),
    ReverseChainSingle(ReverseChainSingleSubstFormat1),
    /// A subtable with an unknown type or format; applying it does nothing.
    Unimplemented { lookup_type: u16, format: u16 },
    /// A subtable that failed to parse; applying it does nothing.
    Malformed {
        lookup_type: u16,
        format: u16,
        error: ReadError,
    },
}

impl SubstitutionSubtable {
    /// Read a subtable of the given lookup type, unwrapping extensions.
    pub fn read(lookup_type: u16, data: FontData) -> Result<Self, ReadError> {
        use self::lookup_type::*;
        let format: u16 = data.read_at(0)?;
        Ok(match (lookup_type, format) {
            (SINGLE, 1 | 2) => Self::Single(SingleSubst::read(data)?),
            (MULTIPLE, 1) => Self::Multiple(MultipleSubstFormat1::read(data)?),
            (ALTERNATE, 1) => Self::Alternate(AlternateSubstFormat1::read(data)?),
            (LIGATURE, 1) => Self::Ligature(LigatureSubstFormat1::read(data)?),
            (CONTEXT, 1..=3) => Self::Context(SequenceContext::read(data)?),
            (CHAIN_CONTEXT, 1..=3) => Self::ChainContext(ChainedSequenceContext::read(data)?),
            (EXTENSION, 1) => {
                let extension_type: u16 = data.read_at(2)?;
                if extension_type == EXTENSION {
                    return Err(ReadError::MalformedData("nested extension subtable"));
                }
                return Self::read(extension_type, data.resolve_offset::<u32>(4)?);
            }
            (REVERSE_CHAIN_SINGLE, 1) => {
                Self::ReverseChainSingle(ReverseChainSingleSubstFormat1::read(data)?)
            }
            _ => {
                log::debug!("unsupported GSUB subtable: type {lookup_type} format {format}");
                Self::Unimplemented {
                    lookup_type,
                    format,
                }
            }
        })
    }

    /// The lookup type this subtable belongs to.
    pub fn lookup_type(&self) -> u16 {
        match self {
            Self::Single(_) => lookup_type::SINGLE,
            Self::Multiple(_) => lookup_type::MULTIPLE,
            Self::Alternate(_) => lookup_type::ALTERNATE,
            Self::Ligature(_) => lookup_type::LIGATURE,
            Self::Context(_) => lookup_type::CONTEXT,
            Self::ChainContext(_) => lookup_type::CHAIN_CONTEXT,
            Self::ReverseChainSingle(_) => lookup_type::REVERSE_CHAIN_SINGLE,
            Self::Unimplemented { lookup_type, .. } | Self::Malformed { lookup_type, .. } => {
                *lookup_type
            }
        }
    }
}

/// [Single Substitution](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#lookuptype-1-single-substitution-subtable)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SingleSubst {
    /// Adds a delta to the covered glyph id, modulo 65536.
    Format1 {
        coverage: CoverageTable,
        delta_glyph_id: i16,
    },
    /// Replaces the covered glyph with the substitute at its coverage index.
    Format2 {
        coverage: CoverageTable,
        substitute_glyph_ids: Vec<GlyphId>,
    },
}

impl FontRead<'_> for SingleSubst {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        let coverage = CoverageTable::read(data.resolve_offset::<u16>(2)?)?;
        match format {
            1 => Ok(SingleSubst::Format1 {
                coverage,
                delta_glyph_id: data.read_at(4)?,
            }),
            2 => {
                let count: u16 = data.read_at(4)?;
                Ok(SingleSubst::Format2 {
                    coverage,
                    substitute_glyph_ids: data.read_array(6, count as usize)?,
                })
            }
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

impl SingleSubst {
    pub fn coverage(&self) -> &CoverageTable {
        match self {
            SingleSubst::Format1 { coverage, .. } | SingleSubst::Format2 { coverage, .. } => {
                coverage
            }
        }
    }

    /// The replacement for `gid`, if it is covered.
    pub fn apply(&self, gid: GlyphId) -> Option<GlyphId> {
        match self {
            SingleSubst::Format1 {
                coverage,
                delta_glyph_id,
            } => coverage
                .get(gid)
                .map(|_| gid.wrapping_add_signed(*delta_glyph_id)),
            SingleSubst::Format2 {
                coverage,
                substitute_glyph_ids,
            } => coverage
                .get(gid)
                .and_then(|ix| substitute_glyph_ids.get(ix as usize).copied()),
        }
    }
}

/// A list of glyph ids, used for sequences and alternate sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphArray(pub Vec<GlyphId>);

impl FontRead<'_> for GlyphArray {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let count: u16 = data.read_at(0)?;
        data.read_array(2, count as usize).map(GlyphArray)
    }
}

/// [Multiple Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#21-multiple-substitution-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipleSubstFormat1 {
    pub coverage: CoverageTable,
    pub sequences: Vec<GlyphArray>,
}

impl FontRead<'_> for MultipleSubstFormat1 {
    fn read(data: FontData) -> Result<Self, ReadError> {
        Ok(MultipleSubstFormat1 {
            coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
            sequences: read_offset_array(data, 4)?,
        })
    }
}

/// [Alternate Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#31-alternate-substitution-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlternateSubstFormat1 {
    pub coverage: CoverageTable,
    pub alternate_sets: Vec<GlyphArray>,
}

impl FontRead<'_> for AlternateSubstFormat1 {
    fn read(data: FontData) -> Result<Self, ReadError> {
        Ok(AlternateSubstFormat1 {
            coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
            alternate_sets: read_offset_array(data, 4)?,
        })
    }
}

/// [Ligature Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#41-ligature-substitution-format-1)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LigatureSubstFormat1 {
    pub coverage: CoverageTable,
    pub ligature_sets: Vec<LigatureSet>,
}

/// The ligatures starting with one covered glyph, in preference order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LigatureSet {
    pub ligatures: Vec<Ligature>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ligature {
    pub ligature_glyph: GlyphId,
    /// Components after the first, which is the covered glyph.
    pub component_glyph_ids: Vec<GlyphId>,
}

impl FontRead<'_> for LigatureSubstFormat1 {
    fn read(data: FontData) -> Result<Self, ReadError> {
        Ok(LigatureSubstFormat1 {
            coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
            ligature_sets: read_offset_array(data, 4)?,
        })
    }
}

impl FontRead<'_> for LigatureSet {
    fn read(data: FontData) -> Result<Self, ReadError> {
        read_offset_array(data, 0).map(|ligatures| LigatureSet { ligatures })
    }
}

impl FontRead<'_> for Ligature {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let ligature_glyph = data.read_at(0)?;
        let component_count: u16 = data.read_at(2)?;
        let component_glyph_ids =
            data.read_array(4, (component_count as usize).saturating_sub(1))?;
        Ok(Ligature {
            ligature_glyph,
            component_glyph_ids,
        })
    }
}

/// A glyph or class sequence with the lookups to apply when it matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceRule {
    /// Input sequence after the first glyph, as glyph ids or classes.
    pub input_sequence: Vec<u16>,
    pub seq_lookup_records: Vec<SequenceLookupRecord>,
}

impl FontRead<'_> for SequenceRule {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let glyph_count: u16 = cursor.read()?;
        let seq_lookup_count: u16 = cursor.read()?;
        let input_sequence = cursor.read_array((glyph_count as usize).saturating_sub(1))?;
        let seq_lookup_records =
            SequenceLookupRecord::read_array(&mut cursor, seq_lookup_count as usize)?;
        Ok(SequenceRule {
            input_sequence,
            seq_lookup_records,
        })
    }
}

/// The rules for one starting glyph or class, in preference order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceRuleSet<R> {
    pub rules: Vec<R>,
}

impl<'a, R: FontRead<'a> + Default> FontRead<'a> for SequenceRuleSet<R> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        read_offset_array(data, 0).map(|rules| SequenceRuleSet { rules })
    }
}

/// [Sequence Context](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#sequence-context-format-1-simple-glyph-contexts)
/// subtables, used by contextual substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceContext {
    Format1 {
        coverage: CoverageTable,
        rule_sets: Vec<SequenceRuleSet<SequenceRule>>,
    },
    Format2 {
        coverage: CoverageTable,
        class_def: ClassDef,
        class_rule_sets: Vec<SequenceRuleSet<SequenceRule>>,
    },
    Format3 {
        coverages: Vec<CoverageTable>,
        seq_lookup_records: Vec<SequenceLookupRecord>,
    },
}

impl FontRead<'_> for SequenceContext {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => Ok(SequenceContext::Format1 {
                coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
                rule_sets: read_offset_array(data, 4)?,
            }),
            2 => Ok(SequenceContext::Format2 {
                coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
                class_def: ClassDef::read(data.resolve_offset::<u16>(4)?)?,
                class_rule_sets: read_offset_array(data, 6)?,
            }),
            3 => {
                let glyph_count: u16 = data.read_at(2)?;
                let seq_lookup_count: u16 = data.read_at(4)?;
                let coverages = (0..glyph_count as usize)
                    .map(|i| CoverageTable::read(data.resolve_offset::<u16>(6 + i * 2)?))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut cursor = data.cursor();
                cursor.advance_by(6 + glyph_count as usize * 2);
                let seq_lookup_records =
                    SequenceLookupRecord::read_array(&mut cursor, seq_lookup_count as usize)?;
                Ok(SequenceContext::Format3 {
                    coverages,
                    seq_lookup_records,
                })
            }
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

/// A rule with backtrack, input and lookahead sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainedSequenceRule {
    /// Backtrack sequence, closest glyph first.
    pub backtrack_sequence: Vec<u16>,
    /// Input sequence after the first glyph.
    pub input_sequence: Vec<u16>,
    pub lookahead_sequence: Vec<u16>,
    pub seq_lookup_records: Vec<SequenceLookupRecord>,
}

impl FontRead<'_> for ChainedSequenceRule {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let backtrack_count: u16 = cursor.read()?;
        let backtrack_sequence = cursor.read_array(backtrack_count as usize)?;
        let input_count: u16 = cursor.read()?;
        let input_sequence = cursor.read_array((input_count as usize).saturating_sub(1))?;
        let lookahead_count: u16 = cursor.read()?;
        let lookahead_sequence = cursor.read_array(lookahead_count as usize)?;
        let seq_lookup_count: u16 = cursor.read()?;
        let seq_lookup_records =
            SequenceLookupRecord::read_array(&mut cursor, seq_lookup_count as usize)?;
        Ok(ChainedSequenceRule {
            backtrack_sequence,
            input_sequence,
            lookahead_sequence,
            seq_lookup_records,
        })
    }
}

/// [Chained Sequence Context](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#chained-sequence-context-format-1-simple-glyph-contexts)
/// subtables, used by chained contextual substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainedSequenceContext {
    Format1 {
        coverage: CoverageTable,
        rule_sets: Vec<SequenceRuleSet<ChainedSequenceRule>>,
    },
    Format2 {
        coverage: CoverageTable,
        backtrack_class_def: ClassDef,
        input_class_def: ClassDef,
        lookahead_class_def: ClassDef,
        class_rule_sets: Vec<SequenceRuleSet<ChainedSequenceRule>>,
    },
    Format3 {
        backtrack_coverages: Vec<CoverageTable>,
        input_coverages: Vec<CoverageTable>,
        lookahead_coverages: Vec<CoverageTable>,
        seq_lookup_records: Vec<SequenceLookupRecord>,
    },
}

impl FontRead<'_> for ChainedSequenceContext {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            1 => Ok(ChainedSequenceContext::Format1 {
                coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
                rule_sets: read_offset_array(data, 4)?,
            }),
            2 => Ok(ChainedSequenceContext::Format2 {
                coverage: CoverageTable::read(data.resolve_offset::<u16>(2)?)?,
                backtrack_class_def: read_optional(data, 4)?.unwrap_or_default(),
                input_class_def: ClassDef::read(data.resolve_offset::<u16>(6)?)?,
                lookahead_class_def: read_optional(data, 8)?.unwrap_or_default(),
                class_rule_sets: read_offset_array(data, 10)?,
            }),
            3 => {
                let mut pos = 2;
                let read_coverages = |pos: &mut usize| -> Result<Vec<CoverageTable>, ReadError> {
                    let count: u16 = data.read_at(*pos)?;
                    let coverages = read_coverage_offsets(data, *pos + 2, count as usize)?;
                    *pos += 2 + count as usize * 2;
                    Ok(coverages)
                };
                let backtrack_coverages = read_coverages(&mut pos)?;
                let input_coverages = read_coverages(&mut pos)?;
                let lookahead_coverages = read_coverages(&mut pos)?;
                let seq_lookup_count: u16 = data.read_at(pos)?;
                let mut cursor = data.cursor();
                cursor.advance_by(pos + 2);
                let seq_lookup_records =
                    SequenceLookupRecord::read_array(&mut cursor, seq_lookup_count as usize)?;
                Ok(ChainedSequenceContext::Format3 {
                    backtrack_coverages,
                    input_coverages,
                    lookahead_coverages,
                    seq_lookup_records,
                })
            }
            other => Err(ReadError::InvalidFormat(other as _)),
        }
    }
}

/// Coverage offsets in contextual subtables may not be null.
fn read_coverage_offsets(
    data: FontData,
    pos: usize,
    count: usize,
) -> Result<Vec<CoverageTable>, ReadError> {
    (0..count)
        .map(|i| CoverageTable::read(data.resolve_offset::<u16>(pos + i * 2)?))
        .collect()
}

/// [Reverse Chaining Contextual Single Substitution Format 1](https://docs.microsoft.com/en-us/typography/opentype/spec/gsub#81-reverse-chaining-contextual-single-substitution-format-1-coverage-based-glyph-contexts)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReverseChainSingleSubstFormat1 {
    pub coverage: CoverageTable,
    /// Backtrack coverages, closest glyph first.
    pub backtrack_coverages: Vec<CoverageTable>,
    pub lookahead_coverages: Vec<CoverageTable>,
    pub substitute_glyph_ids: Vec<GlyphId>,
}

impl FontRead<'_> for ReverseChainSingleSubstFormat1 {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let coverage = CoverageTable::read(data.resolve_offset::<u16>(2)?)?;
        let backtrack_count: u16 = data.read_at(4)?;
        let backtrack_coverages = read_coverage_offsets(data, 6, backtrack_count as usize)?;
        let mut pos = 6 + backtrack_count as usize * 2;
        let lookahead_count: u16 = data.read_at(pos)?;
        let lookahead_coverages = read_coverage_offsets(data, pos + 2, lookahead_count as usize)?;
        pos += 2 + lookahead_count as usize * 2;
        let glyph_count: u16 = data.read_at(pos)?;
        let substitute_glyph_ids = data.read_array(pos + 2, glyph_count as usize)?;
        Ok(ReverseChainSingleSubstFormat1 {
            coverage,
            backtrack_coverages,
            lookahead_coverages,
            substitute_glyph_ids,
        })
    }
}
