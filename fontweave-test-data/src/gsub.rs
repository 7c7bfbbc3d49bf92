//! Builders for GSUB tables and subtables.
//!
//! Glyph ids are plain `u16`s and every subtable is returned as raw bytes,
//! ready to be wrapped in a [`lookup`].

use fontweave_types::Tag;

use crate::{
    bebuffer::BeBuffer,
    layout::{
        class_def_format2, coverage_format1, feature_list, lang_sys, link_offsets, offset_array,
        script, script_list,
    },
};

/// A `(sequence index, lookup index)` pair.
pub type SeqLookup = (u16, u16);

/// A chained rule; `backtrack` is listed closest glyph first and `input`
/// excludes the first glyph.
#[derive(Clone, Debug, Default)]
pub struct ChainRule<'a> {
    pub backtrack: &'a [u16],
    pub input: &'a [u16],
    pub lookahead: &'a [u16],
    pub lookups: &'a [SeqLookup],
}

/// A header of `fields` (the first being the format), then a count and
/// an offset array of `children`; the `links` are resolved first.
///
/// Empty children are written as null offsets.
fn subtable_with_children(fields: &[u16], links: &[(usize, &[u8])], children: &[Vec<u8>]) -> Vec<u8> {
    let array_pos = fields.len() * 2 + 2;
    let header = BeBuffer::new()
        .extend(fields.iter().copied())
        .push(children.len() as u16)
        .extend(std::iter::repeat_n(0u16, children.len()));
    let mut all_links = links.to_vec();
    all_links.extend(
        children
            .iter()
            .enumerate()
            .filter(|(_, child)| !child.is_empty())
            .map(|(i, child)| (array_pos + i * 2, child.as_slice())),
    );
    link_offsets(header, &all_links).into_vec()
}

/// Format 1 subtables: format, coverage offset, then an offset array.
fn coverage_with_children(coverage: &[u16], children: &[Vec<u8>]) -> Vec<u8> {
    let coverage = coverage_format1(coverage);
    subtable_with_children(&[1, 0], &[(2, &coverage)], children)
}

fn glyph_array(glyphs: &[u16]) -> Vec<u8> {
    BeBuffer::new()
        .push(glyphs.len() as u16)
        .extend(glyphs.iter().copied())
        .into_vec()
}

fn seq_lookups(buf: BeBuffer, lookups: &[SeqLookup]) -> BeBuffer {
    lookups
        .iter()
        .fold(buf, |buf, (seq, lookup)| buf.push(*seq).push(*lookup))
}

pub fn single_format1(coverage: &[u16], delta: i16) -> Vec<u8> {
    let header = BeBuffer::new().push(1u16).push(0u16).push(delta);
    link_offsets(header, &[(2, &coverage_format1(coverage))]).into_vec()
}

pub fn single_format2(coverage: &[u16], substitutes: &[u16]) -> Vec<u8> {
    let header = BeBuffer::new()
        .push(2u16)
        .push(0u16)
        .push(substitutes.len() as u16)
        .extend(substitutes.iter().copied());
    link_offsets(header, &[(2, &coverage_format1(coverage))]).into_vec()
}

/// One sequence per covered glyph.
pub fn multiple(coverage: &[u16], sequences: &[&[u16]]) -> Vec<u8> {
    let sequences: Vec<_> = sequences.iter().map(|seq| glyph_array(seq)).collect();
    coverage_with_children(coverage, &sequences)
}

/// One alternate set per covered glyph.
pub fn alternate(coverage: &[u16], sets: &[&[u16]]) -> Vec<u8> {
    let sets: Vec<_> = sets.iter().map(|set| glyph_array(set)).collect();
    coverage_with_children(coverage, &sets)
}

/// Ligature sets in coverage order; each ligature is `(ligature glyph,
/// components after the first)`.
pub fn ligature(coverage: &[u16], sets: &[&[(u16, &[u16])]]) -> Vec<u8> {
    let sets: Vec<_> = sets
        .iter()
        .map(|ligatures| {
            let ligatures: Vec<_> = ligatures
                .iter()
                .map(|(glyph, components)| {
                    BeBuffer::new()
                        .push(*glyph)
                        .push(components.len() as u16 + 1)
                        .extend(components.iter().copied())
                        .into_vec()
                })
                .collect();
            offset_array(&ligatures).into_vec()
        })
        .collect();
    coverage_with_children(coverage, &sets)
}

fn sequence_rule(input: &[u16], lookups: &[SeqLookup]) -> Vec<u8> {
    let buf = BeBuffer::new()
        .push(input.len() as u16 + 1)
        .push(lookups.len() as u16)
        .extend(input.iter().copied());
    seq_lookups(buf, lookups).into_vec()
}

fn chain_rule(rule: &ChainRule) -> Vec<u8> {
    let buf = BeBuffer::new()
        .push(rule.backtrack.len() as u16)
        .extend(rule.backtrack.iter().copied())
        .push(rule.input.len() as u16 + 1)
        .extend(rule.input.iter().copied())
        .push(rule.lookahead.len() as u16)
        .extend(rule.lookahead.iter().copied())
        .push(rule.lookups.len() as u16);
    seq_lookups(buf, rule.lookups).into_vec()
}

type Rule<'a> = (&'a [u16], &'a [SeqLookup]);

fn rule_sets(sets: &[&[Rule]]) -> Vec<Vec<u8>> {
    sets.iter()
        .map(|rules| {
            if rules.is_empty() {
                return Vec::new();
            }
            let rules: Vec<_> = rules
                .iter()
                .map(|(input, lookups)| sequence_rule(input, lookups))
                .collect();
            offset_array(&rules).into_vec()
        })
        .collect()
}

fn chain_rule_sets(sets: &[&[ChainRule]]) -> Vec<Vec<u8>> {
    sets.iter()
        .map(|rules| {
            if rules.is_empty() {
                return Vec::new();
            }
            let rules: Vec<_> = rules.iter().map(chain_rule).collect();
            offset_array(&rules).into_vec()
        })
        .collect()
}

/// Context format 1; one rule set per covered glyph, each rule is `(input
/// glyphs after the first, lookups)`.
pub fn context_format1(coverage: &[u16], sets: &[&[Rule]]) -> Vec<u8> {
    coverage_with_children(coverage, &rule_sets(sets))
}

/// Context format 2; one rule set per class, rules list classes.
pub fn context_format2(coverage: &[u16], classes: &[(u16, u16, u16)], sets: &[&[Rule]]) -> Vec<u8> {
    let coverage = coverage_format1(coverage);
    let classes = class_def_format2(classes);
    subtable_with_children(
        &[2, 0, 0],
        &[(2, &coverage), (4, &classes)],
        &rule_sets(sets),
    )
}

/// Context format 3 with one coverage per input position.
pub fn context_format3(coverages: &[&[u16]], lookups: &[SeqLookup]) -> Vec<u8> {
    let header = BeBuffer::new()
        .push(3u16)
        .push(coverages.len() as u16)
        .push(lookups.len() as u16)
        .extend(std::iter::repeat_n(0u16, coverages.len()));
    let header = seq_lookups(header, lookups);
    let tables: Vec<_> = coverages.iter().map(|c| coverage_format1(c)).collect();
    let links: Vec<_> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (6 + i * 2, t.as_slice()))
        .collect();
    link_offsets(header, &links).into_vec()
}

/// Chained context format 1; one rule set per covered glyph.
pub fn chain_format1(coverage: &[u16], sets: &[&[ChainRule]]) -> Vec<u8> {
    coverage_with_children(coverage, &chain_rule_sets(sets))
}

/// Chained context format 2; class definitions are `(start, end, class)`
/// ranges and there is one rule set per input class.
pub fn chain_format2(
    coverage: &[u16],
    backtrack_classes: &[(u16, u16, u16)],
    input_classes: &[(u16, u16, u16)],
    lookahead_classes: &[(u16, u16, u16)],
    sets: &[&[ChainRule]],
) -> Vec<u8> {
    let coverage = coverage_format1(coverage);
    let backtrack = class_def_format2(backtrack_classes);
    let input = class_def_format2(input_classes);
    let lookahead = class_def_format2(lookahead_classes);
    subtable_with_children(
        &[2, 0, 0, 0, 0],
        &[(2, &coverage), (4, &backtrack), (6, &input), (8, &lookahead)],
        &chain_rule_sets(sets),
    )
}

/// Chained context format 3; `backtrack` is listed closest glyph first.
pub fn chain_format3(
    backtrack: &[&[u16]],
    input: &[&[u16]],
    lookahead: &[&[u16]],
    lookups: &[SeqLookup],
) -> Vec<u8> {
    let mut header = BeBuffer::new().push(3u16);
    let mut positions = Vec::new();
    for group in [backtrack, input, lookahead] {
        header = header.push(group.len() as u16);
        for _ in group.iter() {
            positions.push(header.len());
            header = header.push(0u16);
        }
    }
    let header = seq_lookups(header.push(lookups.len() as u16), lookups);
    let tables: Vec<_> = [backtrack, input, lookahead]
        .iter()
        .flat_map(|group| group.iter().map(|c| coverage_format1(c)))
        .collect();
    let links: Vec<_> = positions
        .iter()
        .zip(&tables)
        .map(|(pos, table)| (*pos, table.as_slice()))
        .collect();
    link_offsets(header, &links).into_vec()
}

/// Reverse chaining single substitution; `backtrack` is closest glyph first.
pub fn reverse_chain(
    coverage: &[u16],
    backtrack: &[&[u16]],
    lookahead: &[&[u16]],
    substitutes: &[u16],
) -> Vec<u8> {
    let mut header = BeBuffer::new().push(1u16).push(0u16);
    let mut positions = vec![2];
    for group in [backtrack, lookahead] {
        header = header.push(group.len() as u16);
        for _ in group.iter() {
            positions.push(header.len());
            header = header.push(0u16);
        }
    }
    let header = header
        .push(substitutes.len() as u16)
        .extend(substitutes.iter().copied());
    let tables: Vec<_> = std::iter::once(coverage)
        .chain(backtrack.iter().copied())
        .chain(lookahead.iter().copied())
        .map(coverage_format1)
        .collect();
    let links: Vec<_> = positions
        .iter()
        .zip(&tables)
        .map(|(pos, table)| (*pos, table.as_slice()))
        .collect();
    link_offsets(header, &links).into_vec()
}

/// Wrap a subtable in an extension subtable.
pub fn extension(lookup_type: u16, subtable: &[u8]) -> Vec<u8> {
    BeBuffer::new()
        .push(1u16)
        .push(lookup_type)
        .push(8u32)
        .extend(subtable.iter().copied())
        .into_vec()
}

/// A lookup table with the given subtables.
pub fn lookup(lookup_type: u16, flag: u16, subtables: &[Vec<u8>], mark_filtering_set: Option<u16>) -> Vec<u8> {
    let mut header = BeBuffer::new()
        .push(lookup_type)
        .push(flag)
        .push(subtables.len() as u16)
        .extend(std::iter::repeat_n(0u16, subtables.len()));
    if let Some(set) = mark_filtering_set {
        header = header.push(set);
    }
    let links: Vec<_> = subtables
        .iter()
        .enumerate()
        .map(|(i, sub)| (6 + i * 2, sub.as_slice()))
        .collect();
    link_offsets(header, &links).into_vec()
}

/// A GSUB table from prebuilt script, feature and lookup lists.
pub fn gsub_table(script_list: &[u8], feature_list: &[u8], lookups: &[Vec<u8>]) -> Vec<u8> {
    let header = BeBuffer::new()
        .push(1u16)
        .push(0u16)
        .extend([0u16; 3]);
    let lookup_list = offset_array(lookups);
    link_offsets(
        header,
        &[(4, script_list), (6, feature_list), (8, &lookup_list)],
    )
    .into_vec()
}

/// A GSUB table whose `DFLT` script enables every listed feature.
pub fn gsub(features: &[(Tag, &[u16])], lookups: &[Vec<u8>]) -> Vec<u8> {
    let indices: Vec<u16> = (0..features.len() as u16).collect();
    let scripts = script_list(&[(
        Tag::new(b"DFLT"),
        script(Some(lang_sys(0xFFFF, &indices)), &[]),
    )]);
    gsub_table(&scripts, &feature_list(features), lookups)
}
