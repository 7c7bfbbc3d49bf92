//! Applying GSUB lookups to a sequence of glyphs.
//!
//! Substitution runs over a caller-owned [`GlyphBuffer`]. The lookups of the
//! selected feature are applied one after another, each seeing the output of
//! the previous one. Within a lookup the buffer is scanned front to back
//! (back to front for reverse chaining lookups) and output of a substitution
//! is never revisited by the same lookup.

use std::ops::Deref;

use types::{GlyphId, Tag};

use crate::tables::{
    gdef::{Gdef, GlyphClassDef},
    gsub::{
        lookup_type, ChainedSequenceContext, Gsub, SequenceContext, SubstitutionLookup,
        SubstitutionSubtable,
    },
    layout::{ClassDef, CoverageTable, LookupFlag, SequenceLookupRecord, DFLT_SCRIPT},
};

/// A buffer may grow to at most this many times its starting length.
pub const MAX_BUFFER_LEN_FACTOR: usize = 64;

/// A sequence of glyph ids to be substituted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphBuffer(Vec<GlyphId>);

impl GlyphBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, glyph: GlyphId) {
        self.0.push(glyph);
    }

    pub fn as_slice(&self) -> &[GlyphId] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<GlyphId> {
        self.0
    }

    pub(crate) fn glyphs_mut(&mut self) -> &mut Vec<GlyphId> {
        &mut self.0
    }
}

impl Deref for GlyphBuffer {
    type Target = [GlyphId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[GlyphId]> for GlyphBuffer {
    fn as_ref(&self) -> &[GlyphId] {
        &self.0
    }
}

impl From<Vec<GlyphId>> for GlyphBuffer {
    fn from(glyphs: Vec<GlyphId>) -> Self {
        Self(glyphs)
    }
}

impl From<GlyphBuffer> for Vec<GlyphId> {
    fn from(buffer: GlyphBuffer) -> Self {
        buffer.0
    }
}

impl FromIterator<GlyphId> for GlyphBuffer {
    fn from_iter<I: IntoIterator<Item = GlyphId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<GlyphId> for GlyphBuffer {
    fn extend<I: IntoIterator<Item = GlyphId>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

/// Which feature to apply, and how to resolve it.
///
/// ```
/// use fontweave::{types::Tag, FeatureSelection};
///
/// let selection = FeatureSelection::new(Tag::new(b"salt"))
///     .with_script(Tag::new(b"latn"))
///     .with_alternate(1);
/// assert_eq!(selection.alternate, 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureSelection {
    pub feature: Tag,
    /// Script to look the feature up in; `DFLT` is used when unset or absent.
    pub script: Option<Tag>,
    /// Language system within the script; the default one when unset or absent.
    pub language: Option<Tag>,
    /// Index into alternate sets, for alternate substitution.
    pub alternate: usize,
}

impl FeatureSelection {
    pub fn new(feature: Tag) -> Self {
        Self {
            feature,
            script: None,
            language: None,
            alternate: 0,
        }
    }

    pub fn with_script(mut self, script: Tag) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_language(mut self, language: Tag) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_alternate(mut self, alternate: usize) -> Self {
        self.alternate = alternate;
        self
    }
}

/// Limits on a single substitution call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub max_nesting_level: usize,
    pub max_lookup_operations: usize,
}

/// The lookup indices to apply for `selection`, ascending and deduplicated.
///
/// The feature is looked up in the requested script and language, then in
/// the `DFLT` script, and finally by tag anywhere in the feature list.
pub(crate) fn feature_lookups(gsub: &Gsub, selection: &FeatureSelection) -> Vec<u16> {
    let script = selection
        .script
        .and_then(|tag| gsub.script_list.get(tag))
        .or_else(|| gsub.script_list.get(DFLT_SCRIPT));
    let lang_sys = script.and_then(|script| {
        selection
            .language
            .and_then(|tag| script.lang_sys(tag))
            .or(script.default_lang_sys.as_ref())
    });
    let record = lang_sys
        .and_then(|lang_sys| {
            lang_sys
                .feature_indices
                .iter()
                .filter_map(|ix| gsub.feature_list.get(*ix))
                .find(|record| record.feature_tag == selection.feature)
        })
        .or_else(|| {
            gsub.feature_list
                .feature_records
                .iter()
                .find(|record| record.feature_tag == selection.feature)
        });
    let mut lookups = record
        .map(|record| record.feature.lookup_list_indices.clone())
        .unwrap_or_default();
    lookups.sort_unstable();
    lookups.dedup();
    lookups
}

/// Apply the lookups of `selection` to `buffer`.
pub(crate) fn apply_feature(
    gsub: &Gsub,
    gdef: Option<&Gdef>,
    selection: &FeatureSelection,
    limits: Limits,
    buffer: &mut GlyphBuffer,
) {
    let lookups = feature_lookups(gsub, selection);
    if lookups.is_empty() {
        log::trace!("feature '{}' has no lookups", selection.feature);
        return;
    }
    let glyphs = buffer.glyphs_mut();
    let mut ctx = ApplyContext {
        lookups: &gsub.lookup_list,
        gdef,
        alternate: selection.alternate,
        max_nesting_level: limits.max_nesting_level,
        ops_remaining: limits.max_lookup_operations,
        max_len: glyphs.len().saturating_mul(MAX_BUFFER_LEN_FACTOR),
    };
    for lookup_index in lookups {
        log::trace!("feature '{}': lookup {lookup_index}", selection.feature);
        ctx.apply_lookup(glyphs, lookup_index);
    }
}

/// A sequence of glyph tests from a contextual rule.
#[derive(Clone, Copy)]
enum Sequence<'a> {
    Glyphs(&'a [GlyphId]),
    GlyphIds(&'a [u16]),
    Classes(&'a ClassDef, &'a [u16]),
    Coverages(&'a [CoverageTable]),
}

impl Sequence<'_> {
    fn len(&self) -> usize {
        match self {
            Sequence::Glyphs(glyphs) => glyphs.len(),
            Sequence::GlyphIds(ids) => ids.len(),
            Sequence::Classes(_, classes) => classes.len(),
            Sequence::Coverages(coverages) => coverages.len(),
        }
    }

    fn matches(&self, index: usize, gid: GlyphId) -> bool {
        match self {
            Sequence::Glyphs(glyphs) => glyphs.get(index) == Some(&gid),
            Sequence::GlyphIds(ids) => ids.get(index) == Some(&gid.to_u16()),
            Sequence::Classes(class_def, classes) => {
                classes.get(index) == Some(&class_def.get(gid))
            }
            Sequence::Coverages(coverages) => coverages
                .get(index)
                .is_some_and(|coverage| coverage.contains(gid)),
        }
    }
}

struct ApplyContext<'a> {
    lookups: &'a [SubstitutionLookup],
    gdef: Option<&'a Gdef>,
    alternate: usize,
    max_nesting_level: usize,
    ops_remaining: usize,
    max_len: usize,
}

impl<'a> ApplyContext<'a> {
    fn apply_lookup(&mut self, glyphs: &mut Vec<GlyphId>, lookup_index: u16) {
        let lookups = self.lookups;
        let Some(lookup) = lookups.get(lookup_index as usize) else {
            log::debug!("lookup index {lookup_index} out of range");
            return;
        };
        if lookup.lookup_type == lookup_type::REVERSE_CHAIN_SINGLE {
            for pos in (0..glyphs.len()).rev() {
                if self.ops_remaining == 0 {
                    log::debug!("lookup operation limit reached");
                    return;
                }
                if !self.is_ignored(lookup, glyphs[pos]) {
                    self.apply_at(lookup, glyphs, pos, 0);
                }
            }
            return;
        }
        let mut pos = 0;
        while pos < glyphs.len() {
            if self.ops_remaining == 0 {
                log::debug!("lookup operation limit reached");
                return;
            }
            let next = if self.is_ignored(lookup, glyphs[pos]) {
                None
            } else {
                self.apply_at(lookup, glyphs, pos, 0)
            };
            pos = next.unwrap_or(pos + 1);
        }
    }

    /// Try each subtable of `lookup` at `pos`; the first that applies wins.
    ///
    /// Returns the position following the substituted glyphs.
    fn apply_at(
        &mut self,
        lookup: &'a SubstitutionLookup,
        glyphs: &mut Vec<GlyphId>,
        pos: usize,
        nesting: usize,
    ) -> Option<usize> {
        if self.ops_remaining == 0 {
            return None;
        }
        self.ops_remaining -= 1;
        lookup
            .subtables
            .iter()
            .find_map(|subtable| self.apply_subtable(lookup, subtable, glyphs, pos, nesting))
    }

    fn apply_subtable(
        &mut self,
        lookup: &'a SubstitutionLookup,
        subtable: &'a SubstitutionSubtable,
        glyphs: &mut Vec<GlyphId>,
        pos: usize,
        nesting: usize,
    ) -> Option<usize> {
        let gid = *glyphs.get(pos)?;
        match subtable {
            SubstitutionSubtable::Single(single) => {
                glyphs[pos] = single.apply(gid)?;
                log::trace!("single: {} -> {}", gid.to_u16(), glyphs[pos].to_u16());
                Some(pos + 1)
            }
            SubstitutionSubtable::Multiple(multiple) => {
                let index = multiple.coverage.get(gid)?;
                let sequence = &multiple.sequences.get(index as usize)?.0;
                if sequence.is_empty() && glyphs.len() <= 1 {
                    return None;
                }
                if glyphs.len() - 1 + sequence.len() > self.max_len {
                    log::debug!("buffer length limit ({}) reached", self.max_len);
                    return None;
                }
                glyphs.splice(pos..pos + 1, sequence.iter().copied());
                log::trace!("multiple: {} -> {sequence:?}", gid.to_u16());
                Some(pos + sequence.len())
            }
            SubstitutionSubtable::Alternate(alternate) => {
                let index = alternate.coverage.get(gid)?;
                let set = &alternate.alternate_sets.get(index as usize)?.0;
                glyphs[pos] = *set.get(self.alternate)?;
                log::trace!("alternate: {} -> {}", gid.to_u16(), glyphs[pos].to_u16());
                Some(pos + 1)
            }
            SubstitutionSubtable::Ligature(ligature_subst) => {
                let index = ligature_subst.coverage.get(gid)?;
                let set = ligature_subst.ligature_sets.get(index as usize)?;
                let (ligature, positions) = set.ligatures.iter().find_map(|ligature| {
                    let components = Sequence::Glyphs(&ligature.component_glyph_ids);
                    self.match_input(lookup, glyphs, pos, components)
                        .map(|positions| (ligature, positions))
                })?;
                glyphs[pos] = ligature.ligature_glyph;
                for &component in positions[1..].iter().rev() {
                    glyphs.remove(component);
                }
                log::trace!(
                    "ligature: {} components -> {}",
                    positions.len(),
                    ligature.ligature_glyph.to_u16()
                );
                let last = positions.last().copied().unwrap_or(pos);
                Some(last + 2 - positions.len())
            }
            SubstitutionSubtable::Context(context) => {
                let (positions, records) = self.match_context(lookup, context, glyphs, pos)?;
                Some(self.apply_records(glyphs, positions, records, nesting))
            }
            SubstitutionSubtable::ChainContext(context) => {
                let (positions, records) =
                    self.match_chain_context(lookup, context, glyphs, pos)?;
                Some(self.apply_records(glyphs, positions, records, nesting))
            }
            SubstitutionSubtable::ReverseChainSingle(reverse) => {
                let index = reverse.coverage.get(gid)?;
                let backtrack = Sequence::Coverages(&reverse.backtrack_coverages);
                let lookahead = Sequence::Coverages(&reverse.lookahead_coverages);
                if !self.match_backtrack(lookup, glyphs, pos, backtrack)
                    || !self.match_lookahead(lookup, glyphs, pos, lookahead)
                {
                    return None;
                }
                glyphs[pos] = *reverse.substitute_glyph_ids.get(index as usize)?;
                log::trace!("reverse chain: {} -> {}", gid.to_u16(), glyphs[pos].to_u16());
                Some(pos + 1)
            }
            SubstitutionSubtable::Unimplemented { .. } | SubstitutionSubtable::Malformed { .. } => {
                None
            }
        }
    }

    fn match_context(
        &self,
        lookup: &SubstitutionLookup,
        context: &'a SequenceContext,
        glyphs: &[GlyphId],
        pos: usize,
    ) -> Option<(Vec<usize>, &'a [SequenceLookupRecord])> {
        let gid = glyphs[pos];
        match context {
            SequenceContext::Format1 {
                coverage,
                rule_sets,
            } => {
                let index = coverage.get(gid)?;
                rule_sets.get(index as usize)?.rules.iter().find_map(|rule| {
                    let input = Sequence::GlyphIds(&rule.input_sequence);
                    self.match_input(lookup, glyphs, pos, input)
                        .map(|positions| (positions, rule.seq_lookup_records.as_slice()))
                })
            }
            SequenceContext::Format2 {
                coverage,
                class_def,
                class_rule_sets,
            } => {
                coverage.get(gid)?;
                let class = class_def.get(gid);
                class_rule_sets.get(class as usize)?.rules.iter().find_map(|rule| {
                    let input = Sequence::Classes(class_def, &rule.input_sequence);
                    self.match_input(lookup, glyphs, pos, input)
                        .map(|positions| (positions, rule.seq_lookup_records.as_slice()))
                })
            }
            SequenceContext::Format3 {
                coverages,
                seq_lookup_records,
            } => {
                let (first, rest) = coverages.split_first()?;
                first.get(gid)?;
                let positions =
                    self.match_input(lookup, glyphs, pos, Sequence::Coverages(rest))?;
                Some((positions, seq_lookup_records.as_slice()))
            }
        }
    }

    fn match_chain_context(
        &self,
        lookup: &SubstitutionLookup,
        context: &'a ChainedSequenceContext,
        glyphs: &[GlyphId],
        pos: usize,
    ) -> Option<(Vec<usize>, &'a [SequenceLookupRecord])> {
        let gid = glyphs[pos];
        match context {
            ChainedSequenceContext::Format1 {
                coverage,
                rule_sets,
            } => {
                let index = coverage.get(gid)?;
                rule_sets.get(index as usize)?.rules.iter().find_map(|rule| {
                    let positions = self.match_chain(
                        lookup,
                        glyphs,
                        pos,
                        [
                            Sequence::GlyphIds(&rule.backtrack_sequence),
                            Sequence::GlyphIds(&rule.input_sequence),
                            Sequence::GlyphIds(&rule.lookahead_sequence),
                        ],
                    )?;
                    Some((positions, rule.seq_lookup_records.as_slice()))
                })
            }
            ChainedSequenceContext::Format2 {
                coverage,
                backtrack_class_def,
                input_class_def,
                lookahead_class_def,
                class_rule_sets,
            } => {
                coverage.get(gid)?;
                let class = input_class_def.get(gid);
                class_rule_sets.get(class as usize)?.rules.iter().find_map(|rule| {
                    let positions = self.match_chain(
                        lookup,
                        glyphs,
                        pos,
                        [
                            Sequence::Classes(backtrack_class_def, &rule.backtrack_sequence),
                            Sequence::Classes(input_class_def, &rule.input_sequence),
                            Sequence::Classes(lookahead_class_def, &rule.lookahead_sequence),
                        ],
                    )?;
                    Some((positions, rule.seq_lookup_records.as_slice()))
                })
            }
            ChainedSequenceContext::Format3 {
                backtrack_coverages,
                input_coverages,
                lookahead_coverages,
                seq_lookup_records,
            } => {
                let (first, rest) = input_coverages.split_first()?;
                first.get(gid)?;
                let positions = self.match_chain(
                    lookup,
                    glyphs,
                    pos,
                    [
                        Sequence::Coverages(backtrack_coverages),
                        Sequence::Coverages(rest),
                        Sequence::Coverages(lookahead_coverages),
                    ],
                )?;
                Some((positions, seq_lookup_records.as_slice()))
            }
        }
    }

    /// Match `[backtrack, input, lookahead]` around the glyph at `pos`.
    fn match_chain(
        &self,
        lookup: &SubstitutionLookup,
        glyphs: &[GlyphId],
        pos: usize,
        [backtrack, input, lookahead]: [Sequence; 3],
    ) -> Option<Vec<usize>> {
        let positions = self.match_input(lookup, glyphs, pos, input)?;
        let last = positions.last().copied().unwrap_or(pos);
        (self.match_backtrack(lookup, glyphs, pos, backtrack)
            && self.match_lookahead(lookup, glyphs, last, lookahead))
        .then_some(positions)
    }

    /// Match the glyphs following `start`, which has already been matched.
    ///
    /// On success returns the positions of every matched glyph, `start` first.
    fn match_input(
        &self,
        lookup: &SubstitutionLookup,
        glyphs: &[GlyphId],
        start: usize,
        input: Sequence,
    ) -> Option<Vec<usize>> {
        let mut positions = Vec::with_capacity(input.len() + 1);
        positions.push(start);
        let mut pos = start;
        for i in 0..input.len() {
            pos = self.next_unignored(lookup, glyphs, pos + 1)?;
            if !input.matches(i, glyphs[pos]) {
                return None;
            }
            positions.push(pos);
        }
        Some(positions)
    }

    /// Match backwards from the glyph before `start`, closest glyph first.
    fn match_backtrack(
        &self,
        lookup: &SubstitutionLookup,
        glyphs: &[GlyphId],
        start: usize,
        backtrack: Sequence,
    ) -> bool {
        let mut pos = start;
        for i in 0..backtrack.len() {
            match self.prev_unignored(lookup, glyphs, pos) {
                Some(prev) if backtrack.matches(i, glyphs[prev]) => pos = prev,
                _ => return false,
            }
        }
        true
    }

    /// Match forwards from the glyph after `last`.
    fn match_lookahead(
        &self,
        lookup: &SubstitutionLookup,
        glyphs: &[GlyphId],
        last: usize,
        lookahead: Sequence,
    ) -> bool {
        let mut pos = last;
        for i in 0..lookahead.len() {
            match self.next_unignored(lookup, glyphs, pos + 1) {
                Some(next) if lookahead.matches(i, glyphs[next]) => pos = next,
                _ => return false,
            }
        }
        true
    }

    fn next_unignored(
        &self,
        lookup: &SubstitutionLookup,
        glyphs: &[GlyphId],
        from: usize,
    ) -> Option<usize> {
        (from..glyphs.len()).find(|&pos| !self.is_ignored(lookup, glyphs[pos]))
    }

    fn prev_unignored(
        &self,
        lookup: &SubstitutionLookup,
        glyphs: &[GlyphId],
        before: usize,
    ) -> Option<usize> {
        (0..before)
            .rev()
            .find(|&pos| !self.is_ignored(lookup, glyphs[pos]))
    }

    /// `true` if the lookup flag says to skip `gid`.
    fn is_ignored(&self, lookup: &SubstitutionLookup, gid: GlyphId) -> bool {
        let Some(gdef) = self.gdef else {
            return false;
        };
        let flag = lookup.lookup_flag;
        match gdef.glyph_class(gid) {
            GlyphClassDef::Base => flag.contains(LookupFlag::IGNORE_BASE_GLYPHS),
            GlyphClassDef::Ligature => flag.contains(LookupFlag::IGNORE_LIGATURES),
            GlyphClassDef::Mark => {
                if flag.contains(LookupFlag::IGNORE_MARKS) {
                    return true;
                }
                if let Some(set) = lookup.mark_filtering_set {
                    return !gdef.is_in_mark_glyph_set(set, gid);
                }
                flag.mark_attachment_class()
                    .is_some_and(|class| gdef.mark_attach_class(gid) != class)
            }
            GlyphClassDef::Unclassified | GlyphClassDef::Component => false,
        }
    }

    /// Apply the nested lookups of a matched contextual rule.
    ///
    /// Returns the position following the matched input, adjusted for any
    /// change in buffer length.
    fn apply_records(
        &mut self,
        glyphs: &mut Vec<GlyphId>,
        mut positions: Vec<usize>,
        records: &[SequenceLookupRecord],
        nesting: usize,
    ) -> usize {
        let start = positions[0];
        let mut end = positions.last().copied().unwrap_or(start) + 1;
        if nesting >= self.max_nesting_level {
            log::debug!("nested lookup limit ({}) reached", self.max_nesting_level);
            return end;
        }
        let lookups = self.lookups;
        for record in records {
            let record_ix = record.sequence_index as usize;
            let Some(&pos) = positions.get(record_ix) else {
                continue;
            };
            let Some(lookup) = lookups.get(record.lookup_list_index as usize) else {
                log::debug!("nested lookup {} out of range", record.lookup_list_index);
                continue;
            };
            if pos >= glyphs.len() || self.is_ignored(lookup, glyphs[pos]) {
                continue;
            }
            let len_before = glyphs.len();
            if self.apply_at(lookup, glyphs, pos, nesting + 1).is_none() {
                continue;
            }
            let delta = glyphs.len() as isize - len_before as isize;
            if delta != 0 {
                adjust_positions(&mut positions, record_ix, delta);
                end = end.checked_add_signed(delta).unwrap_or(0);
            }
        }
        end.max(start + 1)
    }
}

/// Shift the matched positions after `record_ix` by `delta` glyphs.
///
/// Growth inserts the new glyphs into the match; shrinking drops positions
/// that were merged into the glyph at `record_ix`.
fn adjust_positions(positions: &mut Vec<usize>, record_ix: usize, delta: isize) {
    let at = positions[record_ix];
    let tail: Vec<usize> = positions.drain(record_ix + 1..).collect();
    if delta > 0 {
        let grown = delta as usize;
        positions.extend((1..=grown).map(|i| at + i));
        positions.extend(tail.into_iter().map(|pos| pos + grown));
    } else {
        let shrunk = delta.unsigned_abs();
        positions.extend(
            tail.into_iter()
                .filter_map(|pos| pos.checked_sub(shrunk))
                .filter(|&pos| pos > at),
        );
    }
}

#[cfg(test)]
#[path = "./tests/substitution.rs"]
mod tests;
