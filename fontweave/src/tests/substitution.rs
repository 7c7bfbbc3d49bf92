use super::*;
use crate::options::{MAX_LOOKUP_OPERATIONS, MAX_NESTING_LEVEL};
use crate::tables::{
    gsub::{
        AlternateSubstFormat1, ChainedSequenceRule, GlyphArray, Ligature, LigatureSet,
        LigatureSubstFormat1, MultipleSubstFormat1, ReverseChainSingleSubstFormat1,
        SequenceRule, SequenceRuleSet, SingleSubst,
    },
    layout::{
        ClassDefFormat1, Feature, FeatureList, FeatureRecord, LangSys, Lookup, Script,
        ScriptList, ScriptRecord,
    },
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const TEST: Tag = Tag::new(b"test");

const LIMITS: Limits = Limits {
    max_nesting_level: MAX_NESTING_LEVEL,
    max_lookup_operations: MAX_LOOKUP_OPERATIONS,
};

fn gid(id: u16) -> GlyphId {
    GlyphId::new(id)
}

fn coverage(ids: &[u16]) -> CoverageTable {
    CoverageTable::from_glyphs(ids.iter().copied().map(GlyphId::new))
}

fn glyph_vec(ids: &[u16]) -> Vec<GlyphId> {
    ids.iter().copied().map(GlyphId::new).collect()
}

fn records(pairs: &[(u16, u16)]) -> Vec<SequenceLookupRecord> {
    pairs
        .iter()
        .map(|&(sequence_index, lookup_list_index)| SequenceLookupRecord {
            sequence_index,
            lookup_list_index,
        })
        .collect()
}

fn lookup(subtables: Vec<SubstitutionSubtable>) -> SubstitutionLookup {
    lookup_with_flag(subtables, LookupFlag::empty(), None)
}

fn lookup_with_flag(
    subtables: Vec<SubstitutionSubtable>,
    lookup_flag: LookupFlag,
    mark_filtering_set: Option<u16>,
) -> SubstitutionLookup {
    Lookup {
        lookup_type: subtables[0].lookup_type(),
        lookup_flag,
        subtables,
        mark_filtering_set,
    }
}

fn single(ids: &[u16], delta: i16) -> SubstitutionSubtable {
    SubstitutionSubtable::Single(SingleSubst::Format1 {
        coverage: coverage(ids),
        delta_glyph_id: delta,
    })
}

fn multiple(ids: &[u16], sequences: &[&[u16]]) -> SubstitutionSubtable {
    SubstitutionSubtable::Multiple(MultipleSubstFormat1 {
        coverage: coverage(ids),
        sequences: sequences.iter().map(|seq| GlyphArray(glyph_vec(seq))).collect(),
    })
}

/// Ligatures starting with `first`, as `(ligature, components after first)`.
fn ligatures(first: u16, ligatures: &[(u16, &[u16])]) -> SubstitutionSubtable {
    SubstitutionSubtable::Ligature(LigatureSubstFormat1 {
        coverage: coverage(&[first]),
        ligature_sets: vec![LigatureSet {
            ligatures: ligatures
                .iter()
                .map(|(glyph, components)| Ligature {
                    ligature_glyph: gid(*glyph),
                    component_glyph_ids: glyph_vec(components),
                })
                .collect(),
        }],
    })
}

/// A table whose only feature, `test`, applies `active`.
fn gsub(lookup_list: Vec<SubstitutionLookup>, active: &[u16]) -> Gsub {
    Gsub {
        script_list: ScriptList::default(),
        feature_list: FeatureList {
            feature_records: vec![FeatureRecord {
                feature_tag: TEST,
                feature: Feature {
                    lookup_list_indices: active.to_vec(),
                },
            }],
        },
        lookup_list,
    }
}

fn apply(gsub: &Gsub, gdef: Option<&Gdef>, glyphs: &[u16]) -> Vec<u16> {
    apply_with(gsub, gdef, &FeatureSelection::new(TEST), LIMITS, glyphs)
}

fn apply_with(
    gsub: &Gsub,
    gdef: Option<&Gdef>,
    selection: &FeatureSelection,
    limits: Limits,
    glyphs: &[u16],
) -> Vec<u16> {
    let mut buffer: GlyphBuffer = glyphs.iter().copied().map(GlyphId::new).collect();
    apply_feature(gsub, gdef, selection, limits, &mut buffer);
    buffer.iter().map(|gid| gid.to_u16()).collect()
}

/// Glyphs 50 and 51 are marks, in attachment classes 1 and 2; mark set 0 holds 51.
fn mark_gdef() -> Gdef {
    Gdef {
        glyph_class_def: Some(ClassDef::Format1(ClassDefFormat1 {
            start_glyph_id: gid(50),
            class_value_array: vec![3, 3],
        })),
        mark_attach_class_def: Some(ClassDef::Format1(ClassDefFormat1 {
            start_glyph_id: gid(50),
            class_value_array: vec![1, 2],
        })),
        mark_glyph_sets: vec![coverage(&[51])],
    }
}

#[test]
fn single_delta_is_reversible() {
    let forward = gsub(vec![lookup(vec![single(&[5, 6], 10)])], &[0]);
    let back = gsub(vec![lookup(vec![single(&[15, 16], -10)])], &[0]);
    let substituted = apply(&forward, None, &[5, 6, 7]);
    assert_eq!(substituted, [15, 16, 7]);
    assert_eq!(apply(&back, None, &substituted), [5, 6, 7]);
}

#[test]
fn single_delta_wraps() {
    let table = gsub(vec![lookup(vec![single(&[0, 65535], -1)])], &[0]);
    assert_eq!(apply(&table, None, &[0]), [65535]);
    let table = gsub(vec![lookup(vec![single(&[65535], 2)])], &[0]);
    assert_eq!(apply(&table, None, &[65535]), [1]);
}

#[test]
fn single_format2_by_rank() {
    let subtable = SubstitutionSubtable::Single(SingleSubst::Format2 {
        coverage: coverage(&[3, 8]),
        substitute_glyph_ids: glyph_vec(&[30, 80]),
    });
    let table = gsub(vec![lookup(vec![subtable])], &[0]);
    assert_eq!(apply(&table, None, &[8, 3, 4]), [80, 30, 4]);
}

#[test]
fn first_applicable_subtable_wins() {
    let table = gsub(
        vec![lookup(vec![
            single(&[2], 1),
            single(&[2, 4], 5),
        ])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[2, 4]), [3, 9]);
}

#[test]
fn multiple_expands() {
    let table = gsub(vec![lookup(vec![multiple(&[2], &[&[20, 21, 22]])])], &[0]);
    assert_eq!(apply(&table, None, &[2, 2, 5]), [20, 21, 22, 20, 21, 22, 5]);
}

#[test]
fn multiple_output_is_not_revisited() {
    let table = gsub(vec![lookup(vec![multiple(&[2], &[&[2, 2]])])], &[0]);
    assert_eq!(apply(&table, None, &[2, 3]), [2, 2, 3]);
}

#[test]
fn multiple_empty_sequence_deletes() {
    let table = gsub(vec![lookup(vec![multiple(&[2], &[&[]])])], &[0]);
    assert_eq!(apply(&table, None, &[1, 2, 3]), [1, 3]);
    assert_eq!(apply(&table, None, &[2, 2, 2]), [2]);
    // never below one glyph
    assert_eq!(apply(&table, None, &[2]), [2]);
}

#[test]
fn multiple_growth_is_bounded() {
    let long = [7u16; MAX_BUFFER_LEN_FACTOR + 1];
    let table = gsub(vec![lookup(vec![multiple(&[2], &[&long])])], &[0]);
    assert_eq!(apply(&table, None, &[2]), [2]);
}

#[rstest]
#[case::first(0, 40)]
#[case::second(1, 41)]
#[case::out_of_range(5, 4)]
fn alternate_by_selection(#[case] alternate: usize, #[case] expected: u16) {
    let subtable = SubstitutionSubtable::Alternate(AlternateSubstFormat1 {
        coverage: coverage(&[4]),
        alternate_sets: vec![GlyphArray(glyph_vec(&[40, 41]))],
    });
    let table = gsub(vec![lookup(vec![subtable])], &[0]);
    let selection = FeatureSelection::new(TEST).with_alternate(alternate);
    assert_eq!(apply_with(&table, None, &selection, LIMITS, &[4]), [expected]);
}

#[rstest]
#[case::ffi(&[2, 2, 3], &[5])]
#[case::fi(&[2, 3, 9], &[6, 9])]
#[case::twice(&[2, 3, 2, 2, 3], &[6, 5])]
#[case::no_match(&[2, 4], &[2, 4])]
#[case::runs_off_end(&[2, 2], &[2, 2])]
fn ligature(#[case] input: &[u16], #[case] expected: &[u16]) {
    let table = gsub(
        vec![lookup(vec![ligatures(2, &[(5, &[2, 3][..]), (6, &[3][..])])])],
        &[0],
    );
    assert_eq!(apply(&table, None, input), expected);
}

#[test]
fn first_listed_ligature_wins() {
    let table = gsub(
        vec![lookup(vec![ligatures(2, &[(6, &[3][..]), (5, &[3, 3][..])])])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[2, 3, 3]), [6, 3]);
}

#[test]
fn ligature_skips_ignored_marks() {
    let gdef = mark_gdef();
    let subtable = || ligatures(2, &[(6, &[3])]);
    let plain = gsub(vec![lookup(vec![subtable()])], &[0]);
    assert_eq!(apply(&plain, Some(&gdef), &[2, 50, 3]), [2, 50, 3]);

    let skip_marks = gsub(
        vec![lookup_with_flag(vec![subtable()], LookupFlag::IGNORE_MARKS, None)],
        &[0],
    );
    assert_eq!(apply(&skip_marks, Some(&gdef), &[2, 50, 3]), [6, 50]);
    assert_eq!(apply(&skip_marks, Some(&gdef), &[2, 50, 3, 2, 3]), [6, 50, 6]);
    // without GDEF nothing is known to be a mark
    assert_eq!(apply(&skip_marks, None, &[2, 50, 3]), [2, 50, 3]);
}

#[test]
fn mark_filtering_set() {
    let gdef = mark_gdef();
    let table = gsub(
        vec![lookup_with_flag(
            vec![ligatures(2, &[(6, &[3])])],
            LookupFlag::USE_MARK_FILTERING_SET,
            Some(0),
        )],
        &[0],
    );
    assert_eq!(apply(&table, Some(&gdef), &[2, 50, 3]), [6, 50]);
    assert_eq!(apply(&table, Some(&gdef), &[2, 51, 3]), [2, 51, 3]);
}

#[test]
fn mark_attachment_class() {
    let gdef = mark_gdef();
    let table = gsub(
        vec![lookup_with_flag(
            vec![ligatures(2, &[(6, &[3])])],
            LookupFlag::empty().with_mark_attachment_class(1),
            None,
        )],
        &[0],
    );
    assert_eq!(apply(&table, Some(&gdef), &[2, 51, 3]), [6, 51]);
    assert_eq!(apply(&table, Some(&gdef), &[2, 50, 3]), [2, 50, 3]);
}

#[test]
fn context_format1() {
    let context = SubstitutionSubtable::Context(SequenceContext::Format1 {
        coverage: coverage(&[2]),
        rule_sets: vec![SequenceRuleSet {
            rules: vec![SequenceRule {
                input_sequence: vec![3],
                seq_lookup_records: records(&[(1, 1)]),
            }],
        }],
    });
    let table = gsub(
        vec![lookup(vec![context]), lookup(vec![single(&[3], 100)])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[2, 3, 2, 4, 3]), [2, 103, 2, 4, 3]);
}

#[test]
fn context_format2() {
    // 2 and 3 are class 1, 7 is class 2
    let class_def = ClassDef::Format1(ClassDefFormat1 {
        start_glyph_id: gid(2),
        class_value_array: vec![1, 1, 0, 0, 0, 2],
    });
    let context = SubstitutionSubtable::Context(SequenceContext::Format2 {
        coverage: coverage(&[2, 3]),
        class_def,
        class_rule_sets: vec![
            SequenceRuleSet::default(),
            SequenceRuleSet {
                rules: vec![SequenceRule {
                    input_sequence: vec![2],
                    seq_lookup_records: records(&[(0, 1)]),
                }],
            },
        ],
    });
    let table = gsub(
        vec![lookup(vec![context]), lookup(vec![single(&[2, 3], 10)])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[3, 7, 2, 9, 2, 7]), [13, 7, 2, 9, 12, 7]);
}

#[test]
fn context_format3_adjusts_positions() {
    let context = SubstitutionSubtable::Context(SequenceContext::Format3 {
        coverages: vec![coverage(&[2]), coverage(&[3]), coverage(&[4])],
        seq_lookup_records: records(&[(0, 1), (3, 2)]),
    });
    let table = gsub(
        vec![
            lookup(vec![context]),
            lookup(vec![multiple(&[2], &[&[20, 21]])]),
            lookup(vec![single(&[4], 1)]),
        ],
        &[0],
    );
    // after expansion the matched sequence is [20, 21, 3, 4]
    assert_eq!(apply(&table, None, &[2, 3, 4, 9]), [20, 21, 3, 5, 9]);
}

#[test]
fn context_format3_with_ligature() {
    let context = SubstitutionSubtable::Context(SequenceContext::Format3 {
        coverages: vec![coverage(&[1]), coverage(&[2]), coverage(&[3]), coverage(&[4])],
        seq_lookup_records: records(&[(1, 1), (2, 2)]),
    });
    let table = gsub(
        vec![
            lookup(vec![context]),
            lookup(vec![ligatures(2, &[(6, &[3])])]),
            lookup(vec![single(&[4], 1)]),
        ],
        &[0],
    );
    // the ligature consumes the third input glyph, so index 2 is now glyph 4
    assert_eq!(apply(&table, None, &[1, 2, 3, 4]), [1, 6, 5]);
}

#[rstest]
#[case::matches(&[2, 3, 4], &[2, 103, 4])]
#[case::wrong_backtrack(&[1, 3, 4], &[1, 3, 4])]
#[case::no_backtrack(&[3, 4], &[3, 4])]
#[case::no_lookahead(&[2, 3], &[2, 3])]
fn chain_format1(#[case] input: &[u16], #[case] expected: &[u16]) {
    let chain = SubstitutionSubtable::ChainContext(ChainedSequenceContext::Format1 {
        coverage: coverage(&[3]),
        rule_sets: vec![SequenceRuleSet {
            rules: vec![ChainedSequenceRule {
                backtrack_sequence: vec![2],
                input_sequence: vec![],
                lookahead_sequence: vec![4],
                seq_lookup_records: records(&[(0, 1)]),
            }],
        }],
    });
    let table = gsub(
        vec![lookup(vec![chain]), lookup(vec![single(&[3], 100)])],
        &[0],
    );
    assert_eq!(apply(&table, None, input), expected);
}

#[test]
fn chain_backtrack_is_closest_first() {
    let chain = SubstitutionSubtable::ChainContext(ChainedSequenceContext::Format1 {
        coverage: coverage(&[3]),
        rule_sets: vec![SequenceRuleSet {
            rules: vec![ChainedSequenceRule {
                backtrack_sequence: vec![2, 1],
                input_sequence: vec![],
                lookahead_sequence: vec![],
                seq_lookup_records: records(&[(0, 1)]),
            }],
        }],
    });
    let table = gsub(
        vec![lookup(vec![chain]), lookup(vec![single(&[3], 100)])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[1, 2, 3]), [1, 2, 103]);
    assert_eq!(apply(&table, None, &[2, 1, 3]), [2, 1, 3]);
}

#[test]
fn chain_format2() {
    let class = |glyph: u16| {
        ClassDef::Format1(ClassDefFormat1 {
            start_glyph_id: gid(glyph),
            class_value_array: vec![1],
        })
    };
    let chain = SubstitutionSubtable::ChainContext(ChainedSequenceContext::Format2 {
        coverage: coverage(&[3]),
        backtrack_class_def: class(1),
        input_class_def: class(3),
        lookahead_class_def: class(4),
        class_rule_sets: vec![
            SequenceRuleSet::default(),
            SequenceRuleSet {
                rules: vec![ChainedSequenceRule {
                    backtrack_sequence: vec![1],
                    input_sequence: vec![],
                    lookahead_sequence: vec![1],
                    seq_lookup_records: records(&[(0, 1)]),
                }],
            },
        ],
    });
    let table = gsub(
        vec![lookup(vec![chain]), lookup(vec![single(&[3], 100)])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[1, 3, 4]), [1, 103, 4]);
    assert_eq!(apply(&table, None, &[2, 3, 4]), [2, 3, 4]);
}

#[test]
fn chain_format3() {
    let chain = SubstitutionSubtable::ChainContext(ChainedSequenceContext::Format3 {
        backtrack_coverages: vec![coverage(&[1])],
        input_coverages: vec![coverage(&[3]), coverage(&[3])],
        lookahead_coverages: vec![coverage(&[4])],
        seq_lookup_records: records(&[(1, 1)]),
    });
    let table = gsub(
        vec![lookup(vec![chain]), lookup(vec![single(&[3], 100)])],
        &[0],
    );
    assert_eq!(apply(&table, None, &[1, 3, 3, 4]), [1, 3, 103, 4]);
    assert_eq!(apply(&table, None, &[1, 3, 3, 5]), [1, 3, 3, 5]);
}

#[test]
fn reverse_chain_scans_backwards() {
    let reverse = SubstitutionSubtable::ReverseChainSingle(ReverseChainSingleSubstFormat1 {
        coverage: coverage(&[3]),
        backtrack_coverages: vec![],
        lookahead_coverages: vec![coverage(&[9, 30])],
        substitute_glyph_ids: glyph_vec(&[30]),
    });
    let table = gsub(vec![lookup(vec![reverse])], &[0]);
    // a forward scan would only substitute the last 3
    assert_eq!(apply(&table, None, &[3, 3, 3, 9]), [30, 30, 30, 9]);
}

#[test]
fn nested_lookups_are_bounded() {
    let recursive = SubstitutionSubtable::Context(SequenceContext::Format3 {
        coverages: vec![coverage(&[2])],
        seq_lookup_records: records(&[(0, 0)]),
    });
    let table = gsub(vec![lookup(vec![recursive])], &[0]);
    let limits = Limits {
        max_nesting_level: 4,
        ..LIMITS
    };
    let selection = FeatureSelection::new(TEST);
    assert_eq!(apply_with(&table, None, &selection, limits, &[2, 2]), [2, 2]);
}

#[test]
fn operations_are_bounded() {
    let table = gsub(vec![lookup(vec![single(&[2], 1)])], &[0]);
    let selection = FeatureSelection::new(TEST);
    let none = Limits {
        max_lookup_operations: 0,
        ..LIMITS
    };
    assert_eq!(apply_with(&table, None, &selection, none, &[2, 2]), [2, 2]);
    let one = Limits {
        max_lookup_operations: 1,
        ..LIMITS
    };
    assert_eq!(apply_with(&table, None, &selection, one, &[2, 2]), [3, 2]);
}

#[test]
fn unimplemented_subtables_pass_through() {
    let unimplemented = || SubstitutionSubtable::Unimplemented {
        lookup_type: 9,
        format: 1,
    };
    let table = gsub(vec![lookup(vec![unimplemented()])], &[0]);
    assert_eq!(apply(&table, None, &[2, 3]), [2, 3]);
    let table = gsub(vec![lookup(vec![unimplemented(), single(&[2], 1)])], &[0]);
    assert_eq!(apply(&table, None, &[2, 3]), [3, 3]);
}

#[test]
fn missing_feature_or_lookup_is_noop() {
    let table = gsub(vec![lookup(vec![single(&[2], 1)])], &[0, 7]);
    let other = FeatureSelection::new(Tag::new(b"zzzz"));
    assert_eq!(apply_with(&table, None, &other, LIMITS, &[2]), [2]);
    assert_eq!(apply(&table, None, &[2]), [3]);
}

#[test]
fn lookups_apply_in_index_order() {
    // listed out of order and duplicated; applied once each, ascending
    let table = gsub(
        vec![
            lookup(vec![single(&[2], 1)]),
            lookup(vec![single(&[3], 10)]),
        ],
        &[1, 0, 1],
    );
    assert_eq!(apply(&table, None, &[2]), [13]);
}

#[test]
fn feature_resolution() {
    let liga = Tag::new(b"liga");
    let lang_sys = |features: &[u16]| LangSys {
        required_feature_index: None,
        feature_indices: features.to_vec(),
    };
    let table = Gsub {
        script_list: ScriptList {
            script_records: vec![
                ScriptRecord {
                    script_tag: DFLT_SCRIPT,
                    script: Script {
                        default_lang_sys: Some(lang_sys(&[1])),
                        lang_sys_records: vec![],
                    },
                },
                ScriptRecord {
                    script_tag: Tag::new(b"latn"),
                    script: Script {
                        default_lang_sys: None,
                        lang_sys_records: vec![(Tag::new(b"TRK "), lang_sys(&[0]))],
                    },
                },
            ],
        },
        feature_list: FeatureList {
            feature_records: vec![
                FeatureRecord {
                    feature_tag: liga,
                    feature: Feature {
                        lookup_list_indices: vec![1, 0, 1],
                    },
                },
                FeatureRecord {
                    feature_tag: liga,
                    feature: Feature {
                        lookup_list_indices: vec![2],
                    },
                },
            ],
        },
        lookup_list: vec![],
    };
    let selection = FeatureSelection::new(liga);
    assert_eq!(feature_lookups(&table, &selection), [2]);
    let turkish = selection
        .with_script(Tag::new(b"latn"))
        .with_language(Tag::new(b"TRK "));
    assert_eq!(feature_lookups(&table, &turkish), [0, 1]);
    let missing_script = selection.with_script(Tag::new(b"cyrl"));
    assert_eq!(feature_lookups(&table, &missing_script), [2]);
    // latn has no default language system
    let latin = selection.with_script(Tag::new(b"latn"));
    assert_eq!(feature_lookups(&table, &latin), [0, 1]);
    let unknown = FeatureSelection::new(Tag::new(b"smcp"));
    assert!(feature_lookups(&table, &unknown).is_empty());
}

#[test]
fn glyph_buffer_conversions() {
    let mut buffer = GlyphBuffer::from(glyph_vec(&[1, 2]));
    buffer.push(gid(3));
    buffer.extend([gid(4)]);
    assert_eq!(buffer.len(), 4);
    assert_eq!(buffer[2], gid(3));
    assert_eq!(buffer.into_vec(), glyph_vec(&[1, 2, 3, 4]));
}
