//! Builders for the OpenType layout common tables.

use fontweave_types::Tag;

use crate::bebuffer::BeBuffer;

/// Append each child after `buf`, writing an Offset16 to it at the paired
/// position. Offsets are relative to the start of `buf`.
pub fn link_offsets(mut buf: BeBuffer, children: &[(usize, &[u8])]) -> BeBuffer {
    for (pos, child) in children {
        let offset = buf.len() as u16;
        buf = buf.patch(*pos, offset).extend(child.iter().copied());
    }
    buf
}

/// A count followed by Offset16s to each child.
pub fn offset_array(children: &[Vec<u8>]) -> BeBuffer {
    let buf = BeBuffer::new()
        .push(children.len() as u16)
        .extend(std::iter::repeat_n(0u16, children.len()));
    let links: Vec<_> = children
        .iter()
        .enumerate()
        .map(|(i, child)| (2 + i * 2, child.as_slice()))
        .collect();
    link_offsets(buf, &links)
}

pub fn coverage_format1(glyphs: &[u16]) -> Vec<u8> {
    BeBuffer::new()
        .push(1u16)
        .push(glyphs.len() as u16)
        .extend(glyphs.iter().copied())
        .into_vec()
}

/// Ranges are `(start, end, start coverage index)`.
pub fn coverage_format2(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
    let mut buf = BeBuffer::new().push(2u16).push(ranges.len() as u16);
    for (start, end, index) in ranges {
        buf = buf.push(*start).push(*end).push(*index);
    }
    buf.into_vec()
}

pub fn class_def_format1(start: u16, classes: &[u16]) -> Vec<u8> {
    BeBuffer::new()
        .push(1u16)
        .push(start)
        .push(classes.len() as u16)
        .extend(classes.iter().copied())
        .into_vec()
}

/// Ranges are `(start, end, class)`.
pub fn class_def_format2(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
    let mut buf = BeBuffer::new().push(2u16).push(ranges.len() as u16);
    for (start, end, class) in ranges {
        buf = buf.push(*start).push(*end).push(*class);
    }
    buf.into_vec()
}

/// A LangSys table; pass `0xFFFF` for no required feature.
pub fn lang_sys(required_feature: u16, features: &[u16]) -> Vec<u8> {
    BeBuffer::new()
        .push(0u16)
        .push(required_feature)
        .push(features.len() as u16)
        .extend(features.iter().copied())
        .into_vec()
}

pub fn script(default_lang_sys: Option<Vec<u8>>, lang_sys: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let mut buf = BeBuffer::new().push(0u16).push(lang_sys.len() as u16);
    for (tag, _) in lang_sys {
        buf = buf.push(*tag).push(0u16);
    }
    let mut links: Vec<(usize, &[u8])> = Vec::new();
    if let Some(default) = &default_lang_sys {
        links.push((0, default.as_slice()));
    }
    for (i, (_, table)) in lang_sys.iter().enumerate() {
        links.push((4 + i * 6 + 4, table.as_slice()));
    }
    link_offsets(buf, &links).into_vec()
}

/// A tagged record list, as used by ScriptList and FeatureList.
fn record_list(records: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let mut buf = BeBuffer::new().push(records.len() as u16);
    for (tag, _) in records {
        buf = buf.push(*tag).push(0u16);
    }
    let links: Vec<_> = records
        .iter()
        .enumerate()
        .map(|(i, (_, table))| (2 + i * 6 + 4, table.as_slice()))
        .collect();
    link_offsets(buf, &links).into_vec()
}

pub fn script_list(scripts: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    record_list(scripts)
}

/// A FeatureList with one `(tag, lookup indices)` entry per feature.
pub fn feature_list(features: &[(Tag, &[u16])]) -> Vec<u8> {
    let records: Vec<_> = features
        .iter()
        .map(|(tag, lookups)| {
            let feature = BeBuffer::new()
                .push(0u16)
                .push(lookups.len() as u16)
                .extend(lookups.iter().copied())
                .into_vec();
            (*tag, feature)
        })
        .collect();
    record_list(&records)
}

/// A version 1.2 GDEF table.
///
/// Empty mark attachment classes or mark glyph sets are written as null
/// offsets.
pub fn gdef(glyph_classes: &[(u16, u16, u16)], mark_attach: &[(u16, u16, u16)], mark_sets: &[&[u16]]) -> Vec<u8> {
    let header = BeBuffer::new()
        .push(1u16)
        .push(2u16)
        .extend([0u16; 5]);
    let class_def = class_def_format2(glyph_classes);
    let attach = class_def_format2(mark_attach);
    let mut links: Vec<(usize, &[u8])> = vec![(4, class_def.as_slice())];
    if !mark_attach.is_empty() {
        links.push((10, attach.as_slice()));
    }
    let sets = (!mark_sets.is_empty()).then(|| {
        let header = BeBuffer::new()
            .push(1u16)
            .push(mark_sets.len() as u16)
            .extend(std::iter::repeat_n(0u32, mark_sets.len()));
        let mut buf = header;
        for (i, glyphs) in mark_sets.iter().enumerate() {
            let offset = buf.len() as u32;
            buf = buf
                .patch(4 + i * 4, offset)
                .extend(coverage_format1(glyphs));
        }
        buf.into_vec()
    });
    if let Some(sets) = &sets {
        links.push((12, sets.as_slice()));
    }
    link_offsets(header, &links).into_vec()
}
