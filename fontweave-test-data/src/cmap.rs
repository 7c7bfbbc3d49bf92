//! cmap test data

use crate::{be_buffer, bebuffer::BeBuffer};

/// A format 4 subtable with three segments:
///
/// - `A..=Z` mapped by delta to glyphs 3..=28
/// - `a..=c` mapped through the glyph id array to 40, 0 and 42
/// - the required `0xFFFF` sentinel
pub fn simple_cmap4() -> BeBuffer {
    be_buffer! {
        4u16,                       // format
        0u16,                       // length, patched below
        0u16,                       // language
        6u16,                       // segCountX2
        4u16,                       // searchRange
        1u16,                       // entrySelector
        2u16,                       // rangeShift
        // endCode
        0x5Au16, 0x63u16, 0xFFFFu16,
        0u16,                       // reservedPad
        // startCode
        0x41u16, 0x61u16, 0xFFFFu16,
        // idDelta
        -62i16, 0i16, 1i16,
        // idRangeOffset
        0u16, 4u16, 0u16,
        // glyphIdArray
        40u16, 0u16, 42u16
    }
    .with_length_at(2)
}

/// A single segment whose delta wraps past 0xFFFF.
pub fn wrapping_cmap4() -> BeBuffer {
    be_buffer! {
        4u16, 0u16, 0u16,
        4u16,                       // segCountX2
        2u16, 0u16, 2u16,
        0x20u16, 0xFFFFu16,         // endCode
        0u16,
        0x20u16, 0xFFFFu16,         // startCode
        -31i16, 1i16,               // idDelta
        0u16, 0u16                  // idRangeOffset
    }
    .with_length_at(2)
}

/// A format 12 subtable mapping `a..=e` to glyphs 10..=14 and U+1F600 to 50.
pub fn simple_cmap12() -> BeBuffer {
    be_buffer! {
        12u16,                      // format
        0u16,                       // reserved
        40u32,                      // length
        0u32,                       // language
        2u32,                       // numGroups
        0x61u32, 0x65u32, 10u32,
        0x1F600u32, 0x1F600u32, 50u32
    }
}

/// Wrap a subtable in a cmap header with a single (3, 1) encoding record.
pub fn windows_unicode_cmap(subtable: &[u8]) -> Vec<u8> {
    cmap_with_records(&[(3, 1, subtable.to_vec())])
}

/// Build a cmap with one encoding record per `(platform, encoding, subtable)`.
pub fn cmap_with_records(records: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let header_len = 4 + records.len() * 8;
    let mut buf = BeBuffer::new().push(0u16).push(records.len() as u16);
    let mut offset = header_len;
    for (platform_id, encoding_id, data) in records {
        buf = buf
            .push(*platform_id)
            .push(*encoding_id)
            .push(offset as u32);
        offset += data.len();
    }
    let mut bytes = buf.into_vec();
    for (_, _, data) in records {
        bytes.extend_from_slice(data);
    }
    bytes
}

/// A format 4 subtable with one delta segment per `(codepoint, glyph)` pair.
///
/// Pairs must be sorted by codepoint.
pub fn format4_from_pairs(pairs: &[(u16, u16)]) -> BeBuffer {
    let seg_count = pairs.len() as u16 + 1;
    let ends = pairs.iter().map(|(c, _)| *c).chain([0xFFFF]);
    let starts = pairs.iter().map(|(c, _)| *c).chain([0xFFFF]);
    let deltas = pairs
        .iter()
        .map(|(c, g)| g.wrapping_sub(*c) as i16)
        .chain([1]);
    BeBuffer::new()
        .push(4u16)
        .push(0u16) // length
        .push(0u16) // language
        .push(seg_count * 2)
        .extend([0u16; 3]) // search fields are not used for lookup
        .extend(ends)
        .push(0u16)
        .extend(starts)
        .extend(deltas)
        .extend(std::iter::repeat_n(0u16, seg_count as usize))
        .with_length_at(2)
}
