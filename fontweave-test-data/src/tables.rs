//! Builders for the simple header and metrics tables.

use crate::bebuffer::BeBuffer;

/// A `head` table with the given units per em, smallest readable size and
/// loca format.
pub fn head(units_per_em: u16, lowest_rec_ppem: u16, long_loca: bool) -> BeBuffer {
    BeBuffer::new()
        .push(0x00010000u32) // version
        .push(0x00010000u32) // fontRevision
        .push(0u32) // checksumAdjustment
        .push(0x5F0F3CF5u32) // magicNumber
        .push(0u16) // flags
        .push(units_per_em)
        .extend([0u32; 4]) // created, modified
        .extend([-50i16, -200, 1000, 800]) // xMin, yMin, xMax, yMax
        .push(0u16) // macStyle
        .push(lowest_rec_ppem)
        .push(2i16) // fontDirectionHint
        .push(long_loca as i16)
        .push(0i16) // glyphDataFormat
}

/// An `hhea` table.
pub fn hhea(ascender: i16, descender: i16, line_gap: i16, number_of_h_metrics: u16) -> BeBuffer {
    BeBuffer::new()
        .push(0x00010000u32)
        .push(ascender)
        .push(descender)
        .push(line_gap)
        .push(1000u16) // advanceWidthMax
        .extend([0i16; 3]) // minLeftSideBearing, minRightSideBearing, xMaxExtent
        .extend([1i16, 0, 0]) // caretSlopeRise, caretSlopeRun, caretOffset
        .extend([0i16; 4]) // reserved
        .push(0i16) // metricDataFormat
        .push(number_of_h_metrics)
}

/// A version 0.5 `maxp` table.
pub fn maxp(num_glyphs: u16) -> BeBuffer {
    BeBuffer::new().push(0x00005000u32).push(num_glyphs)
}

/// An `hmtx` table from long metrics and trailing side bearings.
pub fn hmtx(h_metrics: &[(u16, i16)], left_side_bearings: &[i16]) -> BeBuffer {
    let mut buf = BeBuffer::new();
    for (advance, lsb) in h_metrics {
        buf = buf.push(*advance).push(*lsb);
    }
    buf.extend(left_side_bearings.iter().copied())
}

/// A `name` table with one record per `(platform, encoding, language, name id, value)`.
///
/// Values are encoded as UTF-16BE, except for the Macintosh platform where
/// they are encoded as Latin-1.
pub fn name(records: &[(u16, u16, u16, u16, &str)]) -> BeBuffer {
    let storage_offset = 6 + records.len() * 12;
    let mut header = BeBuffer::new()
        .push(0u16)
        .push(records.len() as u16)
        .push(storage_offset as u16);
    let mut storage = Vec::new();
    for (platform_id, encoding_id, language_id, name_id, value) in records {
        let encoded: Vec<u8> = if *platform_id == 1 {
            value.chars().map(|c| c as u32 as u8).collect()
        } else {
            value.encode_utf16().flat_map(u16::to_be_bytes).collect()
        };
        header = header
            .push(*platform_id)
            .push(*encoding_id)
            .push(*language_id)
            .push(*name_id)
            .push(encoded.len() as u16)
            .push(storage.len() as u16);
        storage.extend(encoded);
    }
    header.extend(storage)
}
