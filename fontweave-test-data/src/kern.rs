//! kern test data

use crate::bebuffer::BeBuffer;

// a single format 0 subtable with three pairs, as encoded by fontTools
#[rustfmt::skip]
pub static KERN_VER_0_FMT_0_DATA: &[u8] = &[
    0x00, 0x00, // version
    0x00, 0x01, // nTables
    0x00, 0x00, // subtable version
    0x00, 0x20, // length=32
    0x00,       // format=0
    0x01,       // coverage=horizontal
    0x00, 0x03, // nPairs=3
    0x00, 0x0C, // searchRange
    0x00, 0x01, // entrySelector
    0x00, 0x06, // rangeShift
    0x00, 0x04, 0x00, 0x0C, 0xFF, 0xD8, // l=4, r=12, v=-40
    0x00, 0x04, 0x00, 0x1C, 0x00, 0x28, // l=4, r=28, v=40
    0x00, 0x05, 0x00, 0x28, 0xFF, 0xCE, // l=5, r=40, v=-50
];

/// A subtable with an arbitrary format, coverage bits and body.
pub fn subtable(format: u8, coverage: u16, body: &[u8]) -> Vec<u8> {
    BeBuffer::new()
        .push(0u16)
        .push((6 + body.len()) as u16)
        .push(((format as u16) << 8) | coverage)
        .extend(body.iter().copied())
        .into_vec()
}

/// A horizontal format 0 subtable holding `(left, right, value)` pairs in the
/// given order.
pub fn format0(pairs: &[(u16, u16, i16)]) -> Vec<u8> {
    let mut body = BeBuffer::new()
        .push(pairs.len() as u16)
        .extend([0u16; 3]);
    for (left, right, value) in pairs {
        body = body.push(*left).push(*right).push(*value);
    }
    subtable(0, 0x0001, &body)
}

/// A version 0 kern table with the given subtables.
pub fn kern_table(subtables: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = BeBuffer::new()
        .push(0u16)
        .push(subtables.len() as u16)
        .into_vec();
    for subtable in subtables {
        buf.extend_from_slice(subtable);
    }
    buf
}
