//! The [kern](https://docs.microsoft.com/en-us/typography/opentype/spec/kern) table

use types::{GlyphId, Tag};

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

/// Coverage bits of an OpenType kern subtable header.
pub mod coverage {
    pub const HORIZONTAL: u16 = 0x0001;
    pub const MINIMUM: u16 = 0x0002;
    pub const CROSS_STREAM: u16 = 0x0004;
    pub const OVERRIDE: u16 = 0x0008;
}

/// Pair adjustments from all usable kern subtables, merged and sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kern {
    pairs: Vec<(u32, i16)>,
    skipped: Vec<SkippedSubtable>,
}

/// A subtable that did not contribute pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedSubtable {
    pub index: u16,
    pub format: u8,
    pub coverage: u16,
}

/// Pack a glyph pair into a single lookup key.
pub fn pair_key(left: GlyphId, right: GlyphId) -> u32 {
    (left.to_u32() << 16) | right.to_u32()
}

impl TopLevelTable for Kern {
    const TAG: Tag = Tag::new(b"kern");
}

impl FontRead<'_> for Kern {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: u16 = cursor.read()?;
        if version != 0 {
            return Err(ReadError::InvalidFormat(version as _));
        }
        let num_tables: u16 = cursor.read()?;
        let mut pairs = Vec::new();
        let mut skipped = Vec::new();
        let mut subtable_start = cursor.position()?;
        for index in 0..num_tables {
            let subtable = data
                .split_off(subtable_start)
                .ok_or(ReadError::OutOfBounds)?;
            let mut cursor = subtable.cursor();
            let _version: u16 = cursor.read()?;
            let length: u16 = cursor.read()?;
            let coverage: u16 = cursor.read()?;
            let format = (coverage >> 8) as u8;
            let horizontal = coverage & (coverage::HORIZONTAL | coverage::CROSS_STREAM)
                == coverage::HORIZONTAL;
            if format != 0 || !horizontal {
                log::debug!("skipping kern subtable {index}, format {format} coverage {coverage:#06x}");
                skipped.push(SkippedSubtable {
                    index,
                    format,
                    coverage,
                });
                if length == 0 {
                    // the end of this subtable is unknown
                    break;
                }
                subtable_start += length as usize;
                continue;
            }
            let num_pairs: u16 = cursor.read()?;
            // searchRange, entrySelector, rangeShift
            cursor.advance_by(6);
            for _ in 0..num_pairs {
                let left: GlyphId = cursor.read()?;
                let right: GlyphId = cursor.read()?;
                let value: i16 = cursor.read()?;
                pairs.push((pair_key(left, right), value));
            }
            // a zero length is common for the last format 0 subtable when
            // its true size overflows u16
            subtable_start += if length == 0 {
                cursor.position()?
            } else {
                length as usize
            };
        }
        // stable sort keeps table order among equal keys; keep the last
        pairs.sort_by_key(|(key, _)| *key);
        let mut merged: Vec<(u32, i16)> = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            match merged.last_mut() {
                Some(last) if last.0 == key => last.1 = value,
                _ => merged.push((key, value)),
            }
        }
        log::debug!("kern: {} pairs, {} subtables skipped", merged.len(), skipped.len());
        Ok(Kern {
            pairs: merged,
            skipped,
        })
    }
}

impl Kern {
    /// The adjustment for a pair, or zero when the pair is not kerned.
    pub fn get(&self, left: GlyphId, right: GlyphId) -> i16 {
        let key = pair_key(left, right);
        self.pairs
            .binary_search_by_key(&key, |(k, _)| *k)
            .map(|ix| self.pairs[ix].1)
            .unwrap_or(0)
    }

    /// All pairs as `(left, right, value)`, ordered by pair key.
    pub fn pairs(&self) -> impl Iterator<Item = (GlyphId, GlyphId, i16)> + '_ {
        self.pairs.iter().map(|(key, value)| {
            (
                GlyphId::new((key >> 16) as u16),
                GlyphId::new(*key as u16),
                *value,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Subtables that were ignored because of their format or orientation.
    pub fn skipped_subtables(&self) -> &[SkippedSubtable] {
        &self.skipped
    }
}
