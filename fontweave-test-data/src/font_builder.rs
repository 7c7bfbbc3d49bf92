//! A builder for top-level font objects

use std::collections::BTreeMap;

use fontweave_types::{Tag, TT_SFNT_VERSION};

use crate::bebuffer::BeBuffer;

const TABLE_RECORD_LEN: usize = 16;

/// Build a font from some set of raw tables.
#[derive(Debug, Clone, Default)]
pub struct FontBuilder {
    sfnt_version: Option<u32>,
    tables: BTreeMap<Tag, Vec<u8>>,
}

impl FontBuilder {
    /// Create a new builder to compile a binary font
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a signature other than the TrueType default.
    pub fn sfnt_version(&mut self, version: u32) -> &mut Self {
        self.sfnt_version = Some(version);
        self
    }

    /// A builder method to add raw data for the provided tag
    pub fn add_raw(&mut self, tag: Tag, data: impl Into<Vec<u8>>) -> &mut Self {
        self.tables.insert(tag, data.into());
        self
    }

    /// Returns `true` if the builder contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Assemble all the tables into a binary font file with a table directory.
    pub fn build(&mut self) -> Vec<u8> {
        let header_len = std::mem::size_of::<u32>() // sfnt
            + std::mem::size_of::<u16>() * 4 // num_tables to range_shift
            + self.tables.len() * TABLE_RECORD_LEN;

        let num_tables = self.tables.len() as u16;
        let search = SearchRange::compute(self.tables.len(), TABLE_RECORD_LEN);
        let mut directory = BeBuffer::new()
            .push(self.sfnt_version.unwrap_or(TT_SFNT_VERSION))
            .push(num_tables)
            .push(search.search_range)
            .push(search.entry_selector)
            .push(search.range_shift);

        let mut position = header_len as u32;
        for (tag, data) in &self.tables {
            let length = data.len() as u32;
            directory = directory
                .push(*tag)
                .push(checksum(data))
                .push(position)
                .push(length);
            position += round4(data.len()) as u32;
        }

        let mut data = directory.into_vec();
        for table in self.tables.values() {
            data.extend_from_slice(table);
            let rem = round4(table.len()) - table.len();
            data.extend_from_slice(&[0u8; 4][..rem]);
        }
        data
    }
}

struct SearchRange {
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl SearchRange {
    fn compute(n_items: usize, item_size: usize) -> Self {
        let entry_selector = (n_items as f64).log2().floor() as usize;
        let search_range = (2.0_f64.powi(entry_selector as i32) * item_size as f64) as usize;
        let range_shift = (n_items * item_size).saturating_sub(search_range);
        SearchRange {
            search_range: search_range as u16,
            entry_selector: entry_selector as u16,
            range_shift: range_shift as u16,
        }
    }
}

fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

fn checksum(table: &[u8]) -> u32 {
    table.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_binary_search_assists() {
        let mut builder = FontBuilder::new();
        (0..0x16u32).for_each(|i| {
            builder.add_raw(Tag::from_be_bytes(i.to_ne_bytes()), b"doesn't matter".to_vec());
        });
        let bytes = builder.build();
        let read = |pos: usize| u16::from_be_bytes([bytes[pos], bytes[pos + 1]]);
        assert_eq!((read(6), read(8), read(10)), (256, 4, 96));
    }

    #[test]
    fn survives_no_tables() {
        assert_eq!(FontBuilder::default().build().len(), 12);
    }

    #[test]
    fn tables_are_padded() {
        let bytes = FontBuilder::new()
            .add_raw(Tag::new(b"aaaa"), vec![1u8; 5])
            .add_raw(Tag::new(b"bbbb"), vec![2u8; 3])
            .build();
        // 12 byte header, two records, 8 bytes for the first table, 4 for the second
        assert_eq!(bytes.len(), 12 + 32 + 8 + 4);
        assert_eq!(&bytes[44..49], &[1; 5]);
        assert_eq!(&bytes[52..55], &[2; 3]);
    }

    #[test]
    fn checksum_pads_final_word() {
        assert_eq!(checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(checksum(&[1]), 0x0100_0000);
    }
}
