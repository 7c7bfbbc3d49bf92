//! The sfnt table directory

use types::{Tag, CFF_SFNT_VERSION, TRUE_SFNT_VERSION, TT_SFNT_VERSION};

use crate::{error::FontError, font_data::FontData};

/// The size of the directory header that precedes the table records.
const HEADER_LEN: usize = 12;

/// A record locating one table in the font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The top-level [table directory] of a font.
///
/// Construction validates that every record's byte range lies within the
/// font data, so looking up a table can only fail because it is absent.
///
/// [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
#[derive(Clone, Debug)]
pub struct TableDirectory<'a> {
    data: FontData<'a>,
    sfnt_version: u32,
    records: Vec<TableRecord>,
}

impl<'a> TableDirectory<'a> {
    /// Parse the directory at the start of `data`.
    pub fn read(data: FontData<'a>) -> Result<Self, FontError> {
        let mut cursor = data.cursor();
        let sfnt_version: u32 = cursor.read()?;
        if ![TT_SFNT_VERSION, TRUE_SFNT_VERSION, CFF_SFNT_VERSION].contains(&sfnt_version) {
            return Err(FontError::InvalidFontSignature(sfnt_version));
        }
        let num_tables: u16 = cursor.read()?;
        // searchRange, entrySelector, rangeShift
        cursor.advance_by(6);
        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let record = TableRecord {
                tag: cursor.read()?,
                checksum: cursor.read()?,
                offset: cursor.read()?,
                length: cursor.read()?,
            };
            let end = record.offset as u64 + record.length as u64;
            if end > data.len() as u64 {
                return Err(FontError::TableOutOfBounds {
                    tag: record.tag,
                    offset: record.offset,
                    length: record.length,
                    file_len: data.len(),
                });
            }
            records.push(record);
        }
        log::debug!(
            "read table directory: version 0x{sfnt_version:08X}, {} tables",
            records.len()
        );
        Ok(TableDirectory {
            data,
            sfnt_version,
            records,
        })
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn table_records(&self) -> &[TableRecord] {
        &self.records
    }

    /// The offset of the first byte after the table records.
    pub fn header_len(&self) -> usize {
        HEADER_LEN + self.records.len() * TableRecord::RAW_BYTE_LEN
    }

    /// Returns the data for the table with the given tag, if present.
    pub fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>> {
        let record = self.records.iter().find(|record| record.tag == tag)?;
        let start = record.offset as usize;
        self.data.slice(start..start + record.length as usize)
    }

    /// Returns `true` if the font contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.records.iter().any(|record| record.tag == tag)
    }
}

impl TableRecord {
    /// The number of bytes in an encoded record.
    pub const RAW_BYTE_LEN: usize = 16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::ReadError;
    use fontweave_test_data::{BeBuffer, FontBuilder};

    #[test]
    fn finds_tables() {
        let font = FontBuilder::new()
            .add_raw(Tag::new(b"abcd"), vec![1u8, 2, 3])
            .add_raw(Tag::new(b"wxyz"), vec![9u8; 8])
            .build();
        let directory = TableDirectory::read(FontData::new(&font)).unwrap();
        assert_eq!(directory.sfnt_version(), TT_SFNT_VERSION);
        assert_eq!(directory.table_records().len(), 2);
        assert_eq!(directory.header_len(), 12 + 32);
        assert_eq!(
            directory.data_for_tag(Tag::new(b"abcd")).unwrap().as_bytes(),
            &[1, 2, 3]
        );
        assert_eq!(
            directory.data_for_tag(Tag::new(b"wxyz")).unwrap().len(),
            8
        );
        assert!(directory.data_for_tag(Tag::new(b"kern")).is_none());
        assert!(!directory.contains(Tag::new(b"GSUB")));
    }

    #[test]
    fn accepts_known_signatures() {
        for version in [TT_SFNT_VERSION, TRUE_SFNT_VERSION, CFF_SFNT_VERSION] {
            let buf = BeBuffer::new().push(version).extend([0u16; 4]);
            let directory = TableDirectory::read(FontData::new(&buf)).unwrap();
            assert!(directory.table_records().is_empty());
        }
    }

    #[test]
    fn bad_signature() {
        let buf = BeBuffer::new().push(0x12345678u32).extend([0u16; 4]);
        assert_eq!(
            TableDirectory::read(FontData::new(&buf)).err(),
            Some(FontError::InvalidFontSignature(0x12345678))
        );
    }

    #[test]
    fn table_past_end_is_fatal() {
        let buf = BeBuffer::new()
            .push(TT_SFNT_VERSION)
            .push(1u16)
            .extend([0u16; 3])
            .push(Tag::new(b"glyf"))
            .push(0u32) // checksum
            .push(28u32) // offset
            .push(100u32) // length
            .extend([0u8; 20]);
        assert_eq!(
            TableDirectory::read(FontData::new(&buf)).err(),
            Some(FontError::TableOutOfBounds {
                tag: Tag::new(b"glyf"),
                offset: 28,
                length: 100,
                file_len: 48,
            })
        );
    }

    #[test]
    fn truncated_records() {
        let buf = BeBuffer::new()
            .push(TT_SFNT_VERSION)
            .push(3u16)
            .extend([0u16; 3])
            .push(Tag::new(b"cmap"));
        assert_eq!(
            TableDirectory::read(FontData::new(&buf)).err(),
            Some(FontError::Read(ReadError::OutOfBounds))
        );
    }
}
