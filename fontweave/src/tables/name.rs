//! The [name (Naming)](https://docs.microsoft.com/en-us/typography/opentype/spec/name) table

use types::Tag;

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

/// Identifiers for the name records used by this crate.
pub mod name_id {
    pub const FAMILY_NAME: u16 = 1;
    pub const SUBFAMILY_NAME: u16 = 2;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION_STRING: u16 = 5;
}

const WINDOWS_ENGLISH_US: u16 = 0x0409;

/// A decoded name record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: String,
}

/// The naming table, with every decodable record converted to a string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Name {
    records: Vec<NameRecord>,
}

impl TopLevelTable for Name {
    const TAG: Tag = Tag::new(b"name");
}

impl FontRead<'_> for Name {
    fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let _version: u16 = cursor.read()?;
        let count: u16 = cursor.read()?;
        let storage_offset: u16 = cursor.read()?;
        let storage = data
            .split_off(storage_offset as usize)
            .ok_or(ReadError::OutOfBounds)?;
        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let platform_id: u16 = cursor.read()?;
            let encoding_id: u16 = cursor.read()?;
            let language_id: u16 = cursor.read()?;
            let name_id: u16 = cursor.read()?;
            let length: u16 = cursor.read()?;
            let offset: u16 = cursor.read()?;
            let bytes = storage
                .slice(offset as usize..offset as usize + length as usize)
                .ok_or(ReadError::OutOfBounds)?;
            let Some(value) = Encoding::new(platform_id, encoding_id).decode(bytes.as_bytes())
            else {
                continue;
            };
            records.push(NameRecord {
                platform_id,
                encoding_id,
                language_id,
                name_id,
                value,
            });
        }
        Ok(Name { records })
    }
}

impl Name {
    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    /// Returns the string for the given name id.
    ///
    /// A Windows US English record is preferred; otherwise the first record
    /// with a matching id is used.
    pub fn get(&self, name_id: u16) -> Option<&str> {
        let mut matching = self.records.iter().filter(|rec| rec.name_id == name_id);
        let first = matching.clone().next()?;
        matching
            .find(|rec| rec.platform_id == 3 && rec.language_id == WINDOWS_ENGLISH_US)
            .or(Some(first))
            .map(|rec| rec.value.as_str())
    }
}

/// The encoding used by a name record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Encoding {
    Utf16Be,
    Latin1,
    Unknown,
}

impl Encoding {
    fn new(platform_id: u16, encoding_id: u16) -> Encoding {
        match (platform_id, encoding_id) {
            (0, _) => Encoding::Utf16Be,
            (1, 0) => Encoding::Latin1,
            (3, 0) | (3, 1) | (3, 10) => Encoding::Utf16Be,
            _ => Encoding::Unknown,
        }
    }

    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf16Be => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                Some(
                    char::decode_utf16(units)
                        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                        .collect(),
                )
            }
            Encoding::Latin1 => Some(bytes.iter().map(|b| *b as char).collect()),
            Encoding::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::tables;

    #[test]
    fn prefers_windows_english() {
        let data = tables::name(&[
            (1, 0, 0, name_id::FULL_NAME, "Mac Name"),
            (3, 1, 0x0407, name_id::FULL_NAME, "German Name"),
            (3, 1, 0x0409, name_id::FULL_NAME, "Weave Sans Regular"),
            (3, 1, 0x0409, name_id::FAMILY_NAME, "Weave Sans"),
        ]);
        let name = Name::read(FontData::new(&data)).unwrap();
        assert_eq!(name.records().len(), 4);
        assert_eq!(name.get(name_id::FULL_NAME), Some("Weave Sans Regular"));
        assert_eq!(name.get(name_id::FAMILY_NAME), Some("Weave Sans"));
        assert_eq!(name.get(name_id::VERSION_STRING), None);
    }

    #[test]
    fn falls_back_to_first() {
        let data = tables::name(&[(1, 0, 0, name_id::FULL_NAME, "Caf\u{e9}")]);
        let name = Name::read(FontData::new(&data)).unwrap();
        assert_eq!(name.get(name_id::FULL_NAME), Some("Caf\u{e9}"));
    }

    #[test]
    fn lone_surrogate() {
        let decoded = Encoding::Utf16Be.decode(&[0xD8, 0x00, 0x00, 0x41]);
        assert_eq!(decoded.as_deref(), Some("\u{FFFD}A"));
    }
}
