//! The [head (Font Header)](https://docs.microsoft.com/en-us/typography/opentype/spec/head) table

use types::{BoundingBox, Tag};

use crate::{
    font_data::FontData,
    read::{FontRead, ReadError, TopLevelTable},
};

const MAGIC_NUMBER: u32 = 0x5F0F3CF5;

/// The parts of the font header used by this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Head {
    pub units_per_em: u16,
    /// Smallest readable size in pixels.
    pub lowest_rec_ppem: u16,
    /// Bounds of all glyphs in the font.
    pub bbox: BoundingBox<i16>,
    /// `true` if the `loca` table uses 32-bit offsets.
    pub long_loca: bool,
}

impl TopLevelTable for Head {
    const TAG: Tag = Tag::new(b"head");
}

impl FontRead<'_> for Head {
    fn read(data: FontData) -> Result<Self, ReadError> {
        if data.read_at::<u32>(12)? != MAGIC_NUMBER {
            return Err(ReadError::MalformedData("bad magic number in head table"));
        }
        let units_per_em = data.read_at::<u16>(18)?;
        if units_per_em == 0 {
            return Err(ReadError::MalformedData("unitsPerEm must be non-zero"));
        }
        let long_loca = match data.read_at::<i16>(50)? {
            0 => false,
            1 => true,
            other => return Err(ReadError::InvalidFormat(other as _)),
        };
        Ok(Head {
            units_per_em,
            lowest_rec_ppem: data.read_at(46)?,
            bbox: BoundingBox {
                x_min: data.read_at(36)?,
                y_min: data.read_at(38)?,
                x_max: data.read_at(40)?,
                y_max: data.read_at(42)?,
            },
            long_loca,
        })
    }
}

impl Default for Head {
    fn default() -> Self {
        Head {
            units_per_em: 1000,
            lowest_rec_ppem: 0,
            bbox: BoundingBox::default(),
            long_loca: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave_test_data::tables;

    #[test]
    fn read_head() {
        let data = tables::head(2048, 9, true);
        let head = Head::read(FontData::new(&data)).unwrap();
        assert_eq!(head.units_per_em, 2048);
        assert_eq!(head.lowest_rec_ppem, 9);
        assert!(head.long_loca);
    }

    #[test]
    fn bad_loca_format() {
        let mut data = tables::head(1000, 8, false).to_vec();
        data[51] = 7;
        assert_eq!(
            Head::read(FontData::new(&data)),
            Err(ReadError::InvalidFormat(7))
        );
    }
}
