//! The lookup flag type.
//!
//! This is kind-of-but-not-quite-exactly a bit enumeration, and so we implement
//! it manually.

use std::ops::BitOr;

use types::Scalar;

/// The [LookupFlag](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupFlag) bit enumeration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupFlag(u16);

impl BitOr for LookupFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl LookupFlag {
    /// Only meaningful for cursive attachment; has no effect on substitution.
    pub const RIGHT_TO_LEFT: Self = LookupFlag(0x0001);
    /// If set, skips over base glyphs
    pub const IGNORE_BASE_GLYPHS: Self = LookupFlag(0x0002);
    /// If set, skips over ligatures
    pub const IGNORE_LIGATURES: Self = LookupFlag(0x0004);
    /// If set, skips over all combining marks
    pub const IGNORE_MARKS: Self = LookupFlag(0x0008);
    /// If set, the lookup is followed by a mark filtering set index and
    /// marks not in that set are skipped.
    pub const USE_MARK_FILTERING_SET: Self = LookupFlag(0x0010);

    const FLAG_MASK: u16 = 0x001F;

    pub fn empty() -> Self {
        Self(0)
    }

    /// Construct a LookupFlag from a raw value, discarding reserved bits
    pub fn from_bits_truncate(bits: u16) -> Self {
        const VALID_BITS: u16 = !0x00E0;
        Self(bits & VALID_BITS)
    }

    pub fn to_bits(self) -> u16 {
        self.0
    }

    /// Returns `true` if all of the flags in `other` are contained within `self`.
    pub const fn contains(&self, other: Self) -> bool {
        let other = other.0 & Self::FLAG_MASK;
        (self.0 & other) == other
    }

    /// If not zero, skips over all marks of attachment type different from specified.
    pub fn mark_attachment_class(self) -> Option<u16> {
        let val = self.0 & 0xff00;
        (val != 0).then_some(val >> 8)
    }

    pub fn with_mark_attachment_class(self, class: u8) -> Self {
        Self((self.0 & 0xff) | ((class as u16) << 8))
    }
}

impl Scalar for LookupFlag {
    type Raw = <u16 as Scalar>::Raw;
    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Self::from_bits_truncate(u16::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits() {
        let flag = LookupFlag::from_bits_truncate(0x03_08 | 0x00E0);
        assert!(flag.contains(LookupFlag::IGNORE_MARKS));
        assert!(!flag.contains(LookupFlag::IGNORE_LIGATURES));
        assert_eq!(flag.mark_attachment_class(), Some(3));
        assert_eq!(flag.to_bits(), 0x0308);
        assert_eq!(LookupFlag::empty().mark_attachment_class(), None);
        assert_eq!(
            (LookupFlag::IGNORE_BASE_GLYPHS | LookupFlag::IGNORE_LIGATURES).to_bits(),
            0x0006
        );
        assert_eq!(
            LookupFlag::IGNORE_MARKS.with_mark_attachment_class(2).to_bits(),
            0x0208
        );
    }
}
