//! Glyph Identifiers
//!
//! Although these are treated as u16s in font files, we represent them
//! as a distinct type.

/// A 16-bit glyph identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphId(u16);

impl GlyphId {
    /// The identifier reserved for unknown glyphs
    pub const NOTDEF: GlyphId = GlyphId(0);

    /// Construct a new `GlyphId`.
    pub const fn new(raw: u16) -> Self {
        GlyphId(raw)
    }

    /// The identifier as a u16.
    pub const fn to_u16(self) -> u16 {
        self.0
    }

    /// The identifier as a u32.
    pub const fn to_u32(self) -> u32 {
        self.0 as u32
    }

    /// Add a signed delta, wrapping modulo 65536.
    ///
    /// This is the arithmetic used by cmap id deltas and single substitution
    /// deltas.
    pub const fn wrapping_add_signed(self, delta: i16) -> Self {
        GlyphId(self.0.wrapping_add_signed(delta))
    }
}

impl From<u16> for GlyphId {
    fn from(value: u16) -> Self {
        GlyphId(value)
    }
}

impl From<GlyphId> for u32 {
    fn from(value: GlyphId) -> Self {
        value.to_u32()
    }
}

impl From<GlyphId> for usize {
    fn from(value: GlyphId) -> Self {
        value.0 as usize
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}

crate::newtype_scalar!(GlyphId, [u8; 2]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_wraps() {
        assert_eq!(GlyphId::new(10).wrapping_add_signed(5), GlyphId::new(15));
        assert_eq!(GlyphId::new(3).wrapping_add_signed(-5), GlyphId::new(65534));
        assert_eq!(GlyphId::new(65535).wrapping_add_signed(2), GlyphId::new(1));
    }

    #[test]
    fn display() {
        assert_eq!(GlyphId::new(42).to_string(), "GID_42");
        assert_eq!(GlyphId::default(), GlyphId::NOTDEF);
    }
}
