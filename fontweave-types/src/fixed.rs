//! fixed-point numerical types

/// 16-bit signed fixed point number with 14 bits of fraction.
///
/// Used for the scale and 2x2 transform values of composite glyph components.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct F2Dot14(i16);

impl F2Dot14 {
    /// Minimum value.
    pub const MIN: Self = Self(i16::MIN);
    /// Maximum value.
    pub const MAX: Self = Self(i16::MAX);
    /// The value `1.0`.
    pub const ONE: Self = Self(1 << Self::FRACT_BITS);
    /// The value `0.0`.
    pub const ZERO: Self = Self(0);

    const FRACT_BITS: u32 = 14;
    const INT_MASK: i16 = !0 << Self::FRACT_BITS;

    /// Creates a new value from its raw bit representation.
    pub const fn from_bits(bits: i16) -> Self {
        Self(bits)
    }

    /// Returns the raw bit representation.
    pub const fn to_bits(self) -> i16 {
        self.0
    }

    /// Creates a fixed point value from an f32.
    ///
    /// This operation is lossy; the float will be rounded to the nearest
    /// representable value.
    pub fn from_f32(x: f32) -> Self {
        Self((x * (1 << Self::FRACT_BITS) as f32).round() as i16)
    }

    /// Returns the value as an f32.
    ///
    /// This operation is lossless.
    pub fn to_f32(self) -> f32 {
        let int = ((self.0 & Self::INT_MASK) >> Self::FRACT_BITS) as f32;
        let fract = (self.0 & !Self::INT_MASK) as f32 / (1 << Self::FRACT_BITS) as f32;
        int + fract
    }
}

impl std::fmt::Display for F2Dot14 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.to_f32().fmt(f)
    }
}

impl std::fmt::Debug for F2Dot14 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.to_f32().fmt(f)
    }
}

crate::newtype_scalar!(F2Dot14, [u8; 2]);
