//! types for working with raw big-endian bytes

/// A trait for font scalars.
///
/// This is the bridge between the big-endian byte representation found in
/// font files and the native type. Every type that can be read with
/// `FontData::read_at` implements it.
pub trait Scalar: Sized {
    /// The raw byte representation of this type.
    type Raw: Copy + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// The number of bytes in the encoded representation.
    const RAW_BYTE_LEN: usize = std::mem::size_of::<Self::Raw>();

    /// Create an instance of this type from raw big-endian bytes
    fn from_raw(raw: Self::Raw) -> Self;

    /// Encode this type as raw big-endian bytes
    fn to_raw(self) -> Self::Raw;

    /// Decode a value from the front of `bytes`.
    ///
    /// Returns `None` if there are fewer than [`Self::RAW_BYTE_LEN`] bytes.
    fn read(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..Self::RAW_BYTE_LEN)?;
        Self::Raw::try_from(raw).ok().map(Self::from_raw)
    }
}

/// An internal macro for implementing the `Scalar` trait for newtypes.
#[macro_export]
#[doc(hidden)]
macro_rules! newtype_scalar {
    ($name:ident, $raw:ty) => {
        impl $crate::Scalar for $name {
            type Raw = $raw;
            fn to_raw(self) -> $raw {
                $crate::Scalar::to_raw(self.0)
            }

            fn from_raw(raw: $raw) -> Self {
                Self($crate::Scalar::from_raw(raw))
            }
        }
    };
}

macro_rules! int_scalar {
    ($ty:ty, $raw:ty) => {
        impl crate::raw::Scalar for $ty {
            type Raw = $raw;
            fn to_raw(self) -> $raw {
                self.to_be_bytes()
            }

            fn from_raw(raw: $raw) -> $ty {
                Self::from_be_bytes(raw)
            }
        }
    };
}

int_scalar!(u8, [u8; 1]);
int_scalar!(i8, [u8; 1]);
int_scalar!(u16, [u8; 2]);
int_scalar!(i16, [u8; 2]);
int_scalar!(u32, [u8; 4]);
int_scalar!(i32, [u8; 4]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_decoding() {
        assert_eq!(u16::read(&[0x12, 0x34]), Some(0x1234));
        assert_eq!(i16::read(&[0xFF, 0xD8]), Some(-40));
        assert_eq!(u32::read(&[0, 1, 0, 0, 0xAA]), Some(0x0001_0000));
        assert_eq!(i8::read(&[0x80]), Some(-128));
    }

    #[test]
    fn short_input() {
        assert_eq!(u32::read(&[0, 1, 0]), None);
        assert_eq!(u8::read(&[]), None);
        assert_eq!(<u16 as Scalar>::RAW_BYTE_LEN, 2);
    }
}
