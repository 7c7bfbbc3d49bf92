//! Traits for interpreting font data

use types::Tag;

use crate::font_data::FontData;

/// A type that can be read from raw table data.
///
/// Implementations are responsible for validating the data as they go:
/// array lengths, offsets and formats are checked, and any inconsistency is
/// reported as a [`ReadError`].
pub trait FontRead<'a>: Sized {
    /// Read an instance of `Self` from the provided data, performing validation.
    fn read(data: FontData<'a>) -> Result<Self, ReadError>;
}

/// A table that is found directly in the table directory.
pub trait TopLevelTable {
    /// The table's tag.
    const TAG: Tag;
}

/// An error that occurs when reading font data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("An offset was out of bounds")]
    OutOfBounds,
    // i64 is flexible enough to store any value we might encounter
    #[error("Invalid format '{0}'")]
    InvalidFormat(i64),
    #[error("An offset was unexpectedly null")]
    NullOffset,
    #[error("Malformed data: '{0}'")]
    MalformedData(&'static str),
}
