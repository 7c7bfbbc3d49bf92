//! raw font bytes

use std::ops::{Bound, RangeBounds};

use types::Scalar;

use crate::read::ReadError;

/// A reference to raw binary font data.
///
/// This is a wrapper around a byte slice, that provides bounds-checked,
/// big-endian reads at absolute offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

/// A cursor for reading sequential fields out of [`FontData`].
///
/// Every read is bounds checked; a failed read leaves the position unchanged.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> FontData<'a> {
    /// Create a new `FontData` with these bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    /// The length of the data, in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the data has a length of zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the data starting at `pos`, or `None` if `pos` is past the end.
    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(|bytes| FontData { bytes })
    }

    /// Returns a subrange of this data, or `None` if it is out of bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let bounds: (Bound<usize>, Bound<usize>) =
            (range.start_bound().cloned(), range.end_bound().cloned());
        self.bytes.get(bounds).map(|bytes| FontData { bytes })
    }

    /// Read a scalar at the absolute `offset`.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        let end = offset
            .checked_add(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        self.bytes
            .get(offset..end)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Read `count` consecutive scalars starting at `offset`.
    pub fn read_array<T: Scalar>(&self, offset: usize, count: usize) -> Result<Vec<T>, ReadError> {
        let len = count
            .checked_mul(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        let end = offset.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let bytes = self.bytes.get(offset..end).ok_or(ReadError::OutOfBounds)?;
        bytes
            .chunks_exact(T::RAW_BYTE_LEN)
            .map(|chunk| T::read(chunk).ok_or(ReadError::OutOfBounds))
            .collect()
    }

    /// Read an offset at `pos` and return the data it points to, relative to
    /// the start of this data.
    ///
    /// A zero offset is reported as [`ReadError::NullOffset`].
    pub fn resolve_offset<T: Scalar + Into<u32>>(&self, pos: usize) -> Result<FontData<'a>, ReadError> {
        let offset = self.read_at::<T>(pos)?.into() as usize;
        if offset == 0 {
            return Err(ReadError::NullOffset);
        }
        self.split_off(offset).ok_or(ReadError::OutOfBounds)
    }

    /// A new cursor positioned at the start of this data.
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }

    /// The underlying bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Cursor<'a> {
    /// Skip over a value of type `T`.
    pub fn advance<T: Scalar>(&mut self) {
        self.pos = self.pos.saturating_add(T::RAW_BYTE_LEN);
    }

    /// Skip `n_bytes` bytes.
    pub fn advance_by(&mut self, n_bytes: usize) {
        self.pos = self.pos.saturating_add(n_bytes);
    }

    /// Read the next value and advance past it.
    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let temp = self.data.read_at(self.pos)?;
        self.pos += T::RAW_BYTE_LEN;
        Ok(temp)
    }

    /// Read `len` consecutive values and advance past them.
    pub fn read_array<T: Scalar>(&mut self, len: usize) -> Result<Vec<T>, ReadError> {
        let temp = self.data.read_array(self.pos, len)?;
        self.pos += len * T::RAW_BYTE_LEN;
        Ok(temp)
    }

    /// Return the current position, or an error if we are out of bounds
    pub fn position(&self) -> Result<usize, ReadError> {
        if self.pos <= self.data.len() {
            Ok(self.pos)
        } else {
            Err(ReadError::OutOfBounds)
        }
    }

    /// The number of bytes between the current position and the end.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(src: &'a [u8]) -> FontData<'a> {
        FontData::new(src)
    }
}
