//! small utilities used in tests

use std::collections::HashMap;

use fontweave_types::Scalar;

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains zero bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a reference to the contents of the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write a scalar, remembering its location so it can be patched later.
    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self.data.extend(item.to_raw().as_ref());
        }
        self
    }

    /// Append the contents of another buffer.
    pub fn append(mut self, other: &BeBuffer) -> Self {
        self.data.extend_from_slice(&other.data);
        self
    }

    /// Overwrite the bytes at `pos` with a scalar.
    pub fn patch(mut self, pos: usize, item: impl Scalar) -> Self {
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        self.data[pos..pos + new_data.len()].copy_from_slice(new_data);
        self
    }

    /// Write the buffer's current length as a u16 at `pos`.
    pub fn with_length_at(self, pos: usize) -> Self {
        let len = self.len() as u16;
        self.patch(pos, len)
    }

    /// The offset of a location recorded with [`BeBuffer::push_with_tag`].
    pub fn offset_for(&self, tag: &str) -> usize {
        // panic on unrecognized tags
        self.tagged_locations.get(tag).copied().unwrap()
    }

    /// Overwrite the value at a tagged location.
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        let offset = self.offset_for(tag);
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        let data = &mut self.data[offset..];
        if data.len() < new_data.len() {
            panic!("not enough room left in buffer for the requested write.");
        }
        data[..new_data.len()].copy_from_slice(new_data);
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Build a [`BeBuffer`] from a list of scalar expressions.
#[macro_export]
macro_rules! be_buffer {
    ( $( $x:expr ),* $(,)? ) => {{
        let buffer = $crate::bebuffer::BeBuffer::new();
        $( let buffer = buffer.push($x); )*
        buffer
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_writes() {
        let mut buf = BeBuffer::new()
            .push(1u16)
            .push_with_tag(0u16, "offset")
            .push(-1i16);
        assert_eq!(buf.offset_for("offset"), 2);
        buf.write_at("offset", 0x1234u16);
        assert_eq!(buf.as_slice(), &[0, 1, 0x12, 0x34, 0xFF, 0xFF]);
    }

    #[test]
    fn macro_pushes_in_order() {
        let buf = be_buffer! { 1u8, 2u16, 3u32 };
        assert_eq!(buf.as_slice(), &[1, 0, 2, 0, 0, 0, 3]);
    }
}
