//! Fatal errors and recoverable diagnostics.

use std::fmt;

use types::{GlyphId, Tag};

use crate::read::ReadError;

/// Errors that prevent a font from being loaded at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FontError {
    #[error("Invalid font signature 0x{0:08X}")]
    InvalidFontSignature(u32),

    #[error("Table '{tag}' at offset {offset} with length {length} exceeds the {file_len} byte font")]
    TableOutOfBounds {
        tag: Tag,
        offset: u32,
        length: u32,
        file_len: usize,
    },

    #[error("Error reading table directory: {0}")]
    Read(#[from] ReadError),
}

/// A non-fatal problem found while loading a font.
///
/// Loading continues past these; the affected table or glyph falls back to
/// an empty default.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// The table the problem was found in.
    pub table: Tag,
    /// The glyph the problem concerns, if any.
    pub glyph: Option<GlyphId>,
    /// A human readable description.
    pub message: String,
}

impl Diagnostic {
    pub fn new(table: Tag, message: impl Into<String>) -> Self {
        Self {
            table,
            glyph: None,
            message: message.into(),
        }
    }

    pub fn for_glyph(table: Tag, glyph: GlyphId, message: impl Into<String>) -> Self {
        Self {
            table,
            glyph: Some(glyph),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.glyph {
            Some(gid) => write!(f, "{}: glyph {}: {}", self.table, gid.to_u16(), self.message),
            None => write!(f, "{}: {}", self.table, self.message),
        }
    }
}

/// An ordered collection of diagnostics, built up during loading.
#[derive(Debug, Default, Clone)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub(crate) fn table(&mut self, table: Tag, message: impl Into<String>) {
        self.push(Diagnostic::new(table, message));
    }

    pub(crate) fn glyph(&mut self, table: Tag, glyph: GlyphId, message: impl Into<String>) {
        self.push(Diagnostic::for_glyph(table, glyph, message));
    }

    pub(crate) fn into_inner(self) -> Vec<Diagnostic> {
        self.0
    }
}
