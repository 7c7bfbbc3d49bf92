//! Reading, shaping and tessellating OpenType fonts
//!
//! This crate parses the tables of a TrueType-flavoured font file into owned
//! data, resolves glyph outlines (including composite glyphs), applies `GSUB`
//! substitutions to runs of glyphs, and tessellates outlines into triangle
//! meshes suitable for uploading to a GPU.
//!
//! Loading is tolerant: the only fatal error is an unreadable table
//! directory. Every other problem is recorded as a [`Diagnostic`] and the
//! affected table or glyph falls back to an empty default.
//!
//! # Example
//!
//! ```
//! # let font_bytes = fontweave_test_data::fonts::simple_font();
//! use fontweave::{types::Tag, Font};
//!
//! let font = Font::new(&font_bytes).expect("failed to read font data");
//! let mut glyphs = font.glyphs_for_str("ffi");
//! font.substitute(&mut glyphs, Tag::new(b"liga"));
//! assert_eq!(glyphs.len(), 1);
//!
//! let outline = font.outline(glyphs[0]);
//! println!("{} triangles", outline.mesh().len() / 3);
//! ```
//!
//! The [`tables`] module exposes the parsed form of each supported table for
//! callers who need more than the [`Font`] queries.

#![deny(rustdoc::broken_intra_doc_links)]

/// Public re-export of the fontweave-types crate.
pub extern crate fontweave_types as types;

mod error;
mod font;
mod font_data;
mod options;
mod outline;
mod read;
mod substitution;
mod table_directory;
pub mod tables;
mod tessellate;

pub use error::{Diagnostic, FontError};
pub use font::Font;
pub use font_data::{Cursor, FontData};
pub use options::{
    LoadOptions, DEFAULT_TESSELLATION_TOLERANCE, GLYF_COMPOSITE_RECURSION_LIMIT,
    MAX_LOOKUP_OPERATIONS, MAX_NESTING_LEVEL,
};
pub use outline::{Contour, ContourPoint, GlyphOutline, OutlineError};
pub use read::{FontRead, ReadError, TopLevelTable};
pub use substitution::{FeatureSelection, GlyphBuffer, MAX_BUFFER_LEN_FACTOR};
pub use table_directory::{TableDirectory, TableRecord};
pub use tessellate::{tessellate, Vertex};
