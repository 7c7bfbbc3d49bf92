//! Common scalar data types used in font files
//!
//! These are the building blocks shared by the parsers in `fontweave`: every
//! value with a fixed big-endian encoding implements [`Scalar`].

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod bbox;
mod fixed;
mod glyph_id;
mod point;
mod raw;
mod tag;

pub use bbox::BoundingBox;
pub use fixed::F2Dot14;
pub use glyph_id::GlyphId;
pub use point::Point;
pub use raw::Scalar;
pub use tag::{InvalidTag, Tag};

/// The SFNT version for fonts containing TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;
/// The legacy Apple SFNT version for TrueType outlines (`'true'`).
pub const TRUE_SFNT_VERSION: u32 = 0x74727565;
/// The SFNT version for fonts containing CFF outlines (`'OTTO'`).
pub const CFF_SFNT_VERSION: u32 = 0x4F54544F;
