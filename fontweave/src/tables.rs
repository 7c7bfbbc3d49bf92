//! The parsed form of each supported table.

pub mod cmap;
pub mod gdef;
pub mod glyf;
pub mod gsub;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod kern;
pub mod layout;
pub mod loca;
pub mod maxp;
pub mod name;
