//! Test data shared between the fontweave crates.

pub mod bebuffer;
pub mod cmap;
pub mod font_builder;
pub mod fonts;
pub mod glyf;
pub mod gsub;
pub mod kern;
pub mod layout;
pub mod tables;

pub use bebuffer::BeBuffer;
pub use font_builder::FontBuilder;

/// Route `log` output through the test harness.
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
