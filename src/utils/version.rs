//! Version information

/// Crate version baked in at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the crate version string
pub fn get_version() -> &'static str {
    VERSION
}
