//! Output formatting module
//!
//! Live CLI output formats for batch results.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
