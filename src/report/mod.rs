//! Reporting utilities: formatted terminal output.

mod format;

pub use format::*;
