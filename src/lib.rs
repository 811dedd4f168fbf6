//! `recession-watch` library crate.
//!
//! The binary (`rw`) is a thin wrapper around this library so that:
//!
//! - the metrics pipeline is testable without spawning processes or hitting FRED
//! - the report, plot and TUI front-ends share one dashboard computation

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod tui;
