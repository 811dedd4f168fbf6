//! Error types.
//!
//! `AppError` is what crosses the application boundary: it carries the process
//! exit code alongside a human-readable message. `PipelineError` is the typed
//! failure of the metrics pipeline; callers that only render a "cannot compute"
//! state match on it directly instead of going through `AppError`.

use thiserror::Error;

use crate::domain::{ColumnKey, SeriesName};

/// Exit code for configuration, credential and local I/O problems.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for data that cannot support the computation.
pub const EXIT_DATA: u8 = 3;
/// Exit code for upstream and terminal failures.
pub const EXIT_UPSTREAM: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the metrics pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("no series supplied to the pipeline")]
    NoSeries,

    #[error("insufficient data: {rows} aligned row(s), at least 2 are required")]
    InsufficientData { rows: usize },

    #[error("column {0} is not present in the table")]
    MissingColumn(ColumnKey),

    #[error("required series unavailable: {}", fmt_names(.0))]
    MissingRequiredSeries(Vec<SeriesName>),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(EXIT_DATA, format!("Cannot compute dashboard: {err}."))
    }
}

fn fmt_names(names: &[SeriesName]) -> String {
    names
        .iter()
        .map(|n| n.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_data_exit_code() {
        let err: AppError = PipelineError::InsufficientData { rows: 1 }.into();
        assert_eq!(err.exit_code(), EXIT_DATA);
        assert!(err.message().contains("1 aligned row"));
    }

    #[test]
    fn missing_required_lists_display_names() {
        let err = PipelineError::MissingRequiredSeries(vec![
            SeriesName::LipstickProxy,
            SeriesName::TotalRetail,
        ]);
        let text = err.to_string();
        assert!(text.contains("Lipstick proxy"));
        assert!(text.contains("Total retail"));
    }
}
