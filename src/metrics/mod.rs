//! Metrics pipeline: alignment, derived ratios, normalization and signals.
//!
//! Everything in here is a pure function of its inputs. Fetching and caching
//! live in `data`, orchestration in `app::pipeline`.

pub mod align;
pub mod normalize;
pub mod ratio;
pub mod signals;
pub mod stress;

pub use align::{MIN_ROWS, align};
pub use normalize::{DEGENERATE_FILL, normalize};
pub use ratio::derive_ratio_index;
pub use signals::{classify, latest_delta, recession_periods, status_card, trailing_alert, trailing_mean};
pub use stress::{stress_score, with_stress_score};
