//! FRED API integration for the dashboard series.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::data::SeriesSource;
use crate::domain::{ObservationSeries, SeriesName};
use crate::error::{AppError, EXIT_CONFIG, EXIT_UPSTREAM};

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 10000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the FRED API key.
pub const API_KEY_VAR: &str = "FRED_API_KEY";

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    /// Build a client from `FRED_API_KEY` (a `.env` file is honored).
    ///
    /// A missing or empty key is fatal: nothing should be fetched or computed
    /// without it.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR).unwrap_or_default();
        Self::new(api_key)
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::new(
                EXIT_CONFIG,
                format!("Missing {API_KEY_VAR} in environment (.env)."),
            ));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
        })
    }

    fn fetch_observations(&self, name: SeriesName, start: NaiveDate) -> Result<ObservationSeries, AppError> {
        let series_id = name.series_id();
        debug!(series_id, %start, "requesting FRED observations");

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("observation_start", &start.to_string()),
                ("limit", &OBS_LIMIT.to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(EXIT_UPSTREAM, format!("FRED request for {series_id} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                EXIT_UPSTREAM,
                format!("FRED request for {series_id} failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp.json().map_err(|e| {
            AppError::new(EXIT_UPSTREAM, format!("Failed to parse FRED response for {series_id}: {e}"))
        })?;

        parse_observations(name, body)
    }
}

impl SeriesSource for FredClient {
    fn label(&self) -> &str {
        "FRED"
    }

    fn fetch(&self, name: SeriesName, start: NaiveDate) -> Result<ObservationSeries, AppError> {
        self.fetch_observations(name, start)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

fn parse_observations(name: SeriesName, body: ObservationsResponse) -> Result<ObservationSeries, AppError> {
    let mut points = Vec::with_capacity(body.observations.len());
    for obs in body.observations {
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").map_err(|e| {
            AppError::new(EXIT_UPSTREAM, format!("Invalid FRED date '{}' for {}: {e}", obs.date, name.series_id()))
        })?;
        points.push((date, parse_value(&obs.value)));
    }
    Ok(ObservationSeries::new(name, points))
}

/// FRED marks missing observations with `"."`.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_handles_missing_markers() {
        assert_eq!(parse_value("5.2"), Some(5.2));
        assert_eq!(parse_value(" 1000 "), Some(1000.0));
        assert_eq!(parse_value("."), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value("abc"), None);
    }

    #[test]
    fn parses_observations_payload() {
        let json = r#"{
            "realtime_start": "2025-01-01",
            "observations": [
                {"realtime_start": "2025-01-01", "date": "2020-02-01", "value": "3.5"},
                {"realtime_start": "2025-01-01", "date": "2020-01-01", "value": "3.6"},
                {"realtime_start": "2025-01-01", "date": "2020-03-01", "value": "."}
            ]
        }"#;
        let body: ObservationsResponse = serde_json::from_str(json).unwrap();
        let series = parse_observations(SeriesName::Unemployment, body).unwrap();
        let d = |m| NaiveDate::from_ymd_opt(2020, m, 1).unwrap();
        assert_eq!(
            series.points,
            vec![(d(1), Some(3.6)), (d(2), Some(3.5)), (d(3), None)]
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        let body = ObservationsResponse {
            observations: vec![Observation {
                date: "2020/01/01".to_string(),
                value: "1".to_string(),
            }],
        };
        let err = parse_observations(SeriesName::Recession, body).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_UPSTREAM);
    }

    #[test]
    fn empty_api_key_is_fatal() {
        let err = FredClient::new("  ").err().unwrap();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(err.message().contains(API_KEY_VAR));
    }
}
