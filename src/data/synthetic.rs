//! Deterministic offline series.
//!
//! A small simulated economy with the same shape as the FRED inputs: monthly
//! observations, two recession windows, retail sales that dip through them and
//! a lipstick share that rises. Used by `--offline` and by tests that need a
//! realistic multi-year table without network access.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::SeriesSource;
use crate::domain::{ObservationSeries, SeriesName};
use crate::error::{AppError, EXIT_UPSTREAM};

/// NBER-style recession windows (first and last month, inclusive).
const RECESSIONS: [((i32, u32), (i32, u32)); 2] = [((2008, 1), (2009, 6)), ((2020, 3), (2020, 4))];

/// Months after a recession during which unemployment stays elevated.
const RECOVERY_MONTHS: u32 = 18;

/// Chance that a menswear observation is reported as missing.
const MISSING_PROB: f64 = 0.02;

pub struct SyntheticSource {
    seed: u64,
    origin: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
struct Month {
    date: NaiveDate,
    recession: bool,
    unemployment: f64,
    total_retail: f64,
    lipstick: f64,
    menswear: Option<f64>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            origin: ymd(2000, 1),
            end: ymd(2025, 12),
        }
    }

    fn simulate(&self) -> Result<Vec<Month>, AppError> {
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, self.origin));
        let noise = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Noise distribution error: {e}")))?;

        let mut out = Vec::new();
        let mut unemployment = 4.5;
        let mut total_retail = 250_000.0;
        let mut menswear = 800.0;
        let mut since_recession: Option<u32> = None;

        let mut date = self.origin;
        while date <= self.end {
            let recession = in_recession(date);
            since_recession = match (recession, since_recession) {
                (true, _) => Some(0),
                (false, Some(n)) => Some(n + 1),
                (false, None) => None,
            };
            let stressed = since_recession.is_some_and(|n| n <= RECOVERY_MONTHS);

            let target = if stressed { 9.0 } else { 4.2 };
            let z: f64 = rng.sample(noise);
            unemployment = (0.85 * unemployment + 0.15 * target + 0.08 * z).max(2.5);

            let growth = if recession { -0.012 } else { 0.003 };
            let z: f64 = rng.sample(noise);
            total_retail *= 1.0 + growth + 0.004 * z;

            let share = if stressed { 0.068 } else { 0.062 };
            let z: f64 = rng.sample(noise);
            let lipstick = total_retail * (share + 0.0008 * z);

            let growth = if recession { -0.025 } else { 0.001 };
            let z: f64 = rng.sample(noise);
            menswear *= 1.0 + growth + 0.01 * z;
            let reported = (!rng.gen_bool(MISSING_PROB)).then_some(menswear);

            out.push(Month {
                date,
                recession,
                unemployment,
                total_retail,
                lipstick,
                menswear: reported,
            });

            date = match date.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(out)
    }
}

impl SeriesSource for SyntheticSource {
    fn label(&self) -> &str {
        "offline"
    }

    fn fetch(&self, name: SeriesName, start: NaiveDate) -> Result<ObservationSeries, AppError> {
        let points = self
            .simulate()?
            .into_iter()
            .filter(|m| m.date >= start)
            .map(|m| {
                let value = match name {
                    SeriesName::Unemployment => Some(round_to(m.unemployment, 1)),
                    SeriesName::LipstickProxy => Some(m.lipstick.round()),
                    SeriesName::MenswearProxy => m.menswear.map(f64::round),
                    SeriesName::TotalRetail => Some(m.total_retail.round()),
                    SeriesName::Recession => Some(if m.recession { 1.0 } else { 0.0 }),
                };
                (m.date, value)
            })
            .collect();
        Ok(ObservationSeries::new(name, points))
    }
}

fn in_recession(date: NaiveDate) -> bool {
    RECESSIONS
        .iter()
        .any(|&(from, to)| date >= ymd(from.0, from.1) && date <= ymd(to.0, to.1))
}

fn ymd(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

fn mix_seed(seed: u64, origin: NaiveDate) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    origin.hash(&mut hasher);
    hasher.finish()
}
