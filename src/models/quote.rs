//! Stock quote models

use chrono::{Duration, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// The fixed symbol shown by the stock panel
pub const SYMBOL: &str = "AAPL";

/// A single OHLCV row
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Quote history for one symbol, ordered ascending by timestamp
#[derive(Debug, Clone)]
pub struct QuoteTable {
    pub symbol: String,
    pub period: Period,
    pub records: Vec<QuoteRecord>,
}

impl QuoteTable {
    pub fn new(symbol: &str, period: Period, mut records: Vec<QuoteRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self {
            symbol: symbol.to_string(),
            period,
            records,
        }
    }

    /// True when any record carries a time of day (intraday data)
    pub fn is_intraday(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.timestamp.num_seconds_from_midnight() != 0)
    }
}

/// History period offered by the stock panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    OneDay,
    #[default]
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
}

impl Period {
    pub const ALL: [Period; 9] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self, Period::OneDay)
    }

    /// Calendar span covered by the period
    pub fn window(&self) -> Duration {
        match self {
            Period::OneDay => Duration::days(1),
            Period::FiveDays => Duration::days(5),
            Period::OneMonth => Duration::days(30),
            Period::ThreeMonths => Duration::days(91),
            Period::SixMonths => Duration::days(182),
            Period::OneYear => Duration::days(365),
            Period::TwoYears => Duration::days(730),
            Period::FiveYears => Duration::days(1826),
            Period::TenYears => Duration::days(3652),
        }
    }

    pub fn accepted_values() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "❌ Unknown period: '{}'. Supported: {}",
                    s,
                    Self::accepted_values()
                )
            })
    }
}

/// Keep only the records inside `period`, measured back from the latest record.
/// The one-day period keeps the latest trading day.
pub fn trim_to_period(records: &mut Vec<QuoteRecord>, period: Period) {
    let Some(latest) = records.iter().map(|r| r.timestamp).max() else {
        return;
    };

    if period.is_intraday() {
        let day = latest.date();
        records.retain(|r| r.timestamp.date() == day);
    } else {
        let cutoff = latest - period.window();
        records.retain(|r| r.timestamp > cutoff);
    }
}
