use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{QuoteError, QuoteSource};
use crate::models::{Notice, Period, QuoteTable};
use crate::utils::redact_secret;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Row layout of the exported CSV
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Fetch the quote table for `symbol` over `period` from the configured provider
pub async fn load_quotes(
    source: &QuoteSource,
    symbol: &str,
    period: Period,
) -> Result<QuoteTable, QuoteError> {
    info!("Loading {} quotes for {} from {}", period, symbol, source.name());
    let records = source.fetch(symbol, period).await?;
    if records.is_empty() {
        return Err(QuoteError::NoData(period));
    }
    info!("Loaded {} quote records for {}", records.len(), symbol);
    Ok(QuoteTable::new(symbol, period, records))
}

/// Messages for a failed load, most specific first
pub fn failure_notices(err: &QuoteError, secret: Option<&str>) -> Vec<Notice> {
    let first = match err {
        QuoteError::Provider(msg) => {
            warn!("Quote provider error: {}", redact_secret(msg, secret));
            // only key-based providers can fail on the key
            let hint = match secret {
                Some(_) => "Check the API key or try again later.",
                None => "The provider rejected the request, try again later.",
            };
            Notice::Error(format!("❌ Failed to fetch data. {}", hint))
        }
        QuoteError::NoData(period) => Notice::Warning(format!(
            "⚠️ No data available for {}. Try choosing a different period.",
            period
        )),
        QuoteError::Http(_) | QuoteError::Parse(_) => {
            Notice::Error(format!("🚨 Error: {}", redact_secret(&err.to_string(), secret)))
        }
    };
    vec![
        first,
        Notice::Warning("⚠️ Data temporarily unavailable. Please try again later.".to_string()),
    ]
}

/// Serialize the table to CSV, one row per record
pub fn to_csv(table: &QuoteTable) -> Result<Vec<u8>, csv::Error> {
    let format = if table.is_intraday() {
        DATETIME_FORMAT
    } else {
        DATE_FORMAT
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    for r in &table.records {
        writer.serialize(CsvRow {
            date: r.timestamp.format(format).to_string(),
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        })?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuoteRecord, SYMBOL};
    use chrono::{NaiveDate, NaiveDateTime};

    /// Read back a CSV produced by [`to_csv`]
    fn from_csv(data: &[u8]) -> Result<Vec<QuoteRecord>, QuoteError> {
        let mut reader = csv::Reader::from_reader(data);
        reader
            .deserialize::<CsvRow>()
            .map(|row| {
                let row = row.map_err(|e| QuoteError::Parse(e.to_string()))?;
                Ok(QuoteRecord {
                    timestamp: parse_date(&row.date)?,
                    open: row.open,
                    high: row.high,
                    low: row.low,
                    close: row.close,
                    volume: row.volume,
                })
            })
            .collect()
    }

    fn parse_date(raw: &str) -> Result<NaiveDateTime, QuoteError> {
        NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| QuoteError::Parse(format!("invalid date '{}'", raw)))
    }

    fn record(ts: &str, open: f64, volume: f64) -> QuoteRecord {
        QuoteRecord {
            timestamp: parse_date(ts).unwrap(),
            open,
            high: open + 1.25,
            low: open - 0.75,
            close: open + 0.1,
            volume,
        }
    }

    #[test]
    fn test_daily_csv_round_trip() {
        let table = QuoteTable::new(
            SYMBOL,
            Period::FiveDays,
            vec![
                record("2024-03-04", 176.15, 81510101.0),
                record("2024-03-05", 170.76, 95132355.0),
                record("2024-03-06", 171.06, 68587707.0),
            ],
        );
        let csv = to_csv(&table).unwrap();
        let text = String::from_utf8(csv.clone()).unwrap();
        assert!(text.starts_with("date,open,high,low,close,volume\n2024-03-04,"));

        let parsed = from_csv(&csv).unwrap();
        assert_eq!(parsed, table.records);
    }

    #[test]
    fn test_intraday_csv_keeps_time() {
        let table = QuoteTable::new(
            SYMBOL,
            Period::OneDay,
            vec![
                record("2024-03-05 19:50:00", 170.0, 800.0),
                record("2024-03-05 19:55:00", 170.1, 1200.0),
            ],
        );
        let csv = to_csv(&table).unwrap();
        assert!(String::from_utf8_lossy(&csv).contains("2024-03-05 19:55:00"));
        assert_eq!(from_csv(&csv).unwrap(), table.records);
    }

    #[test]
    fn test_from_csv_rejects_bad_date() {
        let data = b"date,open,high,low,close,volume\nyesterday,1,2,0.5,1.5,10\n";
        assert!(matches!(from_csv(data), Err(QuoteError::Parse(_))));
    }

    #[test]
    fn test_failure_notices_are_distinct() {
        let provider = failure_notices(&QuoteError::Provider("Invalid API call".into()), Some("KEY"));
        let no_data = failure_notices(&QuoteError::NoData(Period::OneDay), None);
        let parse = failure_notices(&QuoteError::Parse("bad json".into()), None);

        assert!(matches!(&provider[0], Notice::Error(m) if m.contains("API key")));
        assert!(matches!(&no_data[0], Notice::Warning(m) if m.contains("No data")));
        assert!(matches!(&parse[0], Notice::Error(m) if m.contains("bad json")));
        assert_ne!(provider[0], parse[0]);
        for notices in [&provider, &no_data, &parse] {
            assert_eq!(notices.len(), 2);
            assert!(matches!(&notices[1], Notice::Warning(m) if m.contains("temporarily unavailable")));
        }
    }

    #[test]
    fn test_keyless_provider_error_does_not_mention_key() {
        let notices = failure_notices(&QuoteError::Provider("Not Found".into()), None);
        assert!(matches!(&notices[0], Notice::Error(m) if m.starts_with("❌ Failed to fetch data") && !m.contains("API key")));
    }

    #[test]
    fn test_failure_notices_redact_secret() {
        let err = QuoteError::Parse("url https://x/query?apikey=TOPSECRET".into());
        let notices = failure_notices(&err, Some("TOPSECRET"));
        assert!(matches!(&notices[0], Notice::Error(m) if !m.contains("TOPSECRET")));
    }
}
