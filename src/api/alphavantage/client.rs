use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::{SeriesBar, TimeSeriesResponse};
use crate::api::QuoteError;
use crate::models::quote::trim_to_period;
use crate::models::{Period, QuoteRecord};

const INTRADAY_INTERVAL: &str = "5min";

/// The latest 100 bars; `full` is a premium feature for daily series
const OUTPUT_SIZE: &str = "compact";

/// Alpha Vantage time series client
#[derive(Clone)]
pub struct AlphaVantageClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a client against `base_url` (normally https://www.alphavantage.co)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// GET /query?function=TIME_SERIES_*
    ///
    /// The one-day period asks for 5-minute intraday bars, every other period
    /// for daily bars. The series is trimmed to the period before returning.
    pub async fn get_time_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<QuoteRecord>, QuoteError> {
        let url = format!("{}/query", self.base_url);
        let query = query_params(symbol, period);
        debug!("Requesting {} for {} ({})", query[0].1, symbol, period);

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        parse_time_series(&body, period)
    }
}

/// Query parameters for a period, without the API key
pub fn query_params(symbol: &str, period: Period) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("function", function_for(period).to_string()),
        ("symbol", symbol.to_string()),
    ];
    if period.is_intraday() {
        params.push(("interval", INTRADAY_INTERVAL.to_string()));
    }
    params.push(("outputsize", OUTPUT_SIZE.to_string()));
    params.push(("datatype", "json".to_string()));
    params
}

pub fn function_for(period: Period) -> &'static str {
    if period.is_intraday() {
        "TIME_SERIES_INTRADAY"
    } else {
        "TIME_SERIES_DAILY"
    }
}

/// Turn a response body into ascending quote records
pub fn parse_time_series(body: &str, period: Period) -> Result<Vec<QuoteRecord>, QuoteError> {
    let response: TimeSeriesResponse =
        serde_json::from_str(body).map_err(|e| QuoteError::Parse(e.to_string()))?;

    if let Some(message) = response.provider_message() {
        warn!("Alpha Vantage reported: {}", message);
        return Err(QuoteError::Provider(message.to_string()));
    }

    let series = if period.is_intraday() {
        response.intraday
    } else {
        response.daily
    };

    let series = match series {
        Some(series) if !series.is_empty() => series,
        _ => return Err(QuoteError::NoData(period)),
    };

    let mut records = series
        .iter()
        .map(|(ts, bar)| parse_bar(ts, bar))
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by_key(|r| r.timestamp);
    trim_to_period(&mut records, period);

    if records.is_empty() {
        return Err(QuoteError::NoData(period));
    }
    Ok(records)
}

fn parse_bar(ts: &str, bar: &SeriesBar) -> Result<QuoteRecord, QuoteError> {
    Ok(QuoteRecord {
        timestamp: parse_timestamp(ts)?,
        open: parse_number(&bar.open, "open", ts)?,
        high: parse_number(&bar.high, "high", ts)?,
        low: parse_number(&bar.low, "low", ts)?,
        close: parse_number(&bar.close, "close", ts)?,
        volume: parse_number(&bar.volume, "volume", ts)?,
    })
}

fn parse_number(raw: &str, field: &str, ts: &str) -> Result<f64, QuoteError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| QuoteError::Parse(format!("invalid {} '{}' at {}", field, raw, ts)))
}

fn parse_timestamp(ts: &str) -> Result<NaiveDateTime, QuoteError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| QuoteError::Parse(format!("invalid timestamp '{}'", ts)))
}
