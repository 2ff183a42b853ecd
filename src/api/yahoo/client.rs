use chrono::DateTime;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::ChartResponse;
use crate::api::QuoteError;
use crate::models::{Period, QuoteRecord};

/// Yahoo Finance chart client; the period string is passed straight through as `range`
#[derive(Clone)]
pub struct YahooFinanceClient {
    http_client: HttpClient,
    base_url: String,
}

impl YahooFinanceClient {
    const USER_AGENT: &'static str = concat!("finboard/", env!("CARGO_PKG_VERSION"));

    /// Create a client against `base_url` (normally https://query1.finance.yahoo.com)
    pub fn with_base_url(base_url: String) -> Self {
        let http_client = HttpClient::builder()
            .user_agent(Self::USER_AGENT)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET /v8/finance/chart/{symbol}?range={period}&interval={5m|1d}
    pub async fn get_chart(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<QuoteRecord>, QuoteError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting Yahoo chart for {} ({})", symbol, period);

        let response = self
            .http_client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", interval_for(period))])
            .send()
            .await?;

        // Yahoo reports unknown symbols as 404 with a JSON error body
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() && !body.trim_start().starts_with('{') {
            warn!("Yahoo chart request failed with status {}", status);
            return Err(QuoteError::Provider(format!("HTTP status {}", status)));
        }
        parse_chart(&body, period)
    }
}

pub fn interval_for(period: Period) -> &'static str {
    if period.is_intraday() {
        "5m"
    } else {
        "1d"
    }
}

/// Turn a chart response body into ascending quote records, dropping incomplete rows
pub fn parse_chart(body: &str, period: Period) -> Result<Vec<QuoteRecord>, QuoteError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| QuoteError::Parse(e.to_string()))?;
    let chart = response
        .chart
        .ok_or_else(|| QuoteError::Parse("missing chart object".to_string()))?;

    if let Some(error) = chart.error {
        let message = error.message();
        warn!("Yahoo Finance reported: {}", message);
        return Err(QuoteError::Provider(message));
    }

    let Some(result) = chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(QuoteError::NoData(period));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .and_then(|i| i.quote)
        .and_then(|mut q| q.pop())
        .unwrap_or_default();

    let mut records = Vec::with_capacity(timestamps.len());
    for (idx, ts) in timestamps.iter().enumerate() {
        let Some([open, high, low, close, volume]) = quote.row(idx) else {
            continue;
        };
        let timestamp = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| QuoteError::Parse(format!("invalid timestamp {}", ts)))?
            .naive_utc();
        records.push(QuoteRecord {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if records.is_empty() {
        return Err(QuoteError::NoData(period));
    }
    records.sort_by_key(|r| r.timestamp);
    Ok(records)
}
