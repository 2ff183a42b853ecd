use serde::Deserialize;
use std::collections::BTreeMap;

/// One bar of an Alpha Vantage time series; the API sends numbers as strings
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// Body of TIME_SERIES_INTRADAY / TIME_SERIES_DAILY responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeriesResponse {
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    /// Throttling notice sent instead of data
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Time Series (5min)")]
    pub intraday: Option<BTreeMap<String, SeriesBar>>,
    #[serde(rename = "Time Series (Daily)")]
    pub daily: Option<BTreeMap<String, SeriesBar>>,
}

impl TimeSeriesResponse {
    /// The first provider-reported message, if any
    pub fn provider_message(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or(self.note.as_deref())
            .or(self.information.as_deref())
    }
}
