use serde::Deserialize;

/// Body of GET /v8/finance/chart/{symbol}
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Option<Chart>,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl ChartError {
    pub fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Option<Vec<QuoteSeries>>,
}

/// Parallel OHLCV arrays; Yahoo leaves gaps as nulls
#[derive(Debug, Default, Deserialize)]
pub struct QuoteSeries {
    pub open: Option<Vec<Option<f64>>>,
    pub high: Option<Vec<Option<f64>>>,
    pub low: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
    pub volume: Option<Vec<Option<f64>>>,
}

impl QuoteSeries {
    fn value_at(series: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
        series.as_ref().and_then(|v| v.get(idx)).and_then(|v| *v)
    }

    /// OHLCV at `idx`, or `None` when any value is missing
    pub fn row(&self, idx: usize) -> Option<[f64; 5]> {
        Some([
            Self::value_at(&self.open, idx)?,
            Self::value_at(&self.high, idx)?,
            Self::value_at(&self.low, idx)?,
            Self::value_at(&self.close, idx)?,
            Self::value_at(&self.volume, idx)?,
        ])
    }
}
