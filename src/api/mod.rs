//! Quote providers behind the stock panel

pub mod alphavantage;
pub mod yahoo;

use thiserror::Error;

use crate::config::{Config, ConfigError, ProviderKind};
use crate::models::{Period, QuoteRecord};

pub use alphavantage::AlphaVantageClient;
pub use yahoo::YahooFinanceClient;

/// Why a quote request produced no table
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The provider answered with an error indicator
    #[error("provider error: {0}")]
    Provider(String),
    /// The provider answered without any rows for the period
    #[error("no data returned for period {0}")]
    NoData(Period),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// The configured quote provider
#[derive(Clone)]
pub enum QuoteSource {
    AlphaVantage(AlphaVantageClient),
    Yahoo(YahooFinanceClient),
}

impl QuoteSource {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match config.provider {
            ProviderKind::AlphaVantage => {
                let api_key = config
                    .alphavantage_api_key
                    .clone()
                    .ok_or(ConfigError::MissingVar("ALPHAVANTAGE_API_KEY"))?;
                Ok(QuoteSource::AlphaVantage(AlphaVantageClient::with_base_url(
                    api_key,
                    config.alphavantage_base_url.clone(),
                )))
            }
            ProviderKind::Yahoo => Ok(QuoteSource::Yahoo(YahooFinanceClient::with_base_url(
                config.yahoo_base_url.clone(),
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuoteSource::AlphaVantage(_) => "Alpha Vantage",
            QuoteSource::Yahoo(_) => "Yahoo Finance",
        }
    }

    /// Secret that must never reach a user-visible message
    pub fn secret(&self) -> Option<&str> {
        match self {
            QuoteSource::AlphaVantage(client) => Some(client.api_key()),
            QuoteSource::Yahoo(_) => None,
        }
    }

    /// Fetch the OHLCV history for `symbol` over `period`, ascending by time
    pub async fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<QuoteRecord>, QuoteError> {
        match self {
            QuoteSource::AlphaVantage(client) => client.get_time_series(symbol, period).await,
            QuoteSource::Yahoo(client) => client.get_chart(symbol, period).await,
        }
    }
}
