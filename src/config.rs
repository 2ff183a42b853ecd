use thiserror::Error;

const DEFAULT_ALPHAVANTAGE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_CHART_WIDTH: u32 = 1024;
const DEFAULT_CHART_HEIGHT: u32 = 576;

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} not set")]
    MissingVar(&'static str),
    #[error("Invalid value for {name}: '{value}'")]
    InvalidVar { name: &'static str, value: String },
}

/// Which quote provider backs the stock panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    AlphaVantage,
    Yahoo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::AlphaVantage => "alphavantage",
            ProviderKind::Yahoo => "yahoo",
        }
    }
}

/// Chart canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

/// Runtime configuration read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub provider: ProviderKind,
    pub alphavantage_api_key: Option<String>,
    pub alphavantage_base_url: String,
    pub yahoo_base_url: String,
    pub chart_size: ChartSize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::MissingVar("DISCORD_TOKEN"))?;

        let provider = match get("QUOTE_PROVIDER").map(|v| v.trim().to_lowercase()) {
            None => ProviderKind::AlphaVantage,
            Some(v) if v == "alphavantage" || v == "alpha_vantage" || v == "av" => {
                ProviderKind::AlphaVantage
            }
            Some(v) if v == "yahoo" => ProviderKind::Yahoo,
            Some(v) => {
                return Err(ConfigError::InvalidVar {
                    name: "QUOTE_PROVIDER",
                    value: v,
                })
            }
        };

        let alphavantage_api_key = get("ALPHAVANTAGE_API_KEY");
        if provider == ProviderKind::AlphaVantage && alphavantage_api_key.is_none() {
            return Err(ConfigError::MissingVar("ALPHAVANTAGE_API_KEY"));
        }

        let parse_dimension = |name: &'static str, default: u32| -> Result<u32, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(v) => v
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| (200..=4096).contains(n))
                    .ok_or(ConfigError::InvalidVar { name, value: v }),
            }
        };

        Ok(Self {
            discord_token,
            provider,
            alphavantage_api_key,
            alphavantage_base_url: get("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ALPHAVANTAGE_URL.to_string()),
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_URL.to_string()),
            chart_size: ChartSize {
                width: parse_dimension("CHART_WIDTH", DEFAULT_CHART_WIDTH)?,
                height: parse_dimension("CHART_HEIGHT", DEFAULT_CHART_HEIGHT)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_alphavantage() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("ALPHAVANTAGE_API_KEY", "key"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderKind::AlphaVantage);
        assert_eq!(config.alphavantage_api_key.as_deref(), Some("key"));
        assert_eq!(config.alphavantage_base_url, DEFAULT_ALPHAVANTAGE_URL);
        assert_eq!(config.chart_size, ChartSize::default());
    }

    #[test]
    fn test_missing_token() {
        let err = Config::from_lookup(lookup(&[("ALPHAVANTAGE_API_KEY", "key")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("DISCORD_TOKEN"));
    }

    #[test]
    fn test_alphavantage_requires_key() {
        let err = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "token")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("ALPHAVANTAGE_API_KEY"));
    }

    #[test]
    fn test_yahoo_needs_no_key() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("QUOTE_PROVIDER", "Yahoo"),
            ("CHART_WIDTH", "800"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Yahoo);
        assert_eq!(config.chart_size.width, 800);
        assert_eq!(config.chart_size.height, DEFAULT_CHART_HEIGHT);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("QUOTE_PROVIDER", "bloomberg"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "QUOTE_PROVIDER", .. }));

        let err = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("QUOTE_PROVIDER", "yahoo"),
            ("CHART_HEIGHT", "tall"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "CHART_HEIGHT", .. }));
    }
}
