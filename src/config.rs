use std::env;

use url::Url;

use crate::coordinator::{CoordinatorConfig, DEFAULT_CHAIN_LABEL};
use crate::window::{DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE};

const DEFAULT_WS_URL: &str = "ws://localhost:8546";
const DEFAULT_ETHER_PRICE: f64 = 300.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub eth_ws_url: String,
    pub window_size: u64,
    /// Display-currency price of one ether, supplied externally.
    pub ether_price: f64,
    pub http_bind_addr: String,
    pub default_chain_label: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid ETH_WS_URL {0:?}: expected ws:// or wss://")]
    InvalidWsUrl(String),
    #[error("invalid WINDOW_SIZE {0:?}: expected an integer between 1 and 1024")]
    InvalidWindowSize(String),
    #[error("invalid ETHER_PRICE {0:?}: expected a non-negative number")]
    InvalidEtherPrice(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let eth_ws_url = parse_ws_url(
            env::var("ETH_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),
        )?;
        let window_size = env::var("WINDOW_SIZE")
            .ok()
            .map(parse_window_size)
            .transpose()?
            .unwrap_or(DEFAULT_WINDOW_SIZE);
        let ether_price = env::var("ETHER_PRICE")
            .ok()
            .map(parse_ether_price)
            .transpose()?
            .unwrap_or(DEFAULT_ETHER_PRICE);
        let http_bind_addr = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let default_chain_label = env::var("DEFAULT_CHAIN_LABEL")
            .ok()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAIN_LABEL.to_string());

        Ok(Self {
            eth_ws_url,
            window_size,
            ether_price,
            http_bind_addr,
            default_chain_label,
        })
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            window_size: self.window_size,
            default_chain_label: self.default_chain_label.clone(),
        }
    }
}

fn parse_ws_url(raw: String) -> Result<String, ConfigError> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => Ok(raw.trim().to_string()),
        _ => Err(ConfigError::InvalidWsUrl(raw)),
    }
}

fn parse_window_size(raw: String) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(size) if (1..=MAX_WINDOW_SIZE).contains(&size) => Ok(size),
        _ => Err(ConfigError::InvalidWindowSize(raw)),
    }
}

fn parse_ether_price(raw: String) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ConfigError::InvalidEtherPrice(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_requires_websocket_scheme() {
        assert_eq!(
            parse_ws_url("ws://localhost:8546".to_string()),
            Ok("ws://localhost:8546".to_string())
        );
        assert!(parse_ws_url(" wss://node.example/ws ".to_string()).is_ok());
        assert!(matches!(
            parse_ws_url("http://localhost:8545".to_string()),
            Err(ConfigError::InvalidWsUrl(_))
        ));
        assert!(parse_ws_url("not a url".to_string()).is_err());
    }

    #[test]
    fn window_size_must_be_positive_and_bounded() {
        assert_eq!(parse_window_size("25".to_string()), Ok(25));
        assert_eq!(parse_window_size("1024".to_string()), Ok(MAX_WINDOW_SIZE));
        assert!(parse_window_size("0".to_string()).is_err());
        assert!(parse_window_size("1025".to_string()).is_err());
        assert_eq!(
            parse_window_size("1000000000".to_string()),
            Err(ConfigError::InvalidWindowSize("1000000000".to_string()))
        );
        assert!(parse_window_size("-3".to_string()).is_err());
        assert!(parse_window_size("ten".to_string()).is_err());
    }

    #[test]
    fn ether_price_must_be_finite_and_non_negative() {
        assert_eq!(parse_ether_price("300".to_string()), Ok(300.0));
        assert_eq!(parse_ether_price("1234.5".to_string()), Ok(1234.5));
        assert!(parse_ether_price("-1".to_string()).is_err());
        assert!(parse_ether_price("NaN".to_string()).is_err());
        assert!(parse_ether_price("inf".to_string()).is_err());
    }
}
