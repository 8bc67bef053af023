use gatebridge_core::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_HOST: &str = "https://api.gateio.ws/api/v4";

/// Connection settings for Gate.io APIv4.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Base URL including the `/api/v4` prefix.
    pub host: String,
    /// Fallback API key for requests that bring no credentials.
    pub key: Option<String>,
    pub secret: Option<String>,
    /// Fallback proxy URL (`http://`, `https://` or `socks5://`).
    pub proxy: Option<String>,
    pub timeout_secs: u64,
    /// Time allowed to establish a connection, for every endpoint.
    pub connect_timeout_secs: u64,
    /// Candlestick requests fail faster than the rest.
    pub candlestick_timeout_secs: u64,
}

impl GateConfig {
    /// The configured key pair, if both halves are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.key.as_deref(), self.secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(Credentials::new(key, secret))
            }
            _ => None,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            key: None,
            secret: None,
            proxy: None,
            timeout_secs: 30,
            connect_timeout_secs: 5,
            candlestick_timeout_secs: 5,
        }
    }
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("host", &self.host)
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("proxy", &self.proxy)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("candlestick_timeout_secs", &self.candlestick_timeout_secs)
            .finish()
    }
}
