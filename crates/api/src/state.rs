use crate::config::AppConfig;
use crate::error::ApiError;
use axum::http::StatusCode;
use gatebridge_core::{Access, Credentials, Exchange, ExchangeSession};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub exchange: Arc<dyn Exchange>,
    /// Process-wide quota for the candlestick route.
    candlestick_limiter: DefaultDirectRateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, exchange: Arc<dyn Exchange>) -> Self {
        let per_second = NonZeroU32::new(config.rate_limit.candlesticks_per_second)
            .unwrap_or(NonZeroU32::MIN);
        Self {
            config,
            exchange,
            candlestick_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    /// Open an exchange session with the credentials a request brought.
    pub fn session(&self, security: Security) -> Result<Box<dyn ExchangeSession>, ApiError> {
        let access = security.into_access()?;
        Ok(self.exchange.session(access)?)
    }

    pub fn check_candlestick_quota(&self) -> Result<(), ApiError> {
        self.candlestick_limiter.check().map_err(|not_until| {
            ApiError::rate_limited(not_until.wait_time_from(DefaultClock::default().now()))
        })
    }
}

/// Credentials a request may carry in its body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Security {
    pub key: Option<String>,
    pub secret: Option<String>,
    pub proxy: Option<String>,
}

impl Security {
    /// Missing credentials fall back to the configured ones later; a key
    /// without a secret (or the reverse) is rejected here.
    pub fn into_access(self) -> Result<Access, ApiError> {
        let key = self.key.filter(|k| !k.is_empty());
        let secret = self.secret.filter(|s| !s.is_empty());
        let credentials = match (key, secret) {
            (Some(key), Some(secret)) => Some(Credentials::new(key, secret)),
            (None, None) => None,
            _ => {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INCOMPLETE_CREDENTIALS",
                    "Both key and secret must be provided",
                ))
            }
        };
        Ok(Access {
            credentials,
            proxy: self.proxy.filter(|p| !p.is_empty()),
        })
    }
}

/// Request body carrying optional credentials and route-specific data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payload<D> {
    #[serde(default)]
    pub security: Option<Security>,
    #[serde(default)]
    pub data: D,
}

/// `data` of routes that take no parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoParams {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_security_has_no_credentials() {
        let access = Security::default().into_access().unwrap();
        assert_eq!(access, Access::default());
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let security = Security {
            key: Some(String::new()),
            secret: Some(String::new()),
            proxy: Some(String::new()),
        };
        assert_eq!(security.into_access().unwrap(), Access::default());
    }

    #[test]
    fn test_half_credentials_rejected() {
        let security = Security {
            key: Some("k".to_string()),
            ..Default::default()
        };
        let err = security.into_access().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.label, "INCOMPLETE_CREDENTIALS");
    }

    #[test]
    fn test_payload_data_defaults() {
        let payload: Payload<gatebridge_core::CandlestickQuery> =
            serde_json::from_str(r#"{"security": {"key": "k", "secret": "s"}}"#).unwrap();
        assert_eq!(payload.data, gatebridge_core::CandlestickQuery::default());
        let access = payload.security.unwrap().into_access().unwrap();
        assert_eq!(access.credentials, Some(Credentials::new("k", "s")));
    }
}
