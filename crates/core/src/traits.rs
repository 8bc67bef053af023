use crate::models::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Payload Parser Trait
// ---------------------------------------------------------------------------

/// A payload did not have the shape its parser expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid payload shape at `{path}`: expected {expected}, found {found}")]
    InvalidShape {
        path: String,
        expected: String,
        found: String,
    },
}

impl ParseError {
    pub fn invalid_shape(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        ParseError::InvalidShape {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Wraps one raw payload and turns it into typed records.
///
/// A parse either fully succeeds or fully fails.
pub trait PayloadParser {
    type Output;

    fn parse(self) -> Result<Self::Output, ParseError>;
}

// ---------------------------------------------------------------------------
// Exchange Boundary
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("API key and secret are required for this endpoint")]
    MissingCredentials,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Exchange did not answer within {0}s")]
    Timeout(u64),
    #[error("Exchange rejected request ({status} {label}): {message}")]
    Api {
        status: u16,
        label: String,
        message: String,
    },
    #[error(transparent)]
    Payload(#[from] ParseError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid request: {0}")]
    InvalidInput(String),
}

/// API key pair used to sign private requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

/// What a single request is allowed to use: its credentials and proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Access {
    pub credentials: Option<Credentials>,
    pub proxy: Option<String>,
}

/// Order status filter for listing orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Finished,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Finished => "finished",
        }
    }
}

/// Optional order book request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookQuery {
    /// Price aggregation precision, e.g. `"0.01"`.
    pub interval: Option<String>,
    /// Maximum depth per side.
    pub limit: Option<u32>,
    /// Ask the exchange to include the snapshot id.
    pub with_id: Option<bool>,
}

/// Optional candlestick request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandlestickQuery {
    /// Window length, e.g. `"1m"`, `"1h"`, `"1d"`.
    pub interval: Option<String>,
    pub limit: Option<u32>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Creates sessions bound to one request's access.
pub trait Exchange: Send + Sync {
    fn session(&self, access: Access) -> Result<Box<dyn ExchangeSession>, ExchangeError>;
}

/// Spot and wallet operations exposed by the facade.
#[async_trait]
pub trait ExchangeSession: Send + Sync {
    /// Trading rules of a single currency pair.
    async fn currency_pair(&self, currency_pair: &str) -> Result<CurrencyPair, ExchangeError>;

    /// Trading rules of every currency pair.
    async fn list_currency_pairs(&self) -> Result<Vec<CurrencyPair>, ExchangeError>;

    /// Cancel every open order of a currency pair.
    async fn cancel_orders(&self, currency_pair: &str) -> Result<Vec<Order>, ExchangeError>;

    async fn list_orders(
        &self,
        currency_pair: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>, ExchangeError>;

    async fn list_spot_accounts(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<SpotAccount>, ExchangeError>;

    async fn list_spot_account_book(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<AccountBookEntry>, ExchangeError>;

    /// Recent public trades.
    async fn list_trades(&self, currency_pair: &str) -> Result<Vec<Trade>, ExchangeError>;

    async fn list_tickers(&self, currency_pair: Option<&str>)
        -> Result<Vec<Ticker>, ExchangeError>;

    async fn order_book(
        &self,
        currency_pair: &str,
        query: &OrderBookQuery,
    ) -> Result<OrderBook, ExchangeError>;

    async fn list_all_open_orders(&self) -> Result<Vec<OpenOrders>, ExchangeError>;

    async fn list_candlesticks(
        &self,
        currency_pair: &str,
        query: &CandlestickQuery,
    ) -> Result<Vec<Candlestick>, ExchangeError>;

    /// Total balance converted into `currency` (exchange default when `None`).
    async fn total_balance(&self, currency: Option<&str>) -> Result<TotalBalance, ExchangeError>;
}
