use async_trait::async_trait;
use chrono::Utc;
use gatebridge_core::*;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::GateConfig;
use crate::signing::sign_request;

/// Gate.io APIv4 exchange.
///
/// Holds one shared HTTP client; every request gets its own
/// [`GateSession`] bound to the credentials and proxy it brought.
pub struct GateExchange {
    config: GateConfig,
    http: Client,
    base: Url,
}

impl GateExchange {
    pub fn new(config: GateConfig) -> Result<Self, ExchangeError> {
        let base = Url::parse(&config.host)
            .map_err(|e| ExchangeError::Config(format!("Invalid host '{}': {}", config.host, e)))?;
        let http = build_http_client(&config, config.proxy.as_deref())?;
        info!(host = %config.host, "Gate.io client ready");
        Ok(Self { config, http, base })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

impl Exchange for GateExchange {
    fn session(&self, access: Access) -> Result<Box<dyn ExchangeSession>, ExchangeError> {
        let credentials = access.credentials.or_else(|| self.config.credentials());

        // A proxy different from the configured one needs its own client.
        let http = match access.proxy.as_deref() {
            Some(proxy) if Some(proxy) != self.config.proxy.as_deref() => {
                debug!(proxy = %proxy, "Building client for request proxy");
                build_http_client(&self.config, Some(proxy))?
            }
            _ => self.http.clone(),
        };

        Ok(Box::new(GateSession {
            http,
            base: self.base.clone(),
            credentials,
            timeout: Duration::from_secs(self.config.timeout_secs),
            candlestick_timeout: Duration::from_secs(self.config.candlestick_timeout_secs),
        }))
    }
}

fn build_http_client(config: &GateConfig, proxy: Option<&str>) -> Result<Client, ExchangeError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| ExchangeError::Config(format!("Invalid proxy '{}': {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| ExchangeError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Whether an endpoint needs a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Public,
    Signed,
}

/// Error body returned by APIv4 on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    label: String,
    #[serde(default)]
    message: String,
}

/// One request's view of the exchange.
pub struct GateSession {
    http: Client,
    base: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
    candlestick_timeout: Duration,
}

impl GateSession {
    fn url(&self, endpoint: &str, query: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{}", self.base.path().trim_end_matches('/'), endpoint);
        url.set_path(&path);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        auth: Auth,
        timeout: Option<Duration>,
    ) -> Result<Value, ExchangeError> {
        let url = self.url(endpoint, query);
        let mut request = self.http.request(method.clone(), url.clone());

        if auth == Auth::Signed {
            let credentials = self
                .credentials
                .as_ref()
                .ok_or(ExchangeError::MissingCredentials)?;
            let headers = sign_request(
                credentials,
                method.as_str(),
                url.path(),
                url.query().unwrap_or(""),
                "",
                Utc::now().timestamp(),
            )?;
            request = request
                .header("KEY", headers.key)
                .header("Timestamp", headers.timestamp)
                .header("SIGN", headers.sign);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        debug!(method = %method, endpoint = %endpoint, "Calling exchange");
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExchangeError::Timeout(timeout.unwrap_or(self.timeout).as_secs())
                } else {
                    ExchangeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = api_error(status, &body);
            warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                error = %err,
                "Exchange returned an error"
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            ExchangeError::Payload(ParseError::invalid_shape(
                endpoint,
                "JSON document",
                e.to_string(),
            ))
        })
    }

    async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        auth: Auth,
    ) -> Result<Value, ExchangeError> {
        self.call(Method::GET, endpoint, query, auth, None).await
    }
}

fn api_error(status: StatusCode, body: &str) -> ExchangeError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ExchangeError::Api {
            status: status.as_u16(),
            label: parsed.label,
            message: parsed.message,
        },
        Err(_) => ExchangeError::Api {
            status: status.as_u16(),
            label: status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_uppercase()
                .replace(' ', "_"),
            message: body.trim().to_string(),
        },
    }
}

/// Decode a pass-through object with serde.
fn decode<T: DeserializeOwned>(value: Value, endpoint: &str) -> Result<T, ExchangeError> {
    serde_json::from_value(value).map_err(|e| {
        ExchangeError::Payload(ParseError::invalid_shape(
            endpoint,
            "exchange record",
            e.to_string(),
        ))
    })
}

/// Currency pairs end up in the URL path; only `[A-Za-z0-9_]` is allowed.
fn path_pair(currency_pair: &str) -> Result<&str, ExchangeError> {
    let valid = !currency_pair.is_empty()
        && currency_pair
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(currency_pair)
    } else {
        Err(ExchangeError::InvalidInput(format!(
            "Invalid currency pair '{}'",
            currency_pair
        )))
    }
}

fn push_opt<T: ToString>(
    query: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<T>,
) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

#[async_trait]
impl ExchangeSession for GateSession {
    async fn currency_pair(&self, currency_pair: &str) -> Result<CurrencyPair, ExchangeError> {
        let endpoint = format!("/spot/currency_pairs/{}", path_pair(currency_pair)?);
        let value = self.get(&endpoint, &[], Auth::Public).await?;
        decode(value, &endpoint)
    }

    async fn list_currency_pairs(&self) -> Result<Vec<CurrencyPair>, ExchangeError> {
        let value = self.get("/spot/currency_pairs", &[], Auth::Public).await?;
        decode(value, "/spot/currency_pairs")
    }

    async fn cancel_orders(&self, currency_pair: &str) -> Result<Vec<Order>, ExchangeError> {
        let query = [("currency_pair", currency_pair.to_string())];
        let value = self
            .call(Method::DELETE, "/spot/orders", &query, Auth::Signed, None)
            .await?;
        decode(value, "/spot/orders")
    }

    async fn list_orders(
        &self,
        currency_pair: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>, ExchangeError> {
        let query = [
            ("currency_pair", currency_pair.to_string()),
            ("status", status.as_str().to_string()),
        ];
        let value = self.get("/spot/orders", &query, Auth::Signed).await?;
        decode(value, "/spot/orders")
    }

    async fn list_spot_accounts(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<SpotAccount>, ExchangeError> {
        let mut query = Vec::new();
        push_opt(&mut query, "currency", currency);
        let value = self.get("/spot/accounts", &query, Auth::Signed).await?;
        decode(value, "/spot/accounts")
    }

    async fn list_spot_account_book(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<AccountBookEntry>, ExchangeError> {
        let mut query = Vec::new();
        push_opt(&mut query, "currency", currency);
        let value = self.get("/spot/account_book", &query, Auth::Signed).await?;
        decode(value, "/spot/account_book")
    }

    async fn list_trades(&self, currency_pair: &str) -> Result<Vec<Trade>, ExchangeError> {
        let query = [("currency_pair", currency_pair.to_string())];
        let value = self.get("/spot/trades", &query, Auth::Public).await?;
        decode(value, "/spot/trades")
    }

    async fn list_tickers(
        &self,
        currency_pair: Option<&str>,
    ) -> Result<Vec<Ticker>, ExchangeError> {
        let mut query = Vec::new();
        push_opt(&mut query, "currency_pair", currency_pair);
        let value = self.get("/spot/tickers", &query, Auth::Public).await?;
        Ok(ParseTickers::new(value).parse()?)
    }

    async fn order_book(
        &self,
        currency_pair: &str,
        params: &OrderBookQuery,
    ) -> Result<OrderBook, ExchangeError> {
        let mut query = vec![("currency_pair", currency_pair.to_string())];
        push_opt(&mut query, "interval", params.interval.as_deref());
        push_opt(&mut query, "limit", params.limit);
        push_opt(&mut query, "with_id", params.with_id);
        let value = self.get("/spot/order_book", &query, Auth::Public).await?;
        Ok(ParseOrderBook::new(value).parse()?)
    }

    async fn list_all_open_orders(&self) -> Result<Vec<OpenOrders>, ExchangeError> {
        let value = self.get("/spot/open_orders", &[], Auth::Signed).await?;
        decode(value, "/spot/open_orders")
    }

    async fn list_candlesticks(
        &self,
        currency_pair: &str,
        params: &CandlestickQuery,
    ) -> Result<Vec<Candlestick>, ExchangeError> {
        let mut query = vec![("currency_pair", currency_pair.to_string())];
        push_opt(&mut query, "limit", params.limit);
        push_opt(&mut query, "from", params.from);
        push_opt(&mut query, "to", params.to);
        push_opt(&mut query, "interval", params.interval.as_deref());
        let value = self
            .call(
                Method::GET,
                "/spot/candlesticks",
                &query,
                Auth::Public,
                Some(self.candlestick_timeout),
            )
            .await?;
        Ok(ParseCandlesticks::new(value).parse()?)
    }

    async fn total_balance(&self, currency: Option<&str>) -> Result<TotalBalance, ExchangeError> {
        let mut query = Vec::new();
        push_opt(&mut query, "currency", currency);
        let value = self.get("/wallet/total_balance", &query, Auth::Signed).await?;
        Ok(ParseTotalBalance::new(value).parse()?)
    }
}
