//! Router tests against a stub exchange.
//!
//! Every request goes through the full axum stack (extractors, error
//! mapping, rate limiting) with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gatebridge_api::{build_router, AppConfig, AppState};
use gatebridge_core::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ============================================================================
// Stub exchange
// ============================================================================

#[derive(Default)]
struct StubExchange {
    /// Access of the most recent session.
    last_access: Mutex<Option<Access>>,
    /// Order book query of the most recent call.
    last_book_query: Arc<Mutex<Option<OrderBookQuery>>>,
}

impl Exchange for StubExchange {
    fn session(&self, access: Access) -> Result<Box<dyn ExchangeSession>, ExchangeError> {
        *self.last_access.lock().unwrap() = Some(access.clone());
        Ok(Box::new(StubSession {
            access,
            last_book_query: self.last_book_query.clone(),
        }))
    }
}

struct StubSession {
    access: Access,
    last_book_query: Arc<Mutex<Option<OrderBookQuery>>>,
}

impl StubSession {
    fn require_credentials(&self) -> Result<(), ExchangeError> {
        self.access
            .credentials
            .as_ref()
            .map(|_| ())
            .ok_or(ExchangeError::MissingCredentials)
    }
}

#[async_trait]
impl ExchangeSession for StubSession {
    async fn currency_pair(&self, currency_pair: &str) -> Result<CurrencyPair, ExchangeError> {
        if currency_pair == "NOPE_USDT" {
            return Err(ExchangeError::Api {
                status: 400,
                label: "INVALID_CURRENCY_PAIR".to_string(),
                message: "Invalid currency pair NOPE_USDT".to_string(),
            });
        }
        Ok(CurrencyPair {
            id: currency_pair.to_string(),
            base: "BTC".to_string(),
            quote: "USDT".to_string(),
            trade_status: "tradable".to_string(),
            ..Default::default()
        })
    }

    async fn list_currency_pairs(&self) -> Result<Vec<CurrencyPair>, ExchangeError> {
        Ok(vec![self.currency_pair("BTC_USDT").await?])
    }

    async fn cancel_orders(&self, currency_pair: &str) -> Result<Vec<Order>, ExchangeError> {
        self.require_credentials()?;
        Ok(vec![Order {
            id: "1".to_string(),
            currency_pair: currency_pair.to_string(),
            status: "cancelled".to_string(),
            ..Default::default()
        }])
    }

    async fn list_orders(
        &self,
        currency_pair: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.require_credentials()?;
        Ok(vec![Order {
            id: "2".to_string(),
            currency_pair: currency_pair.to_string(),
            status: status.as_str().to_string(),
            ..Default::default()
        }])
    }

    async fn list_spot_accounts(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<SpotAccount>, ExchangeError> {
        self.require_credentials()?;
        Ok(vec![SpotAccount {
            currency: currency.unwrap_or("USDT").to_string(),
            available: "10".to_string(),
            locked: "0".to_string(),
            update_id: Some(1),
        }])
    }

    async fn list_spot_account_book(
        &self,
        _currency: Option<&str>,
    ) -> Result<Vec<AccountBookEntry>, ExchangeError> {
        self.require_credentials()?;
        Ok(Vec::new())
    }

    async fn list_trades(&self, currency_pair: &str) -> Result<Vec<Trade>, ExchangeError> {
        Ok(vec![Trade {
            id: "7".to_string(),
            currency_pair: currency_pair.to_string(),
            side: "sell".to_string(),
            amount: "0.5".to_string(),
            price: "50000".to_string(),
            ..Default::default()
        }])
    }

    async fn list_tickers(
        &self,
        currency_pair: Option<&str>,
    ) -> Result<Vec<Ticker>, ExchangeError> {
        let payload = json!([{
            "currency_pair": currency_pair.unwrap_or("BTC_USDT"),
            "last": "50000",
            "lowest_ask": "50010",
            "highest_bid": "49990"
        }]);
        Ok(ParseTickers::new(payload).parse()?)
    }

    async fn order_book(
        &self,
        _currency_pair: &str,
        query: &OrderBookQuery,
    ) -> Result<OrderBook, ExchangeError> {
        *self.last_book_query.lock().unwrap() = Some(query.clone());
        let payload = json!({
            "id": 1,
            "current": 100,
            "update": 101,
            "asks": [["50000", "1.0"]],
            "bids": [["49900", "2.0"]]
        });
        Ok(ParseOrderBook::new(payload).parse()?)
    }

    async fn list_all_open_orders(&self) -> Result<Vec<OpenOrders>, ExchangeError> {
        self.require_credentials()?;
        Ok(Vec::new())
    }

    async fn list_candlesticks(
        &self,
        currency_pair: &str,
        _query: &CandlestickQuery,
    ) -> Result<Vec<Candlestick>, ExchangeError> {
        // Broken vendor row for one pair, to exercise the payload error path.
        let payload = if currency_pair == "BROKEN_USDT" {
            json!([["1630000000", 10.0, "50000"]])
        } else {
            json!([["1630000000", 10.0, "50000", "51000", "49000", "49500", 0.5, true]])
        };
        Ok(ParseCandlesticks::new(payload).parse()?)
    }

    async fn total_balance(&self, _currency: Option<&str>) -> Result<TotalBalance, ExchangeError> {
        self.require_credentials()?;
        let payload = json!({"details": {}, "total": {}});
        Ok(ParseTotalBalance::new(payload).parse()?)
    }
}

// ============================================================================
// Test Fixtures
// ============================================================================

fn app_with(config: AppConfig) -> (Router, Arc<StubExchange>) {
    let exchange = Arc::new(StubExchange::default());
    let state = Arc::new(AppState::new(config, exchange.clone()));
    (build_router(state), exchange)
}

fn app() -> (Router, Arc<StubExchange>) {
    app_with(AppConfig::default())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_tickers_normalized() {
    let (app, _) = app();
    let (status, json) = send(app, post("/spot/tickers?currency_pair=ETH_USDT", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([{
            "currency_pair": "ETH_USDT",
            "last": "50000",
            "lowest_ask": "50010",
            "highest_bid": "49990"
        }])
    );
}

#[tokio::test]
async fn test_order_book_forwards_data() {
    let (app, exchange) = app();
    let body = json!({"data": {"limit": 10, "with_id": true}});
    let (status, json) = send(app, post("/spot/order_book?currency_pair=BTC_USDT", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["asks"][0]["price"], "50000");
    assert_eq!(json["bids"][0]["amount"], "2.0");

    let query = exchange.last_book_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.limit, Some(10));
    assert_eq!(query.with_id, Some(true));
    assert_eq!(query.interval, None);
}

#[tokio::test]
async fn test_candlesticks_shape() {
    let (app, _) = app();
    let (status, json) = send(
        app,
        post("/spot/candlesticks?currency_pair=BTC_USDT", json!({"data": {"interval": "1m"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["open_price"], "49500");
    assert_eq!(json[0]["trade_volume_in_quote"], 10.0);
    assert_eq!(json[0]["window_is_closed"], true);
}

#[tokio::test]
async fn test_candlesticks_rate_limited() {
    let mut config = AppConfig::default();
    config.rate_limit.candlesticks_per_second = 1;
    let (app, _) = app_with(config);

    let (first, _) = send(
        app.clone(),
        post("/spot/candlesticks?currency_pair=BTC_USDT", json!({})),
    )
    .await;
    assert_eq!(first, StatusCode::OK);

    let (second, json) = send(
        app,
        post("/spot/candlesticks?currency_pair=BTC_USDT", json!({})),
    )
    .await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "TOO_MANY_REQUESTS");
}

#[tokio::test]
async fn test_invalid_payload_shape_is_bad_gateway() {
    let (app, _) = app();
    let (status, json) = send(
        app,
        post("/spot/candlesticks?currency_pair=BROKEN_USDT", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "INVALID_PAYLOAD_SHAPE");
}

#[tokio::test]
async fn test_total_balance_requires_credentials() {
    let (app, _) = app();
    let (status, json) = send(app, post("/wallet/total_balance", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "MISSING_CREDENTIALS");
}

#[tokio::test]
async fn test_total_balance_with_credentials() {
    let (app, exchange) = app();
    let body = json!({"key": "k", "secret": "s", "proxy": "http://127.0.0.1:8888"});
    let (status, json) = send(app, post("/wallet/total_balance?currency=USDT", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"]["amount"], "0");
    assert_eq!(json["details"]["spot"]["currency"], "");

    let access = exchange.last_access.lock().unwrap().clone().unwrap();
    assert_eq!(access.credentials, Some(Credentials::new("k", "s")));
    assert_eq!(access.proxy.as_deref(), Some("http://127.0.0.1:8888"));
}

#[tokio::test]
async fn test_half_credentials_rejected() {
    let (app, _) = app();
    let (status, json) = send(app, post("/spot/spot_accounts", json!({"key": "k"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INCOMPLETE_CREDENTIALS");
}

#[tokio::test]
async fn test_orders_status_filter() {
    let (app, _) = app();
    let body = json!({"key": "k", "secret": "s"});
    let (status, json) = send(
        app.clone(),
        post("/spot/orders?currency_pair=BTC_USDT&status=finished", body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["status"], "finished");

    let (status, _) = send(
        app,
        post("/spot/orders?currency_pair=BTC_USDT&status=pending", body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vendor_error_passes_through() {
    let (app, _) = app();
    let (status, json) = send(
        app,
        post("/spot/currency_pair?currency_pair=NOPE_USDT", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_CURRENCY_PAIR");
}

#[tokio::test]
async fn test_currency_pair_with_payload_security() {
    let (app, exchange) = app();
    let body = json!({"security": {"key": "k", "secret": "s"}});
    let (status, json) = send(app, post("/spot/currency_pair?currency_pair=BTC_USDT", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "BTC_USDT");

    let access = exchange.last_access.lock().unwrap().clone().unwrap();
    assert!(access.credentials.is_some());
}

#[tokio::test]
async fn test_cancel_orders() {
    let (app, _) = app();
    let body = json!({"key": "k", "secret": "s"});
    let (status, json) = send(app, post("/spot/cancel_orders?currency_pair=BTC_USDT", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["status"], "cancelled");
    assert_eq!(json[0]["type"], "");
}

#[tokio::test]
async fn test_public_trades() {
    let (app, _) = app();
    let (status, json) = send(app, post("/spot/trades?currency_pair=BTC_USDT", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["price"], "50000");
}
