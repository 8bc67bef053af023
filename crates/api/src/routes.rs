use crate::error::ApiError;
use crate::state::{AppState, NoParams, Payload, Security};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gatebridge_core::*;
use serde::Deserialize;
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Spot market data
        .route("/spot/currency_pair", post(currency_pair))
        .route("/spot/currency_pairs", post(currency_pairs))
        .route("/spot/tickers", post(tickers))
        .route("/spot/order_book", post(order_book))
        .route("/spot/trades", post(trades))
        .route("/spot/candlesticks", post(candlesticks))
        // Spot trading
        .route("/spot/orders", post(orders))
        .route("/spot/cancel_orders", post(cancel_orders))
        .route("/spot/all_open_orders", post(all_open_orders))
        .route("/spot/spot_accounts", post(spot_accounts))
        .route("/spot/spot_account_book", post(spot_account_book))
        // Wallet
        .route("/wallet/total_balance", post(total_balance))
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PairQuery {
    currency_pair: String,
}

#[derive(Deserialize)]
struct OptionalPairQuery {
    currency_pair: Option<String>,
}

#[derive(Deserialize)]
struct OrdersQuery {
    currency_pair: String,
    status: OrderStatus,
}

#[derive(Deserialize)]
struct CurrencyQuery {
    currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "exchange": state.config.gate.host,
    }))
}

// ---------------------------------------------------------------------------
// Spot market data
// ---------------------------------------------------------------------------

async fn currency_pair(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PairQuery>,
    Json(payload): Json<Payload<NoParams>>,
) -> ApiResult<CurrencyPair> {
    let session = state.session(payload.security.unwrap_or_default())?;
    Ok(Json(session.currency_pair(&q.currency_pair).await?))
}

async fn currency_pairs(
    State(state): State<Arc<AppState>>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<CurrencyPair>> {
    let session = state.session(security)?;
    Ok(Json(session.list_currency_pairs().await?))
}

async fn tickers(
    State(state): State<Arc<AppState>>,
    Query(q): Query<OptionalPairQuery>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<Ticker>> {
    let session = state.session(security)?;
    Ok(Json(session.list_tickers(q.currency_pair.as_deref()).await?))
}

async fn order_book(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PairQuery>,
    Json(payload): Json<Payload<OrderBookQuery>>,
) -> ApiResult<OrderBook> {
    let session = state.session(payload.security.unwrap_or_default())?;
    Ok(Json(session.order_book(&q.currency_pair, &payload.data).await?))
}

async fn trades(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PairQuery>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<Trade>> {
    let session = state.session(security)?;
    Ok(Json(session.list_trades(&q.currency_pair).await?))
}

async fn candlesticks(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PairQuery>,
    Json(payload): Json<Payload<CandlestickQuery>>,
) -> ApiResult<Vec<Candlestick>> {
    state.check_candlestick_quota()?;
    let session = state.session(payload.security.unwrap_or_default())?;
    Ok(Json(
        session.list_candlesticks(&q.currency_pair, &payload.data).await?,
    ))
}

// ---------------------------------------------------------------------------
// Spot trading
// ---------------------------------------------------------------------------

async fn orders(
    State(state): State<Arc<AppState>>,
    Query(q): Query<OrdersQuery>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<Order>> {
    let session = state.session(security)?;
    Ok(Json(session.list_orders(&q.currency_pair, q.status).await?))
}

async fn cancel_orders(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PairQuery>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<Order>> {
    let session = state.session(security)?;
    let cancelled = session.cancel_orders(&q.currency_pair).await?;
    tracing::info!(
        currency_pair = %q.currency_pair,
        count = cancelled.len(),
        "Cancelled open orders"
    );
    Ok(Json(cancelled))
}

async fn all_open_orders(
    State(state): State<Arc<AppState>>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<OpenOrders>> {
    let session = state.session(security)?;
    Ok(Json(session.list_all_open_orders().await?))
}

async fn spot_accounts(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CurrencyQuery>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<SpotAccount>> {
    let session = state.session(security)?;
    Ok(Json(session.list_spot_accounts(q.currency.as_deref()).await?))
}

async fn spot_account_book(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CurrencyQuery>,
    Json(security): Json<Security>,
) -> ApiResult<Vec<AccountBookEntry>> {
    let session = state.session(security)?;
    Ok(Json(
        session.list_spot_account_book(q.currency.as_deref()).await?,
    ))
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

async fn total_balance(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CurrencyQuery>,
    Json(security): Json<Security>,
) -> ApiResult<TotalBalance> {
    let session = state.session(security)?;
    Ok(Json(session.total_balance(q.currency.as_deref()).await?))
}
