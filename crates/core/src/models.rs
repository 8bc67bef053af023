use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// Latest price snapshot for one currency pair.
///
/// Prices are kept as the exchange sent them (decimal-as-text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub currency_pair: String,
    pub last: String,
    pub lowest_ask: String,
    pub highest_bid: String,
}

/// A single ask level: `[price, amount]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ask {
    pub price: String,
    pub amount: String,
}

/// A single bid level: `[price, amount]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub price: String,
    pub amount: String,
}

/// Order book snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Snapshot id, only present when the book was requested `with_id`.
    pub id: Option<i64>,
    /// Response generation time in milliseconds.
    pub current: i64,
    /// Last time the book changed, in milliseconds.
    pub update: i64,
    pub asks: Vec<Ask>,
    pub bids: Vec<Bid>,
}

/// One candlestick window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candlestick {
    pub unix_timestamp: String,
    pub trade_volume_in_quote: f64,
    pub close_price: String,
    pub highest_price: String,
    pub lowest_price: String,
    pub open_price: String,
    pub base_currency_amount: f64,
    pub window_is_closed: bool,
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// Balance of a single account type, converted into the requested currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub currency: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealised_pnl: Option<String>,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            currency: String::new(),
            amount: "0".to_string(),
            unrealised_pnl: None,
        }
    }
}

/// Aggregate of all account types.
pub type Total = Balance;

/// Per-account-type balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Details {
    pub spot: Balance,
    pub margin: Balance,
    pub cross_margin: Balance,
    pub futures: Balance,
    pub delivery: Balance,
    pub finance: Balance,
    pub quant: Balance,
    pub warrant: Balance,
    pub cbbc: Balance,
    /// Account types not known at build time.
    #[serde(flatten)]
    pub other: BTreeMap<String, Balance>,
}

impl Details {
    /// Slot for a known account type, `None` for anything else.
    pub fn slot_mut(&mut self, account: &str) -> Option<&mut Balance> {
        match account {
            "spot" => Some(&mut self.spot),
            "margin" => Some(&mut self.margin),
            "cross_margin" => Some(&mut self.cross_margin),
            "futures" => Some(&mut self.futures),
            "delivery" => Some(&mut self.delivery),
            "finance" => Some(&mut self.finance),
            "quant" => Some(&mut self.quant),
            "warrant" => Some(&mut self.warrant),
            "cbbc" => Some(&mut self.cbbc),
            _ => None,
        }
    }
}

/// Total estimated balance of the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalBalance {
    pub details: Details,
    pub total: Total,
}

// ---------------------------------------------------------------------------
// Pass-through exchange objects
// ---------------------------------------------------------------------------

/// Trading rules of a spot currency pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyPair {
    pub id: String,
    pub base: String,
    pub quote: String,
    pub fee: String,
    pub min_base_amount: Option<String>,
    pub min_quote_amount: Option<String>,
    pub max_base_amount: Option<String>,
    pub max_quote_amount: Option<String>,
    pub amount_precision: Option<i32>,
    pub precision: Option<i32>,
    pub trade_status: String,
    pub sell_start: Option<i64>,
    pub buy_start: Option<i64>,
}

/// A spot order as reported by the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: String,
    pub text: String,
    pub create_time: String,
    pub update_time: String,
    pub create_time_ms: Option<i64>,
    pub update_time_ms: Option<i64>,
    pub status: String,
    pub currency_pair: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub account: String,
    pub side: String,
    pub amount: String,
    pub price: String,
    pub time_in_force: String,
    pub left: String,
    pub filled_total: String,
    pub fee: String,
    pub fee_currency: String,
    pub avg_deal_price: Option<String>,
}

/// Spot balance of one currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotAccount {
    pub currency: String,
    pub available: String,
    pub locked: String,
    pub update_id: Option<i64>,
}

/// One spot account ledger entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountBookEntry {
    pub id: String,
    pub time: i64,
    pub currency: String,
    pub change: String,
    pub balance: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub text: String,
}

/// A public market trade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trade {
    pub id: String,
    pub create_time: String,
    pub create_time_ms: String,
    pub currency_pair: String,
    pub side: String,
    pub role: Option<String>,
    pub amount: String,
    pub price: String,
    pub order_id: Option<String>,
    pub fee: Option<String>,
    pub fee_currency: Option<String>,
}

/// Open orders of one currency pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOrders {
    pub currency_pair: String,
    pub total: i32,
    pub orders: Vec<Order>,
}
