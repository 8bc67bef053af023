//! Payload normalization.
//!
//! Each parser wraps one decoded exchange payload and maps it into the typed
//! records of [`crate::models`]. Positional payloads are decoded through the
//! layout tables below; values are copied verbatim, nothing is rounded or
//! converted.

use crate::models::*;
use crate::traits::{ParseError, PayloadParser};
use serde_json::{Map, Value};

/// Positions inside one candlestick array, in the exchange's APIv4 order.
pub mod candle_layout {
    pub const ARITY: usize = 8;

    pub const UNIX_TIMESTAMP: usize = 0;
    pub const TRADE_VOLUME_IN_QUOTE: usize = 1;
    pub const CLOSE_PRICE: usize = 2;
    pub const HIGHEST_PRICE: usize = 3;
    pub const LOWEST_PRICE: usize = 4;
    pub const OPEN_PRICE: usize = 5;
    pub const BASE_CURRENCY_AMOUNT: usize = 6;
    pub const WINDOW_IS_CLOSED: usize = 7;
}

/// Positions inside one `[price, amount]` order book level.
pub mod level_layout {
    pub const ARITY: usize = 2;

    pub const PRICE: usize = 0;
    pub const AMOUNT: usize = 1;
}

// ---------------------------------------------------------------------------
// Tickers
// ---------------------------------------------------------------------------

/// `[{currency_pair, last, lowest_ask, highest_bid, ...}, ...]`
#[derive(Debug, Clone)]
pub struct ParseTickers(Value);

impl ParseTickers {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }
}

impl PayloadParser for ParseTickers {
    type Output = Vec<Ticker>;

    fn parse(self) -> Result<Vec<Ticker>, ParseError> {
        let items = as_array(&self.0, "tickers")?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("tickers[{}]", i);
                let obj = as_object(item, &path)?;
                Ok(Ticker {
                    currency_pair: text_field(obj, "currency_pair", &path)?,
                    last: text_field(obj, "last", &path)?,
                    lowest_ask: text_field(obj, "lowest_ask", &path)?,
                    highest_bid: text_field(obj, "highest_bid", &path)?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Order Book
// ---------------------------------------------------------------------------

/// `{id?, current, update, asks: [[price, amount], ...], bids: [...]}`
#[derive(Debug, Clone)]
pub struct ParseOrderBook(Value);

impl ParseOrderBook {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }
}

impl PayloadParser for ParseOrderBook {
    type Output = OrderBook;

    fn parse(self) -> Result<OrderBook, ParseError> {
        let path = "order_book";
        let obj = as_object(&self.0, path)?;

        let id = match optional(obj, "id") {
            Some(v) => Some(integer(v, &format!("{}.id", path))?),
            None => None,
        };
        let current = integer(required(obj, "current", path)?, &format!("{}.current", path))?;
        let update = integer(required(obj, "update", path)?, &format!("{}.update", path))?;

        let asks = levels(required(obj, "asks", path)?, "order_book.asks")?
            .into_iter()
            .map(|(price, amount)| Ask { price, amount })
            .collect();
        let bids = levels(required(obj, "bids", path)?, "order_book.bids")?
            .into_iter()
            .map(|(price, amount)| Bid { price, amount })
            .collect();

        Ok(OrderBook {
            id,
            current,
            update,
            asks,
            bids,
        })
    }
}

fn levels(value: &Value, path: &str) -> Result<Vec<(String, String)>, ParseError> {
    as_array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let level_path = format!("{}[{}]", path, i);
            let fields = positional(level, level_layout::ARITY, &level_path)?;
            Ok((
                text(&fields[level_layout::PRICE], &level_path)?,
                text(&fields[level_layout::AMOUNT], &level_path)?,
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Candlesticks
// ---------------------------------------------------------------------------

/// `[[t, quote_volume, close, high, low, open, base_volume, closed], ...]`
#[derive(Debug, Clone)]
pub struct ParseCandlesticks(Value);

impl ParseCandlesticks {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }
}

impl PayloadParser for ParseCandlesticks {
    type Output = Vec<Candlestick>;

    fn parse(self) -> Result<Vec<Candlestick>, ParseError> {
        use candle_layout::*;

        as_array(&self.0, "candlesticks")?
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let path = format!("candlesticks[{}]", i);
                let f = positional(candle, ARITY, &path)?;
                Ok(Candlestick {
                    unix_timestamp: text(&f[UNIX_TIMESTAMP], &path)?,
                    trade_volume_in_quote: float(&f[TRADE_VOLUME_IN_QUOTE], &path)?,
                    close_price: text(&f[CLOSE_PRICE], &path)?,
                    highest_price: text(&f[HIGHEST_PRICE], &path)?,
                    lowest_price: text(&f[LOWEST_PRICE], &path)?,
                    open_price: text(&f[OPEN_PRICE], &path)?,
                    base_currency_amount: float(&f[BASE_CURRENCY_AMOUNT], &path)?,
                    window_is_closed: flag(&f[WINDOW_IS_CLOSED], &path)?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Total Balance
// ---------------------------------------------------------------------------

/// `{details: {account_type: {currency, amount}}, total: {currency, amount}}`
///
/// Missing, `null` or empty sections produce default balances.
#[derive(Debug, Clone)]
pub struct ParseTotalBalance(Value);

impl ParseTotalBalance {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }
}

impl PayloadParser for ParseTotalBalance {
    type Output = TotalBalance;

    fn parse(self) -> Result<TotalBalance, ParseError> {
        let obj = as_object(&self.0, "total_balance")?;

        let details = match optional(obj, "details") {
            Some(v) => details(v, "total_balance.details")?,
            None => Details::default(),
        };
        let total = match optional(obj, "total") {
            Some(v) => balance(v, "total_balance.total")?,
            None => Total::default(),
        };

        Ok(TotalBalance { details, total })
    }
}

fn details(value: &Value, path: &str) -> Result<Details, ParseError> {
    let mut details = Details::default();
    for (account, entry) in as_object(value, path)? {
        if entry.is_null() {
            continue;
        }
        let parsed = balance(entry, &format!("{}.{}", path, account))?;
        match details.slot_mut(account) {
            Some(slot) => *slot = parsed,
            None => {
                tracing::debug!(account = %account, "Keeping unknown account type");
                details.other.insert(account.clone(), parsed);
            }
        }
    }
    Ok(details)
}

fn balance(value: &Value, path: &str) -> Result<Balance, ParseError> {
    let obj = as_object(value, path)?;
    let mut out = Balance::default();
    if let Some(v) = optional(obj, "currency") {
        out.currency = text(v, &format!("{}.currency", path))?;
    }
    if let Some(v) = optional(obj, "amount") {
        out.amount = text(v, &format!("{}.amount", path))?;
    }
    if let Some(v) = optional(obj, "unrealised_pnl") {
        out.unrealised_pnl = Some(text(v, &format!("{}.unrealised_pnl", path))?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Shape checks
// ---------------------------------------------------------------------------

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ParseError> {
    value
        .as_array()
        .ok_or_else(|| ParseError::invalid_shape(path, "array", kind(value)))
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or_else(|| ParseError::invalid_shape(path, "object", kind(value)))
}

/// An array of exactly `arity` elements.
fn positional<'a>(value: &'a Value, arity: usize, path: &str) -> Result<&'a [Value], ParseError> {
    let items = as_array(value, path)?;
    if items.len() != arity {
        return Err(ParseError::invalid_shape(
            path,
            format!("{} elements", arity),
            format!("{} elements", items.len()),
        ));
    }
    Ok(items.as_slice())
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, ParseError> {
    obj.get(key).ok_or_else(|| {
        ParseError::invalid_shape(format!("{}.{}", path, key), "a value", "nothing")
    })
}

/// A present, non-null field.
fn optional<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String, ParseError> {
    text(required(obj, key, path)?, &format!("{}.{}", path, key))
}

fn text(value: &Value, path: &str) -> Result<String, ParseError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ParseError::invalid_shape(path, "string", kind(value)))
}

fn integer(value: &Value, path: &str) -> Result<i64, ParseError> {
    value
        .as_i64()
        .ok_or_else(|| ParseError::invalid_shape(path, "integer", kind(value)))
}

/// A JSON number as-is, or the exchange's numeric-string form.
fn float(value: &Value, path: &str) -> Result<f64, ParseError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseError::invalid_shape(path, "float", "number")),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| ParseError::invalid_shape(path, "float", format!("string {:?}", s))),
        other => Err(ParseError::invalid_shape(path, "float", kind(other))),
    }
}

/// A JSON boolean, or the strings `"true"` / `"false"`.
fn flag(value: &Value, path: &str) -> Result<bool, ParseError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(ParseError::invalid_shape(path, "boolean", kind(other))),
    }
}
