pub mod kline;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use kline::normalize_kline;

/// OHLCV bar for one instrument and interval, as delivered by the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub symbol: String,
    pub interval: String,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub is_closed: bool,
}

impl Candle {
    /// Closing price as the float the indicator works in
    pub fn close_f64(&self) -> Option<f64> {
        self.close.to_f64()
    }
}

/// Order side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Exchange wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the strategy currently holds the traded instrument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ExposureState {
    #[default]
    Flat,
    Long,
}

impl ExposureState {
    /// Exposure once an order on `side` is confirmed
    pub fn after_fill(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => ExposureState::Long,
            TradeSide::Sell => ExposureState::Flat,
        }
    }
}

/// Decision to buy or sell, not yet sent to the exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeIntent {
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderType {
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
        }
    }
}

/// Request handed to the order-execution client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: Decimal,
    pub order_type: OrderType,
}

impl OrderRequest {
    pub fn market(intent: &TradeIntent) -> Self {
        Self {
            side: intent.side,
            symbol: intent.symbol.clone(),
            quantity: intent.quantity,
            order_type: OrderType::Market,
        }
    }
}

/// Exchange acknowledgement of an accepted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub order_id: Option<i64>,
    pub client_order_id: String,
    pub status: String,
    pub executed_qty: Option<Decimal>,
}
