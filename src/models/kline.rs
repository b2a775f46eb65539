use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use super::Candle;
use crate::error::BotError;

const KLINE_EVENT: &str = "kline";

/// Binance kline stream event
///
/// Docs: https://github.com/binance/binance-spot-api-docs/blob/master/web-socket-streams.md
#[derive(Debug, Deserialize)]
struct KlineEvent {
    #[serde(rename = "e")]
    event_type: Option<String>,
    #[serde(rename = "k")]
    kline: KlinePayload,
}

/// Combined-stream wrapper (`/stream?streams=...`)
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[allow(dead_code)]
    stream: String,
    data: KlineEvent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Envelope(StreamEnvelope),
    Event(KlineEvent),
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time: Option<i64>,
    #[serde(rename = "T")]
    close_time: Option<i64>,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "i")]
    interval: String,
    #[serde(rename = "o")]
    open: Option<NumberField>,
    #[serde(rename = "h")]
    high: Option<NumberField>,
    #[serde(rename = "l")]
    low: Option<NumberField>,
    #[serde(rename = "c")]
    close: NumberField,
    #[serde(rename = "v")]
    volume: Option<NumberField>,
    #[serde(rename = "x")]
    is_closed: bool,
}

/// Binance sends prices as strings; accept bare numbers too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberField {
    Text(String),
    Number(serde_json::Number),
}

impl NumberField {
    fn to_decimal(&self, field: &str) -> Result<Decimal, BotError> {
        let raw = match self {
            NumberField::Text(s) => s.trim().to_string(),
            NumberField::Number(n) => n.to_string(),
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|_| BotError::MalformedMessage(format!("{} '{}' is not a number", field, raw)))
    }
}

/// Parse one raw market-data message into a [`Candle`]
///
/// Symbol, interval, close price and the closed flag are required. Open, high
/// and low fall back to the close and volume to zero when absent.
pub fn normalize_kline(message: &str) -> Result<Candle, BotError> {
    let event = match serde_json::from_str::<Inbound>(message)? {
        Inbound::Envelope(envelope) => envelope.data,
        Inbound::Event(event) => event,
    };

    if let Some(event_type) = event.event_type.as_deref() {
        if event_type != KLINE_EVENT {
            return Err(BotError::MalformedMessage(format!(
                "unexpected event type '{}'",
                event_type
            )));
        }
    }

    let k = event.kline;
    let close = k.close.to_decimal("close")?;
    let optional = |field: &Option<NumberField>, name: &str, fallback: Decimal| {
        field
            .as_ref()
            .map(|value| value.to_decimal(name))
            .unwrap_or(Ok(fallback))
    };

    Ok(Candle {
        symbol: k.symbol.to_uppercase(),
        interval: k.interval,
        open_time: k.open_time.and_then(DateTime::<Utc>::from_timestamp_millis),
        close_time: k.close_time.and_then(DateTime::<Utc>::from_timestamp_millis),
        open: optional(&k.open, "open", close)?,
        high: optional(&k.high, "high", close)?,
        low: optional(&k.low, "low", close)?,
        close,
        volume: optional(&k.volume, "volume", Decimal::ZERO)?,
        is_closed: k.is_closed,
    })
}
