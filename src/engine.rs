use rust_decimal::Decimal;

use crate::error::{BotError, ExecutionFailure};
use crate::execution::ExecutionGate;
use crate::indicators::RsiIndicator;
use crate::models::{normalize_kline, Candle, ExposureState, OrderAck, TradeIntent};
use crate::strategy::{RsiThresholdStrategy, ThresholdConfig};

/// What happened to one inbound candle
#[derive(Debug, Clone, PartialEq)]
pub enum CandleOutcome {
    /// Candle still forming; not fed to the indicator
    Open,
    /// Not enough closes for a reading yet
    WarmingUp { have: usize, need: usize },
    /// Reading taken, no trade
    Held { rsi: f64, reason: String },
    /// Intent sent and confirmed
    Filled {
        rsi: f64,
        intent: TradeIntent,
        ack: OrderAck,
    },
    /// Intent sent but not confirmed; exposure unchanged
    ExecutionFailed {
        rsi: f64,
        intent: TradeIntent,
        error: ExecutionFailure,
    },
}

/// Streaming RSI signal engine for one instrument
///
/// Owns the indicator, the strategy and the execution gate. Candles must be
/// handed in one at a time, in arrival order.
pub struct SignalEngine {
    stream_symbol: String,
    indicator: RsiIndicator,
    strategy: RsiThresholdStrategy,
    gate: ExecutionGate,
}

impl SignalEngine {
    /// # Arguments
    /// * `stream_symbol` - Feed symbol candles must carry (case-insensitive)
    /// * `trade_symbol` - Symbol orders are placed on
    pub fn new(
        stream_symbol: &str,
        trade_symbol: &str,
        rsi_period: usize,
        thresholds: ThresholdConfig,
        quantity: Decimal,
        gate: ExecutionGate,
    ) -> Self {
        Self {
            stream_symbol: stream_symbol.to_uppercase(),
            indicator: RsiIndicator::new(rsi_period),
            strategy: RsiThresholdStrategy::new(thresholds, trade_symbol, quantity),
            gate,
        }
    }

    pub fn exposure(&self) -> ExposureState {
        self.strategy.exposure()
    }

    pub fn indicator(&self) -> &RsiIndicator {
        &self.indicator
    }

    /// Normalize a raw feed message and process it
    pub async fn handle_message(&mut self, message: &str) -> Result<CandleOutcome, BotError> {
        let candle = normalize_kline(message)?;
        self.handle_candle(&candle).await
    }

    /// Process the next candle
    pub async fn handle_candle(&mut self, candle: &Candle) -> Result<CandleOutcome, BotError> {
        if candle.symbol != self.stream_symbol {
            return Err(BotError::MalformedMessage(format!(
                "candle for {} on a {} engine",
                candle.symbol, self.stream_symbol
            )));
        }

        if !candle.is_closed {
            tracing::debug!(symbol = %candle.symbol, close = %candle.close, "Candle still open");
            return Ok(CandleOutcome::Open);
        }

        let close = candle.close_f64().ok_or_else(|| {
            BotError::MalformedMessage(format!("close {} out of range", candle.close))
        })?;

        self.indicator.append(close);
        tracing::info!(
            symbol = %candle.symbol,
            close = %candle.close,
            samples = self.indicator.samples(),
            "Candle closed"
        );

        let Some(reading) = self.indicator.latest_reading() else {
            return Ok(CandleOutcome::WarmingUp {
                have: self.indicator.samples(),
                need: self.indicator.samples_needed(),
            });
        };

        let rsi = reading.value;
        tracing::info!("Current RSI: {:.2}", rsi);

        let decision = self.strategy.evaluate(&reading);
        let Some(intent) = decision.intent else {
            tracing::debug!("{}", decision.reason);
            return Ok(CandleOutcome::Held {
                rsi,
                reason: decision.reason,
            });
        };

        tracing::info!("🎯 {}: {}", intent.side, decision.reason);

        match self.gate.submit(&intent, &mut self.strategy).await {
            Ok(ack) => Ok(CandleOutcome::Filled { rsi, intent, ack }),
            Err(error) => Ok(CandleOutcome::ExecutionFailed { rsi, intent, error }),
        }
    }
}
