use rust_decimal::Decimal;

use crate::error::BotError;
use crate::indicators::IndicatorReading;
use crate::models::{ExposureState, TradeIntent, TradeSide};

/// Overbought/oversold levels for the RSI rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), BotError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.overbought) || !in_range(self.oversold) {
            return Err(BotError::Config(format!(
                "RSI thresholds must lie in [0, 100], got oversold={} overbought={}",
                self.oversold, self.overbought
            )));
        }
        if self.oversold >= self.overbought {
            return Err(BotError::Config(format!(
                "oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }
}

/// Outcome of applying the rule to one reading
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub intent: Option<TradeIntent>,
    pub reason: String,
}

impl Decision {
    fn hold(reason: impl Into<String>) -> Self {
        Self {
            intent: None,
            reason: reason.into(),
        }
    }
}

/// RSI threshold strategy for a single instrument
///
/// Buys when RSI drops below `oversold` while flat and sells when it rises
/// above `overbought` while long. Crossing requires strict inequality.
///
/// Exposure only changes through [`RsiThresholdStrategy::apply_fill`], which
/// the execution gate calls after the exchange confirms an order.
#[derive(Debug, Clone)]
pub struct RsiThresholdStrategy {
    thresholds: ThresholdConfig,
    symbol: String,
    quantity: Decimal,
    exposure: ExposureState,
}

impl RsiThresholdStrategy {
    pub fn new(thresholds: ThresholdConfig, symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            thresholds,
            symbol: symbol.into(),
            quantity,
            exposure: ExposureState::Flat,
        }
    }

    pub fn exposure(&self) -> ExposureState {
        self.exposure
    }

    /// Apply the threshold rule to a reading
    ///
    /// Overbought is checked before oversold. A reading above `overbought`
    /// never reaches the oversold check, so at most one intent comes out per
    /// reading even with overlapping thresholds.
    pub fn evaluate(&self, reading: &IndicatorReading) -> Decision {
        let rsi = reading.value;

        if rsi > self.thresholds.overbought {
            return match self.exposure {
                ExposureState::Long => self.trade(
                    TradeSide::Sell,
                    format!("RSI {:.2} overbought (> {})", rsi, self.thresholds.overbought),
                ),
                ExposureState::Flat => {
                    Decision::hold(format!("RSI {:.2} overbought, but nothing held", rsi))
                }
            };
        }

        if rsi < self.thresholds.oversold {
            return match self.exposure {
                ExposureState::Flat => self.trade(
                    TradeSide::Buy,
                    format!("RSI {:.2} oversold (< {})", rsi, self.thresholds.oversold),
                ),
                ExposureState::Long => {
                    Decision::hold(format!("RSI {:.2} oversold, but already positioned", rsi))
                }
            };
        }

        Decision::hold(format!("RSI {:.2} within thresholds", rsi))
    }

    /// Record a confirmed fill
    pub(crate) fn apply_fill(&mut self, side: TradeSide) {
        let next = ExposureState::after_fill(side);
        if next != self.exposure {
            tracing::info!(from = ?self.exposure, to = ?next, "Exposure changed");
        }
        self.exposure = next;
    }

    fn trade(&self, side: TradeSide, reason: String) -> Decision {
        Decision {
            intent: Some(TradeIntent {
                side,
                symbol: self.symbol.clone(),
                quantity: self.quantity,
            }),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reading(value: f64) -> IndicatorReading {
        IndicatorReading {
            value,
            close: 100.0,
            samples: 15,
        }
    }

    fn strategy() -> RsiThresholdStrategy {
        RsiThresholdStrategy::new(ThresholdConfig::default(), "ETHUSD", dec!(0.015))
    }

    fn long_strategy() -> RsiThresholdStrategy {
        let mut s = strategy();
        s.apply_fill(TradeSide::Buy);
        s
    }

    #[test]
    fn test_buy_when_flat_and_oversold() {
        let s = strategy();
        let decision = s.evaluate(&reading(25.0));

        let intent = decision.intent.expect("expected a buy intent");
        assert_eq!(intent.side, TradeSide::Buy);
        assert_eq!(intent.symbol, "ETHUSD");
        assert_eq!(intent.quantity, dec!(0.015));
        // Deciding alone never moves exposure
        assert_eq!(s.exposure(), ExposureState::Flat);
    }

    #[test]
    fn test_sell_when_long_and_overbought() {
        let s = long_strategy();
        let decision = s.evaluate(&reading(75.0));

        assert_eq!(decision.intent.unwrap().side, TradeSide::Sell);
        assert_eq!(s.exposure(), ExposureState::Long);
    }

    #[test]
    fn test_skip_overbought_when_flat() {
        let decision = strategy().evaluate(&reading(85.0));
        assert!(decision.intent.is_none());
        assert!(decision.reason.contains("nothing held"));
    }

    #[test]
    fn test_skip_oversold_when_long() {
        let decision = long_strategy().evaluate(&reading(12.0));
        assert!(decision.intent.is_none());
        assert!(decision.reason.contains("already positioned"));
    }

    #[test]
    fn test_neutral_readings_never_trade() {
        for s in [strategy(), long_strategy()] {
            for value in [30.01, 42.0, 50.0, 69.99] {
                let decision = s.evaluate(&reading(value));
                assert!(decision.intent.is_none(), "traded at {}", value);
            }
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        for s in [strategy(), long_strategy()] {
            assert!(s.evaluate(&reading(70.0)).intent.is_none());
            assert!(s.evaluate(&reading(30.0)).intent.is_none());
        }
    }

    #[test]
    fn test_buy_then_fill_then_hold() {
        let mut s = strategy();

        let intent = s.evaluate(&reading(20.0)).intent.unwrap();
        assert_eq!(intent.side, TradeSide::Buy);

        s.apply_fill(intent.side);
        assert_eq!(s.exposure(), ExposureState::Long);

        assert!(s.evaluate(&reading(20.0)).intent.is_none());
    }

    #[test]
    fn test_sell_fill_returns_to_flat() {
        let mut s = long_strategy();
        let intent = s.evaluate(&reading(90.0)).intent.unwrap();
        s.apply_fill(intent.side);
        assert_eq!(s.exposure(), ExposureState::Flat);
    }

    #[test]
    fn test_overlapping_thresholds_prefer_overbought() {
        let overlapping = ThresholdConfig {
            overbought: 20.0,
            oversold: 80.0,
        };
        let flat = RsiThresholdStrategy::new(overlapping, "ETHUSD", dec!(0.015));
        let mut long = flat.clone();
        long.apply_fill(TradeSide::Buy);

        // 50 is both above overbought and below oversold
        let decision = flat.evaluate(&reading(50.0));
        assert!(decision.intent.is_none());
        assert!(decision.reason.contains("nothing held"));

        let decision = long.evaluate(&reading(50.0));
        assert_eq!(decision.intent.unwrap().side, TradeSide::Sell);

        // Below both levels only the oversold rule applies
        assert_eq!(flat.evaluate(&reading(10.0)).intent.unwrap().side, TradeSide::Buy);
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(ThresholdConfig::default().validate().is_ok());

        let inverted = ThresholdConfig {
            overbought: 30.0,
            oversold: 70.0,
        };
        assert!(inverted.validate().is_err());

        let out_of_range = ThresholdConfig {
            overbought: 120.0,
            oversold: 30.0,
        };
        assert!(out_of_range.validate().is_err());
    }
}
