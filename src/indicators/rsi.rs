/// Standard RSI lookback
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// RSI value for the most recent closed candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorReading {
    pub value: f64,
    /// Close price of the candle that produced this reading
    pub close: f64,
    /// Number of closes seen when the reading was taken
    pub samples: usize,
}

/// Incremental Wilder RSI over a stream of closing prices
///
/// Keeps only the previous close and the smoothed averages, so memory stays
/// constant however long the stream runs. The first `period` deltas seed the
/// averages with a simple mean; every later delta is folded in with Wilder
/// smoothing (`avg = (avg * (period - 1) + x) / period`).
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    period: usize,
    samples: usize,
    prev_close: Option<f64>,
    last_close: f64,
    // Running sums while seeding, smoothed averages afterwards
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiIndicator {
    /// Create an indicator with lookback `period`
    ///
    /// A period of zero is treated as one.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            samples: 0,
            prev_close: None,
            last_close: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Closes appended so far
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Closes required before the first reading
    pub fn samples_needed(&self) -> usize {
        self.period + 1
    }

    pub fn is_ready(&self) -> bool {
        self.samples > self.period
    }

    /// Append the close of a newly closed candle
    pub fn append(&mut self, close: f64) {
        self.samples += 1;
        self.last_close = close;

        let Some(prev) = self.prev_close.replace(close) else {
            return;
        };

        let change = close - prev;
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, change.abs())
        };

        let deltas = self.samples - 1;
        let period = self.period as f64;

        if deltas < self.period {
            self.avg_gain += gain;
            self.avg_loss += loss;
        } else if deltas == self.period {
            self.avg_gain = (self.avg_gain + gain) / period;
            self.avg_loss = (self.avg_loss + loss) / period;
        } else {
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }
    }

    /// RSI for the latest close, or `None` until `period + 1` closes are in
    pub fn latest_reading(&self) -> Option<IndicatorReading> {
        if !self.is_ready() {
            return None;
        }

        Some(IndicatorReading {
            value: rsi_from_averages(self.avg_gain, self.avg_loss),
            close: self.last_close,
            samples: self.samples,
        })
    }
}

impl Default for RsiIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_RSI_PERIOD)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Calculate Wilder's Relative Strength Index over a full price history
///
/// Recomputes from scratch; [`RsiIndicator`] gives the same value
/// incrementally. Returns `None` when fewer than `period + 1` prices are given.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    let period = period.max(1);
    if prices.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: &f64| if *c > 0.0 { *c } else { 0.0 };
    let loss = |c: &f64| if *c < 0.0 { c.abs() } else { 0.0 };

    let (seed, rest) = changes.split_at(period);
    let p = period as f64;
    let mut avg_gain = seed.iter().map(gain).sum::<f64>() / p;
    let mut avg_loss = seed.iter().map(loss).sum::<f64>() / p;

    for change in rest {
        avg_gain = (avg_gain * (p - 1.0) + gain(change)) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss(change)) / p;
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}
