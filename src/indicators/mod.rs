// Technical indicators module
// Wilder RSI, incremental (live) and batch (reference) forms

pub mod rsi;

pub use rsi::{calculate_rsi, IndicatorReading, RsiIndicator, DEFAULT_RSI_PERIOD};
