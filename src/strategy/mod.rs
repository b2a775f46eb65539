// Trading strategy module
pub mod rsi_threshold;

pub use rsi_threshold::{Decision, RsiThresholdStrategy, ThresholdConfig};
