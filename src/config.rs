use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::BotError;
use crate::strategy::ThresholdConfig;

const ENV_PREFIX: &str = "RSIBOT";

/// Runtime settings for one bot instance
///
/// Sources, later ones win: built-in defaults, optional TOML file,
/// `RSIBOT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Symbol orders are placed on (e.g. "ETHUSD")
    pub trade_symbol: String,
    pub trade_quantity: Decimal,
    /// Symbol of the kline feed (e.g. "ethusdt")
    pub stream_symbol: String,
    pub interval: String,
    pub ws_endpoint: String,
    pub rest_endpoint: String,
    pub order_timeout_secs: u64,
    pub dry_run: bool,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl BotConfig {
    /// Load settings, reading `path` if given
    ///
    /// `dry_run` overrides every other source and is applied before validation.
    pub fn load(path: Option<&Path>, dry_run: Option<bool>) -> Result<Self, BotError> {
        Self::load_with_prefix(path, dry_run, ENV_PREFIX)
    }

    fn load_with_prefix(
        path: Option<&Path>,
        dry_run: Option<bool>,
        env_prefix: &str,
    ) -> Result<Self, BotError> {
        let mut builder = Config::builder()
            .set_default("rsi_period", 14)
            .and_then(|b| b.set_default("rsi_overbought", 70.0))
            .and_then(|b| b.set_default("rsi_oversold", 30.0))
            .and_then(|b| b.set_default("trade_symbol", "ETHUSD"))
            .and_then(|b| b.set_default("trade_quantity", "0.015"))
            .and_then(|b| b.set_default("stream_symbol", "ethusdt"))
            .and_then(|b| b.set_default("interval", "1m"))
            .and_then(|b| b.set_default("ws_endpoint", "wss://stream.binance.com:9443/ws"))
            .and_then(|b| b.set_default("rest_endpoint", "https://api.binance.us"))
            .and_then(|b| b.set_default("order_timeout_secs", 10))
            .and_then(|b| b.set_default("dry_run", true))
            .map_err(config_error)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(env_prefix).try_parsing(true));
        if let Some(dry_run) = dry_run {
            builder = builder.set_override("dry_run", dry_run).map_err(config_error)?;
        }

        let config: BotConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            overbought: self.rsi_overbought,
            oversold: self.rsi_oversold,
        }
    }

    pub fn order_timeout(&self) -> Duration {
        Duration::from_secs(self.order_timeout_secs)
    }

    /// API key and secret, when both are set and non-empty
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), BotError> {
        if self.rsi_period == 0 {
            return Err(BotError::Config("rsi_period must be at least 1".into()));
        }
        self.thresholds().validate()?;
        if self.trade_quantity <= Decimal::ZERO {
            return Err(BotError::Config(format!(
                "trade_quantity must be positive, got {}",
                self.trade_quantity
            )));
        }
        if self.trade_symbol.trim().is_empty() || self.stream_symbol.trim().is_empty() {
            return Err(BotError::Config("trade and stream symbols are required".into()));
        }
        if self.order_timeout_secs == 0 {
            return Err(BotError::Config("order_timeout_secs must be positive".into()));
        }
        if !self.dry_run && self.credentials().is_none() {
            return Err(BotError::Config(
                "api_key and api_secret are required when dry_run is off".into(),
            ));
        }
        Ok(())
    }
}

fn config_error(err: config::ConfigError) -> BotError {
    BotError::Config(err.to_string())
}
