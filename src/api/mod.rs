pub mod binance;

pub use binance::BinanceOrderClient;
