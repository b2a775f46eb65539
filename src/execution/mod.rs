// Order execution and market data module
pub mod executor;
pub mod order_client;
pub mod price_feed;

pub use executor::{ExecutionGate, DEFAULT_ORDER_TIMEOUT};
pub use order_client::{OrderClient, PaperOrderClient};
pub use price_feed::KlineStream;
