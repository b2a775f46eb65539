use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ExecutionFailure;
use crate::models::{OrderAck, OrderRequest};

/// Venue that turns an order request into a confirmed fill or a failure
#[async_trait]
pub trait OrderClient: Send + Sync {
    /// Submit a market order
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExecutionFailure>;

    /// Client name for logs
    fn name(&self) -> &str;
}

/// Dry-run client: logs the order and acknowledges it as filled
#[derive(Debug, Clone, Default)]
pub struct PaperOrderClient;

impl PaperOrderClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderClient for PaperOrderClient {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExecutionFailure> {
        let client_order_id = format!("paper-{}", Uuid::new_v4().simple());

        tracing::info!(
            side = %order.side,
            symbol = %order.symbol,
            quantity = %order.quantity,
            client_order_id = %client_order_id,
            "📝 Paper order filled"
        );

        Ok(OrderAck {
            order_id: None,
            client_order_id,
            status: "FILLED".to_string(),
            executed_qty: Some(order.quantity),
        })
    }

    fn name(&self) -> &str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderType, TradeSide};
    use rust_decimal_macros::dec;

    #[test]
    fn test_paper_order_fills_full_quantity() {
        let client = PaperOrderClient::new();
        let order = OrderRequest {
            side: TradeSide::Buy,
            symbol: "ETHUSD".to_string(),
            quantity: dec!(0.015),
            order_type: OrderType::Market,
        };

        let ack = tokio_test::block_on(client.submit_order(&order)).unwrap();

        assert_eq!(ack.status, "FILLED");
        assert_eq!(ack.executed_qty, Some(dec!(0.015)));
        assert!(ack.client_order_id.starts_with("paper-"));
        assert_eq!(client.name(), "paper");
    }
}
