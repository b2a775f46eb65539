use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::ExecutionFailure;
use crate::execution::OrderClient;
use crate::models::{OrderAck, OrderRequest, TradeIntent};
use crate::strategy::RsiThresholdStrategy;

pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends trade intents to the order client and records confirmed fills
///
/// This is the only place exposure is written: a fill moves the strategy to
/// the side's implied exposure, any failure leaves it as it was. Nothing is
/// retried; a failed order forfeits that signal.
pub struct ExecutionGate {
    client: Arc<dyn OrderClient>,
    order_timeout: Duration,
}

impl ExecutionGate {
    pub fn new(client: Arc<dyn OrderClient>, order_timeout: Duration) -> Self {
        Self {
            client,
            order_timeout,
        }
    }

    pub fn order_timeout(&self) -> Duration {
        self.order_timeout
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Submit `intent` and reconcile `strategy` with the outcome
    pub async fn submit(
        &self,
        intent: &TradeIntent,
        strategy: &mut RsiThresholdStrategy,
    ) -> Result<OrderAck, ExecutionFailure> {
        let request = OrderRequest::market(intent);

        tracing::info!(
            side = %request.side,
            symbol = %request.symbol,
            quantity = %request.quantity,
            client = self.client.name(),
            "Sending order"
        );

        // Run on its own task so a panicking client surfaces as a failure
        let client = Arc::clone(&self.client);
        let mut handle = tokio::spawn(async move { client.submit_order(&request).await });

        let outcome = match timeout(self.order_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ExecutionFailure::Transport(format!(
                "order task failed: {}",
                join_err
            ))),
            Err(_) => {
                handle.abort();
                Err(ExecutionFailure::Timeout(self.order_timeout))
            }
        };

        match outcome {
            Ok(ack) => {
                strategy.apply_fill(intent.side);
                tracing::info!(
                    side = %intent.side,
                    status = %ack.status,
                    client_order_id = %ack.client_order_id,
                    exposure = ?strategy.exposure(),
                    "✅ Order confirmed"
                );
                Ok(ack)
            }
            Err(failure) => {
                tracing::warn!(
                    side = %intent.side,
                    symbol = %intent.symbol,
                    error = %failure,
                    exposure = ?strategy.exposure(),
                    "❌ Order failed, exposure unchanged"
                );
                Err(failure)
            }
        }
    }
}
