use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::ExecutionFailure;
use crate::execution::OrderClient;
use crate::models::{OrderAck, OrderRequest};

// Spot order endpoint
// Docs: https://developers.binance.com/docs/binance-spot-api-docs/rest-api/trading-endpoints
const ORDER_PATH: &str = "/api/v3/order";
const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;
const HTTP_TIMEOUT_SECS: u64 = 10;
const ORDERS_PER_SECOND: u32 = 5;

type HmacSha256 = Hmac<Sha256>;

type OrderRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Signed market-order client for Binance spot
#[derive(Clone)]
pub struct BinanceOrderClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    recv_window_ms: u64,
    rate_limiter: Arc<OrderRateLimiter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: Option<i64>,
    client_order_id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    executed_qty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: i64,
    msg: String,
}

impl BinanceOrderClient {
    /// # Arguments
    /// * `base_url` - REST root (e.g. "https://api.binance.us")
    pub fn new(base_url: &str, api_key: String, api_secret: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let per_second = NonZeroU32::new(ORDERS_PER_SECOND).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            rate_limiter,
        })
    }

    /// Place a market order; the outer error is transport, the inner one an exchange rejection
    async fn place_market_order(
        &self,
        order: &OrderRequest,
    ) -> Result<std::result::Result<OrderAck, ExecutionFailure>> {
        self.rate_limiter.until_ready().await;

        let client_order_id = Uuid::new_v4().simple().to_string();
        let query = order_query(
            order,
            &client_order_id,
            self.recv_window_ms,
            Utc::now().timestamp_millis(),
        );
        let signature = sign_payload(&self.api_secret, &query)?;
        let body = format!("{}&signature={}", query, signature);

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-MBX-APIKEY",
            HeaderValue::from_str(&self.api_key).context("API key is not a valid header")?,
        );
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let url = format!("{}{}", self.base_url, ORDER_PATH);
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .context("Order request failed")?;

        let status = response.status();
        let payload = response.text().await.context("Failed to read order response")?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<ApiErrorResponse>(&payload) {
                Ok(err) => format!("{} (code {})", err.msg, err.code),
                Err(_) => format!("HTTP {}: {}", status.as_u16(), payload.trim()),
            };
            return Ok(Err(ExecutionFailure::Rejected { reason }));
        }

        let parsed: OrderResponse =
            serde_json::from_str(&payload).context("Failed to decode order response")?;
        tracing::info!(response = %payload, "Order acknowledged by exchange");

        Ok(Ok(OrderAck {
            order_id: parsed.order_id,
            client_order_id: parsed.client_order_id,
            status: parsed.status.unwrap_or_else(|| "ACK".to_string()),
            executed_qty: parsed
                .executed_qty
                .as_deref()
                .and_then(|q| Decimal::from_str(q).ok()),
        }))
    }
}

#[async_trait]
impl OrderClient for BinanceOrderClient {
    async fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> std::result::Result<OrderAck, ExecutionFailure> {
        self.place_market_order(order).await?
    }

    fn name(&self) -> &str {
        "binance"
    }
}

fn order_query(
    order: &OrderRequest,
    client_order_id: &str,
    recv_window_ms: u64,
    timestamp_ms: i64,
) -> String {
    format!(
        "symbol={}&side={}&type={}&quantity={}&newClientOrderId={}&recvWindow={}&timestamp={}",
        order.symbol.to_uppercase(),
        order.side.as_str(),
        order.order_type.as_str(),
        order.quantity.normalize(),
        client_order_id,
        recv_window_ms,
        timestamp_ms
    )
}

/// Hex HMAC-SHA256 of `payload` keyed by the API secret
fn sign_payload(secret: &str, payload: &str) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).context("Invalid API secret for HMAC")?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
