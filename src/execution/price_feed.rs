use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const INITIAL_BACKOFF_MS: u64 = 2000; // Start with 2 seconds
const MAX_BACKOFF_MS: u64 = 60_000;
const MAX_JITTER_MS: u64 = 500;

/// Binance kline websocket feed for one symbol and interval
///
/// Forwards raw text frames, in arrival order, to a channel. Reconnects with
/// exponential backoff until the receiving side is dropped.
#[derive(Debug, Clone)]
pub struct KlineStream {
    url: String,
}

impl KlineStream {
    /// # Arguments
    /// * `ws_endpoint` - Base websocket URL (e.g. "wss://stream.binance.com:9443/ws")
    /// * `stream_symbol` - Feed symbol (e.g. "ethusdt")
    /// * `interval` - Kline interval (e.g. "1m")
    pub fn new(ws_endpoint: &str, stream_symbol: &str, interval: &str) -> Self {
        Self {
            url: stream_url(ws_endpoint, stream_symbol, interval),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run until `tx` is closed
    pub async fn run(self, tx: mpsc::Sender<String>) {
        let mut attempt: u32 = 0;

        loop {
            match connect_async(self.url.as_str()).await {
                Ok((mut ws, _)) => {
                    tracing::info!(url = %self.url, "opened connection");
                    attempt = 0;

                    while let Some(frame) = ws.next().await {
                        let payload = match frame {
                            Ok(Message::Text(text)) => text,
                            Ok(Message::Binary(bin)) => match String::from_utf8(bin) {
                                Ok(text) => text,
                                Err(_) => {
                                    tracing::warn!("Dropping non-UTF-8 binary frame");
                                    continue;
                                }
                            },
                            Ok(Message::Ping(data)) => {
                                if let Err(e) = ws.send(Message::Pong(data)).await {
                                    tracing::warn!("Failed to answer ping: {}", e);
                                    break;
                                }
                                continue;
                            }
                            Ok(Message::Close(frame)) => {
                                tracing::info!(?frame, "closed connection");
                                break;
                            }
                            Ok(_) => continue,
                            Err(e) => {
                                tracing::warn!("Websocket error: {}", e);
                                break;
                            }
                        };

                        if tx.send(payload).await.is_err() {
                            tracing::info!("Candle receiver dropped, stopping feed");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, "Failed to connect: {}", e);
                }
            }

            if tx.is_closed() {
                return;
            }

            let delay = reconnect_delay(attempt);
            attempt = attempt.saturating_add(1);
            tracing::warn!("Reconnecting in {}ms (attempt {})", delay.as_millis(), attempt);
            sleep(delay).await;
        }
    }
}

fn stream_url(ws_endpoint: &str, stream_symbol: &str, interval: &str) -> String {
    format!(
        "{}/{}@kline_{}",
        ws_endpoint.trim_end_matches('/'),
        stream_symbol.to_lowercase(),
        interval
    )
}

/// Exponential backoff with a little jitter, capped
fn reconnect_delay(attempt: u32) -> Duration {
    let base = INITIAL_BACKOFF_MS
        .saturating_mul(2_u64.saturating_pow(attempt.min(16)))
        .min(MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
    Duration::from_millis(base + jitter)
}
