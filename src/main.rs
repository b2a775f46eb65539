use clap::Parser;
use rsibot::api::BinanceOrderClient;
use rsibot::config::BotConfig;
use rsibot::execution::{ExecutionGate, KlineStream, OrderClient, PaperOrderClient};
use rsibot::{CandleOutcome, Result, SignalEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const FEED_CHANNEL_CAPACITY: usize = 1024;

/// RSI threshold trading bot for a single instrument
#[derive(Debug, Parser)]
#[command(name = "rsibot", version, about)]
struct Cli {
    /// TOML config file (defaults and RSIBOT_* env vars apply otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log orders instead of sending them
    #[arg(long, conflicts_with = "live")]
    dry_run: bool,

    /// Send real orders to the exchange
    #[arg(long)]
    live: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let dry_run = match (cli.dry_run, cli.live) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let config = BotConfig::load(cli.config.as_deref(), dry_run)?;

    tracing::info!("🚀 rsibot starting");
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Feed: {}@kline_{}", config.stream_symbol, config.interval);
    tracing::info!("  Trade: {} x {}", config.trade_symbol, config.trade_quantity);
    tracing::info!(
        "  RSI({}) oversold < {} / overbought > {}",
        config.rsi_period,
        config.rsi_oversold,
        config.rsi_overbought
    );
    tracing::info!("  Mode: {}", if config.dry_run { "dry run" } else { "LIVE" });

    let client = create_order_client(&config)?;
    let gate = ExecutionGate::new(client, config.order_timeout());
    tracing::info!("  Orders: {} (timeout {:?})", gate.client_name(), gate.order_timeout());
    let mut engine = SignalEngine::new(
        &config.stream_symbol,
        &config.trade_symbol,
        config.rsi_period,
        config.thresholds(),
        config.trade_quantity,
        gate,
    );

    let stream = KlineStream::new(&config.ws_endpoint, &config.stream_symbol, &config.interval);
    tracing::info!("Connecting to {}", stream.url());

    let (tx, mut rx) = mpsc::channel::<String>(FEED_CHANNEL_CAPACITY);
    let feed_task = tokio::spawn(stream.run(tx));

    tracing::info!("\nPress Ctrl+C to stop...\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
                break;
            }
            message = rx.recv() => {
                let Some(message) = message else {
                    tracing::error!("Market data feed stopped");
                    break;
                };
                process_message(&mut engine, &message).await;
            }
        }
    }

    drop(rx);
    feed_task.abort();

    tracing::info!(exposure = ?engine.exposure(), "👋 rsibot stopped");
    Ok(())
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rsibot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn create_order_client(config: &BotConfig) -> Result<Arc<dyn OrderClient>> {
    if config.dry_run {
        tracing::info!("Paper trading enabled, orders will only be logged");
        return Ok(Arc::new(PaperOrderClient::new()));
    }

    let (api_key, api_secret) = config
        .credentials()
        .ok_or("api_key and api_secret are required for live trading")?;
    let client = BinanceOrderClient::new(&config.rest_endpoint, api_key, api_secret)?;
    tracing::info!("Live trading against {}", config.rest_endpoint);
    Ok(Arc::new(client))
}

// ============================================================================
// Message Handling
// ============================================================================

async fn process_message(engine: &mut SignalEngine, message: &str) {
    tracing::debug!(raw = %message, "received message");

    match engine.handle_message(message).await {
        Ok(CandleOutcome::Open) => {}
        Ok(CandleOutcome::WarmingUp { have, need }) => {
            tracing::info!("Collecting closes: {}/{}", have, need);
        }
        Ok(CandleOutcome::Held { .. }) => {}
        Ok(CandleOutcome::Filled { intent, ack, .. }) => {
            tracing::info!(
                "💰 {} {} {} filled (status {})",
                intent.side,
                intent.quantity,
                intent.symbol,
                ack.status
            );
        }
        Ok(CandleOutcome::ExecutionFailed { intent, error, .. }) => {
            tracing::error!("{} signal forfeited: {}", intent.side, error);
        }
        Err(e) => {
            tracing::warn!("Discarding message: {}", e);
        }
    }
}
