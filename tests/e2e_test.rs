use async_trait::async_trait;
use rsibot::execution::{ExecutionGate, OrderClient, PaperOrderClient};
use rsibot::strategy::ThresholdConfig;
use rsibot::*;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Order client that replays scripted outcomes and records every request
#[derive(Default)]
struct ScriptedClient {
    outcomes: Mutex<VecDeque<std::result::Result<(), ExecutionFailure>>>,
    orders: Mutex<Vec<OrderRequest>>,
}

impl ScriptedClient {
    fn with_outcomes(outcomes: Vec<std::result::Result<(), ExecutionFailure>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            orders: Mutex::new(Vec::new()),
        })
    }

    fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderClient for ScriptedClient {
    async fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> std::result::Result<OrderAck, ExecutionFailure> {
        self.orders.lock().unwrap().push(order.clone());
        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome.map(|_| OrderAck {
            order_id: Some(self.orders.lock().unwrap().len() as i64),
            client_order_id: "scripted".to_string(),
            status: "FILLED".to_string(),
            executed_qty: Some(order.quantity),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn kline(close: &str, closed: bool) -> String {
    format!(
        r#"{{"e":"kline","E":1638747660000,"s":"ETHUSDT","k":{{"t":1638747660000,"T":1638747719999,"s":"ETHUSDT","i":"1m","f":100,"L":200,"o":"{c}","c":"{c}","h":"{c}","l":"{c}","v":"10.0","n":100,"x":{closed},"q":"1.0","V":"5","Q":"0.5","B":"0"}}}}"#,
        c = close,
        closed = closed
    )
}

fn engine_with(client: Arc<dyn OrderClient>) -> SignalEngine {
    let gate = ExecutionGate::new(client, Duration::from_secs(5));
    SignalEngine::new(
        "ethusdt",
        "ETHUSD",
        14,
        ThresholdConfig::default(),
        dec!(0.015),
        gate,
    )
}

/// Closes 114, 113, ..., 100
fn falling_closes() -> Vec<String> {
    (0..15).map(|i| (114 - i).to_string()).collect()
}

#[tokio::test]
async fn test_e2e_buy_then_sell_cycle() {
    let _ = tracing_subscriber::fmt::try_init();

    let client = ScriptedClient::with_outcomes(vec![]);
    let mut engine = engine_with(client.clone());

    // Falling market: warm up, then buy on the 15th close
    let closes = falling_closes();
    for (i, close) in closes.iter().enumerate() {
        // Intra-candle updates are ignored
        let open = engine.handle_message(&kline(close, false)).await.unwrap();
        assert_eq!(open, CandleOutcome::Open);

        let outcome = engine.handle_message(&kline(close, true)).await.unwrap();
        if i < 14 {
            assert!(matches!(outcome, CandleOutcome::WarmingUp { .. }));
        } else {
            match outcome {
                CandleOutcome::Filled { rsi, intent, ack } => {
                    assert!(rsi.abs() < 0.01);
                    assert_eq!(intent.side, TradeSide::Buy);
                    assert_eq!(ack.status, "FILLED");
                }
                other => panic!("expected buy fill, got {:?}", other),
            }
        }
    }
    assert_eq!(engine.exposure(), ExposureState::Long);

    // Recovery in steps of 2: RSI climbs 13.33, 24.22, ... 68.71, then 71.58 sells
    let mut sell_rsi = None;
    for step in 1..=11 {
        let close = (100 + 2 * step).to_string();
        match engine.handle_message(&kline(&close, true)).await.unwrap() {
            CandleOutcome::Held { rsi, .. } => {
                assert!(step < 11, "no sell at RSI {:.2}", rsi);
                if step == 1 {
                    assert!((rsi - 13.33).abs() < 0.01);
                }
            }
            CandleOutcome::Filled { rsi, intent, .. } => {
                assert_eq!(step, 11);
                assert_eq!(intent.side, TradeSide::Sell);
                sell_rsi = Some(rsi);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert!((sell_rsi.unwrap() - 71.58).abs() < 0.01);
    assert_eq!(engine.exposure(), ExposureState::Flat);

    let orders = client.orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].side, TradeSide::Buy);
    assert_eq!(orders[1].side, TradeSide::Sell);
    assert!(orders.iter().all(|o| o.symbol == "ETHUSD"));
    assert!(orders.iter().all(|o| o.quantity == dec!(0.015)));
    assert!(orders.iter().all(|o| o.order_type == OrderType::Market));
}

#[tokio::test]
async fn test_e2e_failed_buy_keeps_flat() {
    let client = ScriptedClient::with_outcomes(vec![Err(ExecutionFailure::Rejected {
        reason: "Account has insufficient balance".to_string(),
    })]);
    let mut engine = engine_with(client.clone());

    let closes = falling_closes();
    let mut last = None;
    for close in &closes {
        last = Some(engine.handle_message(&kline(close, true)).await.unwrap());
    }

    match last.unwrap() {
        CandleOutcome::ExecutionFailed { intent, error, .. } => {
            assert_eq!(intent.side, TradeSide::Buy);
            assert!(matches!(error, ExecutionFailure::Rejected { .. }));
        }
        other => panic!("expected failed execution, got {:?}", other),
    }
    assert_eq!(engine.exposure(), ExposureState::Flat);
    assert_eq!(client.orders().len(), 1);

    // Still oversold on the next close: a fresh signal, which now fills
    let outcome = engine.handle_message(&kline("99", true)).await.unwrap();
    assert!(matches!(outcome, CandleOutcome::Filled { .. }));
    assert_eq!(engine.exposure(), ExposureState::Long);
    assert_eq!(client.orders().len(), 2);
}

#[tokio::test]
async fn test_e2e_malformed_messages_do_not_stop_stream() {
    let mut engine = engine_with(Arc::new(PaperOrderClient::new()));

    let mut messages: Vec<String> = falling_closes()
        .iter()
        .map(|c| kline(c, true))
        .collect();
    messages.insert(3, r#"{"result":null,"id":1}"#.to_string());
    messages.insert(7, kline("not-a-price", true));
    messages.insert(9, "garbage".to_string());

    let mut malformed = 0;
    let mut fills = 0;
    for message in &messages {
        match engine.handle_message(message).await {
            Err(BotError::MalformedMessage(_)) => malformed += 1,
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(CandleOutcome::Filled { .. }) => fills += 1,
            Ok(_) => {}
        }
    }

    assert_eq!(malformed, 3);
    assert_eq!(fills, 1);
    assert_eq!(engine.indicator().samples(), 15);
    assert_eq!(engine.exposure(), ExposureState::Long);
}

#[tokio::test]
async fn test_e2e_rising_market_while_flat_never_trades() {
    let client = ScriptedClient::with_outcomes(vec![]);
    let mut engine = engine_with(client.clone());

    let mut last = None;
    for close in 100..=114 {
        last = Some(
            engine
                .handle_message(&kline(&close.to_string(), true))
                .await
                .unwrap(),
        );
    }

    match last.unwrap() {
        CandleOutcome::Held { rsi, .. } => assert!(rsi > 70.0),
        other => panic!("expected hold, got {:?}", other),
    }
    assert!(client.orders().is_empty());
    assert_eq!(engine.exposure(), ExposureState::Flat);
}
