//! 바이낸스 선물 실시간 체결/최우선호가 WebSocket 클라이언트.
//!
//! 구독 방식은 업비트의 ticket/type/format 3단 봉투와 달리 URL에 스트림
//! 이름을 박아 넣는 방식(`/stream?streams=...`)을 쓴다. 재연결 루프 모양은
//! 업비트 클라이언트와 동일(KIS `connect()`/`connect_internal()` 계보).

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::ExchangeError;
use crate::venue::BestQuote;

const WS_BASE: &str = "wss://fstream.binance.com/stream";
const INITIAL_BACKOFF_SECS: f64 = 1.0;
const MAX_BACKOFF_SECS: f64 = 30.0;
const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const PING_INTERVAL_SECS: u64 = 40;
const PING_WRITE_DEADLINE_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub enum BinanceStreamEvent {
    Quote(BestQuote),
    Trade { price: Decimal, quantity: Decimal },
    ConnectionStatus(bool),
}

#[derive(Debug, Deserialize)]
struct BinanceEnvelope<T> {
    #[allow(dead_code)]
    stream: String,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
enum BinanceFrame {
    #[serde(rename = "bookTicker")]
    BookTicker {
        #[serde(rename = "b")]
        bid_price: Decimal,
        #[serde(rename = "B")]
        bid_qty: Decimal,
        #[serde(rename = "a")]
        ask_price: Decimal,
        #[serde(rename = "A")]
        ask_qty: Decimal,
    },
    #[serde(rename = "aggTrade")]
    AggTrade {
        #[serde(rename = "p")]
        price: Decimal,
        #[serde(rename = "q")]
        quantity: Decimal,
    },
}

pub struct BinanceMarketStream {
    symbol_lower: String,
    tx: mpsc::Sender<BinanceStreamEvent>,
}

impl BinanceMarketStream {
    pub fn new(symbol: impl Into<String>) -> (Self, mpsc::Receiver<BinanceStreamEvent>) {
        let (tx, rx) = mpsc::channel(1000);
        (
            Self {
                symbol_lower: symbol.into().to_lowercase(),
                tx,
            },
            rx,
        )
    }

    pub async fn run(&self, mut cancel: tokio::sync::oneshot::Receiver<()>) -> Result<(), ExchangeError> {
        let initial_jitter = rand::thread_rng().gen_range(5.0..=10.0);
        tokio::time::sleep(Duration::from_secs_f64(initial_jitter)).await;

        let mut attempt = 0u32;
        loop {
            tokio::select! {
                result = self.connect_once() => {
                    match result {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            attempt += 1;
                            if attempt > MAX_RECONNECT_ATTEMPTS {
                                error!(symbol = %self.symbol_lower, "바이낸스 스트림 재연결 한도 초과");
                                return Err(e);
                            }
                            let backoff = (INITIAL_BACKOFF_SECS * 2f64.powi(attempt as i32 - 1)).min(MAX_BACKOFF_SECS);
                            warn!(symbol = %self.symbol_lower, attempt, backoff, "바이낸스 스트림 재연결 대기");
                            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                        }
                    }
                }
                _ = &mut cancel => {
                    info!(symbol = %self.symbol_lower, "바이낸스 스트림 취소됨");
                    return Ok(());
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<(), ExchangeError> {
        let url = format!(
            "{WS_BASE}?streams={sym}@bookTicker/{sym}@aggTrade",
            sym = self.symbol_lower
        );
        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("바이낸스 WS 연결 실패: {e}")))?;
        let (mut write, mut read) = ws_stream.split();

        let _ = self.tx.send(BinanceStreamEvent::ConnectionStatus(true)).await;

        let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("바이낸스가 연결 종료를 요청");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("바이낸스 WS 수신 에러: {e}");
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                _ = ping_interval.tick() => {
                    let write_result = tokio::time::timeout(
                        Duration::from_secs(PING_WRITE_DEADLINE_SECS),
                        write.send(Message::Ping(vec![])),
                    ).await;
                    match write_result {
                        Ok(Ok(())) => debug!("바이낸스 ping 전송"),
                        _ => {
                            error!("바이낸스 ping 전송 실패/타임아웃");
                            break;
                        }
                    }
                }
            }
        }

        let _ = self.tx.send(BinanceStreamEvent::ConnectionStatus(false)).await;
        Err(ExchangeError::Disconnected("바이낸스 WS 연결 끊김".to_string()))
    }

    fn handle_frame(&self, text: &str) {
        let event = serde_json::from_str::<BinanceEnvelope<BinanceFrame>>(text)
            .ok()
            .map(|env| env.data)
            .or_else(|| serde_json::from_str::<BinanceFrame>(text).ok());

        let Some(frame) = event else { return };
        let mapped = match frame {
            BinanceFrame::BookTicker {
                bid_price,
                bid_qty,
                ask_price,
                ask_qty,
            } => BinanceStreamEvent::Quote(BestQuote {
                bid: bid_price,
                ask: ask_price,
                bid_qty,
                ask_qty,
            }),
            BinanceFrame::AggTrade { price, quantity } => BinanceStreamEvent::Trade { price, quantity },
        };
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(mapped).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url_embeds_symbol() {
        let (stream, _rx) = BinanceMarketStream::new("BTCUSDT");
        let url = format!(
            "{WS_BASE}?streams={sym}@bookTicker/{sym}@aggTrade",
            sym = stream.symbol_lower
        );
        assert_eq!(url, "wss://fstream.binance.com/stream?streams=btcusdt@bookTicker/btcusdt@aggTrade");
    }
}
