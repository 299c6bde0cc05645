//! 업비트 실시간 체결/호가 WebSocket 클라이언트.
//!
//! 재연결 루프는 KIS 국내 클라이언트의 `connect()`(바깥 루프) +
//! `connect_internal()`(안쪽 셀렉트 루프) 모양을 그대로 따르되, 백오프
//! 숫자는 이 플랫폼의 것(1s→30s 배가, 최대 5회, 40s ping/10s 데드라인,
//! 기동 시 5–10s 균등분포 지터)을 쓴다.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::ExchangeError;
use crate::venue::BestQuote;

const WS_URL: &str = "wss://api.upbit.com/websocket/v1";
const INITIAL_BACKOFF_SECS: f64 = 1.0;
const MAX_BACKOFF_SECS: f64 = 30.0;
const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const PING_INTERVAL_SECS: u64 = 40;
const PING_WRITE_DEADLINE_SECS: u64 = 10;

/// 업비트 실시간 메시지에서 뽑아낸 이벤트.
#[derive(Debug, Clone)]
pub enum UpbitStreamEvent {
    Quote(BestQuote),
    Trade { price: Decimal, quantity: Decimal },
    ConnectionStatus(bool),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum UpbitSubscribeFrame<'a> {
    Ticket {
        ticket: &'a str,
    },
    Type {
        #[serde(rename = "type")]
        kind: &'a str,
        codes: Vec<&'a str>,
    },
    Format {
        format: &'a str,
    },
}

#[derive(Debug, Deserialize)]
struct UpbitOrderbookUnit {
    ask_price: Decimal,
    bid_price: Decimal,
    ask_size: Decimal,
    bid_size: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum UpbitFrame {
    #[serde(rename = "orderbook")]
    Orderbook {
        #[serde(rename = "orderbook_units")]
        units: Vec<UpbitOrderbookUnit>,
    },
    #[serde(rename = "trade")]
    Trade {
        #[serde(rename = "trade_price")]
        price: Decimal,
        #[serde(rename = "trade_volume")]
        volume: Decimal,
    },
}

pub struct UpbitMarketStream {
    symbol: String,
    tx: mpsc::Sender<UpbitStreamEvent>,
}

impl UpbitMarketStream {
    pub fn new(symbol: impl Into<String>) -> (Self, mpsc::Receiver<UpbitStreamEvent>) {
        let (tx, rx) = mpsc::channel(1000);
        (
            Self {
                symbol: symbol.into(),
                tx,
            },
            rx,
        )
    }

    /// 기동 시 5–10초 균등분포 지터 후, 지수 백오프로 재연결하며 구독을
    /// 유지한다. 컨텍스트 취소는 `cancel`로 표현한다.
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
                                error!(symbol = %self.symbol, "업비트 스트림 재연결 한도 초과");
                                return Err(e);
                            }
                            let backoff = (INITIAL_BACKOFF_SECS * 2f64.powi(attempt as i32 - 1)).min(MAX_BACKOFF_SECS);
                            warn!(symbol = %self.symbol, attempt, backoff, "업비트 스트림 재연결 대기");
                            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                        }
                    }
                }
                _ = &mut cancel => {
                    info!(symbol = %self.symbol, "업비트 스트림 취소됨");
                    return Ok(());
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<(), ExchangeError> {
        let (ws_stream, _) = connect_async(WS_URL)
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("업비트 WS 연결 실패: {e}")))?;
        let (mut write, mut read) = ws_stream.split();

        let ticket = uuid::Uuid::new_v4().to_string();
        let frames = vec![
            UpbitSubscribeFrame::Ticket { ticket: &ticket },
            UpbitSubscribeFrame::Type {
                kind: "orderbook",
                codes: vec![&self.symbol],
            },
            UpbitSubscribeFrame::Type {
                kind: "trade",
                codes: vec![&self.symbol],
            },
            UpbitSubscribeFrame::Format { format: "SIMPLE" },
        ];
        let payload = serde_json::to_string(&frames)
            .map_err(|e| ExchangeError::ParseError(e.to_string()))?;

        write
            .send(Message::Text(payload))
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        let _ = self.tx.send(UpbitStreamEvent::ConnectionStatus(true)).await;

        let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_frame(&text).await,
                        Some(Ok(Message::Binary(bytes))) => {
                            if let Ok(text) = String::from_utf8(bytes) {
                                self.handle_frame(&text).await;
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("업비트가 연결 종료를 요청");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("업비트 WS 수신 에러: {e}");
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
                        Ok(Ok(())) => debug!("업비트 ping 전송"),
                        _ => {
                            error!("업비트 ping 전송 실패/타임아웃");
                            break;
                        }
                    }
                }
            }
        }

        let _ = self.tx.send(UpbitStreamEvent::ConnectionStatus(false)).await;
        Err(ExchangeError::Disconnected("업비트 WS 연결 끊김".to_string()))
    }

    async fn handle_frame(&self, text: &str) {
        let Ok(frame) = serde_json::from_str::<UpbitFrame>(text) else {
            return;
        };
        let event = match frame {
            UpbitFrame::Orderbook { units } => match units.into_iter().next() {
                Some(top) => UpbitStreamEvent::Quote(BestQuote {
                    bid: top.bid_price,
                    ask: top.ask_price,
                    bid_qty: top.bid_size,
                    ask_qty: top.ask_size,
                }),
                None => return,
            },
            UpbitFrame::Trade { price, volume } => UpbitStreamEvent::Trade {
                price,
                quantity: volume,
            },
        };
        let _ = self.tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let steps: Vec<f64> = (1..=6)
            .map(|attempt| (INITIAL_BACKOFF_SECS * 2f64.powi(attempt - 1)).min(MAX_BACKOFF_SECS))
            .collect();
        assert_eq!(steps, vec![1.0, 2.0, 4.0, 8.0, 16.0, 30.0]);
    }
}
