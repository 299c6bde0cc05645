//! 페어 평가기: 페어 하나의 호가 상태를 소유하고, 두 프리미엄을
//! 결정적으로 계산해 시그널 엔진으로 내보낸다.
//!
//! 병합 루프 하나가 한국/해외 호가 8개 채널과 앵커 체결 채널까지 총
//! 9개 채널을 select한다. 입력 하나가 들어올 때마다: 뮤텍스를 들고,
//! 필드 하나만 갱신하고, 관련 프리미엄을 재계산하고, 뮤텍스를 놓는다.
//! 다섯 입력(한국매도호가/매수호가, 해외매도호가/매수호가, 앵커)이 모두
//! 한 번이라도 0이 아니게 된 뒤에만 논블로킹으로 내보낸다.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};
use trader_core::{PairBook, PremiumTriple};

/// 연속으로 준비되지 않은 루프 반복 횟수 상한. 대략 100ms 틱 간격 기준
/// 8분 동안 다섯 입력 중 하나라도 갱신되지 않으면 치명적 오류로 간주한다.
const MAX_CONSECUTIVE_NOT_READY: u64 = 5000;

/// 업비트/바이낸스 한 쌍에 대한 상태 기계.
pub struct PairEvaluator {
    pub pair_id: String,
    state: Mutex<PairBook>,
    korean_bid_rx: Mutex<mpsc::Receiver<Decimal>>,
    korean_bid_qty_rx: Mutex<mpsc::Receiver<Decimal>>,
    korean_ask_rx: Mutex<mpsc::Receiver<Decimal>>,
    korean_ask_qty_rx: Mutex<mpsc::Receiver<Decimal>>,
    foreign_bid_rx: Mutex<mpsc::Receiver<Decimal>>,
    foreign_bid_qty_rx: Mutex<mpsc::Receiver<Decimal>>,
    foreign_ask_rx: Mutex<mpsc::Receiver<Decimal>>,
    foreign_ask_qty_rx: Mutex<mpsc::Receiver<Decimal>>,
    anchor_price_rx: Mutex<mpsc::Receiver<Decimal>>,
    premium_tx: mpsc::Sender<PremiumTriple>,
}

#[allow(clippy::too_many_arguments)]
impl PairEvaluator {
    pub fn new(
        pair_id: impl Into<String>,
        korean_bid_rx: mpsc::Receiver<Decimal>,
        korean_bid_qty_rx: mpsc::Receiver<Decimal>,
        korean_ask_rx: mpsc::Receiver<Decimal>,
        korean_ask_qty_rx: mpsc::Receiver<Decimal>,
        foreign_bid_rx: mpsc::Receiver<Decimal>,
        foreign_bid_qty_rx: mpsc::Receiver<Decimal>,
        foreign_ask_rx: mpsc::Receiver<Decimal>,
        foreign_ask_qty_rx: mpsc::Receiver<Decimal>,
        anchor_price_rx: mpsc::Receiver<Decimal>,
        premium_tx: mpsc::Sender<PremiumTriple>,
    ) -> Self {
        Self {
            pair_id: pair_id.into(),
            state: Mutex::new(PairBook::default()),
            korean_bid_rx: Mutex::new(korean_bid_rx),
            korean_bid_qty_rx: Mutex::new(korean_bid_qty_rx),
            korean_ask_rx: Mutex::new(korean_ask_rx),
            korean_ask_qty_rx: Mutex::new(korean_ask_qty_rx),
            foreign_bid_rx: Mutex::new(foreign_bid_rx),
            foreign_bid_qty_rx: Mutex::new(foreign_bid_qty_rx),
            foreign_ask_rx: Mutex::new(foreign_ask_rx),
            foreign_ask_qty_rx: Mutex::new(foreign_ask_qty_rx),
            anchor_price_rx: Mutex::new(anchor_price_rx),
            premium_tx,
        }
    }

    /// 현재 호가 스냅샷 (시그널 엔진이 페어 주문 힌트를 만들 때 쓴다).
    pub async fn snapshot(&self) -> PairSnapshot {
        let state = self.state.lock().await;
        PairSnapshot {
            korean_bid: state.korean_bid,
            korean_bid_qty: state.korean_bid_qty,
            korean_ask: state.korean_ask,
            korean_ask_qty: state.korean_ask_qty,
            foreign_bid: state.foreign_bid,
            foreign_bid_qty: state.foreign_bid_qty,
            foreign_ask: state.foreign_ask,
            foreign_ask_qty: state.foreign_ask_qty,
        }
    }

    /// 병합 루프. 프로세스당 한 번만 구동해야 한다.
    pub async fn run(self: Arc<Self>) {
        let mut korean_bid_rx = self.korean_bid_rx.lock().await;
        let mut korean_bid_qty_rx = self.korean_bid_qty_rx.lock().await;
        let mut korean_ask_rx = self.korean_ask_rx.lock().await;
        let mut korean_ask_qty_rx = self.korean_ask_qty_rx.lock().await;
        let mut foreign_bid_rx = self.foreign_bid_rx.lock().await;
        let mut foreign_bid_qty_rx = self.foreign_bid_qty_rx.lock().await;
        let mut foreign_ask_rx = self.foreign_ask_rx.lock().await;
        let mut foreign_ask_qty_rx = self.foreign_ask_qty_rx.lock().await;
        let mut anchor_price_rx = self.anchor_price_rx.lock().await;

        let mut not_ready_streak: u64 = 0;
        let mut drop_count: u64 = 0;

        // 채널 하나가 닫혀도 `recv()`는 즉시 `None`을 반환하며 계속 준비된
        // 상태로 남는다 — 가드 없이 select하면 그 가지가 매 반복 바쁜
        // 폴링을 유발한다. 닫힌 채널은 가드로 꺼서 남은 채널만 폴링한다.
        let mut korean_bid_closed = false;
        let mut korean_bid_qty_closed = false;
        let mut korean_ask_closed = false;
        let mut korean_ask_qty_closed = false;
        let mut foreign_bid_closed = false;
        let mut foreign_bid_qty_closed = false;
        let mut foreign_ask_closed = false;
        let mut foreign_ask_qty_closed = false;
        let mut anchor_price_closed = false;

        loop {
            if korean_bid_closed
                && korean_bid_qty_closed
                && korean_ask_closed
                && korean_ask_qty_closed
                && foreign_bid_closed
                && foreign_bid_qty_closed
                && foreign_ask_closed
                && foreign_ask_qty_closed
                && anchor_price_closed
            {
                warn!(pair_id = %self.pair_id, "all input channels closed, evaluator stopping");
                return;
            }

            let ready = tokio::select! {
                v = korean_bid_rx.recv(), if !korean_bid_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.korean_bid = v;
                        s.recompute_exit();
                        s.is_ready()
                    }
                    None => { korean_bid_closed = true; continue; }
                },
                v = korean_bid_qty_rx.recv(), if !korean_bid_qty_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.korean_bid_qty = v;
                        s.is_ready()
                    }
                    None => { korean_bid_qty_closed = true; continue; }
                },
                v = korean_ask_rx.recv(), if !korean_ask_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.korean_ask = v;
                        s.recompute_enter();
                        s.is_ready()
                    }
                    None => { korean_ask_closed = true; continue; }
                },
                v = korean_ask_qty_rx.recv(), if !korean_ask_qty_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.korean_ask_qty = v;
                        s.is_ready()
                    }
                    None => { korean_ask_qty_closed = true; continue; }
                },
                v = foreign_bid_rx.recv(), if !foreign_bid_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.foreign_bid = v;
                        s.recompute_enter();
                        s.is_ready()
                    }
                    None => { foreign_bid_closed = true; continue; }
                },
                v = foreign_bid_qty_rx.recv(), if !foreign_bid_qty_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.foreign_bid_qty = v;
                        s.is_ready()
                    }
                    None => { foreign_bid_qty_closed = true; continue; }
                },
                v = foreign_ask_rx.recv(), if !foreign_ask_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.foreign_ask = v;
                        s.recompute_exit();
                        s.is_ready()
                    }
                    None => { foreign_ask_closed = true; continue; }
                },
                v = foreign_ask_qty_rx.recv(), if !foreign_ask_qty_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.foreign_ask_qty = v;
                        s.is_ready()
                    }
                    None => { foreign_ask_qty_closed = true; continue; }
                },
                v = anchor_price_rx.recv(), if !anchor_price_closed => match v {
                    Some(v) => {
                        let mut s = self.state.lock().await;
                        s.anchor_price = v;
                        s.recompute_enter();
                        s.recompute_exit();
                        s.is_ready()
                    }
                    None => { anchor_price_closed = true; continue; }
                },
            };

            if !ready {
                not_ready_streak += 1;
                if not_ready_streak >= MAX_CONSECUTIVE_NOT_READY {
                    error!(
                        pair_id = %self.pair_id,
                        "readiness timeout: no usable data from any producer, exiting"
                    );
                    std::process::exit(1);
                }
                continue;
            }
            not_ready_streak = 0;

            let triple = {
                let s = self.state.lock().await;
                PremiumTriple {
                    enter_premium: s.enter_premium,
                    exit_premium: s.exit_premium,
                    anchor_price: s.anchor_price,
                }
            };

            if self.premium_tx.try_send(triple).is_err() {
                drop_count += 1;
                debug!(pair_id = %self.pair_id, drop_count, "premium channel full, dropping triple");
            }
        }
    }
}

/// 시그널 엔진이 페어 주문 힌트를 만들 때 쓰는 호가 스냅샷.
#[derive(Debug, Clone, Copy)]
pub struct PairSnapshot {
    pub korean_bid: Decimal,
    pub korean_bid_qty: Decimal,
    pub korean_ask: Decimal,
    pub korean_ask_qty: Decimal,
    pub foreign_bid: Decimal,
    pub foreign_bid_qty: Decimal,
    pub foreign_ask: Decimal,
    pub foreign_ask_qty: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_enter_premium_formula() {
        let mut state = PairBook {
            korean_ask: dec!(100_000_000),
            foreign_bid: dec!(70_000),
            anchor_price: dec!(1400),
            ..Default::default()
        };
        state.recompute_enter();
        assert_eq!(state.enter_premium, dec!(100_000_000) / (dec!(70_000) * dec!(1400)));
    }

    #[test]
    fn test_exit_premium_formula() {
        let mut state = PairBook {
            korean_bid: dec!(100_000_000),
            foreign_ask: dec!(70_100),
            anchor_price: dec!(1400),
            ..Default::default()
        };
        state.recompute_exit();
        assert_eq!(state.exit_premium, dec!(100_000_000) / (dec!(70_100) * dec!(1400)));
    }

    #[test]
    fn test_zero_divisor_skips_recompute() {
        let mut state = PairBook::default();
        state.recompute_enter();
        assert_eq!(state.enter_premium, Decimal::ZERO);
        assert!(!state.is_ready());
    }
}
