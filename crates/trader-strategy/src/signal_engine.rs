//! 시그널 엔진: 진입/청산 경계를 적용하고 프로세스 로컬 포지션
//! 플래그를 관리하며, 경계 돌파를 트레이더 RPC로 번역한다.
//!
//! 기동 시 지갑 캐시를 직접 읽어 포지션 플래그를 재조정한다 — 신호
//! 프로세스는 거래소의 인증이 필요한 엔드포인트를 직접 두드리지 않고,
//! 공유 캐시와 트레이더 RPC 클라이언트만 갖는다.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info, warn};
use trader_core::{
    ExchangeOrder, OrderResponse, OrderSide, PairOrderSheet, PairOrderType, PremiumLog,
    TradeRequest, Venue,
};
use trader_data::cache::wallet::WalletCache;

use crate::pair_evaluator::{PairEvaluator, PairSnapshot, PremiumTriple};

const PREMIUM_LOG_TICK_MILLIS: u64 = 500;

/// 기동 시 재조정이 실패하는 경우 — 두 다리 중 한쪽만 보유 중인 상태.
#[derive(Debug, thiserror::Error)]
pub enum SignalEngineError {
    #[error("inconsistent startup position: korean leg present={korean}, foreign leg present={foreign}")]
    InconsistentPosition { korean: bool, foreign: bool },
    #[error("cache error: {0}")]
    Cache(#[from] trader_data::DataError),
    #[error("trader rpc error: {0}")]
    Rpc(#[from] reqwest::Error),
}

/// 한 페어에 대한 진입/청산 의사결정기.
pub struct SignalEngine {
    base_symbol: String,
    korean_symbol: String,
    foreign_symbol: String,
    evaluator: Arc<PairEvaluator>,
    premium_rx: mpsc::Receiver<PremiumTriple>,
    wallet_cache: WalletCache,
    rpc_client: reqwest::Client,
    trader_address: String,
    premium_log_tx: mpsc::Sender<PremiumLog>,
    enter_boundary: Decimal,
    exit_boundary: Decimal,
    in_position: bool,
    last_triple: PremiumTriple,
}

impl SignalEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base_symbol: impl Into<String>,
        korean_symbol: impl Into<String>,
        foreign_symbol: impl Into<String>,
        evaluator: Arc<PairEvaluator>,
        premium_rx: mpsc::Receiver<PremiumTriple>,
        wallet_cache: WalletCache,
        trader_address: impl Into<String>,
        premium_log_tx: mpsc::Sender<PremiumLog>,
        enter_boundary: Decimal,
        exit_boundary: Decimal,
    ) -> Self {
        Self {
            base_symbol: base_symbol.into(),
            korean_symbol: korean_symbol.into(),
            foreign_symbol: foreign_symbol.into(),
            evaluator,
            premium_rx,
            wallet_cache,
            rpc_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build rpc client"),
            trader_address: trader_address.into(),
            premium_log_tx,
            enter_boundary,
            exit_boundary,
            in_position: false,
            last_triple: PremiumTriple {
                enter_premium: Decimal::ZERO,
                exit_premium: Decimal::ZERO,
                anchor_price: Decimal::ZERO,
            },
        }
    }

    /// 기동 시 양쪽 지갑을 읽어 `in_position` 플래그를 재조정한다. 한쪽
    /// 다리만 보유 중이면 치명적 오류로 간주하고 기동을 중단시킨다.
    pub async fn reconcile_on_startup(&mut self) -> Result<(), SignalEngineError> {
        let korean_base_currency = self
            .korean_symbol
            .strip_prefix("KRW-")
            .unwrap_or(&self.korean_symbol);
        let korean_held = self
            .wallet_cache
            .get_position(Venue::Upbit, korean_base_currency)
            .await?
            > Decimal::ZERO;
        let foreign_position = self
            .wallet_cache
            .get_position(Venue::Binance, &self.foreign_symbol)
            .await?;
        let foreign_held = !foreign_position.is_zero();

        if korean_held != foreign_held {
            return Err(SignalEngineError::InconsistentPosition {
                korean: korean_held,
                foreign: foreign_held,
            });
        }

        self.in_position = korean_held && foreign_held;
        info!(in_position = self.in_position, "startup reconciliation complete");
        Ok(())
    }

    /// 프리미엄 채널과 500ms 로그 틱을 같은 병합 루프에서 처리한다.
    pub async fn run(mut self) {
        let mut log_ticker = interval(Duration::from_millis(PREMIUM_LOG_TICK_MILLIS));

        loop {
            tokio::select! {
                maybe_triple = self.premium_rx.recv() => {
                    match maybe_triple {
                        Some(triple) => self.on_premium(triple).await,
                        None => {
                            warn!(base_symbol = %self.base_symbol, "premium channel closed, signal engine stopping");
                            return;
                        }
                    }
                }
                _ = log_ticker.tick() => {
                    self.emit_premium_log().await;
                }
            }
        }
    }

    async fn on_premium(&mut self, triple: PremiumTriple) {
        self.last_triple = triple;

        if self.in_position && triple.exit_premium > self.exit_boundary {
            let snapshot = self.evaluator.snapshot().await;
            let sheet = self.build_exit_sheet(triple.anchor_price, snapshot);
            match self.submit_trade(sheet).await {
                Ok(response) if response.success => {
                    self.in_position = false;
                    info!(base_symbol = %self.base_symbol, "exit submitted");
                }
                Ok(response) => {
                    warn!(base_symbol = %self.base_symbol, message = %response.message, "exit rejected");
                }
                Err(e) => error!(base_symbol = %self.base_symbol, error = %e, "failed to submit exit"),
            }
        } else if !self.in_position && triple.enter_premium < self.enter_boundary {
            let snapshot = self.evaluator.snapshot().await;
            let sheet = self.build_enter_sheet(triple.anchor_price, snapshot);
            match self.submit_trade(sheet).await {
                Ok(response) if response.success => {
                    self.in_position = true;
                    info!(base_symbol = %self.base_symbol, "enter submitted");
                }
                Ok(response) => {
                    warn!(base_symbol = %self.base_symbol, message = %response.message, "enter rejected");
                }
                Err(e) => error!(base_symbol = %self.base_symbol, error = %e, "failed to submit enter"),
            }
        }
    }

    fn build_enter_sheet(&self, anchor_price: Decimal, snapshot: PairSnapshot) -> PairOrderSheet {
        PairOrderSheet {
            base_symbol: self.base_symbol.clone(),
            exchange_rate: anchor_price,
            pair_order_type: PairOrderType::Enter,
            upbit_order: ExchangeOrder::new(
                Venue::Upbit,
                self.korean_symbol.clone(),
                OrderSide::Buy,
                snapshot.korean_ask,
                snapshot.korean_ask_qty,
            ),
            binance_order: ExchangeOrder::new(
                Venue::Binance,
                self.foreign_symbol.clone(),
                OrderSide::Sell,
                snapshot.foreign_bid,
                snapshot.foreign_bid_qty,
            ),
            reason: "enter".to_string(),
        }
    }

    fn build_exit_sheet(&self, anchor_price: Decimal, snapshot: PairSnapshot) -> PairOrderSheet {
        PairOrderSheet {
            base_symbol: self.base_symbol.clone(),
            exchange_rate: anchor_price,
            pair_order_type: PairOrderType::Exit,
            upbit_order: ExchangeOrder::new(
                Venue::Upbit,
                self.korean_symbol.clone(),
                OrderSide::Sell,
                snapshot.korean_bid,
                snapshot.korean_bid_qty,
            ),
            binance_order: ExchangeOrder::new(
                Venue::Binance,
                self.foreign_symbol.clone(),
                OrderSide::Buy,
                snapshot.foreign_ask,
                snapshot.foreign_ask_qty,
            ),
            reason: "exit".to_string(),
        }
    }

    async fn submit_trade(&self, sheet: PairOrderSheet) -> Result<OrderResponse, reqwest::Error> {
        let request = TradeRequest::PairOrder(sheet);
        self.rpc_client
            .post(format!("{}/v1/trade", self.trader_address))
            .json(&request)
            .send()
            .await?
            .json::<OrderResponse>()
            .await
    }

    async fn emit_premium_log(&self) {
        let snapshot = self.evaluator.snapshot().await;
        let row = PremiumLog {
            time: chrono::Utc::now(),
            symbol: self.base_symbol.clone(),
            anchor_price: self.last_triple.anchor_price,
            kimchi_best_bid: snapshot.korean_bid,
            kimchi_best_ask: snapshot.korean_ask,
            cefi_best_bid: snapshot.foreign_bid,
            cefi_best_ask: snapshot.foreign_ask,
            enter_premium: self.last_triple.enter_premium,
            exit_premium: self.last_triple.exit_premium,
        };
        if self.premium_log_tx.try_send(row).is_err() {
            warn!(base_symbol = %self.base_symbol, "premium log channel full, dropping row");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_position_error_message() {
        let err = SignalEngineError::InconsistentPosition {
            korean: true,
            foreign: false,
        };
        assert!(err.to_string().contains("korean leg present=true"));
    }
}
