//! 비상 이탈: 페어 주문 중 어느 한쪽이라도 전송에 실패하면
//! 즉시 전 잔고를 정리하고 프로세스를 종료한다.
//!
//! 이탈 다리 하나가 실패해도 재시도하지 않는다 — 실패는
//! `wallet_cleared = false`와 합쳐진 메모에 접히고, 이탈은 실패 건수와
//! 무관하게 로그 기록과 종료까지 그대로 진행한다.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info};
use trader_core::{EmergencyShutdownLog, ExchangeOrder, OrderSide, Venue};
use trader_data::{AccountManager, EmergencyShutdownLogRepository};
use trader_exchange::VenueRest;

const CLOSE_BUFFER: Decimal = dec!(1.0005);

/// `KimchiPremiumEject`에 대응하는 비상 이탈 실행기.
pub struct Ejector {
    upbit_rest: Arc<dyn VenueRest>,
    binance_rest: Arc<dyn VenueRest>,
    account: Arc<AccountManager>,
    log_repo: EmergencyShutdownLogRepository,
    korean_minimum: Decimal,
    foreign_minimum: Decimal,
}

impl Ejector {
    pub fn new(
        upbit_rest: Arc<dyn VenueRest>,
        binance_rest: Arc<dyn VenueRest>,
        account: Arc<AccountManager>,
        log_repo: EmergencyShutdownLogRepository,
        korean_minimum: Decimal,
        foreign_minimum: Decimal,
    ) -> Self {
        Self {
            upbit_rest,
            binance_rest,
            account,
            log_repo,
            korean_minimum,
            foreign_minimum,
        }
    }

    /// 전 잔고를 정리하고 로그를 남긴 뒤 프로세스를 비정상 종료한다.
    ///
    /// 호출부가 이미 계좌 뮤텍스를 들고 있는 상태에서 불려야 한다
    /// (거래 경로 안에서 발생하는 유일한 호출 지점이기 때문).
    pub async fn eject(&self) -> ! {
        error!("[EMERGENCY] ejecting trading server");

        if let Err(e) = self.account.sync_from_exchange_locked(Venue::Upbit).await {
            error!("failed to refresh upbit wallet before eject: {e}");
        }
        if let Err(e) = self.account.sync_from_exchange_locked(Venue::Binance).await {
            error!("failed to refresh binance wallet before eject: {e}");
        }

        let mut wallet_cleared = true;
        let mut notes = Vec::new();

        let upbit_snapshot = self.account.get_snapshot(Venue::Upbit).await;
        for (currency, amount) in upbit_snapshot.non_principal_balances("KRW") {
            if amount <= self.korean_minimum {
                continue;
            }
            info!(currency, %amount, "closing korean position");

            let order = ExchangeOrder::new(
                Venue::Upbit,
                format!("KRW-{currency}"),
                OrderSide::Sell,
                Decimal::ZERO,
                amount,
            );

            match self.upbit_rest.place_order(&order).await {
                Ok(result) if result.success => {}
                Ok(result) => {
                    wallet_cleared = false;
                    notes.push(format!("upbit close {currency} rejected: {}", result.message));
                }
                Err(e) => {
                    wallet_cleared = false;
                    notes.push(format!("upbit close {currency} failed: {e}"));
                }
            }
        }

        let binance_snapshot = self.account.get_snapshot(Venue::Binance).await;
        for (symbol, amount) in binance_snapshot.non_principal_balances("USDT") {
            let abs_amount = amount.abs();
            if abs_amount <= self.foreign_minimum {
                continue;
            }
            info!(symbol, %abs_amount, "closing foreign position");

            let order = ExchangeOrder::new(
                Venue::Binance,
                symbol.to_string(),
                OrderSide::Buy,
                Decimal::ZERO,
                abs_amount * CLOSE_BUFFER,
            )
            .reduce_only();

            match self.binance_rest.place_order(&order).await {
                Ok(result) if result.success => {}
                Ok(result) => {
                    wallet_cleared = false;
                    notes.push(format!("binance close {symbol} rejected: {}", result.message));
                }
                Err(e) => {
                    wallet_cleared = false;
                    notes.push(format!("binance close {symbol} failed: {e}"));
                }
            }
        }

        let log = EmergencyShutdownLog {
            time: chrono::Utc::now(),
            position_clear_success: wallet_cleared,
            note: notes.join("\n"),
        };

        if let Err(e) = self.log_repo.insert(&log).await {
            error!("failed to persist emergency shutdown log: {e}");
        }

        std::process::exit(1);
    }
}
