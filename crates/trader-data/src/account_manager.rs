//! 계좌 동기화: 거래소 잔고를 주기적으로 읽어 Redis에 반영하고,
//! 로컬 메모리에도 최신 스냅샷을 들고 있는다.
//!
//! 실거래 경로(체결 후 잔고 갱신)와 이 모듈의 `run()` 틱이 같은 뮤텍스를
//! 공유한다 — 거래소 REST 호출(`syncFromExchange`)은 이 프로세스에서만
//! 일어나야 하고, 다른 리더는 로컬 접근자나 `syncFromCache`만 사용한다.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};
use trader_core::{Venue, WalletSnapshot};
use trader_exchange::VenueRest;

use crate::error::Result;
use crate::storage::redis::RedisCache;

const SYNC_INTERVAL_SECS: u64 = 30;

fn key_wallet_snapshot(venue: Venue) -> String {
    format!("wallet_snapshot:{}", venue.as_str())
}

fn key_position(venue: Venue, currency: &str) -> String {
    format!("wallet:{}:{}", venue.as_str(), currency)
}

fn key_reserved_fund(venue: Venue) -> String {
    format!("reserved_fund:{}", venue.as_str())
}

fn key_available_fund(venue: Venue) -> String {
    format!("available_fund:{}", venue.as_str())
}

struct Snapshots {
    upbit: WalletSnapshot,
    binance: WalletSnapshot,
}

impl Snapshots {
    fn get_mut(&mut self, venue: Venue) -> &mut WalletSnapshot {
        match venue {
            Venue::Upbit => &mut self.upbit,
            Venue::Binance => &mut self.binance,
        }
    }

    fn get(&self, venue: Venue) -> &WalletSnapshot {
        match venue {
            Venue::Upbit => &self.upbit,
            Venue::Binance => &self.binance,
        }
    }
}

/// 업비트/바이낸스 잔고를 동기화하고 로컬에 들고 있는 매니저.
///
/// `sync_mutex`는 `syncFromExchange`를 호출하는 모든 경로(주기 틱, 거래
/// 체결 후 즉시 갱신)를 직렬화한다 — 동시에 두 REST 호출이 같은 거래소
/// 잔고를 덮어쓰는 경쟁을 막는다.
pub struct AccountManager {
    upbit_rest: Arc<dyn VenueRest>,
    binance_rest: Arc<dyn VenueRest>,
    redis: RedisCache,
    snapshots: Arc<Mutex<Snapshots>>,
    sync_mutex: Arc<Mutex<()>>,
}

impl AccountManager {
    pub fn new(
        upbit_rest: Arc<dyn VenueRest>,
        binance_rest: Arc<dyn VenueRest>,
        redis: RedisCache,
    ) -> Self {
        Self {
            upbit_rest,
            binance_rest,
            redis,
            snapshots: Arc::new(Mutex::new(Snapshots {
                upbit: WalletSnapshot::new(),
                binance: WalletSnapshot::new(),
            })),
            sync_mutex: Arc::new(Mutex::new(())),
        }
    }

    fn rest_for(&self, venue: Venue) -> &Arc<dyn VenueRest> {
        match venue {
            Venue::Upbit => &self.upbit_rest,
            Venue::Binance => &self.binance_rest,
        }
    }

    /// 거래 경로가 계좌 상태를 건드리는 동안 `run()` 틱과 상호 배제하기
    /// 위해 드는 락. 트레이더 서비스는 `PairOrder` 처리 전체를 이 가드
    /// 수명 동안 감싸야 한다. 가드를 든 채로는
    /// [`Self::sync_from_exchange`]가 아니라
    /// [`Self::sync_from_exchange_locked`]를 불러야 한다 — 뮤텍스는
    /// 재진입이 불가능하다.
    pub async fn trade_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.sync_mutex.lock().await
    }

    /// 거래소에서 인증된 잔고 조회를 수행하고 Redis + 로컬 메모리에 반영한다.
    ///
    /// 이 메서드만 거래소에 실제로 잔고를 묻는다. 다른 호출부는
    /// [`Self::sync_from_cache`]나 로컬 접근자만 사용해야 한다.
    #[instrument(skip(self))]
    pub async fn sync_from_exchange(&self, venue: Venue) -> Result<WalletSnapshot> {
        let _guard = self.sync_mutex.lock().await;
        self.sync_from_exchange_locked(venue).await
    }

    /// [`Self::sync_from_exchange`]와 동일하지만 호출부가 이미
    /// [`Self::trade_lock`]을 들고 있다고 가정하고 직접 락을 시도하지
    /// 않는다 — `PairOrder` 처리 중 캐시를 재갱신하는 마지막 단계와
    /// 비상 이탈 경로에서 쓴다.
    pub async fn sync_from_exchange_locked(&self, venue: Venue) -> Result<WalletSnapshot> {
        let snapshot = self.rest_for(venue).fetch_wallet().await.map_err(|e| {
            crate::error::DataError::FetchError(format!(
                "{} wallet fetch failed: {e}",
                venue.as_str()
            ))
        })?;

        self.redis
            .set_persistent(&key_wallet_snapshot(venue), &snapshot)
            .await?;

        for (currency, amount) in snapshot.balances.iter() {
            self.redis
                .set_persistent(&key_position(venue, currency), amount)
                .await?;
        }

        let mut guard = self.snapshots.lock().await;
        *guard.get_mut(venue) = snapshot.clone();

        Ok(snapshot)
    }

    /// Redis에 이미 적재된 스냅샷을 읽어 로컬 메모리만 갱신한다.
    /// 거래소를 호출하지 않는다.
    pub async fn sync_from_cache(&self, venue: Venue) -> Result<()> {
        let snapshot: Option<WalletSnapshot> =
            self.redis.get(&key_wallet_snapshot(venue)).await?;

        if let Some(snapshot) = snapshot {
            let mut guard = self.snapshots.lock().await;
            *guard.get_mut(venue) = snapshot;
        } else {
            warn!(venue = venue.as_str(), "no cached wallet snapshot found");
        }

        Ok(())
    }

    /// 로컬 메모리에 있는 최신 스냅샷 복사본.
    pub async fn get_snapshot(&self, venue: Venue) -> WalletSnapshot {
        self.snapshots.lock().await.get(venue).clone()
    }

    /// 특정 통화/계약 잔고.
    pub async fn get_position(&self, venue: Venue, currency: &str) -> Decimal {
        self.snapshots.lock().await.get(venue).get(currency)
    }

    /// 예약 자금(읽기 전용) — 거래 경로가 쓰고 이 매니저는 읽기만 한다.
    pub async fn get_reserved_fund(&self, venue: Venue) -> Result<Decimal> {
        Ok(self
            .redis
            .get::<Decimal>(&key_reserved_fund(venue))
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    pub async fn get_available_fund(&self, venue: Venue) -> Result<Decimal> {
        Ok(self
            .redis
            .get::<Decimal>(&key_available_fund(venue))
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    /// 기동 시 한 번 양쪽 거래소를 동기화한다.
    pub async fn init(&self) -> Result<()> {
        self.sync_from_exchange(Venue::Upbit).await?;
        self.sync_from_exchange(Venue::Binance).await?;
        Ok(())
    }

    /// 30초마다 양쪽 거래소 잔고를 갱신하는 백그라운드 루프.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(Duration::from_secs(SYNC_INTERVAL_SECS));

        loop {
            ticker.tick().await;

            if let Err(e) = self.sync_from_exchange(Venue::Upbit).await {
                error!("upbit account sync failed: {e}");
            }
            if let Err(e) = self.sync_from_exchange(Venue::Binance).await {
                error!("binance account sync failed: {e}");
            }

            info!("account sync tick complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(key_wallet_snapshot(Venue::Upbit), "wallet_snapshot:upbit");
        assert_eq!(key_position(Venue::Binance, "USDT"), "wallet:binance:USDT");
        assert_eq!(key_reserved_fund(Venue::Upbit), "reserved_fund:upbit");
        assert_eq!(key_available_fund(Venue::Binance), "available_fund:binance");
    }
}
