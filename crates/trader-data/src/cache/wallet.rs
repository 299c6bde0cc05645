//! 지갑 Redis 키 빌더. 모든 쓰기는 트레이더 프로세스를 거친다.
//!
//! 키 형식: `reserved_fund:<venue>`, `available_fund:<venue>`,
//! `wallet:<venue>:<currency>`, `wallet_snapshot:<venue>`,
//! `order_id:<venue>`.

use rust_decimal::Decimal;
use trader_core::{Venue, WalletSnapshot};

use crate::error::Result;
use crate::storage::redis::RedisCache;

pub struct WalletCache {
    redis: RedisCache,
}

impl WalletCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn get_reserved_fund(&self, venue: Venue) -> Result<Decimal> {
        Ok(self
            .redis
            .get::<Decimal>(&format!("reserved_fund:{}", venue.as_str()))
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    pub async fn set_reserved_fund(&self, venue: Venue, amount: Decimal) -> Result<()> {
        self.redis
            .set_persistent(&format!("reserved_fund:{}", venue.as_str()), &amount)
            .await
    }

    pub async fn get_available_fund(&self, venue: Venue) -> Result<Decimal> {
        Ok(self
            .redis
            .get::<Decimal>(&format!("available_fund:{}", venue.as_str()))
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    pub async fn set_available_fund(&self, venue: Venue, amount: Decimal) -> Result<()> {
        self.redis
            .set_persistent(&format!("available_fund:{}", venue.as_str()), &amount)
            .await
    }

    pub async fn get_position(&self, venue: Venue, currency: &str) -> Result<Decimal> {
        Ok(self
            .redis
            .get::<Decimal>(&format!("wallet:{}:{}", venue.as_str(), currency))
            .await?
            .unwrap_or(Decimal::ZERO))
    }

    pub async fn set_position(&self, venue: Venue, currency: &str, amount: Decimal) -> Result<()> {
        self.redis
            .set_persistent(&format!("wallet:{}:{}", venue.as_str(), currency), &amount)
            .await
    }

    pub async fn get_wallet_snapshot(&self, venue: Venue) -> Result<Option<WalletSnapshot>> {
        self.redis
            .get(&format!("wallet_snapshot:{}", venue.as_str()))
            .await
    }

    pub async fn set_wallet_snapshot(&self, venue: Venue, snapshot: &WalletSnapshot) -> Result<()> {
        self.redis
            .set_persistent(&format!("wallet_snapshot:{}", venue.as_str()), snapshot)
            .await
    }

    pub async fn get_order_id(&self, venue: Venue) -> Result<Option<String>> {
        self.redis
            .get(&format!("order_id:{}", venue.as_str()))
            .await
    }

    pub async fn set_order_id(&self, venue: Venue, order_id: &str) -> Result<()> {
        self.redis
            .set_persistent(&format!("order_id:{}", venue.as_str()), &order_id.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_key_format_matches_source_convention() {
        assert_eq!(format!("reserved_fund:{}", "upbit"), "reserved_fund:upbit");
        assert_eq!(format!("wallet:{}:{}", "binance", "USDT"), "wallet:binance:USDT");
    }
}
