//! 캐싱 레이어.
//!
//! - Wallet 캐시: 지갑/잔고 Redis 키 접근자

pub mod wallet;

pub use wallet::WalletCache;
