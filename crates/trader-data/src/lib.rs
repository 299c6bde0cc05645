//! 데이터 관리 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 계좌 동기화 관리자 (거래소 잔고 → Redis/로컬 메모리)
//! - 자산 퍼블리셔 (오더북/체결 팬아웃 라우터)
//! - TimescaleDB 저장소 (계좌 스냅샷, 페어 주문 로그, 프리미엄 로그, 비상 이탈 로그)
//! - 타입 파라미터 저장소 (`trading_metadata`)
//! - Redis 캐싱 (지갑 키)

pub mod account_manager;
pub mod cache;
pub mod error;
pub mod log_writer;
pub mod publisher;
pub mod storage;

pub use account_manager::AccountManager;
pub use error::{DataError, Result};
pub use log_writer::LogWriterHandle;
pub use publisher::{OrderbookTick, SubscribableAsset, TradeTick};

// 저장소 타입 재내보내기
pub use cache::wallet::WalletCache;
pub use storage::{
    AccountSnapshotRecord, AccountSnapshotRepository, Database, DatabaseConfig,
    EmergencyShutdownLogRecord, EmergencyShutdownLogRepository, KimchiOrderLogRecord,
    KimchiOrderLogRepository, ParamStore, PremiumLogRecord, PremiumLogRepository, RedisCache,
    RedisConfig,
};
