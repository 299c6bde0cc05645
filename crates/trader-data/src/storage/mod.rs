//! 저장소 레이어: 시계열 저장소, 타입 파라미터 저장소, Redis 캐시.

pub mod params;
pub mod redis;
pub mod timescale;

pub use params::ParamStore;
pub use redis::{RedisCache, RedisConfig};
pub use timescale::{
    AccountSnapshotRecord, AccountSnapshotRepository, Database, DatabaseConfig,
    EmergencyShutdownLogRecord, EmergencyShutdownLogRepository, KimchiOrderLogRecord,
    KimchiOrderLogRepository, PremiumLogRecord, PremiumLogRepository,
};
