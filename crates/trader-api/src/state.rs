//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `trader` 바이너리가 실제로 필요로 하는 의존성만 남긴다 — 계좌
//! 매니저와 트레이더 서비스, 기동 시각/버전뿐이다.

use std::sync::Arc;

use trader_core::AppConfig;
use trader_data::AccountManager;
use trader_execution::TraderService;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 계좌 상태의 단일 소유자
    pub account: Arc<AccountManager>,

    /// `SubmitTrade` 핸들러 본체
    pub trader_service: Arc<TraderService>,

    /// 로드된 설정 (읽기 전용 참조용)
    pub config: Arc<AppConfig>,

    /// 서버 시작 시각 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// 패키지 버전
    pub version: String,
}

impl AppState {
    pub fn new(
        account: Arc<AccountManager>,
        trader_service: Arc<TraderService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            account,
            trader_service,
            config,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
