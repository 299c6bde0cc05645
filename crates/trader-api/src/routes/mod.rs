//! API 라우트.
//!
//! - `/healthz`, `/readyz` - 프로세스 슈퍼바이저용 liveness/readiness
//! - `/v1/trade` - `SubmitTrade` RPC

pub mod health;
pub mod trade;

pub use health::{health_router, HealthResponse};
pub use trade::trade_router;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .nest("/v1/trade", trade_router())
}
