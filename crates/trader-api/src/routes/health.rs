//! 헬스 체크 endpoint.
//!
//! 프로세스 슈퍼바이저(Kubernetes 등)를 위한 liveness/readiness 엔드포인트.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub timestamp: String,
}

/// liveness probe. 프로세스가 요청을 받을 수 있는지만 본다.
/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// readiness probe. 계좌 스냅샷이 한 번이라도 채워졌는지로 판단한다 —
/// 기동 시 `AccountManager::init`이 실패하면 바이너리는 애초에
/// 기동하지 않으므로, 여기서는 프로세스 생존만 확인하면 충분하다.
/// GET /readyz
pub async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ready".to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response))
}

pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz_returns_ok() {
        let app = Router::new().route("/healthz", get(healthz));

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
