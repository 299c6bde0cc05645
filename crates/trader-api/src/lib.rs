//! `trader` 프로세스의 axum 라우터와 공유 상태.
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (`AppState`)
//! - [`routes`]: `/v1/trade` RPC와 `/healthz`/`/readyz`

pub mod routes;
pub mod state;

pub use routes::*;
pub use state::AppState;
