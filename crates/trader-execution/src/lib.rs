//! 주문 실행 및 포지션 관리.
//!
//! 이 crate는 다음을 제공합니다:
//! - `TraderService`: `SubmitTrade` RPC 핸들러, 페어 주문 사이징/실행/감사
//! - `Ejector`: 비상 이탈(emergency eject) 시퀀스

pub mod eject;
pub mod trader_service;

pub use eject::Ejector;
pub use trader_service::{TraderService, VenueRegistries};
