//! 페어 평가 및 시그널 생성.
//!
//! 이 크레이트가 제공하는 기능:
//! - 페어 평가기: 9개 채널을 병합해 진입/청산 프리미엄을 계산
//! - 시그널 엔진: 프리미엄 경계 돌파를 트레이더 RPC 호출로 번역

pub mod pair_evaluator;
pub mod signal_engine;

pub use pair_evaluator::{PairEvaluator, PairSnapshot, PremiumTriple};
pub use signal_engine::{SignalEngine, SignalEngineError};
