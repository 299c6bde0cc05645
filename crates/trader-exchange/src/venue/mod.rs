//! 거래소별(venue) REST/WebSocket 커넥터.
//!
//! `Exchange`/`MarketStream`(`traits.rs`)보다 좁은, 이 플랫폼이 실제로
//! 필요로 하는 작업(지갑 조회, 주문 전송, 교환정보 조회, 최우선호가
//! 스트리밍)만 드러내는 트레이트 두 개를 정의한다.

pub mod binance;
pub mod upbit;

use async_trait::async_trait;
use trader_core::{ExchangeOrder, ExchangeInfo, WalletSnapshot};

use crate::error::ExchangeError;

/// 주문 전송 한 건의 결과.
#[derive(Debug, Clone)]
pub struct LegResult {
    pub success: bool,
    pub message: String,
    pub venue_order_id: Option<String>,
}

impl LegResult {
    pub fn ok(venue_order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "filled".to_string(),
            venue_order_id: Some(venue_order_id.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            venue_order_id: None,
        }
    }
}

/// 한 거래소의 REST 면(지갑, 주문, 교환정보).
#[async_trait]
pub trait VenueRest: Send + Sync {
    /// 모든 통화/계약의 잔고 스냅샷.
    async fn fetch_wallet(&self) -> Result<WalletSnapshot, ExchangeError>;

    /// 시장가 주문 하나를 전송한다.
    async fn place_order(&self, order: &ExchangeOrder) -> Result<LegResult, ExchangeError>;

    /// 가용 심볼 집합과 가격/수량 정밀도 캐시를 새로 받아온다.
    ///
    /// 이 플랫폼은 이 메서드를 기동 시 한 번 호출할 뿐, 스스로 주기적으로
    /// 재조회를 스케줄링하지 않는다.
    async fn fetch_exchange_info(&self) -> Result<ExchangeInfo, ExchangeError>;
}

/// 한 거래소의 최우선호가(best bid/ask) 실시간 스트림에서 나오는 이벤트.
#[derive(Debug, Clone, Copy)]
pub struct BestQuote {
    pub bid: rust_decimal::Decimal,
    pub ask: rust_decimal::Decimal,
    pub bid_qty: rust_decimal::Decimal,
    pub ask_qty: rust_decimal::Decimal,
}
