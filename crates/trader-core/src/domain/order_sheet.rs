//! 트레이더 RPC 계약: `SubmitTrade(TradeRequest) -> OrderResponse`.
//!
//! 와이어 상의 `TradeRequest`의
//! one-of는 `serde`의 내부 태그(`order_type`)로 표현한다 — 와이어 상에서는
//! JSON-over-HTTP 바디 하나다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::Venue;

/// 거래소 주문 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// 한 거래소에 보낼 주문 한 장.
///
/// `price`의 의미는 거래소/방향에 따라 다르다: 업비트 시장가 매수는 이
/// 필드가 지출할 KRW 명목가를 나타내고, 그 외에는 단가를 나타낸다
/// (정밀도 감사 참고).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOrder {
    pub venue: Venue,
    pub symbol: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
    /// 해외 거래소 전용: 포지션을 반대 방향으로 뒤집을 수 없게 한다.
    #[serde(default)]
    pub reduce_only: bool,
}

impl ExchangeOrder {
    pub fn new(venue: Venue, symbol: impl Into<String>, side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self {
            venue,
            symbol: symbol.into(),
            side,
            price,
            amount,
            reduce_only: false,
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }
}

/// 페어 주문 종류: 진입(롱 한국/숏 해외) 또는 청산.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairOrderType {
    Unspecified,
    Enter,
    Exit,
}

/// 시그널 엔진이 트레이더에게 보내는 페어 주문 요청.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOrderSheet {
    pub base_symbol: String,
    pub exchange_rate: Decimal,
    pub pair_order_type: PairOrderType,
    pub upbit_order: ExchangeOrder,
    pub binance_order: ExchangeOrder,
    #[serde(default)]
    pub reason: String,
}

/// 계약에는 존재하지만 이 플랫폼의 핵심 범위 밖인 단일 주문 모양.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleOrderSheet {
    pub venue: Venue,
    pub order: ExchangeOrder,
}

/// `SubmitTrade`의 요청 바디. `order_type` 태그로 구분되는 one-of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "order_type", rename_all = "snake_case")]
pub enum TradeRequest {
    SingleOrder(SingleOrderSheet),
    PairOrder(PairOrderSheet),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
}

impl OrderResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: "order submitted".to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// 한 다리(leg)의 체결 기록. 두 다리가 같은 `pair_id`와 타임스탬프를 공유한다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KimchiOrderLog {
    pub pair_id: Uuid,
    pub order_time: DateTime<Utc>,
    pub execution_time: DateTime<Utc>,
    pub pair_side: PairOrderType,
    pub exchange: Venue,
    pub side: OrderSide,
    pub order_price: Decimal,
    pub executed_price: Decimal,
    pub anchor_price: Decimal,
}

/// 시그널 엔진의 500ms 주기 로그 행.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumLog {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub anchor_price: Decimal,
    pub kimchi_best_bid: Decimal,
    pub kimchi_best_ask: Decimal,
    pub cefi_best_bid: Decimal,
    pub cefi_best_ask: Decimal,
    pub enter_premium: Decimal,
    pub exit_premium: Decimal,
}

/// 비상 이탈 한 건의 기록.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyShutdownLog {
    pub time: DateTime<Utc>,
    pub position_clear_success: bool,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_request_serde_roundtrip_pair_order() {
        let sheet = PairOrderSheet {
            base_symbol: "BTC".to_string(),
            exchange_rate: dec!(1400),
            pair_order_type: PairOrderType::Enter,
            upbit_order: ExchangeOrder::new(Venue::Upbit, "KRW-BTC", OrderSide::Buy, dec!(124922), dec!(124922)),
            binance_order: ExchangeOrder::new(Venue::Binance, "BTCUSDT", OrderSide::Sell, dec!(1.0), dec!(89.230)),
            reason: "enter".to_string(),
        };
        let req = TradeRequest::PairOrder(sheet);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"order_type\":\"pair_order\""));
        let back: TradeRequest = serde_json::from_str(&json).unwrap();
        match back {
            TradeRequest::PairOrder(s) => assert_eq!(s.base_symbol, "BTC"),
            _ => panic!("expected PairOrder"),
        }
    }

    #[test]
    fn test_reduce_only_builder() {
        let order = ExchangeOrder::new(Venue::Binance, "BTCUSDT", OrderSide::Buy, dec!(1.0), dec!(50.0))
            .reduce_only();
        assert!(order.reduce_only);
    }
}
