//! `POST /v1/trade` — `SubmitTrade` RPC.
//!
//! 전송은 JSON-over-HTTP다: 와이어 one-of는 `TradeRequest`의 태깅된
//! `enum` 표현 그대로 역직렬화된다.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use trader_core::{OrderResponse, TradeRequest};

use crate::state::AppState;

async fn submit_trade(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TradeRequest>,
) -> Json<OrderResponse> {
    let response = state.trader_service.submit_trade(request).await;
    Json(response)
}

pub fn trade_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(submit_trade))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_core::{ExchangeOrder, OrderSide, PairOrderSheet, PairOrderType, Venue};

    #[test]
    fn test_trade_request_serializes_as_tagged_enum() {
        let sheet = PairOrderSheet {
            base_symbol: "BTC".to_string(),
            exchange_rate: rust_decimal_macros::dec!(1350),
            pair_order_type: PairOrderType::Enter,
            upbit_order: ExchangeOrder::new(
                Venue::Upbit,
                "KRW-BTC",
                OrderSide::Buy,
                rust_decimal::Decimal::ZERO,
                rust_decimal::Decimal::ZERO,
            ),
            binance_order: ExchangeOrder::new(
                Venue::Binance,
                "BTCUSDT",
                OrderSide::Sell,
                rust_decimal::Decimal::ZERO,
                rust_decimal::Decimal::ZERO,
            ),
            reason: "test".to_string(),
        };
        let request = TradeRequest::PairOrder(sheet);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("PairOrder").is_some());
    }
}
