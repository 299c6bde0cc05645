//! 거래소 심볼 메타데이터: 가용 심볼 집합과 가격/수량 정밀도.
//!
//! 시작 시 한 번 거래소 교환정보를 받아와 캐시한다. `refresh()`는 호출
//! 가능하지만 이 플랫폼 자체가 주기적으로 스케줄링하지는 않는다 — 원본이
//! 들고 있되 자동으로 돌리지 않는 동일한 모양을 그대로 유지한다.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 심볼의 거래 정밀도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPrecision {
    /// 가격 소수 자릿수
    pub price_precision: u32,
    /// 수량 소수 자릿수
    pub quantity_precision: u32,
}

/// 거래소 하나의 교환정보 캐시.
///
/// `isAvailableSymbol`/정밀도 조회는 모두 이 캐시를 본다. 바이낸스처럼
/// 정밀도 조회 메서드를 제공하는 거래소와, 업비트처럼 그런 메서드가
/// 없는(정밀도를 조회하지 않는) 거래소 양쪽을 `precisions`가 비어 있을 수
/// 있다는 사실로 함께 표현한다.
#[derive(Debug, Clone, Default)]
pub struct ExchangeInfo {
    symbols: HashMap<String, SymbolPrecision>,
    /// 정밀도 없이 가용성만 따지는 심볼 (업비트 현물처럼 틱사이즈를
    /// 거래소가 알아서 검증해 주는 경우).
    available_only: std::collections::HashSet<String>,
}

impl ExchangeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_with_precision(&mut self, symbol: impl Into<String>, precision: SymbolPrecision) {
        self.symbols.insert(symbol.into(), precision);
    }

    pub fn insert_available(&mut self, symbol: impl Into<String>) {
        self.available_only.insert(symbol.into());
    }

    pub fn is_available_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol) || self.available_only.contains(symbol)
    }

    pub fn precision(&self, symbol: &str) -> Option<SymbolPrecision> {
        self.symbols.get(symbol).copied()
    }
}

/// 거래소 하나의 가변 설정: 기준통화, 최소 거래 금액, 교환정보 캐시.
///
/// `principal_currency`/`minimum_trade_amount`는 하드코딩하지 않고 타입이
/// 태깅된 파라미터 저장소에서 읽어 채운다.
#[derive(Debug, Clone)]
pub struct VenueSymbolRegistry {
    pub principal_currency: String,
    pub minimum_trade_amount: Decimal,
    exchange_info: ExchangeInfo,
}

impl VenueSymbolRegistry {
    pub fn new(principal_currency: impl Into<String>, minimum_trade_amount: Decimal) -> Self {
        Self {
            principal_currency: principal_currency.into(),
            minimum_trade_amount,
            exchange_info: ExchangeInfo::new(),
        }
    }

    /// 캐시된 교환정보를 교체한다. 원본과 동일하게, 호출은 외부(기동 루틴
    /// 또는 운영자)가 결정하며 이 레지스트리는 스스로 일정을 잡지 않는다.
    pub fn refresh_exchange_info(&mut self, info: ExchangeInfo) {
        self.exchange_info = info;
    }

    pub fn is_available_symbol(&self, symbol: &str) -> bool {
        self.exchange_info.is_available_symbol(symbol)
    }

    pub fn precision(&self, symbol: &str) -> Option<SymbolPrecision> {
        self.exchange_info.precision(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_available_symbol_with_and_without_precision() {
        let mut info = ExchangeInfo::new();
        info.insert_with_precision(
            "BTCUSDT",
            SymbolPrecision {
                price_precision: 2,
                quantity_precision: 3,
            },
        );
        info.insert_available("KRW-BTC");

        assert!(info.is_available_symbol("BTCUSDT"));
        assert_eq!(info.precision("BTCUSDT").unwrap().quantity_precision, 3);

        assert!(info.is_available_symbol("KRW-BTC"));
        assert!(info.precision("KRW-BTC").is_none());

        assert!(!info.is_available_symbol("ETHUSDT"));
    }

    #[test]
    fn test_registry_refresh_replaces_snapshot() {
        let mut registry = VenueSymbolRegistry::new("USDT", dec!(1));
        assert!(!registry.is_available_symbol("BTCUSDT"));

        let mut info = ExchangeInfo::new();
        info.insert_with_precision(
            "BTCUSDT",
            SymbolPrecision {
                price_precision: 2,
                quantity_precision: 3,
            },
        );
        registry.refresh_exchange_info(info);

        assert!(registry.is_available_symbol("BTCUSDT"));
    }
}
