//! 계좌/지갑 도메인 타입: 거래소 구분, 지갑 스냅샷, 계좌 상태.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 이 플랫폼이 거래하는 두 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// 한국 현물 거래소 (KRW 기준통화)
    Upbit,
    /// 해외 무기한 선물 거래소 (USDT 기준통화)
    Binance,
}

impl Venue {
    /// 해당 거래소의 기준(결제) 통화.
    pub fn principal_currency(&self) -> &'static str {
        match self {
            Venue::Upbit => "KRW",
            Venue::Binance => "USDT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Upbit => "upbit",
            Venue::Binance => "binance",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 한 거래소의 통화/계약 심볼 -> 부호 있는 수량 맵.
///
/// 해외 선물 숏 포지션은 음수로 표현된다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub balances: HashMap<String, Decimal>,
}

impl WalletSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, currency: &str) -> Decimal {
        self.balances.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, currency: impl Into<String>, amount: Decimal) {
        self.balances.insert(currency.into(), amount);
    }

    /// 기준통화를 제외한, 잔고가 0이 아닌 항목들.
    pub fn non_principal_balances<'a>(
        &'a self,
        principal: &'a str,
    ) -> impl Iterator<Item = (&'a str, Decimal)> + 'a {
        self.balances
            .iter()
            .filter(move |(ccy, amt)| ccy.as_str() != principal && !amt.is_zero())
            .map(|(ccy, amt)| (ccy.as_str(), *amt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_principal_currency() {
        assert_eq!(Venue::Upbit.principal_currency(), "KRW");
        assert_eq!(Venue::Binance.principal_currency(), "USDT");
    }

    #[test]
    fn test_non_principal_balances_excludes_principal_and_zero() {
        let mut wallet = WalletSnapshot::new();
        wallet.set("USDT", dec!(1000));
        wallet.set("BTCUSDT", dec!(-0.5));
        wallet.set("ETHUSDT", Decimal::ZERO);

        let remaining: Vec<_> = wallet.non_principal_balances("USDT").collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, "BTCUSDT");
    }
}
