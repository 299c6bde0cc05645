//! 김치 프리미엄 페어의 식별자, 프리미엄 계산, 호가 스냅샷.
//!
//! 하나의 페어는 한국 거래소 심볼, 해외 거래소 심볼, 앵커(환율) 심볼의
//! 조합 하나를 가리킨다. `PairBook`은 그 페어의 최신 호가/환율 스냅샷과
//! 두 프리미엄을 들고 있는 값 타입이며, 페어 평가기가 mutex로 감싸 공유한다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 페어를 구성하는 세 심볼.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairIdentity {
    /// 한국 거래소(업비트) 심볼, 예: "KRW-BTC"
    pub korean_symbol: String,
    /// 해외 거래소(바이낸스) 심볼, 예: "BTCUSDT"
    pub foreign_symbol: String,
    /// 앵커 환율 심볼, 예: "KRW-USDT"
    pub anchor_symbol: String,
}

impl PairIdentity {
    pub fn new(
        korean_symbol: impl Into<String>,
        foreign_symbol: impl Into<String>,
        anchor_symbol: impl Into<String>,
    ) -> Self {
        Self {
            korean_symbol: korean_symbol.into(),
            foreign_symbol: foreign_symbol.into(),
            anchor_symbol: anchor_symbol.into(),
        }
    }

    /// 기준 자산 이름을 해외 심볼에서 유추한다 (예: "BTCUSDT" -> "BTC").
    fn base_asset(&self) -> &str {
        self.foreign_symbol
            .strip_suffix("USDT")
            .unwrap_or(&self.foreign_symbol)
    }

    /// 안정적으로 파생되는 구독 키: `UPBIT_BINANCE_<quote>_<base>` (대문자).
    pub fn pair_id(&self) -> String {
        format!(
            "UPBIT_BINANCE_{}_{}",
            self.anchor_symbol.to_uppercase(),
            self.base_asset().to_uppercase()
        )
    }
}

impl std::fmt::Display for PairIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pair_id())
    }
}

/// 김치 프리미엄 쌍 (진입/청산), 단위 없는 비율.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Premium {
    /// `koreanAsk / (foreignBid * anchor)`; 1 미만이면 "싸다".
    pub enter: Decimal,
    /// `koreanBid / (foreignAsk * anchor)`; exitBoundary 초과시 청산.
    pub exit: Decimal,
}

impl Premium {
    /// 분모가 0이면 계산을 건너뛰고 `None`을 반환한다 (0으로 나누기 방지).
    pub fn calculate_enter(korean_ask: Decimal, foreign_bid: Decimal, anchor: Decimal) -> Option<Decimal> {
        if foreign_bid.is_zero() || anchor.is_zero() {
            return None;
        }
        Some(korean_ask / (foreign_bid * anchor))
    }

    pub fn calculate_exit(korean_bid: Decimal, foreign_ask: Decimal, anchor: Decimal) -> Option<Decimal> {
        if foreign_ask.is_zero() || anchor.is_zero() {
            return None;
        }
        Some(korean_bid / (foreign_ask * anchor))
    }
}

/// 프리미엄 엔진으로 내보내는 3-튜플: `[enterPremium, exitPremium, anchorPrice]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PremiumTriple {
    pub enter_premium: Decimal,
    pub exit_premium: Decimal,
    pub anchor_price: Decimal,
}

/// 페어 평가기가 mutex로 보호하며 들고 있는 호가/환율 스냅샷.
///
/// 여덟 개의 호가 필드와 anchor는 오직 이 mutex를 쥔 채로만 읽고 쓴다.
#[derive(Debug, Clone, Default)]
pub struct PairBook {
    pub korean_bid: Decimal,
    pub korean_bid_qty: Decimal,
    pub korean_ask: Decimal,
    pub korean_ask_qty: Decimal,
    pub foreign_bid: Decimal,
    pub foreign_bid_qty: Decimal,
    pub foreign_ask: Decimal,
    pub foreign_ask_qty: Decimal,
    pub anchor_price: Decimal,
    pub enter_premium: Decimal,
    pub exit_premium: Decimal,
}

impl PairBook {
    /// 프리미엄 방출 조건: 5개의 입력(양쪽 매도/매수호가 + anchor)이
    /// 전부 0이 아닌 값을 가진 적이 있어야 한다.
    pub fn is_ready(&self) -> bool {
        !self.korean_ask.is_zero()
            && !self.korean_bid.is_zero()
            && !self.foreign_ask.is_zero()
            && !self.foreign_bid.is_zero()
            && !self.anchor_price.is_zero()
    }

    /// `enter_premium`을 현재 스냅샷으로 재계산한다. 분모가 0이면 건너뛴다.
    pub fn recompute_enter(&mut self) {
        if let Some(enter) = Premium::calculate_enter(self.korean_ask, self.foreign_bid, self.anchor_price) {
            self.enter_premium = enter;
        }
    }

    /// `exit_premium`을 현재 스냅샷으로 재계산한다. 분모가 0이면 건너뛴다.
    pub fn recompute_exit(&mut self) {
        if let Some(exit) = Premium::calculate_exit(self.korean_bid, self.foreign_ask, self.anchor_price) {
            self.exit_premium = exit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_id_derivation() {
        let id = PairIdentity::new("KRW-BTC", "BTCUSDT", "KRW-USDT");
        assert_eq!(id.pair_id(), "UPBIT_BINANCE_KRW-USDT_BTC");
    }

    #[test]
    fn test_premium_enter_happy_path() {
        let enter = Premium::calculate_enter(dec!(1388), dec!(1.000), dec!(1400)).unwrap();
        // 1388 / (1.000 * 1400) ~= 0.9914
        assert!((enter - dec!(0.991428571428571428571428571)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_premium_guards_division_by_zero() {
        assert!(Premium::calculate_enter(dec!(1388), Decimal::ZERO, dec!(1400)).is_none());
        assert!(Premium::calculate_exit(dec!(1388), dec!(1.0), Decimal::ZERO).is_none());
    }

    #[test]
    fn test_pair_book_readiness() {
        let mut book = PairBook::default();
        assert!(!book.is_ready());
        book.korean_ask = dec!(1);
        book.korean_bid = dec!(1);
        book.foreign_ask = dec!(1);
        book.foreign_bid = dec!(1);
        book.anchor_price = dec!(1);
        assert!(book.is_ready());
    }
}
