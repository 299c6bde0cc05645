//! 페어 주문 사이징.
//!
//! 두 다리의 호가(가격×가용수량) 힌트, 앵커 환율, 두 기준통화 잔고,
//! 거래소 최소 금액, 해외 수량 정밀도로부터 거래 가능한 최대 명목가를
//! 계산한다.

use rust_decimal::Decimal;
use trader_core::{RiskConfig, TraderError};

/// 한 다리의 호가 힌트: 체결 가능한 최우선가와 그 수량.
#[derive(Debug, Clone, Copy)]
pub struct LegHint {
    pub price: Decimal,
    pub qty: Decimal,
}

/// 사이징 결과: 잘린 해외 수량과 그에 대응하는 두 다리의 실제 명목가.
#[derive(Debug, Clone, Copy)]
pub struct SizingResult {
    pub foreign_qty: Decimal,
    pub foreign_notional: Decimal,
    pub korean_notional: Decimal,
}

/// 가격을 소수점 `precision`자리로 내림(truncate)한다 — 반올림이 아니다.
fn truncate_to_precision(value: Decimal, precision: u32) -> Decimal {
    value.trunc_with_scale(precision)
}

/// 페어 Enter 주문의 최대 체결 가능 크기를 계산한다.
///
/// `korean_balance`/`foreign_balance`는 각각 KRW/USDT 잔고.
pub fn calculate_enter_size(
    korean_hint: LegHint,
    foreign_hint: LegHint,
    anchor: Decimal,
    korean_balance: Decimal,
    foreign_balance: Decimal,
    foreign_quantity_precision: u32,
    korean_minimum_notional: Decimal,
    foreign_minimum_notional: Decimal,
    risk: &RiskConfig,
) -> Result<SizingResult, TraderError> {
    if anchor <= Decimal::ZERO {
        return Err(TraderError::SizingInfeasible(
            "anchor rate must be positive".to_string(),
        ));
    }

    let korean_book_available = korean_hint.price * korean_hint.qty * risk.safe_margin;
    let foreign_book_available = foreign_hint.price * foreign_hint.qty * risk.safe_margin;
    let korean_fund = korean_balance * risk.use_fund_upper_bound;
    let foreign_fund = foreign_balance * risk.use_fund_upper_bound;

    let max_notional_usdt = [
        korean_book_available / anchor,
        korean_fund / anchor,
        foreign_book_available,
        foreign_fund,
    ]
    .into_iter()
    .fold(Decimal::MAX, Decimal::min);

    if max_notional_usdt <= Decimal::ZERO {
        return Err(TraderError::SizingInfeasible(
            "no venue/fund combination yields a positive notional".to_string(),
        ));
    }

    let raw_qty = max_notional_usdt / foreign_hint.price;
    let foreign_qty = truncate_to_precision(raw_qty, foreign_quantity_precision);

    if foreign_qty <= Decimal::ZERO {
        return Err(TraderError::SizingInfeasible(
            "truncated foreign quantity rounds to zero".to_string(),
        ));
    }

    let foreign_notional = foreign_qty * foreign_hint.price;
    let korean_notional = foreign_notional * anchor;

    if korean_notional < korean_minimum_notional {
        return Err(TraderError::SizingInfeasible(format!(
            "korean notional {korean_notional} below minimum {korean_minimum_notional}"
        )));
    }
    if foreign_qty < foreign_minimum_notional {
        return Err(TraderError::SizingInfeasible(format!(
            "foreign quantity {foreign_qty} below minimum {foreign_minimum_notional}"
        )));
    }

    Ok(SizingResult {
        foreign_qty,
        foreign_notional,
        korean_notional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(price: &str, qty: &str) -> LegHint {
        LegHint {
            price: price.parse().unwrap(),
            qty: qty.parse().unwrap(),
        }
    }

    #[test]
    fn test_sizing_truncates_not_rounds() {
        let result = calculate_enter_size(
            leg("50000000", "1"),
            leg("40000", "10"),
            dec!(1350),
            dec!(100_000_000),
            dec!(100_000),
            3,
            dec!(5000),
            dec!(1),
            &RiskConfig::default(),
        )
        .unwrap();

        assert_eq!(result.foreign_qty.scale(), 3);
        assert!(result.foreign_qty > Decimal::ZERO);
    }

    #[test]
    fn test_sizing_fails_below_korean_minimum() {
        let result = calculate_enter_size(
            leg("50000000", "0.0001"),
            leg("40000", "10"),
            dec!(1350),
            dec!(100_000_000),
            dec!(100_000),
            3,
            dec!(5_000_000_000),
            dec!(1),
            &RiskConfig::default(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_sizing_fails_on_zero_anchor() {
        let result = calculate_enter_size(
            leg("50000000", "1"),
            leg("40000", "10"),
            Decimal::ZERO,
            dec!(100_000_000),
            dec!(100_000),
            3,
            dec!(5000),
            dec!(1),
            &RiskConfig::default(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_truncate_to_precision_never_rounds_up() {
        let v: Decimal = "1.2399".parse().unwrap();
        assert_eq!(truncate_to_precision(v, 3).to_string(), "1.239");
    }
}
