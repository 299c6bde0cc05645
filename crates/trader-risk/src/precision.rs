//! 주문 시트 정밀도 감사.
//!
//! 가격은 half-up으로 반올림하고, 수량은 잘라낸다(truncate). 한국 시장가
//! 매수의 `price` 필드는 단가가 아니라 지출할 명목가를 나타내므로
//! 정밀도는 정보 제공용일 뿐이다 — 수량만 잘라낸다.

use rust_decimal::Decimal;
use trader_core::{DecimalExt, ExchangeOrder, SymbolPrecision, TraderError};

fn round_price(price: Decimal, precision: u32) -> Decimal {
    price.round_dp(precision)
}

fn truncate_quantity(qty: Decimal, precision: u32) -> Decimal {
    qty.trunc_with_scale(precision)
}

/// 해외 시트(단가 필드가 실제 단가인 경우)에 가격/수량 정밀도를 모두 적용한다.
pub fn audit_foreign_order(
    order: &ExchangeOrder,
    precision: SymbolPrecision,
) -> Result<ExchangeOrder, TraderError> {
    let mut audited = order.clone();
    audited.price = round_price(order.price, precision.price_precision);
    audited.amount = truncate_quantity(order.amount, precision.quantity_precision);

    if audited.amount <= Decimal::ZERO {
        return Err(TraderError::Precision(
            "quantity truncates to zero".to_string(),
        ));
    }

    Ok(audited)
}

/// 한국 시트(`price`가 지출 명목가)는 수량만 정밀도 감사 대상이다.
pub fn audit_korean_order(
    order: &ExchangeOrder,
    quantity_precision: u32,
) -> Result<ExchangeOrder, TraderError> {
    let mut audited = order.clone();
    audited.amount = truncate_quantity(order.amount, quantity_precision);

    if audited.amount <= Decimal::ZERO {
        return Err(TraderError::Precision(
            "quantity truncates to zero".to_string(),
        ));
    }

    Ok(audited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trader_core::{OrderSide, Venue};

    #[test]
    fn test_round_price_half_up() {
        assert_eq!(round_price(dec!(1.005), 2), dec!(1.01));
        assert_eq!(round_price(dec!(1.004), 2), dec!(1.00));
    }

    #[test]
    fn test_truncate_never_rounds_up() {
        assert_eq!(truncate_quantity(dec!(1.2399), 3), dec!(1.239));
    }

    #[test]
    fn test_audit_foreign_order_applies_both() {
        let order = ExchangeOrder::new(
            Venue::Binance,
            "BTCUSDT",
            OrderSide::Sell,
            dec!(50123.456),
            dec!(0.123456),
        );
        let precision = SymbolPrecision {
            price_precision: 1,
            quantity_precision: 3,
        };

        let audited = audit_foreign_order(&order, precision).unwrap();
        assert_eq!(audited.price, dec!(50123.5));
        assert_eq!(audited.amount, dec!(0.123));
    }

    #[test]
    fn test_audit_korean_order_ignores_price() {
        let order = ExchangeOrder::new(
            Venue::Upbit,
            "KRW-BTC",
            OrderSide::Buy,
            dec!(1_000_000),
            dec!(0.01234567),
        );

        let audited = audit_korean_order(&order, 4).unwrap();
        assert_eq!(audited.price, dec!(1_000_000));
        assert_eq!(audited.amount, dec!(0.0123));
    }

    #[test]
    fn test_audit_rejects_zero_after_truncation() {
        let order = ExchangeOrder::new(
            Venue::Binance,
            "BTCUSDT",
            OrderSide::Sell,
            dec!(50000),
            dec!(0.0004),
        );
        let precision = SymbolPrecision {
            price_precision: 1,
            quantity_precision: 3,
        };

        assert!(audit_foreign_order(&order, precision).is_err());
    }
}
