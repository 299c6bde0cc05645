//! 타입이 태깅된 키/값 파라미터 저장소를 위한 값 타입.
//!
//! `GetTradeMetadata(key, default) -> any` 방식의 동적 반환 대신, 호출부가
//! 스칼라 종류를 알고 있다는 전제 하에 `ParamValue`로 한 번 감싸 디코드한다.

use serde::{Deserialize, Serialize};

/// `trading_metadata.value_type` 컬럼이 태깅하는 스칼라 종류.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "value_type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    BoolArray(Vec<bool>),
    StringArray(Vec<String>),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }
}

/// 페어별 설정 파라미터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairParameters {
    pub enter_premium_boundary: rust_decimal::Decimal,
    pub exit_premium_boundary: rust_decimal::Decimal,
    pub korean_minimum_notional: rust_decimal::Decimal,
    pub foreign_minimum_notional: rust_decimal::Decimal,
    pub max_leverage: u32,
}

impl Default for PairParameters {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            enter_premium_boundary: dec!(0.9980),
            exit_premium_boundary: dec!(1.0035),
            korean_minimum_notional: dec!(5000),
            foreign_minimum_notional: dec!(1),
            max_leverage: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_value_type_dispatch() {
        let v = ParamValue::Int(10);
        assert_eq!(v.as_int(), Some(10));
        assert_eq!(v.as_bool(), None);

        let v = ParamValue::StringArray(vec!["a".into(), "b".into()]);
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn test_pair_parameters_defaults() {
        use rust_decimal_macros::dec;
        let p = PairParameters::default();
        assert_eq!(p.enter_premium_boundary, dec!(0.9980));
        assert_eq!(p.exit_premium_boundary, dec!(1.0035));
    }
}
