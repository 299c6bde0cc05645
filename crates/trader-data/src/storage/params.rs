//! `trading_metadata(key, value, value_type)` 타입 접근자.
//!
//! `value_type` 태그로 디스패치해 호출부가 기대하는 스칼라 종류로 직접
//! 반환한다. 조회 실패는 기본값으로 폴백하며 경고 로그를 남기고,
//! `value_type`이 호출부 기대와 다르면 배포 설정이 깨진 것이므로
//! `DataError::ConfigError`를 반환한다.

use crate::error::{DataError, Result};
use sqlx::FromRow;
use tracing::warn;
use trader_core::ParamValue;

use crate::storage::timescale::Database;

#[derive(Debug, FromRow)]
struct TradingMetadataRow {
    #[allow(dead_code)]
    key: String,
    value: String,
    value_type: String,
}

pub struct ParamStore {
    db: Database,
}

impl ParamStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn fetch(&self, key: &str) -> Result<Option<TradingMetadataRow>> {
        sqlx::query_as("SELECT key, value, value_type FROM trading_metadata WHERE key = $1")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await
            .map_err(Into::into)
    }

    fn decode(row: TradingMetadataRow) -> Result<ParamValue> {
        match row.value_type.as_str() {
            "int" => row
                .value
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|e| DataError::InvalidData(e.to_string())),
            "float" => row
                .value
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|e| DataError::InvalidData(e.to_string())),
            "bool" => row
                .value
                .parse::<bool>()
                .map(ParamValue::Bool)
                .map_err(|e| DataError::InvalidData(e.to_string())),
            "string" => Ok(ParamValue::String(row.value)),
            "int_array" => serde_json::from_str::<Vec<i64>>(&row.value)
                .map(ParamValue::IntArray)
                .map_err(DataError::from),
            "float_array" => serde_json::from_str::<Vec<f64>>(&row.value)
                .map(ParamValue::FloatArray)
                .map_err(DataError::from),
            "bool_array" => serde_json::from_str::<Vec<bool>>(&row.value)
                .map(ParamValue::BoolArray)
                .map_err(DataError::from),
            "string_array" => serde_json::from_str::<Vec<String>>(&row.value)
                .map(ParamValue::StringArray)
                .map_err(DataError::from),
            other => Err(DataError::ConfigError(format!(
                "unknown trading_metadata value_type '{other}'"
            ))),
        }
    }

    /// 정수 파라미터를 읽는다. 미존재 시 `default`로 폴백한다.
    pub async fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.fetch(key).await? {
            None => {
                warn!(key, default, "trading_metadata miss, using default");
                Ok(default)
            }
            Some(row) => match Self::decode(row)? {
                ParamValue::Int(v) => Ok(v),
                _ => Err(DataError::ConfigError(format!(
                    "trading_metadata key '{key}' is not typed as int"
                ))),
            },
        }
    }

    pub async fn get_float(&self, key: &str, default: f64) -> Result<f64> {
        match self.fetch(key).await? {
            None => {
                warn!(key, default, "trading_metadata miss, using default");
                Ok(default)
            }
            Some(row) => match Self::decode(row)? {
                ParamValue::Float(v) => Ok(v),
                ParamValue::Int(v) => Ok(v as f64),
                _ => Err(DataError::ConfigError(format!(
                    "trading_metadata key '{key}' is not typed as float"
                ))),
            },
        }
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.fetch(key).await? {
            None => {
                warn!(key, default, "trading_metadata miss, using default");
                Ok(default)
            }
            Some(row) => match Self::decode(row)? {
                ParamValue::Bool(v) => Ok(v),
                _ => Err(DataError::ConfigError(format!(
                    "trading_metadata key '{key}' is not typed as bool"
                ))),
            },
        }
    }

    pub async fn get_string(&self, key: &str, default: &str) -> Result<String> {
        match self.fetch(key).await? {
            None => {
                warn!(key, default, "trading_metadata miss, using default");
                Ok(default.to_string())
            }
            Some(row) => match Self::decode(row)? {
                ParamValue::String(v) => Ok(v),
                _ => Err(DataError::ConfigError(format!(
                    "trading_metadata key '{key}' is not typed as string"
                ))),
            },
        }
    }

    pub async fn set(&self, key: &str, value: &ParamValue) -> Result<()> {
        let (value_str, value_type) = encode(value);
        sqlx::query(
            r#"
            INSERT INTO trading_metadata (key, value, value_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, value_type = EXCLUDED.value_type
            "#,
        )
        .bind(key)
        .bind(value_str)
        .bind(value_type)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

fn encode(value: &ParamValue) -> (String, &'static str) {
    match value {
        ParamValue::Int(v) => (v.to_string(), "int"),
        ParamValue::Float(v) => (v.to_string(), "float"),
        ParamValue::Bool(v) => (v.to_string(), "bool"),
        ParamValue::String(v) => (v.clone(), "string"),
        ParamValue::IntArray(v) => (serde_json::to_string(v).unwrap_or_default(), "int_array"),
        ParamValue::FloatArray(v) => (serde_json::to_string(v).unwrap_or_default(), "float_array"),
        ParamValue::BoolArray(v) => (serde_json::to_string(v).unwrap_or_default(), "bool_array"),
        ParamValue::StringArray(v) => {
            (serde_json::to_string(v).unwrap_or_default(), "string_array")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_roundtrips_type_tag() {
        assert_eq!(encode(&ParamValue::Int(5)), ("5".to_string(), "int"));
        assert_eq!(
            encode(&ParamValue::Bool(true)),
            ("true".to_string(), "bool")
        );
    }
}
