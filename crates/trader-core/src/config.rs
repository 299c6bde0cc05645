//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::PairParameters;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// Redis 설정
    pub redis: RedisConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 사이징 리스크 상수
    pub risk: RiskConfig,
    /// 거래소별 설정. 키는 `Venue::as_str()` (`"upbit"`/`"binance"`)와 일치해야 한다.
    pub exchanges: HashMap<String, ExchangeConfig>,
    /// 이 프로세스가 다루는 단일 페어 설정
    pub pair: PairConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// 유휴 타임아웃 (초)
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connection_timeout_secs: 30,
            idle_timeout_secs: 300,
        }
    }
}

/// Redis 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            connection_timeout_secs: 5,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 사이징 알고리즘의 리스크 상수.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskConfig {
    /// 가용 자금에 곱하는 안전 마진. 지갑 스냅샷의 레이턴시를 흡수한다.
    pub safe_margin: Decimal,
    /// 한 번의 진입에 쓸 수 있는 예치 자금의 상한 비율.
    pub use_fund_upper_bound: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            safe_margin: dec!(0.9),
            use_fund_upper_bound: dec!(0.4),
        }
    }
}

/// 거래소(venue) 연결 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// 이 거래소 활성화 여부
    pub enabled: bool,
    /// 거래소 이름 (`Venue::as_str()`와 일치)
    pub name: String,
    /// REST API 기본 URL
    pub rest_base_url: String,
    /// WebSocket 기본 URL
    pub ws_base_url: String,
    /// API 키
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// API 시크릿
    #[serde(default)]
    pub api_secret: Option<SecretString>,
    /// 분당 요청 한도
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// 재연결 초기 지연 (초). 지터는 실행 시점에 별도로 더한다.
    #[serde(default = "default_ws_reconnect_initial")]
    pub ws_reconnect_initial_secs: f64,
    /// 재연결 지연의 상한 (초). 시도마다 지수적으로 배가하다 이 값에서 멈춘다.
    #[serde(default = "default_ws_reconnect_max")]
    pub ws_reconnect_max_secs: f64,
    /// 최대 재연결 시도 횟수. 초과 시 치명적 에러로 종료한다.
    #[serde(default = "default_ws_max_reconnect")]
    pub ws_max_reconnect_attempts: u32,
    /// WebSocket ping 주기 (초)
    #[serde(default = "default_ws_ping_interval")]
    pub ws_ping_interval_secs: u64,
    /// WebSocket 쓰기 데드라인 (초)
    #[serde(default = "default_ws_write_timeout")]
    pub ws_write_timeout_secs: u64,
}

fn default_rate_limit() -> u32 {
    1200
}
fn default_ws_reconnect_initial() -> f64 {
    1.0
}
fn default_ws_reconnect_max() -> f64 {
    30.0
}
fn default_ws_max_reconnect() -> u32 {
    5
}
fn default_ws_ping_interval() -> u64 {
    40
}
fn default_ws_write_timeout() -> u64 {
    10
}
fn default_trader_rpc_address() -> String {
    "http://127.0.0.1:8080".to_string()
}

/// 이 프로세스가 평가/거래하는 단일 페어의 구성.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairConfig {
    /// 업비트 현물 심볼 (예: `"KRW-BTC"`)
    pub korean_symbol: String,
    /// 바이낸스 선물 심볼 (예: `"BTCUSDT"`)
    pub foreign_symbol: String,
    /// 환율 앵커 심볼 (예: `"KRW-USDT"`)
    pub anchor_symbol: String,
    /// `signal` 프로세스가 `SubmitTrade`를 호출할 `trader` 프로세스 주소
    /// (예: `"http://127.0.0.1:8080"`)
    #[serde(default = "default_trader_rpc_address")]
    pub trader_rpc_address: String,
    /// 진입/청산 프리미엄 경계 및 최소 거래 단위
    #[serde(default)]
    pub parameters: PairParameters,
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("risk.safe_margin", "0.9")?
            .set_default("risk.use_fund_upper_bound", "0.4")?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("TRADER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_config_defaults() {
        let risk = RiskConfig::default();
        assert_eq!(risk.safe_margin, dec!(0.9));
        assert_eq!(risk.use_fund_upper_bound, dec!(0.4));
    }
}
