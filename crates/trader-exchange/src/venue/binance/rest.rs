//! 바이낸스 USDT-M 선물 REST 커넥터: 잔고 조회, 시장가 주문, 교환정보.
//!
//! 서명 방식과 엔드포인트는 원본의 futures 계좌 동기화/주문 전송 로직을
//! 그대로 따른다. REST 클라이언트 구조(빌더, `public_get`/`signed_*`
//! 헬퍼, 에러 매핑)는 `connector::binance::BinanceClient`의 모양을 재사용한다.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};
use trader_core::{binance_style_sign_query, ExchangeInfo, ExchangeOrder, OrderSide, SymbolPrecision, WalletSnapshot};

use crate::error::ExchangeError;
use crate::venue::{LegResult, VenueRest};

const MAINNET_REST: &str = "https://fapi.binance.com";

#[derive(Debug, Clone)]
pub struct BinanceFuturesConfig {
    pub api_key: String,
    pub api_secret: String,
    pub rest_base_url: String,
    pub timeout_secs: u64,
}

impl BinanceFuturesConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            rest_base_url: MAINNET_REST.to_string(),
            timeout_secs: 5,
        }
    }
}

pub struct BinanceFuturesRest {
    config: BinanceFuturesConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct FuturesAsset {
    asset: String,
    #[serde(rename = "availableBalance")]
    available_balance: String,
}

#[derive(Debug, Deserialize)]
struct FuturesPosition {
    symbol: String,
    #[serde(rename = "positionAmt")]
    position_amt: String,
}

#[derive(Debug, Deserialize)]
struct FuturesAccount {
    assets: Vec<FuturesAsset>,
    positions: Vec<FuturesPosition>,
}

#[derive(Debug, Deserialize)]
struct FuturesOrderResponse {
    #[serde(rename = "orderId")]
    order_id: i64,
    status: String,
}

#[derive(Debug, Deserialize)]
struct FuturesApiError {
    code: i32,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct FuturesSymbolFilter {
    #[serde(rename = "filterType")]
    filter_type: String,
    #[serde(default, rename = "tickSize")]
    tick_size: Option<String>,
    #[serde(default, rename = "stepSize")]
    step_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FuturesSymbolInfo {
    symbol: String,
    status: String,
    filters: Vec<FuturesSymbolFilter>,
}

#[derive(Debug, Deserialize)]
struct FuturesExchangeInfo {
    symbols: Vec<FuturesSymbolInfo>,
}

/// `"0.001"` 같은 step 문자열에서 소수 자릿수를 센다.
fn precision_from_step(step: &str) -> u32 {
    match step.trim_end_matches('0').split_once('.') {
        Some((_, frac)) => frac.len() as u32,
        None => 0,
    }
}

impl BinanceFuturesRest {
    pub fn new(config: BinanceFuturesConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_millis() as u64
    }

    async fn signed_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<T, ExchangeError> {
        params.push(("timestamp".to_string(), Self::timestamp_ms().to_string()));
        params.push(("recvWindow".to_string(), "5000".to_string()));

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let signature = binance_style_sign_query(&query, &self.config.api_secret);
        let full_query = format!("{query}&signature={signature}");
        let url = format!("{}{}", self.config.rest_base_url, endpoint);

        debug!(endpoint, "바이낸스 선물 서명 요청");

        let request = match method {
            reqwest::Method::GET => self.client.get(format!("{url}?{full_query}")),
            reqwest::Method::POST => self
                .client
                .post(&url)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(full_query),
            _ => unreachable!("only GET/POST used"),
        };

        let response = request
            .header("X-MBX-APIKEY", &self.config.api_key)
            .send()
            .await
            .map_err(ExchangeError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(ExchangeError::from)?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| ExchangeError::ParseError(e.to_string()))
        } else if let Ok(err) = serde_json::from_str::<FuturesApiError>(&body) {
            Err(ExchangeError::ApiError {
                code: err.code,
                message: err.msg,
            })
        } else {
            Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }
}

#[async_trait]
impl VenueRest for BinanceFuturesRest {
    async fn fetch_wallet(&self) -> Result<WalletSnapshot, ExchangeError> {
        let account: FuturesAccount = self
            .signed_request(reqwest::Method::GET, "/fapi/v3/account", vec![])
            .await?;

        let mut wallet = WalletSnapshot::new();
        for asset in account.assets {
            let available: Decimal = asset
                .available_balance
                .parse()
                .map_err(|_| ExchangeError::ParseError(format!("잔고 파싱 실패: {}", asset.asset)))?;
            wallet.set(asset.asset, available);
        }
        for position in account.positions {
            let amt: Decimal = position
                .position_amt
                .parse()
                .map_err(|_| ExchangeError::ParseError(format!("포지션 파싱 실패: {}", position.symbol)))?;
            if !amt.is_zero() {
                wallet.set(position.symbol, amt);
            }
        }
        Ok(wallet)
    }

    async fn place_order(&self, order: &ExchangeOrder) -> Result<LegResult, ExchangeError> {
        let side = match order.side {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        };

        let params = vec![
            ("symbol".to_string(), order.symbol.clone()),
            ("side".to_string(), side.to_string()),
            ("type".to_string(), "MARKET".to_string()),
            ("quantity".to_string(), order.amount.to_string()),
            ("reduceOnly".to_string(), order.reduce_only.to_string()),
        ];

        let resp: FuturesOrderResponse = self
            .signed_request(reqwest::Method::POST, "/fapi/v1/order", params)
            .await?;

        if resp.status == "REJECTED" || resp.status == "EXPIRED" {
            warn!(order_id = resp.order_id, status = %resp.status, "바이낸스 주문 거절");
            return Ok(LegResult::failure(format!("order status {}", resp.status)));
        }

        Ok(LegResult::ok(resp.order_id.to_string()))
    }

    async fn fetch_exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.config.rest_base_url);
        let resp: FuturesExchangeInfo = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ExchangeError::from)?
            .json()
            .await
            .map_err(ExchangeError::from)?;

        let mut info = ExchangeInfo::new();
        for symbol in resp.symbols {
            if symbol.status != "TRADING" {
                continue;
            }
            let tick_size = symbol
                .filters
                .iter()
                .find(|f| f.filter_type == "PRICE_FILTER")
                .and_then(|f| f.tick_size.as_deref());
            let step_size = symbol
                .filters
                .iter()
                .find(|f| f.filter_type == "LOT_SIZE")
                .and_then(|f| f.step_size.as_deref());

            match (tick_size, step_size) {
                (Some(tick), Some(step)) => info.insert_with_precision(
                    symbol.symbol,
                    SymbolPrecision {
                        price_precision: precision_from_step(tick),
                        quantity_precision: precision_from_step(step),
                    },
                ),
                _ => info.insert_available(symbol.symbol),
            }
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_core::VenueSymbolRegistry;

    #[test]
    fn test_precision_from_step() {
        assert_eq!(precision_from_step("0.001"), 3);
        assert_eq!(precision_from_step("1.00000000"), 0);
        assert_eq!(precision_from_step("0.10000000"), 1);
    }

    fn rest_against(base_url: String) -> BinanceFuturesRest {
        let config = BinanceFuturesConfig {
            rest_base_url: base_url,
            ..BinanceFuturesConfig::new("key", "secret")
        };
        BinanceFuturesRest::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_wallet_parses_assets_and_nonzero_positions() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", mockito::Matcher::Regex("^/fapi/v3/account.*".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"assets":[{"asset":"USDT","availableBalance":"10000.50"}],
                    "positions":[{"symbol":"BTCUSDT","positionAmt":"-0.500"},
                                 {"symbol":"ETHUSDT","positionAmt":"0.000"}]}"#,
            )
            .create_async()
            .await;

        let rest = rest_against(server.url());
        let wallet = rest.fetch_wallet().await.unwrap();

        assert_eq!(wallet.get("USDT"), Decimal::new(1000050, 2));
        assert_eq!(wallet.get("BTCUSDT"), Decimal::new(-500, 3));
        // zero-amount positions are dropped, never recorded as a flat-but-present leg
        assert!(wallet.get("ETHUSDT").is_zero());
    }

    #[tokio::test]
    async fn test_fetch_wallet_surfaces_venue_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", mockito::Matcher::Regex("^/fapi/v3/account.*".into()))
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":-2015,"msg":"Invalid API-key"}"#)
            .create_async()
            .await;

        let rest = rest_against(server.url());
        let err = rest.fetch_wallet().await.unwrap_err();
        assert!(matches!(err, ExchangeError::ApiError { code: -2015, .. }));
    }

    #[tokio::test]
    async fn test_fetch_exchange_info_reads_tick_and_step_size() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/fapi/v1/exchangeInfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"symbols":[{"symbol":"BTCUSDT","status":"TRADING","filters":[
                    {"filterType":"PRICE_FILTER","tickSize":"0.10"},
                    {"filterType":"LOT_SIZE","stepSize":"0.001"}]},
                    {"symbol":"DELISTEDUSDT","status":"BREAK","filters":[]}]}"#,
            )
            .create_async()
            .await;

        let rest = rest_against(server.url());
        let info = rest.fetch_exchange_info().await.unwrap();
        let mut registry = VenueSymbolRegistry::new("USDT", Decimal::ONE);
        registry.refresh_exchange_info(info);

        let precision = registry.precision("BTCUSDT").unwrap();
        assert_eq!(precision.price_precision, 1);
        assert_eq!(precision.quantity_precision, 3);
        assert!(registry.precision("DELISTEDUSDT").is_none());
    }
}
