//! 업비트 현물 REST 커넥터: 잔고 조회, 시장가 주문, 가용 심볼 목록.
//!
//! 업비트는 바이낸스와 달리 정밀도 조회 엔드포인트를 노출하지 않는다
//! 업비트는 가격/수량 정밀도를 내려주는 공개 엔드포인트가 없다 —
//! 그래서 `fetch_exchange_info`는 가용성만 채운 `ExchangeInfo`를 반환한다.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};
use trader_core::{upbit_style_sign_jwt, ExchangeInfo, ExchangeOrder, OrderSide, WalletSnapshot};

use crate::error::ExchangeError;
use crate::venue::{LegResult, VenueRest};

const MAINNET_REST: &str = "https://api.upbit.com";

#[derive(Debug, Clone)]
pub struct UpbitConfig {
    pub access_key: String,
    pub secret_key: String,
    pub rest_base_url: String,
    pub timeout_secs: u64,
}

impl UpbitConfig {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            rest_base_url: MAINNET_REST.to_string(),
            timeout_secs: 5,
        }
    }
}

pub struct UpbitRest {
    config: UpbitConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UpbitAccount {
    currency: String,
    balance: String,
}

#[derive(Debug, Deserialize)]
struct UpbitOrderResponse {
    uuid: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct UpbitErrorBody {
    name: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct UpbitErrorEnvelope {
    error: UpbitErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpbitMarket {
    market: String,
}

impl UpbitRest {
    pub fn new(config: UpbitConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn auth_header(&self, query: Option<&str>) -> Result<String, ExchangeError> {
        upbit_style_sign_jwt(&self.config.access_key, &self.config.secret_key, query)
            .map_err(|e| ExchangeError::Unauthorized(e.to_string()))
    }
}

#[async_trait]
impl VenueRest for UpbitRest {
    async fn fetch_wallet(&self) -> Result<WalletSnapshot, ExchangeError> {
        let auth = self.auth_header(None)?;
        let url = format!("{}/v1/accounts", self.config.rest_base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .send()
            .await
            .map_err(ExchangeError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(ExchangeError::from)?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<UpbitErrorEnvelope>(&body) {
                return Err(ExchangeError::ApiError {
                    code: status.as_u16() as i32,
                    message: format!("{}: {}", err.error.name, err.error.message),
                });
            }
            return Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            });
        }

        let accounts: Vec<UpbitAccount> =
            serde_json::from_str(&body).map_err(|e| ExchangeError::ParseError(e.to_string()))?;

        let mut wallet = WalletSnapshot::new();
        for account in accounts {
            let balance: Decimal = account
                .balance
                .parse()
                .map_err(|_| ExchangeError::ParseError(format!("잔고 파싱 실패: {}", account.currency)))?;
            wallet.set(account.currency, balance);
        }
        Ok(wallet)
    }

    async fn place_order(&self, order: &ExchangeOrder) -> Result<LegResult, ExchangeError> {
        // 업비트 시장가 매수는 `price`(지출할 KRW 명목가) + `ord_type=price`,
        // 시장가 매도는 `volume`(수량) + `ord_type=market`을 쓴다.
        let mut body = serde_json::Map::new();
        body.insert("market".into(), order.symbol.clone().into());

        match order.side {
            OrderSide::Buy => {
                body.insert("side".into(), "bid".into());
                body.insert("ord_type".into(), "price".into());
                body.insert("price".into(), order.price.to_string().into());
            }
            OrderSide::Sell => {
                body.insert("side".into(), "ask".into());
                body.insert("ord_type".into(), "market".into());
                body.insert("volume".into(), order.amount.to_string().into());
            }
        }

        let payload = serde_json::Value::Object(body);
        let query_string = serde_urlencoded::to_string(&payload)
            .map_err(|e| ExchangeError::ParseError(e.to_string()))?;
        let auth = self.auth_header(Some(&query_string))?;

        let url = format!("{}/v1/orders", self.config.rest_base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .json(&payload)
            .send()
            .await
            .map_err(ExchangeError::from)?;

        let status = response.status();
        let body_text = response.text().await.map_err(ExchangeError::from)?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<UpbitErrorEnvelope>(&body_text) {
                warn!(name = %err.error.name, "업비트 주문 거절");
                return Ok(LegResult::failure(err.error.message));
            }
            return Ok(LegResult::failure(body_text));
        }

        let resp: UpbitOrderResponse =
            serde_json::from_str(&body_text).map_err(|e| ExchangeError::ParseError(e.to_string()))?;

        if resp.state == "cancel" {
            return Ok(LegResult::failure(format!("order state {}", resp.state)));
        }

        Ok(LegResult::ok(resp.uuid))
    }

    async fn fetch_exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        debug!("업비트 마켓 목록 조회");
        let url = format!("{}/v1/market/all", self.config.rest_base_url);
        let markets: Vec<UpbitMarket> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ExchangeError::from)?
            .json()
            .await
            .map_err(ExchangeError::from)?;

        let mut info = ExchangeInfo::new();
        for market in markets {
            // 정밀도 조회 메서드가 없다 — 가용성만 등록한다.
            info.insert_available(market.market);
        }
        Ok(info)
    }
}
