//! 트레이더 RPC 서버: `SubmitTrade(TradeRequest) -> OrderResponse`.
//!
//! 계좌에 손대는 모든 상태의 단일 소유자. 계좌 뮤텍스를 메서드 전체
//! 동안 쥔 채 사이징과 정밀도 감사를 거쳐 두 다리를 전송하고, 한쪽이라도
//! 실패하면 비상 이탈로 넘어간다.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use trader_core::{
    ExchangeOrder, KimchiOrderLog, OrderResponse, OrderSide, PairOrderSheet, PairOrderType,
    RiskConfig, SingleOrderSheet, TradeRequest, TraderError, Venue, VenueSymbolRegistry,
};
use trader_data::{AccountManager, LogWriterHandle};
use trader_exchange::VenueRest;
use trader_risk::{audit_foreign_order, audit_korean_order, calculate_enter_size, LegHint};
use uuid::Uuid;

use crate::eject::Ejector;

/// 두 거래소의 심볼 레지스트리 (가용 심볼, 정밀도, 기준통화, 최소 거래량).
pub struct VenueRegistries {
    pub upbit: RwLock<VenueSymbolRegistry>,
    pub binance: RwLock<VenueSymbolRegistry>,
}

impl VenueRegistries {
    pub fn new(upbit: VenueSymbolRegistry, binance: VenueSymbolRegistry) -> Self {
        Self {
            upbit: RwLock::new(upbit),
            binance: RwLock::new(binance),
        }
    }
}

/// RPC 핸들러 본체.
pub struct TraderService {
    upbit_rest: Arc<dyn VenueRest>,
    binance_rest: Arc<dyn VenueRest>,
    account: Arc<AccountManager>,
    registries: Arc<VenueRegistries>,
    log_writer: LogWriterHandle,
    ejector: Arc<Ejector>,
    risk_config: RiskConfig,
}

impl TraderService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upbit_rest: Arc<dyn VenueRest>,
        binance_rest: Arc<dyn VenueRest>,
        account: Arc<AccountManager>,
        registries: Arc<VenueRegistries>,
        log_writer: LogWriterHandle,
        ejector: Arc<Ejector>,
        risk_config: RiskConfig,
    ) -> Self {
        Self {
            upbit_rest,
            binance_rest,
            account,
            registries,
            log_writer,
            ejector,
            risk_config,
        }
    }

    /// RPC 진입점. 모든 합법적 입력이 응답을 내도록 one-of 전체를 처리한다.
    #[instrument(skip(self, request))]
    pub async fn submit_trade(&self, request: TradeRequest) -> OrderResponse {
        match request {
            TradeRequest::PairOrder(sheet) => self.handle_pair_order(sheet).await,
            TradeRequest::SingleOrder(sheet) => self.handle_single_order(sheet),
        }
    }

    /// 계약에는 있으나 이 플랫폼의 핵심 범위 밖이다.
    fn handle_single_order(&self, _sheet: SingleOrderSheet) -> OrderResponse {
        OrderResponse::failure("not implemented")
    }

    async fn handle_pair_order(&self, sheet: PairOrderSheet) -> OrderResponse {
        let _guard = self.account.trade_lock().await;

        let (upbit_sheet, binance_sheet) = match sheet.pair_order_type {
            PairOrderType::Enter => match self.build_enter_sheets(&sheet).await {
                Ok(sheets) => sheets,
                Err(e) => return OrderResponse::failure(e.to_string()),
            },
            PairOrderType::Exit => match self.build_exit_sheets(&sheet).await {
                Ok(sheets) => sheets,
                Err(e) => return OrderResponse::failure(e.to_string()),
            },
            PairOrderType::Unspecified => {
                return OrderResponse::failure("invalid order type");
            }
        };

        let (upbit_sheet, binance_sheet) =
            match self.audit_sheets(upbit_sheet, binance_sheet).await {
                Ok(sheets) => sheets,
                Err(e) => return OrderResponse::failure(e.to_string()),
            };

        let order_time = Utc::now();

        let _upbit_result = match self.upbit_rest.place_order(&upbit_sheet).await {
            Ok(result) if result.success => result,
            Ok(result) => {
                warn!(message = %result.message, "korean leg rejected, ejecting");
                self.ejector.eject().await;
            }
            Err(e) => {
                warn!(error = %e, "korean leg send failed, ejecting");
                self.ejector.eject().await;
            }
        };

        let _binance_result = match self.binance_rest.place_order(&binance_sheet).await {
            Ok(result) if result.success => result,
            Ok(result) => {
                warn!(message = %result.message, "foreign leg rejected, ejecting");
                self.ejector.eject().await;
            }
            Err(e) => {
                warn!(error = %e, "foreign leg send failed, ejecting");
                self.ejector.eject().await;
            }
        };

        let execution_time = Utc::now();

        // 시장가 주문만 다루는 RPC 계약이라 체결가를 별도로 받지 않는다 —
        // 주문가를 체결가로도 기록한다.
        let pair_id = Uuid::new_v4();
        self.log_writer.push_order_log(KimchiOrderLog {
            pair_id,
            order_time,
            execution_time,
            pair_side: sheet.pair_order_type,
            exchange: Venue::Upbit,
            side: upbit_sheet.side,
            order_price: upbit_sheet.price,
            executed_price: upbit_sheet.price,
            anchor_price: sheet.exchange_rate,
        });
        self.log_writer.push_order_log(KimchiOrderLog {
            pair_id,
            order_time,
            execution_time,
            pair_side: sheet.pair_order_type,
            exchange: Venue::Binance,
            side: binance_sheet.side,
            order_price: binance_sheet.price,
            executed_price: binance_sheet.price,
            anchor_price: sheet.exchange_rate,
        });

        if let Err(e) = self
            .account
            .sync_from_exchange_locked(Venue::Upbit)
            .await
        {
            warn!(error = %e, "post-trade upbit resync failed");
        }
        if let Err(e) = self
            .account
            .sync_from_exchange_locked(Venue::Binance)
            .await
        {
            warn!(error = %e, "post-trade binance resync failed");
        }

        info!(pair_id = %pair_id, "pair order complete");
        OrderResponse::ok()
    }

    async fn build_enter_sheets(
        &self,
        sheet: &PairOrderSheet,
    ) -> Result<(ExchangeOrder, ExchangeOrder), TraderError> {
        let korean_hint = LegHint {
            price: sheet.upbit_order.price,
            qty: sheet.upbit_order.amount,
        };
        let foreign_hint = LegHint {
            price: sheet.binance_order.price,
            qty: sheet.binance_order.amount,
        };

        let krw_balance = self.account.get_position(Venue::Upbit, "KRW").await;
        let usdt_balance = self.account.get_position(Venue::Binance, "USDT").await;

        let binance_registry = self.registries.binance.read().await;
        let foreign_precision = binance_registry
            .precision(&sheet.binance_order.symbol)
            .ok_or_else(|| TraderError::NotFound(format!("no precision for {}", sheet.binance_order.symbol)))?;
        let korean_minimum = {
            let upbit_registry = self.registries.upbit.read().await;
            upbit_registry.minimum_trade_amount
        };
        let foreign_minimum = binance_registry.minimum_trade_amount;

        let result = calculate_enter_size(
            korean_hint,
            foreign_hint,
            sheet.exchange_rate,
            krw_balance,
            usdt_balance,
            foreign_precision.quantity_precision,
            korean_minimum,
            foreign_minimum,
            &self.risk_config,
        )?;

        let upbit_order = ExchangeOrder::new(
            Venue::Upbit,
            sheet.upbit_order.symbol.clone(),
            OrderSide::Buy,
            result.korean_notional,
            result.korean_notional,
        );
        let binance_order = ExchangeOrder::new(
            Venue::Binance,
            sheet.binance_order.symbol.clone(),
            OrderSide::Sell,
            sheet.binance_order.price,
            result.foreign_qty,
        );

        Ok((upbit_order, binance_order))
    }

    async fn build_exit_sheets(
        &self,
        sheet: &PairOrderSheet,
    ) -> Result<(ExchangeOrder, ExchangeOrder), TraderError> {
        let market_symbol = &sheet.upbit_order.symbol;
        let base_currency = market_symbol.strip_prefix("KRW-").unwrap_or(market_symbol);
        let held_base = self
            .account
            .get_position(Venue::Upbit, base_currency)
            .await;

        let upbit_order = ExchangeOrder::new(
            Venue::Upbit,
            market_symbol.clone(),
            OrderSide::Sell,
            Decimal::ZERO,
            held_base,
        );

        let foreign_position = self
            .account
            .get_position(Venue::Binance, &sheet.binance_order.symbol)
            .await;

        let binance_order = ExchangeOrder::new(
            Venue::Binance,
            sheet.binance_order.symbol.clone(),
            OrderSide::Buy,
            sheet.binance_order.price,
            foreign_position.abs(),
        )
        .reduce_only();

        Ok((upbit_order, binance_order))
    }

    async fn audit_sheets(
        &self,
        upbit_order: ExchangeOrder,
        binance_order: ExchangeOrder,
    ) -> Result<(ExchangeOrder, ExchangeOrder), TraderError> {
        let upbit_registry = self.registries.upbit.read().await;
        let upbit_precision = upbit_registry
            .precision(&upbit_order.symbol)
            .ok_or_else(|| TraderError::NotFound(format!("no precision for {}", upbit_order.symbol)))?;
        let upbit_order = audit_korean_order(&upbit_order, upbit_precision.quantity_precision)?;

        let binance_registry = self.registries.binance.read().await;
        let binance_precision = binance_registry
            .precision(&binance_order.symbol)
            .ok_or_else(|| TraderError::NotFound(format!("no precision for {}", binance_order.symbol)))?;
        let binance_order = audit_foreign_order(&binance_order, binance_precision)?;

        Ok((upbit_order, binance_order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_order_is_not_implemented() {
        let response = OrderResponse::failure("not implemented");
        assert!(!response.success);
        assert_eq!(response.message, "not implemented");
    }
}
