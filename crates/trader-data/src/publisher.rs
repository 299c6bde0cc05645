//! 자산 퍼블리셔(`SubscribableAsset`): N개의 스트림 프로듀서와 M개의
//! 전략 소비자를 분리하는 단일 라이터 라우터. 자산 하나가 `(venue,
//! symbol)` 한 쌍에 대응한다.
//!
//! 구독자 맵은 읽기-쓰기 뮤텍스로 보호한다 — 퍼블리시 경로는 읽기 락만
//! 들고, 드물게 일어나는 구독/해제만 쓰기 락을 든다. `listen()`이 프로듀서
//! 채널의 유일한 리더이며, 자산당 퍼블리셔 태스크는 하나뿐이다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, instrument};
use uuid::Uuid;

/// 오더북 한 틱.
#[derive(Debug, Clone, Copy)]
pub struct OrderbookTick {
    pub best_bid: Decimal,
    pub best_bid_qty: Decimal,
    pub best_ask: Decimal,
    pub best_ask_qty: Decimal,
}

/// 체결 한 건.
#[derive(Debug, Clone, Copy)]
pub struct TradeTick {
    pub price: Decimal,
    pub quantity: Decimal,
}

type SubscriberMap<T> = HashMap<Uuid, mpsc::Sender<T>>;

#[derive(Default)]
struct BookSubscribers {
    best_bid: SubscriberMap<Decimal>,
    best_bid_qty: SubscriberMap<Decimal>,
    best_ask: SubscriberMap<Decimal>,
    best_ask_qty: SubscriberMap<Decimal>,
}

#[derive(Default)]
struct TradeSubscribers {
    price: SubscriberMap<Decimal>,
    quantity: SubscriberMap<Decimal>,
}

/// 하나의 (venue, symbol) 자산에 대한 구독 가능한 라우터.
pub struct SubscribableAsset {
    pub symbol: String,
    book_subs: RwLock<BookSubscribers>,
    trade_subs: RwLock<TradeSubscribers>,
    orderbook_rx: tokio::sync::Mutex<Option<mpsc::Receiver<OrderbookTick>>>,
    trade_rx: tokio::sync::Mutex<Option<mpsc::Receiver<TradeTick>>>,
    drop_count: AtomicU64,
}

impl SubscribableAsset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            book_subs: RwLock::new(BookSubscribers::default()),
            trade_subs: RwLock::new(TradeSubscribers::default()),
            orderbook_rx: tokio::sync::Mutex::new(None),
            trade_rx: tokio::sync::Mutex::new(None),
            drop_count: AtomicU64::new(0),
        }
    }

    /// 프로듀서(스트림 클라이언트)가 오더북 틱을 밀어 넣을 채널을 등록한다.
    pub async fn set_orderbook_chan(&self, rx: mpsc::Receiver<OrderbookTick>) {
        *self.orderbook_rx.lock().await = Some(rx);
    }

    /// 프로듀서가 체결 틱을 밀어 넣을 채널을 등록한다.
    pub async fn set_trade_chan(&self, rx: mpsc::Receiver<TradeTick>) {
        *self.trade_rx.lock().await = Some(rx);
    }

    /// 한 소비자(페어 등)를 네 개의 오더북 필드 구독자 맵 모두에 등록한다.
    pub async fn subscribe_book(
        &self,
        pair_id: Uuid,
        capacity: usize,
    ) -> (
        mpsc::Receiver<Decimal>,
        mpsc::Receiver<Decimal>,
        mpsc::Receiver<Decimal>,
        mpsc::Receiver<Decimal>,
    ) {
        let capacity = capacity.max(1);
        let (bid_tx, bid_rx) = mpsc::channel(capacity);
        let (bid_qty_tx, bid_qty_rx) = mpsc::channel(capacity);
        let (ask_tx, ask_rx) = mpsc::channel(capacity);
        let (ask_qty_tx, ask_qty_rx) = mpsc::channel(capacity);

        let mut subs = self.book_subs.write().await;
        subs.best_bid.insert(pair_id, bid_tx);
        subs.best_bid_qty.insert(pair_id, bid_qty_tx);
        subs.best_ask.insert(pair_id, ask_tx);
        subs.best_ask_qty.insert(pair_id, ask_qty_tx);

        (bid_rx, bid_qty_rx, ask_rx, ask_qty_rx)
    }

    /// 한 소비자를 두 개의 체결 필드 구독자 맵에 등록한다.
    pub async fn subscribe_trade(
        &self,
        pair_id: Uuid,
        capacity: usize,
    ) -> (mpsc::Receiver<Decimal>, mpsc::Receiver<Decimal>) {
        let capacity = capacity.max(1);
        let (price_tx, price_rx) = mpsc::channel(capacity);
        let (qty_tx, qty_rx) = mpsc::channel(capacity);

        let mut subs = self.trade_subs.write().await;
        subs.price.insert(pair_id, price_tx);
        subs.quantity.insert(pair_id, qty_tx);

        (price_rx, qty_rx)
    }

    pub async fn unsubscribe(&self, pair_id: Uuid) {
        let mut book = self.book_subs.write().await;
        book.best_bid.remove(&pair_id);
        book.best_bid_qty.remove(&pair_id);
        book.best_ask.remove(&pair_id);
        book.best_ask_qty.remove(&pair_id);
        drop(book);

        let mut trade = self.trade_subs.write().await;
        trade.price.remove(&pair_id);
        trade.quantity.remove(&pair_id);
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count.load(Ordering::Relaxed)
    }

    async fn publish_book(&self, tick: OrderbookTick) {
        let subs = self.book_subs.read().await;
        self.try_send_all(&subs.best_bid, tick.best_bid).await;
        self.try_send_all(&subs.best_bid_qty, tick.best_bid_qty).await;
        self.try_send_all(&subs.best_ask, tick.best_ask).await;
        self.try_send_all(&subs.best_ask_qty, tick.best_ask_qty).await;
    }

    async fn publish_trade(&self, tick: TradeTick) {
        let subs = self.trade_subs.read().await;
        self.try_send_all(&subs.price, tick.price).await;
        self.try_send_all(&subs.quantity, tick.quantity).await;
    }

    async fn try_send_all(&self, map: &SubscriberMap<Decimal>, value: Decimal) {
        for tx in map.values() {
            if tx.try_send(value).is_err() {
                self.drop_count.fetch_add(1, Ordering::Relaxed);
                debug!(symbol = %self.symbol, "subscriber channel full, dropping update");
            }
        }
    }

    /// 프로듀서 채널을 영원히 읽으면서 네 개(오더북)/두 개(체결) 구독자
    /// 맵으로 팬아웃한다. 이 자산당 단 하나의 태스크만 호출해야 한다.
    #[instrument(skip(self), fields(symbol = %self.symbol))]
    pub async fn listen(self: Arc<Self>) {
        let mut orderbook_rx = self
            .orderbook_rx
            .lock()
            .await
            .take()
            .expect("set_orderbook_chan must be called before listen()");
        let mut trade_rx = self
            .trade_rx
            .lock()
            .await
            .take()
            .expect("set_trade_chan must be called before listen()");

        loop {
            tokio::select! {
                maybe_tick = orderbook_rx.recv() => {
                    match maybe_tick {
                        Some(tick) => self.publish_book(tick).await,
                        None => break,
                    }
                }
                maybe_trade = trade_rx.recv() => {
                    match maybe_trade {
                        Some(trade) => self.publish_trade(trade).await,
                        None => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_drops_full_subscriber_only() {
        let asset = Arc::new(SubscribableAsset::new("BTCUSDT"));
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();

        let (mut bid_a, _bqa, _ask_a, _askqa) = asset.subscribe_book(id_a, 1).await;
        let (mut bid_b, _bqb, _ask_b, _askqb) = asset.subscribe_book(id_b, 1).await;

        let tick = OrderbookTick {
            best_bid: Decimal::from(100),
            best_bid_qty: Decimal::from(1),
            best_ask: Decimal::from(101),
            best_ask_qty: Decimal::from(1),
        };

        asset.publish_book(tick).await;
        asset.publish_book(tick).await;

        assert!(bid_a.try_recv().is_ok());
        assert!(bid_b.try_recv().is_ok());
        assert_eq!(asset.drop_count(), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_from_all_maps() {
        let asset = SubscribableAsset::new("BTCUSDT");
        let id = Uuid::new_v4();
        let _ = asset.subscribe_book(id, 4).await;
        let _ = asset.subscribe_trade(id, 4).await;

        asset.unsubscribe(id).await;

        let book = asset.book_subs.read().await;
        assert!(!book.best_bid.contains_key(&id));
        let trade = asset.trade_subs.read().await;
        assert!(!trade.price.contains_key(&id));
    }
}
