pub mod rest;
pub mod ws;

pub use rest::{BinanceFuturesConfig, BinanceFuturesRest};
pub use ws::{BinanceMarketStream, BinanceStreamEvent};
