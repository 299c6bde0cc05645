pub mod rest;
pub mod ws;

pub use rest::{UpbitConfig, UpbitRest};
pub use ws::{UpbitMarketStream, UpbitStreamEvent};
