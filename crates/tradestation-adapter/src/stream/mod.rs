/*
[INPUT]:  Stream endpoint URLs, bearer tokens and message handlers
[OUTPUT]: Long-lived HTTP streams with reconnect and cooperative stop
[POS]:    Stream layer - TradeStation HTTP streaming
[UPDATE]: When adding stream endpoints or changing reconnect behavior
*/

pub mod controller;
pub mod decoder;
pub mod handler;
pub mod market_data;
pub mod request;
pub mod session;

pub use controller::{StopHandle, StreamController};
pub use decoder::{DecodedLine, LineDecoder};
pub use handler::{DefaultMessageHandler, MessageHandler, format_bar_line};
pub use market_data::{BarStreamParams, MarketDataStream};
pub use request::{STREAM_ACCEPT, StreamRequest};
pub use session::{ConnectionState, StreamConfig, StreamSession};
