/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public TradeStation adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod client;
pub mod http;
pub mod stream;
pub mod types;

pub use client::TradestationClient;

// Re-export commonly used types from auth
pub use auth::{
    OAuthCredentials,
    StaticTokenProvider,
    TokenData,
    TokenManager,
    TokenProvider,
};

// Re-export commonly used types from http
pub use http::{
    Brokerage,
    ClientConfig,
    Environment,
    QueryParams,
    RequestExecutor,
    Result,
    TradestationError,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from stream
pub use stream::{
    BarStreamParams,
    ConnectionState,
    DefaultMessageHandler,
    MarketDataStream,
    MessageHandler,
    StopHandle,
    StreamConfig,
    StreamController,
    StreamRequest,
    StreamSession,
};
