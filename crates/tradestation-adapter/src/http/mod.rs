/*
[INPUT]:  Client configuration, token providers and REST endpoints
[OUTPUT]: Authenticated JSON responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing request execution
*/

pub mod brokerage;
pub mod client;
pub mod error;
pub mod executor;
pub mod params;

pub use error::{Result, TradestationError};

pub use brokerage::Brokerage;
pub use client::{ClientConfig, Environment};
pub use executor::RequestExecutor;
pub use params::{ParamValue, QueryParams};
