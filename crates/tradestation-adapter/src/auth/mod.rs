/*
[INPUT]:  OAuth credentials or externally obtained bearer tokens
[OUTPUT]: Token providers for authenticated requests and streams
[POS]:    Auth layer - handles TradeStation API authentication
[UPDATE]: When the token contract or refresh flow changes
*/

pub mod manager;
pub mod provider;
pub mod token;

pub use manager::{OAuthCredentials, TokenManager, TokenResponse};
pub use provider::{StaticTokenProvider, TokenProvider};
pub use token::{TokenCache, TokenData};
