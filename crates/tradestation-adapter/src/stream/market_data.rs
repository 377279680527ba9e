/*
[INPUT]:  Symbols, bar settings, depth levels and optional message handlers
[OUTPUT]: Running market data streams (bars, quotes, market depth)
[POS]:    Stream layer - market data stream endpoints
[UPDATE]: When adding stream endpoints or changing parameter validation
*/

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info};

use crate::auth::TokenProvider;
use crate::http::client::endpoint_url_with_segments;
use crate::http::{QueryParams, Result, TradestationError};
use crate::stream::{MessageHandler, StopHandle, StreamController, StreamRequest};
use crate::types::{BarUnit, SessionTemplate};

/// Most symbols a quote stream accepts
pub const MAX_QUOTE_SYMBOLS: usize = 100;
/// Deepest book a depth stream serves per side
pub const DEFAULT_MAX_DEPTH_LEVELS: u32 = 20;

const BARS_PATH: &str = "v3/marketdata/stream/barcharts";
const QUOTES_PATH: &str = "v3/marketdata/stream/quotes";
const MARKET_DEPTH_PATH: &str = "v3/marketdata/stream/marketdepth/quotes";

/// Bar chart stream settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarStreamParams {
    pub symbol: String,
    pub interval: u32,
    pub unit: BarUnit,
    pub barsback: Option<u32>,
    pub session_template: Option<SessionTemplate>,
}

impl BarStreamParams {
    /// One daily bar per update, no history
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: 1,
            unit: BarUnit::Daily,
            barsback: None,
            session_template: None,
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_unit(mut self, unit: BarUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_barsback(mut self, barsback: u32) -> Self {
        self.barsback = Some(barsback);
        self
    }

    pub fn with_session_template(mut self, template: SessionTemplate) -> Self {
        self.session_template = Some(template);
        self
    }

    fn query_params(&self) -> QueryParams {
        QueryParams::new()
            .with("interval", self.interval)
            .with("unit", self.unit.as_str())
            .with_opt("barsback", self.barsback)
            .with_opt("sessiontemplate", self.session_template.map(SessionTemplate::as_str))
    }
}

/// Market data streams sharing one controller.
///
/// Only one stream runs at a time, and once stopped this instance stays
/// stopped; ask the client for a fresh one to stream again.
pub struct MarketDataStream {
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
    controller: StreamController,
}

impl fmt::Debug for MarketDataStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketDataStream")
            .field("base_url", &self.base_url.as_str())
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl MarketDataStream {
    pub fn new(base_url: Url, tokens: Arc<dyn TokenProvider>, controller: StreamController) -> Self {
        Self {
            base_url,
            tokens,
            controller,
        }
    }

    pub fn controller(&self) -> &StreamController {
        &self.controller
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.controller.stop_handle()
    }

    /// Build the bar chart stream request without connecting
    pub async fn bars_request(&self, params: &BarStreamParams) -> Result<StreamRequest> {
        let symbol = required_symbol(&params.symbol)?;
        let url = endpoint_url_with_segments(&self.base_url, BARS_PATH, &[symbol])?;
        let request = StreamRequest::new(url).with_params(params.query_params());
        self.authorize(request).await
    }

    /// Stream bars for one symbol until stopped
    pub async fn stream_bars(
        &self,
        params: &BarStreamParams,
        on_message: Option<Box<dyn MessageHandler>>,
    ) -> Result<()> {
        self.controller.ensure_startable()?;
        let request = self.bars_request(params).await?.with_handler(on_message);
        info!(
            symbol = %params.symbol,
            unit = params.unit.as_str(),
            interval = params.interval,
            "starting bar stream"
        );
        debug!(params = ?request.params(), "bar stream params");
        self.controller.start(request).await
    }

    /// Build the quote stream request without connecting
    pub async fn quotes_request<S: AsRef<str>>(&self, symbols: &[S]) -> Result<StreamRequest> {
        let joined = join_quote_symbols(symbols)?;
        let url = endpoint_url_with_segments(&self.base_url, QUOTES_PATH, &[joined.as_str()])?;
        self.authorize(StreamRequest::new(url)).await
    }

    /// Stream quotes for up to 100 symbols until stopped
    pub async fn stream_quotes<S: AsRef<str>>(
        &self,
        symbols: &[S],
        on_message: Option<Box<dyn MessageHandler>>,
    ) -> Result<()> {
        self.controller.ensure_startable()?;
        let request = self.quotes_request(symbols).await?.with_handler(on_message);
        info!(symbols = symbols.len(), url = %request.url(), "starting quote stream");
        self.controller.start(request).await
    }

    /// Build the market depth stream request without connecting
    pub async fn market_depth_request(
        &self,
        symbol: &str,
        max_levels: Option<u32>,
    ) -> Result<StreamRequest> {
        let symbol = required_symbol(symbol)?;
        let url = endpoint_url_with_segments(&self.base_url, MARKET_DEPTH_PATH, &[symbol])?;
        let params = QueryParams::new().with_opt("maxlevels", max_levels);
        self.authorize(StreamRequest::new(url).with_params(params)).await
    }

    /// Stream Level II depth for one symbol until stopped
    pub async fn stream_market_depth_quotes(
        &self,
        symbol: &str,
        max_levels: Option<u32>,
        on_message: Option<Box<dyn MessageHandler>>,
    ) -> Result<()> {
        self.controller.ensure_startable()?;
        let request = self
            .market_depth_request(symbol, max_levels)
            .await?
            .with_handler(on_message);
        info!(symbol, ?max_levels, "starting market depth stream");
        self.controller.start(request).await
    }

    async fn authorize(&self, request: StreamRequest) -> Result<StreamRequest> {
        let token = self.tokens.get_token().await?;
        Ok(request.with_bearer_token(&token)?.with_stream_accept())
    }
}

/// Trim a required symbol, rejecting blanks
fn required_symbol(symbol: &str) -> Result<&str> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(TradestationError::InvalidArgument(
            "a valid symbol must be provided".to_string(),
        ));
    }
    Ok(symbol)
}

/// Trimmed, uppercased, comma-joined symbol list for quote streams
pub fn join_quote_symbols<S: AsRef<str>>(symbols: &[S]) -> Result<String> {
    if symbols.is_empty() {
        return Err(TradestationError::InvalidArgument(
            "at least one symbol must be provided".to_string(),
        ));
    }
    if symbols.len() > MAX_QUOTE_SYMBOLS {
        return Err(TradestationError::InvalidArgument(format!(
            "at most {MAX_QUOTE_SYMBOLS} symbols allowed per request, got {}",
            symbols.len()
        )));
    }

    let mut normalized = Vec::with_capacity(symbols.len());
    for (index, symbol) in symbols.iter().enumerate() {
        let symbol = symbol.as_ref().trim();
        if symbol.is_empty() {
            return Err(TradestationError::InvalidArgument(format!(
                "symbol at position {index} is empty"
            )));
        }
        normalized.push(symbol.to_uppercase());
    }
    Ok(normalized.join(","))
}
