/*
[INPUT]:  Endpoint URL, query parameters, headers and an optional handler
[OUTPUT]: A stream request ready to hand to a controller or session
[POS]:    Stream layer - request description for a single stream
[UPDATE]: When requests need new parts
*/

use std::fmt;

use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use crate::http::client::bearer_header;
use crate::http::{QueryParams, Result};
use crate::stream::MessageHandler;

/// Accept header value for TradeStation stream endpoints
pub const STREAM_ACCEPT: &str = "application/vnd.tradestation.streams.v2+json";

/// Everything needed to open one stream.
///
/// A reconnect only replaces the `Authorization` header; URL, parameters and
/// handler stay as built here.
pub struct StreamRequest {
    url: Url,
    params: QueryParams,
    headers: HeaderMap,
    handler: Option<Box<dyn MessageHandler>>,
}

impl fmt::Debug for StreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamRequest")
            .field("url", &self.url.as_str())
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl StreamRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            params: QueryParams::new(),
            headers: HeaderMap::new(),
            handler: None,
        }
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_bearer_token(self, token: &str) -> Result<Self> {
        let value = bearer_header(token)?;
        Ok(self.with_header(AUTHORIZATION, value))
    }

    /// Adds the stream `Accept` media type
    pub fn with_stream_accept(self) -> Self {
        self.with_header(ACCEPT, HeaderValue::from_static(STREAM_ACCEPT))
    }

    pub fn on_message<H: MessageHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_handler(mut self, handler: Option<Box<dyn MessageHandler>>) -> Self {
        self.handler = handler;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// URL with the set query parameters appended
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        self.params.apply_to(&mut url);
        url
    }

    pub(crate) fn into_parts(self) -> (Url, HeaderMap, Option<Box<dyn MessageHandler>>) {
        let url = self.full_url();
        (url, self.headers, self.handler)
    }
}
