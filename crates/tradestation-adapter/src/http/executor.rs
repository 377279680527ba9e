/*
[INPUT]:  Endpoint URL, headers, query parameters and a token provider
[OUTPUT]: Parsed JSON bodies; one token refresh + retry on 401
[POS]:    HTTP layer - authenticated request execution for REST endpoints
[UPDATE]: When changing retry semantics or response decoding
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::http::client::bearer_header;
use crate::http::{QueryParams, Result, TradestationError};

/// Executes authenticated GET requests.
///
/// A 401 on the first attempt triggers exactly one forced token refresh and a
/// single retry with the new `Authorization` header. Nothing else is retried.
#[derive(Clone)]
pub struct RequestExecutor {
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    timeout: Duration,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub fn new(http: Client, tokens: Arc<dyn TokenProvider>, timeout: Duration) -> Self {
        Self {
            http,
            tokens,
            timeout,
        }
    }

    /// Headers carrying the provider's current bearer token
    pub async fn authorized_headers(&self) -> Result<HeaderMap> {
        let token = self.tokens.get_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_header(&token)?);
        Ok(headers)
    }

    /// GET `url` and return the parsed JSON body
    pub async fn make_request(
        &self,
        url: &Url,
        headers: HeaderMap,
        params: &QueryParams,
    ) -> Result<serde_json::Value> {
        self.get_json(url, headers, params).await
    }

    /// GET `url` and decode the JSON body into `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        mut headers: HeaderMap,
        params: &QueryParams,
    ) -> Result<T> {
        let response = self.send(url, &headers, params).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode_json(url, response).await;
        }

        warn!(url = %url, status = 401, "request unauthorized; refreshing token and retrying once");
        let token = self.tokens.refresh_token().await?;
        headers.insert(AUTHORIZATION, bearer_header(&token)?);

        let retried = self.send(url, &headers, params).await?;
        decode_json(url, retried).await
    }

    async fn send(&self, url: &Url, headers: &HeaderMap, params: &QueryParams) -> Result<Response> {
        let mut full_url = url.clone();
        params.apply_to(&mut full_url);
        debug!(url = %full_url, "GET");

        let response = self
            .http
            .get(full_url)
            .headers(headers.clone())
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(response)
    }
}

async fn decode_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, status = status.as_u16(), "request failed");
        return Err(TradestationError::request_failed(status, body));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
