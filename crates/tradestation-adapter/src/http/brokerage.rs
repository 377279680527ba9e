/*
[INPUT]:  Account ids and an authenticated request executor
[OUTPUT]: Typed account and balance data
[POS]:    HTTP layer - brokerage endpoints
[UPDATE]: When adding new brokerage endpoints
*/

// ### Brokerage Endpoints

use reqwest::Url;
use tracing::debug;

use crate::http::client::{endpoint_url, endpoint_url_with_segments};
use crate::http::{QueryParams, RequestExecutor, Result, TradestationError};
use crate::types::{Account, AccountsResponse, BalancesResponse};

const ACCOUNTS_PATH: &str = "v3/brokerage/accounts";

/// Most account ids one balances request accepts
pub const MAX_ACCOUNT_IDS: usize = 25;

/// Account-level REST calls
#[derive(Debug, Clone)]
pub struct Brokerage {
    executor: RequestExecutor,
    base_url: Url,
}

impl Brokerage {
    pub fn new(executor: RequestExecutor, base_url: Url) -> Self {
        Self { executor, base_url }
    }

    /// List brokerage accounts for the authenticated user
    ///
    /// GET /v3/brokerage/accounts
    pub async fn get_accounts(&self) -> Result<Vec<Account>> {
        let url = endpoint_url(&self.base_url, ACCOUNTS_PATH)?;
        let headers = self.executor.authorized_headers().await?;

        let response: AccountsResponse = self
            .executor
            .get_json(&url, headers, &QueryParams::new())
            .await?;
        debug!(count = response.accounts.len(), "accounts fetched");
        Ok(response.accounts)
    }

    /// Balances for one or more accounts; per-account failures come back in `errors`
    ///
    /// GET /v3/brokerage/accounts/{ids}/balances
    pub async fn get_balances<S: AsRef<str>>(&self, account_ids: &[S]) -> Result<BalancesResponse> {
        let ids = join_account_ids(account_ids)?;
        let url =
            endpoint_url_with_segments(&self.base_url, ACCOUNTS_PATH, &[ids.as_str(), "balances"])?;
        let headers = self.executor.authorized_headers().await?;

        self.executor
            .get_json(&url, headers, &QueryParams::new())
            .await
    }
}

fn join_account_ids<S: AsRef<str>>(account_ids: &[S]) -> Result<String> {
    if account_ids.is_empty() {
        return Err(TradestationError::InvalidArgument(
            "at least one account id must be provided".to_string(),
        ));
    }
    if account_ids.len() > MAX_ACCOUNT_IDS {
        return Err(TradestationError::InvalidArgument(format!(
            "at most {MAX_ACCOUNT_IDS} account ids allowed per request, got {}",
            account_ids.len()
        )));
    }

    let mut ids = Vec::with_capacity(account_ids.len());
    for (index, id) in account_ids.iter().enumerate() {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(TradestationError::InvalidArgument(format!(
                "account id at position {index} is empty"
            )));
        }
        ids.push(id);
    }
    Ok(ids.join(","))
}
