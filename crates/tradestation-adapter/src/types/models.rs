/*
[INPUT]:  JSON payloads from brokerage and market data endpoints
[OUTPUT]: Typed views over accounts, balances, bars, quotes and depth
[POS]:    Data layer - response and stream message models
[UPDATE]: When API response fields change
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Brokerage account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Per-account error entry returned alongside partial results
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountError {
    #[serde(rename = "AccountID", default)]
    pub account_id: Option<String>,
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// GET /v3/brokerage/accounts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Account balance snapshot
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Balance {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub cash_balance: Option<Decimal>,
    #[serde(default)]
    pub buying_power: Option<Decimal>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    #[serde(default)]
    pub market_value: Option<Decimal>,
    #[serde(default)]
    pub todays_profit_loss: Option<Decimal>,
}

/// GET /v3/brokerage/accounts/{ids}/balances
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BalancesResponse {
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub errors: Vec<AccountError>,
}

/// Bar chart stream message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bar {
    pub time_stamp: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub total_volume: Option<Decimal>,
    #[serde(default)]
    pub up_volume: Option<Decimal>,
    #[serde(default)]
    pub down_volume: Option<Decimal>,
    #[serde(default)]
    pub open_interest: Option<Decimal>,
    #[serde(default)]
    pub is_realtime: Option<bool>,
    #[serde(default)]
    pub is_end_of_history: Option<bool>,
    #[serde(default)]
    pub bar_status: Option<String>,
}

/// Quote stream message. Updates after the first carry only changed fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub bid_size: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub ask_size: Option<Decimal>,
    #[serde(default)]
    pub open: Option<Decimal>,
    #[serde(default)]
    pub high: Option<Decimal>,
    #[serde(default)]
    pub low: Option<Decimal>,
    #[serde(default)]
    pub close: Option<Decimal>,
    #[serde(default)]
    pub previous_close: Option<Decimal>,
    #[serde(default)]
    pub net_change: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub trade_time: Option<String>,
}

/// One price level of a market depth book
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepthLevel {
    pub price: Decimal,
    pub size: Decimal,
    #[serde(default)]
    pub order_count: Option<u32>,
    #[serde(default)]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Market depth (Level II) stream message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketDepthQuote {
    #[serde(default)]
    pub bids: Vec<DepthLevel>,
    #[serde(default)]
    pub asks: Vec<DepthLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_from_stream_message() {
        let raw = serde_json::json!({
            "TimeStamp": "2024-11-07T21:00:00Z",
            "Open": "1",
            "High": "2",
            "Low": "0.5",
            "Close": "1.5",
            "TotalVolume": "42",
            "IsRealtime": false,
            "BarStatus": "Closed"
        });

        let bar: Bar = serde_json::from_value(raw).unwrap();
        assert_eq!(bar.close, "1.5".parse::<Decimal>().unwrap());
        assert_eq!(bar.total_volume, Some(Decimal::from(42)));
        assert_eq!(bar.bar_status.as_deref(), Some("Closed"));
        assert_eq!(bar.up_volume, None);
    }

    #[test]
    fn test_partial_quote_update() {
        let raw = serde_json::json!({"Symbol": "MSFT", "Bid": "410.12"});
        let quote: Quote = serde_json::from_value(raw).unwrap();
        assert_eq!(quote.symbol, "MSFT");
        assert_eq!(quote.bid, Some("410.12".parse().unwrap()));
        assert!(quote.ask.is_none());
    }

    #[test]
    fn test_market_depth_levels() {
        let raw = serde_json::json!({
            "Bids": [{"Price": "99.5", "Size": "300", "OrderCount": 3}],
            "Asks": [{"Price": "100.0", "Size": "100", "Name": "NSDQ"}]
        });
        let depth: MarketDepthQuote = serde_json::from_value(raw).unwrap();
        assert_eq!(depth.bids[0].order_count, Some(3));
        assert_eq!(depth.asks[0].name.as_deref(), Some("NSDQ"));
    }

    #[test]
    fn test_accounts_response() {
        let raw = serde_json::json!({
            "Accounts": [
                {"AccountID": "123456", "AccountType": "Margin", "Currency": "USD", "Status": "Active"}
            ]
        });
        let accounts: AccountsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(accounts.accounts.len(), 1);
        assert_eq!(accounts.accounts[0].account_id, "123456");
        assert_eq!(accounts.accounts[0].alias, None);
    }
}
