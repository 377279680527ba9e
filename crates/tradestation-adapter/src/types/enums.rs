/*
[INPUT]:  Enumerated API values (bar units, session templates, stream statuses)
[OUTPUT]: Type-safe enums with their wire spellings
[POS]:    Data layer - enumeration types
[UPDATE]: When the API adds enum values
*/

use serde::{Deserialize, Serialize};

/// Bar aggregation unit for bar chart streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum BarUnit {
    Minute,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl BarUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            BarUnit::Minute => "Minute",
            BarUnit::Daily => "Daily",
            BarUnit::Weekly => "Weekly",
            BarUnit::Monthly => "Monthly",
        }
    }
}

/// US equity session templates accepted by bar streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SessionTemplate {
    #[serde(rename = "USEQPre")]
    UsEquityPre,
    #[serde(rename = "USEQPost")]
    UsEquityPost,
    #[serde(rename = "USEQPreAndPost")]
    UsEquityPreAndPost,
    #[serde(rename = "USEQ24Hour")]
    UsEquity24Hour,
    Default,
}

impl SessionTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionTemplate::UsEquityPre => "USEQPre",
            SessionTemplate::UsEquityPost => "USEQPost",
            SessionTemplate::UsEquityPreAndPost => "USEQPreAndPost",
            SessionTemplate::UsEquity24Hour => "USEQ24Hour",
            SessionTemplate::Default => "Default",
        }
    }
}

/// Control messages interleaved with data on stream endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum StreamStatus {
    /// Initial snapshot finished; updates follow
    EndSnapshot,
    /// Server is about to close the stream and asks for a reconnect
    GoAway,
}

impl StreamStatus {
    /// Detect a `{"StreamStatus": ...}` control message
    pub fn from_message(message: &serde_json::Value) -> Option<Self> {
        match message.get("StreamStatus")?.as_str()? {
            "EndSnapshot" => Some(StreamStatus::EndSnapshot),
            "GoAway" => Some(StreamStatus::GoAway),
            _ => None,
        }
    }
}
