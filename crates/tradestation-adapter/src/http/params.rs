/*
[INPUT]:  Endpoint query parameters, some of them optional
[OUTPUT]: URL-encoded query strings with unset values dropped
[POS]:    HTTP layer - query parameter model shared by REST and streams
[UPDATE]: When adding parameter value kinds
*/

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Url;

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(value) => f.write_str(value),
            ParamValue::Int(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

/// Query parameters keyed by name.
///
/// Entries may hold no value; those are kept for inspection but never
/// transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, Option<ParamValue>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), Some(value.into()));
        self
    }

    pub fn insert_opt<V: Into<ParamValue>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        self.entries.insert(key.into(), value.map(Into::into));
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_opt<V: Into<ParamValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Value for `key` if it is set
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// True when `key` has a value that will be transmitted
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// True when nothing would be transmitted
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Option::is_none)
    }

    /// Transmitted key/value pairs in key order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|value| (key.as_str(), value.to_string())))
    }

    /// Append the set parameters to `url`'s query string
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (key, value) in self.pairs() {
            query.append_pair(key, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_values_are_dropped() {
        let params = QueryParams::new()
            .with("interval", 5u32)
            .with("unit", "Minute")
            .with_opt::<u32>("barsback", None)
            .with_opt::<&str>("sessiontemplate", None);

        let mut url = Url::parse("https://api.example.com/stream").unwrap();
        params.apply_to(&mut url);

        assert_eq!(url.query(), Some("interval=5&unit=Minute"));
        assert!(!params.contains_key("barsback"));
        assert_eq!(params.get("interval"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_empty_params_leave_url_untouched() {
        let params = QueryParams::new().with_opt::<i64>("maxlevels", None);
        assert!(params.is_empty());

        let mut url = Url::parse("https://api.example.com/stream").unwrap();
        params.apply_to(&mut url);
        assert_eq!(url.as_str(), "https://api.example.com/stream");
    }

    #[test]
    fn test_values_are_url_encoded() {
        let params = QueryParams::new().with("q", "a b&c");
        let mut url = Url::parse("https://api.example.com/").unwrap();
        params.apply_to(&mut url);
        assert_eq!(url.query(), Some("q=a+b%26c"));
    }
}
