//! Resource query strings (`?mode=ali&__component`).
//!
//! Keys keep their first-seen order so the inclusion queries the loader
//! generates are stable from build to build.

use std::fmt;

use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    /// A bare key with no `=value`.
    Flag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    entries: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a resource query. A leading `?` is optional; empty segments are
    /// ignored and a repeated key keeps its last value.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut query = Query::new();

        for segment in raw.split('&').filter(|s| !s.is_empty()) {
            match segment.split_once('=') {
                Some((key, value)) => query.set(decode(key), QueryValue::Str(decode(value))),
                None => query.set(decode(segment), QueryValue::Flag),
            }
        }

        query
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of `key`; flags have none.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(QueryValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: QueryValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: QueryValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode as `?a=b&flag`, or `""` when there are no entries.
    pub fn to_query_string(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| match value {
                QueryValue::Str(value) => format!("{}={}", encode(key), encode(value)),
                QueryValue::Flag => encode(key),
            })
            .collect();

        format!("?{}", pairs.join("&"))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

fn decode(text: &str) -> String {
    // Parse as the value of a throwaway pair to get percent and `+` decoding.
    let pair = format!("_={text}");
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
