use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Named parameters for a templated query, and column maps for `insert`/`update`.
///
/// A `BTreeMap` so iteration is alphabetical: column lists come out sorted and
/// template substitution order is deterministic.
pub type ParamMap = BTreeMap<String, SqlValue>;

/// A value passed into a query as a named parameter, or read back out of a
/// result row.
///
/// Rows produced by the simple query protocol carry `Text`/`Null` only; the
/// `as_*` accessors parse the text form on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Timestamp value (UTC)
    Timestamp(DateTime<Utc>),
    /// JSON value
    Json(JsonValue),
    /// Array of values, expanded to `ARRAY[...]` when used as a parameter
    Array(Vec<SqlValue>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(value) => Some(*value),
            SqlValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            SqlValue::Int(value) => Some(*value as f64),
            SqlValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean form. Text values accept the `t`/`f` output of the simple
    /// protocol as well as `true`/`false`; integers accept 0/1.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(value) => Some(*value),
            SqlValue::Int(1) => Some(true),
            SqlValue::Int(0) => Some(false),
            SqlValue::Text(text) => {
                if text.eq_ignore_ascii_case("t") || text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("f") || text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Timestamp form. Text values are parsed from RFC 3339 or the
    /// `YYYY-MM-DD HH:MM:SS[.fff][+TZ]` shapes the server prints.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::Timestamp(value) => Some(*value),
            SqlValue::Text(text) => parse_timestamp(text),
            _ => None,
        }
    }

    /// JSON rendition of this value. Timestamps become ISO-8601 strings;
    /// non-finite floats become null.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(value) => JsonValue::Bool(*value),
            SqlValue::Int(value) => JsonValue::from(*value),
            SqlValue::Float(value) => serde_json::Number::from_f64(*value)
                .map_or(JsonValue::Null, JsonValue::Number),
            SqlValue::Text(value) => JsonValue::String(value.clone()),
            SqlValue::Timestamp(value) => {
                JsonValue::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            SqlValue::Json(value) => value.clone(),
            SqlValue::Array(values) => {
                JsonValue::Array(values.iter().map(SqlValue::to_json).collect())
            }
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    None
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(values: Vec<T>) -> Self {
        SqlValue::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Build a [`ParamMap`] from `"name" => value` pairs.
///
/// ```
/// use pg_access::param_map;
///
/// let params = param_map! {
///     "id" => 7,
///     "name" => "annual report",
/// };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! param_map {
    () => {
        $crate::ParamMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::ParamMap::new();
        $(
            map.insert(($key).to_string(), $crate::SqlValue::from($value));
        )+
        map
    }};
}
