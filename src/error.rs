use serde_json::Value as JsonValue;
use thiserror::Error;

/// A failed query, carrying the SQL that was actually executed.
///
/// The `sql` field always holds the fully rendered statement (literals
/// inlined), never the original template, so the failing statement can be
/// replayed as-is.
///
/// Some upstream systems smuggle a structured payload as JSON text inside the
/// error message channel. When the driver message parses as a JSON object
/// with a truthy `error` field, `message`, `code` (or `status`) and `cause`
/// are lifted from the payload; otherwise the raw message is kept unchanged.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct QueryException {
    /// Resolved human-readable message.
    pub message: String,
    /// The rendered SQL that failed.
    pub sql: String,
    /// Structured error code, when the payload carried one.
    pub code: Option<i64>,
    /// Structured cause, when the payload carried one.
    pub cause: Option<JsonValue>,
    #[source]
    source: Option<tokio_postgres::Error>,
}

impl QueryException {
    /// Wrap a driver error together with the SQL that triggered it.
    ///
    /// Uses the server-reported message when one exists (that is where
    /// structured payloads arrive), falling back to the error's display form.
    #[must_use]
    pub fn from_driver(error: tokio_postgres::Error, sql: impl Into<String>) -> Self {
        let raw = error
            .as_db_error()
            .map_or_else(|| error.to_string(), |db| db.message().to_string());
        let mut exception = Self::from_message(&raw, sql);
        exception.source = Some(error);
        exception
    }

    /// Build an exception from a bare message string.
    #[must_use]
    pub fn from_message(raw: &str, sql: impl Into<String>) -> Self {
        let (message, code, cause) = decode_payload(raw);
        Self {
            message,
            sql: sql.into(),
            code,
            cause,
            source: None,
        }
    }
}

fn decode_payload(raw: &str) -> (String, Option<i64>, Option<JsonValue>) {
    if let Ok(JsonValue::Object(payload)) = serde_json::from_str::<JsonValue>(raw)
        && payload.get("error").is_some_and(is_truthy)
    {
        let message = payload
            .get("message")
            .and_then(JsonValue::as_str)
            .map_or_else(|| raw.to_string(), str::to_string);
        let code = payload
            .get("code")
            .and_then(JsonValue::as_i64)
            .or_else(|| payload.get("status").and_then(JsonValue::as_i64));
        let cause = payload.get("cause").cloned();
        return (message, code, cause);
    }
    (raw.to_string(), None, None)
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(flag) => *flag,
        JsonValue::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(text) => !text.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

#[derive(Debug, Error)]
pub enum PgAccessError {
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Pool(#[from] deadpool::managed::PoolError<tokio_postgres::Error>),

    #[error(transparent)]
    Query(#[from] QueryException),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Usage error: {0}")]
    UsageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_payload_overrides_message_and_code() {
        let raw = r#"{"error":true,"message":"boom","code":42}"#;
        let exception = QueryException::from_message(raw, "SELECT 1");
        assert_eq!(exception.message, "boom");
        assert_eq!(exception.code, Some(42));
        assert_eq!(exception.sql, "SELECT 1");
        assert!(exception.cause.is_none());
    }

    #[test]
    fn status_field_backs_up_a_missing_code() {
        let raw = r#"{"error":true,"message":"denied","status":403}"#;
        let exception = QueryException::from_message(raw, "SELECT 1");
        assert_eq!(exception.code, Some(403));
    }

    #[test]
    fn cause_is_carried_verbatim() {
        let raw = r#"{"error":true,"message":"bad","cause":{"table":"users"}}"#;
        let exception = QueryException::from_message(raw, "SELECT 1");
        assert_eq!(exception.cause, Some(json!({"table": "users"})));
    }

    #[test]
    fn plain_text_messages_pass_through_unchanged() {
        let raw = "syntax error at or near \"FROM\"";
        let exception = QueryException::from_message(raw, "SELECT FROM");
        assert_eq!(exception.message, raw);
        assert_eq!(exception.code, None);
        assert_eq!(exception.sql, "SELECT FROM");
    }

    #[test]
    fn json_without_error_field_is_not_a_payload() {
        let raw = r#"{"message":"not structured"}"#;
        let exception = QueryException::from_message(raw, "SELECT 1");
        assert_eq!(exception.message, raw);
    }

    #[test]
    fn falsy_error_field_is_not_a_payload() {
        let raw = r#"{"error":false,"message":"ignored"}"#;
        let exception = QueryException::from_message(raw, "SELECT 1");
        assert_eq!(exception.message, raw);
    }

    #[test]
    fn payload_without_message_keeps_raw_text() {
        let raw = r#"{"error":true,"code":7}"#;
        let exception = QueryException::from_message(raw, "SELECT 1");
        assert_eq!(exception.message, raw);
        assert_eq!(exception.code, Some(7));
    }

    #[test]
    fn display_uses_resolved_message() {
        let exception =
            QueryException::from_message(r#"{"error":true,"message":"boom"}"#, "SELECT 1");
        assert_eq!(exception.to_string(), "boom");
        let wrapped: PgAccessError = exception.into();
        assert_eq!(wrapped.to_string(), "boom");
    }
}
