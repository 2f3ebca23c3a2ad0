//! Literal encoding for parameter values.
//!
//! Values are inlined into SQL text wrapped in a randomly tagged pair of
//! dollar quotes (`$ABC$...$ABC$`), so the payload never needs driver-side
//! escaping. A collision requires the random tag itself to appear verbatim
//! inside the payload.

use chrono::SecondsFormat;
use rand::Rng;

use crate::values::SqlValue;

const TAG_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Tag length used for one-off value encodes.
pub(crate) const VALUE_TAG_LEN: usize = 3;
/// Tag length used for a template render pass and for `escape`.
pub(crate) const RENDER_TAG_LEN: usize = 5;

/// Generate a random uppercase delimiter tag.
#[must_use]
pub fn random_tag(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| TAG_ALPHABET[rng.gen_range(0..TAG_ALPHABET.len())] as char)
        .collect()
}

/// Wrap text in a matched pair of dollar-quote delimiters.
#[must_use]
pub fn dollar_quote(text: &str, tag: &str) -> String {
    format!("${tag}${text}${tag}$")
}

/// The text form a value takes inside its delimiters.
///
/// Timestamps become ISO-8601 millisecond strings; JSON objects and arrays
/// become compact JSON text.
pub(crate) fn text_form(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Bool(value) => value.to_string(),
        SqlValue::Int(value) => value.to_string(),
        SqlValue::Float(value) => value.to_string(),
        SqlValue::Text(value) => value.clone(),
        SqlValue::Timestamp(value) => value.to_rfc3339_opts(SecondsFormat::Millis, true),
        SqlValue::Json(value) => value.to_string(),
        SqlValue::Array(_) => value.to_json().to_string(),
    }
}

/// Encode a value as a SQL literal with a fresh random tag.
#[must_use]
pub fn encode_scalar(value: &SqlValue) -> String {
    encode_scalar_with_tag(value, &random_tag(VALUE_TAG_LEN))
}

/// Encode a value as a SQL literal using the caller's delimiter tag.
///
/// `NULL` is produced bare, never delimited.
#[must_use]
pub fn encode_scalar_with_tag(value: &SqlValue, tag: &str) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        other => dollar_quote(&text_form(other), tag),
    }
}

/// Encode a value for a column set (`insert` values, `update` assignments).
///
/// Differs from the named-parameter path: empty strings collapse to `NULL`,
/// and timestamps are single-quoted directly.
#[must_use]
pub fn encode_column_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Text(text) if text.is_empty() => "NULL".to_string(),
        SqlValue::Timestamp(timestamp) => {
            format!("'{}'", timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        other => dollar_quote(&text_form(other), &random_tag(VALUE_TAG_LEN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn null_encodes_bare() {
        assert_eq!(encode_scalar_with_tag(&SqlValue::Null, "ABC"), "NULL");
        assert_eq!(encode_column_value(&SqlValue::Null), "NULL");
    }

    #[test]
    fn scalar_round_trips_through_delimiters() {
        let encoded = encode_scalar_with_tag(&SqlValue::Text("it's fine".into()), "QRS");
        assert_eq!(encoded, "$QRS$it's fine$QRS$");
        let stripped = encoded.replace("$QRS$", "");
        assert_eq!(stripped, "it's fine");
    }

    #[test]
    fn numbers_and_bools_use_display_form() {
        assert_eq!(encode_scalar_with_tag(&SqlValue::Int(7), "AB"), "$AB$7$AB$");
        assert_eq!(
            encode_scalar_with_tag(&SqlValue::Bool(true), "AB"),
            "$AB$true$AB$"
        );
    }

    #[test]
    fn timestamps_take_iso_millisecond_form() {
        let ts = Utc.with_ymd_and_hms(2021, 8, 6, 16, 0, 0).unwrap();
        assert_eq!(
            encode_scalar_with_tag(&SqlValue::Timestamp(ts), "XY"),
            "$XY$2021-08-06T16:00:00.000Z$XY$"
        );
        assert_eq!(
            encode_column_value(&SqlValue::Timestamp(ts)),
            "'2021-08-06T16:00:00.000Z'"
        );
    }

    #[test]
    fn empty_string_nullifies_only_in_column_sets() {
        assert_eq!(encode_column_value(&SqlValue::Text(String::new())), "NULL");
        assert_eq!(
            encode_scalar_with_tag(&SqlValue::Text(String::new()), "AB"),
            "$AB$$AB$"
        );
    }

    #[test]
    fn json_values_serialize_before_encoding() {
        let value = SqlValue::Json(json!({"a": 1}));
        assert_eq!(
            encode_scalar_with_tag(&value, "JK"),
            "$JK${\"a\":1}$JK$"
        );
    }

    #[test]
    fn random_tags_are_uppercase_of_requested_length() {
        let tag = random_tag(5);
        assert_eq!(tag.len(), 5);
        assert!(tag.chars().all(|c| c.is_ascii_uppercase()));
    }
}
