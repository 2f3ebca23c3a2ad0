//! Named-parameter SQL templating.
//!
//! Templates carry `:name` placeholders (letters and digits). Rendering
//! collapses whitespace runs, substitutes every occurrence of each parameter's
//! token with an inlined literal, and can optionally turn any leftover
//! placeholder-shaped token into `NULL`.
//!
//! Token matching is a literal text replace: a parameter named `id` also
//! rewrites the head of `:identity`. Callers must name parameters so that no
//! key is a prefix of another token in the same template. Substitution runs in
//! alphabetical key order, so the outcome of a prefix collision is at least
//! deterministic.

use lazy_static::lazy_static;
use regex::Regex;

use crate::encode::{self, encode_scalar_with_tag};
use crate::values::{ParamMap, SqlValue};

lazy_static! {
    static ref WHITESPACE_RUNS: Regex = Regex::new(r"\s+").unwrap();
    static ref UNREPLACED_PARAMS: Regex = Regex::new(r":[A-Za-z0-9]+").unwrap();
}

/// Per-call options for query execution and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    /// Reshape the result into a map keyed by each row's `id` column.
    pub result_as_object: bool,
    /// Replace any `:identifier` token left after substitution with `NULL`.
    pub nullify_not_replaced_params: bool,
}

impl QueryOptions {
    #[must_use]
    pub fn with_result_as_object(mut self, on: bool) -> Self {
        self.result_as_object = on;
        self
    }

    #[must_use]
    pub fn with_nullify_not_replaced_params(mut self, on: bool) -> Self {
        self.nullify_not_replaced_params = on;
        self
    }
}

/// Render a SQL template into literal SQL.
///
/// Each parameter gets a fresh random delimiter tag, shared by every
/// occurrence of that parameter (and by all elements of an array value).
#[must_use]
pub fn render(sql: &str, params: Option<&ParamMap>, options: QueryOptions) -> String {
    render_inner(sql, params, options, || {
        encode::random_tag(encode::RENDER_TAG_LEN)
    })
}

/// Render with a caller-supplied delimiter tag for every parameter.
///
/// Deterministic variant of [`render`], useful when the output must be
/// reproducible (tests, golden SQL files).
#[must_use]
pub fn render_with_tag(sql: &str, params: Option<&ParamMap>, options: QueryOptions, tag: &str) -> String {
    render_inner(sql, params, options, || tag.to_string())
}

fn render_inner(
    sql: &str,
    params: Option<&ParamMap>,
    options: QueryOptions,
    mut next_tag: impl FnMut() -> String,
) -> String {
    let mut rendered = WHITESPACE_RUNS.replace_all(sql, " ").into_owned();
    if let Some(params) = params {
        for (key, value) in params {
            rendered = substitute(&rendered, key, value, &next_tag());
        }
    }
    let rendered = rendered.trim();
    if options.nullify_not_replaced_params {
        UNREPLACED_PARAMS.replace_all(rendered, "NULL").into_owned()
    } else {
        rendered.to_string()
    }
}

fn substitute(sql: &str, key: &str, value: &SqlValue, tag: &str) -> String {
    let token = format!(":{key}");
    let replacement = match value {
        SqlValue::Array(items) => {
            let elements: Vec<String> = items
                .iter()
                .map(|item| encode_scalar_with_tag(item, tag))
                .collect();
            format!("ARRAY[{}]", elements.join(","))
        }
        scalar => encode_scalar_with_tag(scalar, tag),
    };
    sql.replace(&token, &replacement)
}
