//! Row-map DML helpers and their statement builders.
//!
//! The builders are plain functions over a [`ParamMap`] so ad hoc SQL can be
//! assembled outside the client as well. Column order is always alphabetical.

use crate::encode::encode_column_value;
use crate::error::PgAccessError;
use crate::rows::SqlRow;
use crate::template::QueryOptions;
use crate::values::ParamMap;

use super::PgClient;

/// Quoted column names of a row map, alphabetically ordered.
#[must_use]
pub fn column_names(row: &ParamMap) -> Vec<String> {
    row.keys().map(|key| format!("\"{key}\"")).collect()
}

/// Encoded column values of a row map, in the same order as
/// [`column_names`].
#[must_use]
pub fn column_values(row: &ParamMap) -> Vec<String> {
    row.values().map(encode_column_value).collect()
}

/// The `"col"=value,...` fragment for an UPDATE statement. Empty when the row
/// map has no entries.
#[must_use]
pub fn column_set(row: &ParamMap) -> String {
    row.iter()
        .map(|(key, value)| format!("\"{key}\"={}", encode_column_value(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// A full `INSERT ... RETURNING *;` statement for one row map.
#[must_use]
pub fn insert_statement(table: &str, row: &ParamMap) -> String {
    format!(
        "INSERT INTO {table}({}) VALUES({}) RETURNING *;",
        column_names(row).join(","),
        column_values(row).join(",")
    )
}

/// A `SELECT * FROM "name"(key => :key, ...)` stored-function call template.
#[must_use]
pub fn function_call(function_name: &str, params: Option<&ParamMap>) -> String {
    let arguments: Vec<String> = params
        .map(|map| map.keys().map(|key| format!("{key} => :{key}")).collect())
        .unwrap_or_default();
    format!("SELECT * FROM \"{function_name}\"({})", arguments.join(","))
}

impl PgClient {
    /// Insert one or more rows as a single batch, returning the first row
    /// produced by the batch's `RETURNING *` clauses.
    ///
    /// Callers inserting multiple rows only get the first result back.
    ///
    /// # Errors
    /// Failures are wrapped in a [`QueryException`](crate::QueryException)
    /// carrying the rendered SQL.
    pub async fn insert(
        &self,
        table: &str,
        rows: &[ParamMap],
    ) -> Result<Option<SqlRow>, PgAccessError> {
        let mut sql = String::new();
        for row in rows {
            sql.push_str(&insert_statement(table, row));
            sql.push('\n');
        }
        self.query_one(&sql, None, QueryOptions::default()).await
    }

    /// Update at most one row, returning it.
    ///
    /// A guard query runs first; matching more than one row is a caller-logic
    /// error and fails before any UPDATE is issued. A row map with no entries
    /// turns the call into a plain `SELECT *` of the matching row.
    ///
    /// # Errors
    /// `PgAccessError::UsageError` when the `where` clause matches more than
    /// one row; query failures otherwise.
    pub async fn update(
        &self,
        table: &str,
        where_clause: &str,
        row: &ParamMap,
        where_params: Option<&ParamMap>,
    ) -> Result<Option<SqlRow>, PgAccessError> {
        let matching = self
            .query(
                &format!("SELECT TRUE FROM {table} WHERE {where_clause}"),
                where_params,
                QueryOptions::default(),
            )
            .await?;
        if matching.len() > 1 {
            return Err(PgAccessError::UsageError(
                "this query updates more than one row!".to_string(),
            ));
        }

        let set = column_set(row);
        if set.is_empty() {
            return self
                .query_one(
                    &format!("SELECT * FROM {table} WHERE {where_clause}"),
                    where_params,
                    QueryOptions::default(),
                )
                .await;
        }
        self.query_one(
            &format!("UPDATE {table} SET {set} WHERE {where_clause} RETURNING *"),
            where_params,
            QueryOptions::default(),
        )
        .await
    }

    /// Call a stored function, passing every entry of `params` as a named
    /// argument, and return the first result row.
    ///
    /// # Errors
    /// Failures are wrapped in a [`QueryException`](crate::QueryException)
    /// carrying the rendered SQL.
    pub async fn run_function(
        &self,
        function_name: &str,
        params: Option<&ParamMap>,
        options: QueryOptions,
    ) -> Result<Option<SqlRow>, PgAccessError> {
        self.query_one(&function_call(function_name, params), params, options)
            .await
    }
}
