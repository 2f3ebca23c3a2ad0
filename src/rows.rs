use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use tokio_postgres::SimpleQueryMessage;

use crate::encode::text_form;
use crate::template::QueryOptions;
use crate::values::SqlValue;

/// A row from a query result.
///
/// Column names are shared across the rows of one statement's result set.
/// Values arrive in text form from the simple query protocol; use the
/// [`SqlValue`] accessors to parse them.
#[derive(Debug, Clone)]
pub struct SqlRow {
    /// The column names for this row
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<SqlValue>,
    // Cache for column lookups, to avoid repeated string comparisons
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl SqlRow {
    /// Create a new row from column names and values.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let cache = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(index, name)| (name.clone(), index))
                .collect::<HashMap<_, _>>(),
        );

        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&index) = self.column_index_cache.get(column_name) {
            return Some(index);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value by column name, or `None` if the column is absent.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.get_column_index(column_name)
            .and_then(|index| self.values.get(index))
    }

    /// Get a value by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// JSON object form of this row (`column name` → value).
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .column_names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        JsonValue::Object(map)
    }
}

impl Serialize for SqlRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// The shaped result of a query.
///
/// Plain queries yield `Rows`; with
/// [`result_as_object`](QueryOptions::result_as_object) set, rows collapse
/// into a map keyed by each row's `id` column (last row wins on duplicates).
#[derive(Debug, Clone)]
pub enum QueryOutput {
    Rows(Vec<SqlRow>),
    ById(BTreeMap<String, SqlRow>),
}

impl QueryOutput {
    /// First row of a `Rows` result. A `ById` result has no first row.
    #[must_use]
    pub fn first(&self) -> Option<&SqlRow> {
        match self {
            QueryOutput::Rows(rows) => rows.first(),
            QueryOutput::ById(_) => None,
        }
    }

    /// Consume the output, yielding the first row of a `Rows` result.
    #[must_use]
    pub fn into_first(self) -> Option<SqlRow> {
        match self {
            QueryOutput::Rows(rows) => rows.into_iter().next(),
            QueryOutput::ById(_) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(rows) => rows.len(),
            QueryOutput::ById(by_id) => by_id.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the output as a flat list of rows, in key order for `ById`.
    #[must_use]
    pub fn into_rows(self) -> Vec<SqlRow> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::ById(by_id) => by_id.into_values().collect(),
        }
    }
}

/// Extract rows from a simple-protocol message stream.
///
/// Multi-statement batches interleave row sets; column name sets are shared
/// per contiguous run of identically shaped rows.
pub(crate) fn collect_rows(messages: Vec<SimpleQueryMessage>) -> Vec<SqlRow> {
    let mut rows = Vec::new();
    let mut current_columns: Option<Arc<Vec<String>>> = None;

    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            let names: Vec<String> = row
                .columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect();
            let column_names = match &current_columns {
                Some(existing) if **existing == names => Arc::clone(existing),
                _ => {
                    let fresh = Arc::new(names);
                    current_columns = Some(Arc::clone(&fresh));
                    fresh
                }
            };

            let mut values = Vec::with_capacity(column_names.len());
            for index in 0..column_names.len() {
                values.push(match row.get(index) {
                    Some(text) => SqlValue::Text(text.to_string()),
                    None => SqlValue::Null,
                });
            }
            rows.push(SqlRow::new(column_names, values));
        }
    }

    rows
}

/// Apply result shaping to the collected rows.
pub(crate) fn shape(rows: Vec<SqlRow>, options: QueryOptions) -> QueryOutput {
    if !options.result_as_object {
        return QueryOutput::Rows(rows);
    }

    let mut by_id = BTreeMap::new();
    for row in rows {
        if let Some(key) = row_id_key(&row) {
            by_id.insert(key, row);
        }
    }
    QueryOutput::ById(by_id)
}

// Rows without a usable id column are dropped from ById shaping.
fn row_id_key(row: &SqlRow) -> Option<String> {
    match row.get("id") {
        Some(value) if !value.is_null() => Some(text_form(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Option<i64>, name: &str) -> SqlRow {
        let columns = Arc::new(vec!["id".to_string(), "name".to_string()]);
        SqlRow::new(
            columns,
            vec![
                id.map_or(SqlValue::Null, SqlValue::Int),
                SqlValue::Text(name.to_string()),
            ],
        )
    }

    #[test]
    fn shape_keys_rows_by_id_last_wins() {
        let rows = vec![row(Some(1), "first"), row(Some(2), "second"), row(Some(1), "override")];
        let shaped = shape(rows, QueryOptions::default().with_result_as_object(true));
        let QueryOutput::ById(by_id) = shaped else {
            panic!("expected ById shaping");
        };
        assert_eq!(by_id.len(), 2);
        assert_eq!(
            by_id["1"].get("name"),
            Some(&SqlValue::Text("override".into()))
        );
        assert_eq!(
            by_id["2"].get("name"),
            Some(&SqlValue::Text("second".into()))
        );
    }

    #[test]
    fn shape_drops_rows_without_an_id() {
        let rows = vec![row(None, "orphan"), row(Some(3), "kept")];
        let shaped = shape(rows, QueryOptions::default().with_result_as_object(true));
        assert_eq!(shaped.len(), 1);
    }

    #[test]
    fn shape_passes_rows_through_by_default() {
        let rows = vec![row(Some(1), "a"), row(Some(2), "b")];
        let shaped = shape(rows, QueryOptions::default());
        assert!(matches!(&shaped, QueryOutput::Rows(r) if r.len() == 2));
        assert_eq!(shaped.first().and_then(|r| r.get("id")), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn by_id_output_has_no_first_row() {
        let shaped = shape(
            vec![row(Some(1), "a")],
            QueryOptions::default().with_result_as_object(true),
        );
        assert!(shaped.first().is_none());
        assert!(shaped.into_first().is_none());
    }

    #[test]
    fn row_lookup_by_name_and_index_agree() {
        let r = row(Some(5), "x");
        assert_eq!(r.get("id"), r.get_by_index(0));
        assert_eq!(r.get("name"), r.get_by_index(1));
        assert_eq!(r.get("absent"), None);
    }

    #[test]
    fn row_serializes_as_an_object() {
        let r = row(Some(5), "x");
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({"id": 5, "name": "x"})
        );
    }
}
