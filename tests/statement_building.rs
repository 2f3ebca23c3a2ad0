use std::time::Duration;

use pg_access::prelude::*;
use pg_access::{column_set, function_call, insert_statement};

#[test]
fn insert_statement_builds_sorted_returning_star() {
    let row = param_map! {
        "email" => "ada@example.com",
        "active" => true,
    };
    let statement = insert_statement("accounts", &row);
    assert!(statement.starts_with("INSERT INTO accounts(\"active\",\"email\") VALUES("));
    assert!(statement.ends_with(") RETURNING *;"));
    assert!(statement.contains("ada@example.com"));
}

#[test]
fn insert_statement_skips_nothing_but_encodes_nulls() {
    let row = param_map! { "note" => None::<String> };
    let statement = insert_statement("journal", &row);
    assert_eq!(
        statement,
        "INSERT INTO journal(\"note\") VALUES(NULL) RETURNING *;"
    );
}

#[test]
fn empty_column_set_signals_a_read_instead_of_an_update() {
    assert!(column_set(&ParamMap::new()).is_empty());
}

#[test]
fn function_call_names_every_argument() {
    let params = param_map! { "p_user" => 1, "p_limit" => 10 };
    assert_eq!(
        function_call("fetch_history", Some(&params)),
        "SELECT * FROM \"fetch_history\"(p_limit => :p_limit,p_user => :p_user)"
    );
}

#[test]
fn escape_behaves_per_value_shape() {
    let service = PgService::new(
        PgServiceConfig::new("postgres://app@localhost/app")
            .with_max_pool_size(4)
            .with_connection_timeout(Duration::from_secs(1)),
    );

    // Non-empty values get delimited.
    let escaped = service.escape(Some("annual; DROP TABLE x"), false).unwrap();
    assert!(escaped.contains("annual; DROP TABLE x"));
    assert!(escaped.starts_with('$') && escaped.ends_with('$'));

    // Empty value with nullification requested becomes the NULL literal.
    assert_eq!(service.escape(Some(""), true).as_deref(), Some("NULL"));

    // Absent value without nullification passes through unchanged.
    assert_eq!(service.escape(None, false), None);
}
