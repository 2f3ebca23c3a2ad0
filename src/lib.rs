//! Lightweight access layer over a PostgreSQL connection pool.
//!
//! Provides pooled and single-session clients, named-parameter SQL templating
//! with dollar-quoted literal escaping, simple CRUD helpers, stored-function
//! calls, and driver-error normalization into a structured exception carrying
//! the SQL that actually ran.
//!
//! Parameter values are inlined as literals before execution rather than
//! bound through the driver. That keeps multi-statement batches and ad hoc
//! fragments simple, at the cost of relying on randomized delimiter tags for
//! escaping; callers who do not need those properties should prefer native
//! parameter binding.

mod client;
mod encode;
mod error;
mod rows;
mod service;
mod template;
mod values;

pub mod prelude;

pub use client::dml::{column_names, column_set, column_values, function_call, insert_statement};
pub use client::{ConnectionHandle, IsolationLevel, PgClient};
pub use encode::{
    dollar_quote, encode_column_value, encode_scalar, encode_scalar_with_tag, random_tag,
};
pub use error::{PgAccessError, QueryException};
pub use rows::{QueryOutput, SqlRow};
pub use service::{
    DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_POOL_SIZE, FatalHandler, PgService, PgServiceConfig,
};
pub use template::{QueryOptions, render, render_with_tag};
pub use values::{ParamMap, SqlValue};
