//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::error::{PgAccessError, QueryException};
pub use crate::param_map;
pub use crate::rows::{QueryOutput, SqlRow};
pub use crate::template::{QueryOptions, render};
pub use crate::values::{ParamMap, SqlValue};

pub use crate::client::{IsolationLevel, PgClient};
pub use crate::service::{PgService, PgServiceConfig};
