//! # sift-query
//!
//! Filter clauses, coercion and evaluation for Sift tables.
//!
//! This crate provides:
//! - [`FilterClause`] and [`FilterSpec`], with the JSON wire shape
//!   `[column, operator, operand]`
//! - Operand coercion to a column's type, including date and datetime parsing
//! - Clause validation against a [`Schema`](sift_schema::Schema)
//! - [`FilterEngine`], which scans any [`ColumnSource`](sift_schema::ColumnSource)
//!   into a [`Mask`]
//! - [`View`], a spec bound to its mask that tracks appended rows
//!
//! ## Filters
//!
//! ```rust
//! use sift_query::{FilterClause, FilterSpec, Operator};
//!
//! let spec = FilterSpec::or([
//!     FilterClause::contains("name", "jo"),
//!     FilterClause::in_list("role", vec!["admin", "owner"]),
//! ]);
//! assert_eq!(spec.clauses[1].operator, Operator::In);
//!
//! let parsed = FilterSpec::from_json(r#"{"filter": [["age", ">", 18]], "filter_op": "and"}"#)?;
//! assert_eq!(parsed.clauses[0], FilterClause::gt("age", 18));
//! # Ok::<(), sift_query::QueryError>(())
//! ```
//!
//! ## Validation
//!
//! ```rust
//! use sift_query::{FilterClause, is_valid_filter};
//! use sift_schema::{ColumnType, Schema};
//!
//! let schema = Schema::new().with_column("born", ColumnType::Date);
//!
//! assert!(is_valid_filter(&schema, &FilterClause::eq("born", "01-01-1970")));
//! assert!(!is_valid_filter(&schema, &FilterClause::eq("born", "1234")));
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use sift_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_operator(">=");
//! assert_eq!(err.code, ErrorCode::UnknownOperator);
//! ```

pub mod coerce;
pub mod combine;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod logging;
pub mod validate;
pub mod view;

pub use coerce::{Coerced, CoercionError, coerce, coerce_for, parse_date, parse_datetime_millis};
pub use combine::{combine, combine_bools};
pub use engine::{FilterEngine, Mask, evaluate_filter, is_valid_filter};
pub use error::{ErrorCode, ErrorContext, FilterError, QueryError, QueryResult, Suggestion};
pub use evaluate::{Predicate, Verdict, evaluate};
pub use filter::{Combinator, FilterClause, FilterSpec, Literal, Operator};
pub use validate::{is_valid, validate, validate_spec};
pub use view::{Rows, View};

// Re-export logging utilities
pub use logging::{
    get_log_format, get_log_level, init as init_logging, init_debug, init_from_config,
    init_with_level, is_debug_enabled,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::{FilterEngine, Mask, evaluate_filter, is_valid_filter};
    pub use crate::error::{FilterError, QueryError, QueryResult};
    pub use crate::filter::{Combinator, FilterClause, FilterSpec, Literal, Operator};
    pub use crate::view::View;
}
