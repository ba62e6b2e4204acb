//! # Sift
//!
//! Schema-typed filtering for columnar in-memory tables.
//!
//! Sift provides:
//! - A column type registry and an append-only columnar table
//! - Filter clauses of the form `[column, operator, operand]`, combined with
//!   `and` / `or`
//! - Operand coercion to the column type, with date and datetime parsing
//! - Up-front validation and a scan engine that produces a row mask
//! - Filtered views that pick up appended rows incrementally
//!
//! ## Quick Start
//!
//! ```rust
//! use sift::prelude::*;
//!
//! let schema = Schema::new()
//!     .with_column("x", ColumnType::Integer)
//!     .with_column("y", ColumnType::String);
//!
//! let table = Table::with_rows(
//!     schema,
//!     [
//!         Row::new().set("x", 1).set("y", "a"),
//!         Row::new().set("x", 2).set("y", "b"),
//!         Row::new().set("x", 3).set("y", "c"),
//!     ],
//! )?;
//!
//! let engine = FilterEngine::new();
//! let view = View::new(&engine, &table, FilterSpec::and([FilterClause::gt("x", 1)]));
//!
//! assert_eq!(view.num_rows(), 2);
//! assert_eq!(
//!     view.to_json(&table),
//!     serde_json::json!([{"x": 2, "y": "b"}, {"x": 3, "y": "c"}])
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Column types, tables and configuration.
pub mod schema {
    pub use sift_schema::*;
}

/// Filter clauses, validation and evaluation.
pub mod query {
    pub use sift_query::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::prelude::*;
    pub use crate::schema::{
        ColumnSource, ColumnType, Row, Schema, SharedTable, SiftConfig, Table, TypedValue,
    };
}

// Re-export key types at the crate root
pub use query::{FilterClause, FilterEngine, FilterError, FilterSpec, Mask, QueryError, View};
pub use schema::{ColumnType, Schema, SchemaError, SiftConfig, Table};
