//! # sift-schema
//!
//! Column types, tables and configuration for the Sift filter engine.
//!
//! This crate provides:
//! - [`ColumnType`] and [`TypedValue`], the value domain of every column
//! - [`Schema`], the name → type registry consulted by the filter layer
//! - [`Table`], [`TableSnapshot`] and [`SharedTable`], the columnar storage
//!   the filter engine reads through [`ColumnSource`]
//! - Configuration parser for `sift.toml` files
//!
//! ## Example
//!
//! ```rust
//! use sift_schema::{ColumnSource, ColumnType, Row, Schema, Table};
//!
//! let schema = Schema::new()
//!     .with_column("x", ColumnType::Integer)
//!     .with_column("y", ColumnType::String);
//!
//! let mut table = Table::new(schema);
//! table.append([Row::new().set("x", 1).set("y", "a")])?;
//!
//! assert_eq!(table.row_count(), 1);
//! assert_eq!(table.schema().type_of("y"), Some(ColumnType::String));
//! # Ok::<(), sift_schema::SchemaError>(())
//! ```

pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use config::{CombinatorSetting, SiftConfig};
pub use error::{SchemaError, SchemaResult};
pub use table::{Column, ColumnSource, Row, Schema, SharedTable, Table, TableSnapshot};
pub use types::{ColumnType, TypedValue, date_to_millis, millis_to_date, millis_to_datetime};
