//! Error types for schemas, tables and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::types::ColumnType;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised by the table collaborator and config loader.
///
/// None of these are produced while filtering: the filter path reports
/// problems as a verdict, not as an error.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(sift::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(sift::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// A row referenced a column the table does not have.
    #[error("unknown column `{name}`")]
    #[diagnostic(
        code(sift::schema::unknown_column),
        help("the schema is fixed once the table is created")
    )]
    UnknownColumn { name: String },

    /// Two columns declared with the same name.
    #[error("duplicate column `{name}`")]
    #[diagnostic(code(sift::schema::duplicate_column))]
    DuplicateColumn { name: String },

    /// A cell value does not fit the declared column type.
    #[error("column `{column}` expects {expected}, got {found}")]
    #[diagnostic(code(sift::schema::type_mismatch))]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: ColumnType,
    },

    /// Unrecognised type token in a schema declaration.
    #[error("unknown type `{type_name}` for column `{column}`")]
    #[diagnostic(
        code(sift::schema::unknown_type),
        help("expected one of: integer, float, string, boolean, date, datetime")
    )]
    UnknownType { column: String, type_name: String },

    /// A schema declaration that is not shaped like `{name: type}`.
    #[error("invalid schema: {message}")]
    #[diagnostic(code(sift::schema::invalid_schema))]
    InvalidSchema { message: String },
}

impl SchemaError {
    /// Create an unknown column error.
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }

    /// Create a duplicate column error.
    pub fn duplicate_column(name: impl Into<String>) -> Self {
        Self::DuplicateColumn { name: name.into() }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: ColumnType,
        found: ColumnType,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected,
            found,
        }
    }

    /// Create an unknown type error.
    pub fn unknown_type(column: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }
}
