//! Error types for filter operations with actionable messages.
//!
//! Filtering itself never fails: a bad clause degrades to a verdict (see
//! [`crate::evaluate::Verdict`]). The types here describe *why* a clause was
//! judged invalid or degraded, and report wire-format problems at the API
//! boundary.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Filter errors (unknown column, missing operand, coercion)
//! - 6xxx: Data errors (deserialization)
//! - 7xxx: Configuration errors
//!
//! ```rust
//! use sift_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_operator(">=");
//! assert_eq!(err.code, ErrorCode::UnknownOperator);
//! assert_eq!(err.code.code(), "S1005");
//! ```

use std::fmt;

use sift_schema::{ColumnType, SchemaError};
use thiserror::Error;

use crate::coerce::CoercionError;
use crate::filter::Operator;

/// Result type for filter API operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter errors (1xxx)
    /// Column absent from the schema (S1001).
    UnknownColumn = 1001,
    /// Comparison operator without an operand (S1002).
    MissingOperand = 1002,
    /// Operand cannot be coerced to the column type (S1003).
    InvalidOperand = 1003,
    /// Operator not meaningful for the column type (S1004).
    OperatorTypeMismatch = 1004,
    /// Unrecognised operator token (S1005).
    UnknownOperator = 1005,
    /// Clause not shaped like `[column, operator, operand]` (S1006).
    MalformedClause = 1006,

    // Data errors (6xxx)
    /// Deserialization error (S6003).
    DeserializationError = 6003,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownColumn => "Unknown column",
            Self::MissingOperand => "Missing operand",
            Self::InvalidOperand => "Invalid operand",
            Self::OperatorTypeMismatch => "Operator not supported for column type",
            Self::UnknownOperator => "Unknown operator",
            Self::MalformedClause => "Malformed filter clause",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why a single clause is invalid or degraded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The column is not in the schema. Never fatal.
    #[error("column `{column}` is not in the schema")]
    SchemaLookupMiss { column: String },

    /// A comparison operator was given no operand.
    #[error("operator `{operator}` on column `{column}` requires an operand")]
    MissingOperand { column: String, operator: Operator },

    /// The operand does not coerce to the column type.
    #[error("operand for column `{column}` is invalid: {source}")]
    Coercion {
        column: String,
        #[source]
        source: CoercionError,
    },

    /// The operator is not meaningful for the column type.
    #[error("operator `{operator}` is not supported on {column_type} column `{column}`")]
    OperatorTypeMismatch {
        column: String,
        operator: Operator,
        column_type: ColumnType,
    },
}

impl FilterError {
    /// The error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SchemaLookupMiss { .. } => ErrorCode::UnknownColumn,
            Self::MissingOperand { .. } => ErrorCode::MissingOperand,
            Self::Coercion { .. } => ErrorCode::InvalidOperand,
            Self::OperatorTypeMismatch { .. } => ErrorCode::OperatorTypeMismatch,
        }
    }

    /// The column the failing clause refers to.
    pub fn column(&self) -> &str {
        match self {
            Self::SchemaLookupMiss { column }
            | Self::MissingOperand { column, .. }
            | Self::Coercion { column, .. }
            | Self::OperatorTypeMismatch { column, .. } => column,
        }
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The column involved.
    pub column: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// An error reported at the filter API boundary.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(
        mut self,
        text: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.context.suggestions.push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.context.column = Some(column.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an unknown operator error.
    pub fn unknown_operator(token: impl Into<String>) -> Self {
        let token = token.into();
        Self::new(
            ErrorCode::UnknownOperator,
            format!("Unknown filter operator `{}`", token),
        )
        .with_suggestion(
            "Use one of: >, <, ==, !=, in, not in, contains, is null, is not null",
        )
    }

    /// Create a malformed clause error.
    pub fn malformed_clause(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MalformedClause,
            format!("Malformed filter clause: {}", message.into()),
        )
        .with_code_suggestion(
            "Write clauses as [column, operator, operand]",
            r#"["x", ">", 2]"#,
        )
    }

    /// Create an invalid operand error.
    pub fn invalid_operand(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOperand, message.into())
            .with_help("Operands are numbers, strings, booleans, dates or lists of those")
    }

    /// Create an unknown combinator error.
    pub fn unknown_combinator(token: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MalformedClause,
            format!("Unknown filter combinator `{}`", token.into()),
        )
        .with_suggestion("Use \"and\" or \"or\"")
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize filter: {}", message),
        )
    }

    // ============== Error Checks ==============

    /// Check if this error came from a malformed wire clause.
    pub fn is_wire_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownOperator
                | ErrorCode::MalformedClause
                | ErrorCode::DeserializationError
        )
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref column) = self.context.column {
            output.push_str(&format!("  → Column: {}\n", column));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    let code = code.replace('\n', "\n     ");
                    output.push_str(&format!("     ```\n     {}\n     ```\n", code));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<FilterError> for QueryError {
    fn from(err: FilterError) -> Self {
        let column = err.column().to_string();
        QueryError::new(err.code(), err.to_string())
            .with_column(column)
            .with_source(err)
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        let code = match err {
            SchemaError::IoError { .. }
            | SchemaError::TomlError { .. }
            | SchemaError::DuplicateColumn { .. }
            | SchemaError::UnknownType { .. }
            | SchemaError::InvalidSchema { .. } => ErrorCode::InvalidConfiguration,
            SchemaError::UnknownColumn { .. } => ErrorCode::UnknownColumn,
            SchemaError::TypeMismatch { .. } => ErrorCode::InvalidOperand,
        };
        QueryError::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::deserialization(err.to_string()).with_source(err)
    }
}
