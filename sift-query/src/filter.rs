//! Filter clauses, operands and specs.
//!
//! A clause travels on the wire as `[column, operator, operand]`; a spec is a
//! list of clauses plus an optional combinator:
//!
//! ```rust
//! use sift_query::{Combinator, FilterSpec, Literal, Operator};
//!
//! let spec = FilterSpec::from_json(r#"{
//!     "filter": [["x", ">", 1], ["y", "in", ["a", "b"]]],
//!     "filter_op": "or"
//! }"#)?;
//!
//! assert_eq!(spec.combinator, Combinator::Or);
//! assert_eq!(spec.clauses[0].operator, Operator::Gt);
//! assert_eq!(spec.clauses[1].literal, Literal::from(vec!["a", "b"]));
//! # Ok::<(), sift_query::QueryError>(())
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sift_schema::{CombinatorSetting, TypedValue, millis_to_datetime};
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};

/// Filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Greater than (`>`).
    Gt,
    /// Less than (`<`).
    Lt,
    /// Equals (`==`).
    Eq,
    /// Not equals (`!=`).
    Ne,
    /// Member of a list (`in`).
    In,
    /// Not a member of a list (`not in`).
    NotIn,
    /// Substring match, strings only (`contains`).
    Contains,
    /// Cell is null (`is null`).
    IsNull,
    /// Cell is not null (`is not null`).
    IsNotNull,
}

impl Operator {
    /// All operators, in wire-token order.
    pub const ALL: [Operator; 9] = [
        Self::Gt,
        Self::Lt,
        Self::Eq,
        Self::Ne,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// Parse a wire token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "in" => Some(Self::In),
            "not in" => Some(Self::NotIn),
            "contains" => Some(Self::Contains),
            "is null" => Some(Self::IsNull),
            "is not null" => Some(Self::IsNotNull),
            _ => None,
        }
    }

    /// The wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Contains => "contains",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
        }
    }

    /// Whether the operator compares against an operand.
    pub fn takes_operand(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// Whether the operand is a list.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw filter operand, before coercion to a column type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Literal {
    /// No operand.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    Text(String),
    /// Structured date.
    Date(NaiveDate),
    /// Structured datetime, UTC.
    Datetime(NaiveDateTime),
    /// List of values, for `in` / `not in`.
    List(Vec<Literal>),
}

impl Literal {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the literal's kind, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Date(_) => "date",
            Self::Datetime(_) => "datetime",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<NaiveDate> for Literal {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(v: NaiveDateTime) -> Self {
        Self::Datetime(v)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Datetime(v.naive_utc())
    }
}

impl From<TypedValue> for Literal {
    fn from(v: TypedValue) -> Self {
        match v {
            TypedValue::Integer(i) => Self::Int(i),
            TypedValue::Float(f) => Self::Float(f),
            TypedValue::String(s) => Self::Text(s),
            TypedValue::Boolean(b) => Self::Bool(b),
            TypedValue::Date(d) => Self::Date(d),
            TypedValue::Datetime(ms) => match millis_to_datetime(ms) {
                Some(dt) => Self::Datetime(dt),
                None => Self::Int(ms),
            },
        }
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl TryFrom<serde_json::Value> for Literal {
    type Error = QueryError;

    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().ok_or_else(|| {
                    QueryError::invalid_operand(format!("number {} out of range", n))
                })?),
            },
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Literal::try_from)
                    .collect::<QueryResult<Vec<_>>>()?,
            ),
            Value::Object(_) => {
                return Err(QueryError::invalid_operand(
                    "objects are not valid filter operands",
                ));
            }
        })
    }
}

impl From<Literal> for serde_json::Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => serde_json::Value::Null,
            Literal::Bool(b) => b.into(),
            Literal::Int(i) => i.into(),
            Literal::Float(f) => f.into(),
            Literal::Text(s) => s.into(),
            Literal::Date(d) => d.format("%Y-%m-%d").to_string().into(),
            Literal::Datetime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string().into(),
            Literal::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
        }
    }
}

/// A single `(column, operator, operand)` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<serde_json::Value>",
    into = "Vec<serde_json::Value>"
)]
pub struct FilterClause {
    /// Column the clause tests.
    pub column: SmolStr,
    /// Operator.
    pub operator: Operator,
    /// Operand; ignored by the null operators.
    pub literal: Literal,
}

impl FilterClause {
    /// Create a clause.
    pub fn new(
        column: impl Into<SmolStr>,
        operator: Operator,
        literal: impl Into<Literal>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            literal: literal.into(),
        }
    }

    /// `column > value`.
    pub fn gt(column: impl Into<SmolStr>, value: impl Into<Literal>) -> Self {
        Self::new(column, Operator::Gt, value)
    }

    /// `column < value`.
    pub fn lt(column: impl Into<SmolStr>, value: impl Into<Literal>) -> Self {
        Self::new(column, Operator::Lt, value)
    }

    /// `column == value`.
    pub fn eq(column: impl Into<SmolStr>, value: impl Into<Literal>) -> Self {
        Self::new(column, Operator::Eq, value)
    }

    /// `column != value`.
    pub fn ne(column: impl Into<SmolStr>, value: impl Into<Literal>) -> Self {
        Self::new(column, Operator::Ne, value)
    }

    /// `column in [values]`.
    pub fn in_list<T: Into<Literal>>(column: impl Into<SmolStr>, values: Vec<T>) -> Self {
        Self::new(column, Operator::In, values)
    }

    /// `column not in [values]`.
    pub fn not_in_list<T: Into<Literal>>(column: impl Into<SmolStr>, values: Vec<T>) -> Self {
        Self::new(column, Operator::NotIn, values)
    }

    /// `column contains value`.
    pub fn contains(column: impl Into<SmolStr>, value: impl Into<Literal>) -> Self {
        Self::new(column, Operator::Contains, value)
    }

    /// `column is null`.
    pub fn is_null(column: impl Into<SmolStr>) -> Self {
        Self::new(column, Operator::IsNull, Literal::Null)
    }

    /// `column is not null`.
    pub fn is_not_null(column: impl Into<SmolStr>) -> Self {
        Self::new(column, Operator::IsNotNull, Literal::Null)
    }

    /// Parse a clause from its JSON wire form.
    pub fn from_json(json: &str) -> QueryResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Build a clause from an already parsed JSON value.
    ///
    /// Unlike going through `serde`, this keeps the specific error code.
    pub fn from_value(value: serde_json::Value) -> QueryResult<Self> {
        match value {
            serde_json::Value::Array(parts) => Self::try_from(parts),
            _ => Err(QueryError::malformed_clause("clause must be an array")),
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.takes_operand() {
            let operand: serde_json::Value = self.literal.clone().into();
            write!(f, "{} {} {}", self.column, self.operator, operand)
        } else {
            write!(f, "{} {}", self.column, self.operator)
        }
    }
}

impl TryFrom<Vec<serde_json::Value>> for FilterClause {
    type Error = QueryError;

    fn try_from(parts: Vec<serde_json::Value>) -> QueryResult<Self> {
        if !(2..=3).contains(&parts.len()) {
            return Err(QueryError::malformed_clause(format!(
                "expected 2 or 3 elements, got {}",
                parts.len()
            )));
        }

        let mut parts = parts.into_iter();
        let column = match parts.next() {
            Some(serde_json::Value::String(s)) => SmolStr::from(s),
            _ => return Err(QueryError::malformed_clause("column name must be a string")),
        };
        let operator = match parts.next() {
            Some(serde_json::Value::String(token)) => {
                Operator::parse(&token).ok_or_else(|| QueryError::unknown_operator(token))?
            }
            _ => return Err(QueryError::malformed_clause("operator must be a string")),
        };
        let literal = match parts.next() {
            Some(value) => Literal::try_from(value)?,
            None => Literal::Null,
        };

        Ok(Self {
            column,
            operator,
            literal,
        })
    }
}

impl From<FilterClause> for Vec<serde_json::Value> {
    fn from(clause: FilterClause) -> Self {
        let mut parts = vec![
            serde_json::Value::from(clause.column.as_str()),
            serde_json::Value::from(clause.operator.as_str()),
        ];
        if clause.operator.takes_operand() {
            parts.push(clause.literal.into());
        }
        parts
    }
}

/// How per-clause results fold into one row verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every clause must pass.
    #[default]
    And,
    /// At least one clause must pass.
    Or,
}

impl Combinator {
    /// Parse a combinator token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    /// The combinator token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl From<CombinatorSetting> for Combinator {
    fn from(setting: CombinatorSetting) -> Self {
        match setting {
            CombinatorSetting::And => Self::And,
            CombinatorSetting::Or => Self::Or,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list of clauses folded under one combinator.
///
/// Clause order never changes the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// The clauses.
    #[serde(default, rename = "filter")]
    pub clauses: Vec<FilterClause>,
    /// The combinator; `and` when omitted.
    #[serde(default, rename = "filter_op")]
    pub combinator: Combinator,
}

impl FilterSpec {
    /// Create an empty spec (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an AND spec.
    pub fn and(clauses: impl IntoIterator<Item = FilterClause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
            combinator: Combinator::And,
        }
    }

    /// Create an OR spec.
    pub fn or(clauses: impl IntoIterator<Item = FilterClause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
            combinator: Combinator::Or,
        }
    }

    /// Add a clause.
    pub fn clause(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Set the combinator.
    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Check if the spec has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Parse a spec from JSON.
    ///
    /// Accepts either `{"filter": [...], "filter_op": "or"}` or a bare array
    /// of clauses.
    pub fn from_json(json: &str) -> QueryResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Build a spec from an already parsed JSON value, defaulting to AND.
    pub fn from_value(value: serde_json::Value) -> QueryResult<Self> {
        Self::from_value_or(value, Combinator::And)
    }

    /// Build a spec from a JSON value, using `default` when it names no
    /// combinator.
    pub fn from_value_or(value: serde_json::Value, default: Combinator) -> QueryResult<Self> {
        use serde_json::Value;

        let (clauses, combinator) = match value {
            Value::Array(items) => (items, default),
            Value::Object(mut fields) => {
                let combinator = match fields.remove("filter_op") {
                    None | Some(Value::Null) => default,
                    Some(Value::String(op)) => {
                        Combinator::parse(&op).ok_or_else(|| QueryError::unknown_combinator(op))?
                    }
                    Some(other) => return Err(QueryError::unknown_combinator(other.to_string())),
                };
                let clauses = match fields.remove("filter") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(QueryError::malformed_clause("`filter` must be an array"));
                    }
                };
                (clauses, combinator)
            }
            _ => {
                return Err(QueryError::malformed_clause(
                    "expected a list of clauses or a {\"filter\": [...]} object",
                ));
            }
        };

        Ok(Self {
            clauses: clauses
                .into_iter()
                .map(FilterClause::from_value)
                .collect::<QueryResult<_>>()?,
            combinator,
        })
    }
}
