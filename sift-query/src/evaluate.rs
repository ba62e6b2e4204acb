//! Per-row predicate evaluation.
//!
//! A clause is compiled once per scan into a [`Predicate`]: the operand is
//! coerced to the column type up front, and any failure is folded into the
//! predicate so that evaluation itself cannot fail. Rules, first match wins:
//!
//! 1. `is null` / `is not null` test the cell.
//! 2. A null operand constrains nothing: [`Verdict::Unconstrained`].
//! 3. A null cell never satisfies a comparison.
//! 4. Otherwise the operator's own semantics apply.
//!
//! A column the schema does not know is also [`Verdict::Unconstrained`], and
//! an operand that does not coerce rejects every row.

use std::cmp::Ordering;

use sift_schema::{ColumnType, TypedValue};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::coerce::{Coerced, coerce_for};
use crate::error::FilterError;
use crate::filter::{FilterClause, Operator};

/// Outcome of one clause against one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The clause imposes no constraint on this row.
    Unconstrained,
    /// The row satisfies the clause.
    Pass,
    /// The row does not satisfy the clause.
    Reject,
}

impl Verdict {
    /// Whether the row survives this clause.
    #[inline]
    pub fn is_pass(self) -> bool {
        !matches!(self, Self::Reject)
    }

    #[inline]
    fn from_bool(pass: bool) -> Self {
        if pass { Self::Pass } else { Self::Reject }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Plan {
    Unconstrained,
    NullCheck { want_null: bool },
    Reject,
    Compare { operator: Operator, value: TypedValue },
    Contains(String),
    Member { values: Vec<TypedValue>, negate: bool },
}

/// A clause compiled against a column type.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: SmolStr,
    plan: Plan,
    note: Option<FilterError>,
}

impl Predicate {
    /// Compile `clause` for a column of type `column_type`.
    ///
    /// `None` means the column is unknown; the predicate then passes every row.
    pub fn compile(clause: &FilterClause, column_type: Option<ColumnType>) -> Self {
        let column = clause.column.clone();

        let Some(ty) = column_type else {
            trace!(column = %column, "filter on unknown column is unconstrained");
            return Self {
                note: Some(FilterError::SchemaLookupMiss {
                    column: column.to_string(),
                }),
                column,
                plan: Plan::Unconstrained,
            };
        };

        let (plan, note) = match clause.operator {
            Operator::IsNull => (Plan::NullCheck { want_null: true }, None),
            Operator::IsNotNull => (Plan::NullCheck { want_null: false }, None),
            operator => match coerce_for(operator, ty, &clause.literal) {
                Ok(Coerced::Absent) => (Plan::Unconstrained, None),
                Ok(Coerced::List(values)) => (
                    Plan::Member {
                        values,
                        negate: operator == Operator::NotIn,
                    },
                    None,
                ),
                Ok(Coerced::Scalar(TypedValue::String(needle)))
                    if operator == Operator::Contains =>
                {
                    (Plan::Contains(needle), None)
                }
                Ok(Coerced::Scalar(_)) if operator == Operator::Contains => (
                    Plan::Reject,
                    Some(FilterError::OperatorTypeMismatch {
                        column: column.to_string(),
                        operator,
                        column_type: ty,
                    }),
                ),
                Ok(Coerced::Scalar(value)) => (Plan::Compare { operator, value }, None),
                Err(source) => (
                    Plan::Reject,
                    Some(FilterError::Coercion {
                        column: column.to_string(),
                        source,
                    }),
                ),
            },
        };

        if let Some(ref err) = note {
            debug!(clause = %clause, error = %err, "filter clause degraded to never-match");
        }

        Self { column, plan, note }
    }

    /// The column this predicate reads.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Why the clause was degraded, if it was.
    pub fn note(&self) -> Option<&FilterError> {
        self.note.as_ref()
    }

    /// Whether the predicate passes every row regardless of its cells.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self.plan, Plan::Unconstrained)
    }

    /// Evaluate against one cell, `None` for null.
    pub fn evaluate(&self, value: Option<&TypedValue>) -> Verdict {
        let cell = match (&self.plan, value) {
            (Plan::Unconstrained, _) => return Verdict::Unconstrained,
            (Plan::NullCheck { want_null }, v) => {
                return Verdict::from_bool(v.is_none() == *want_null);
            }
            (Plan::Reject, _) | (_, None) => return Verdict::Reject,
            (_, Some(cell)) => cell,
        };

        let pass = match &self.plan {
            Plan::Compare { operator, value } => {
                let ordering = cell.compare(value);
                match operator {
                    Operator::Gt => ordering == Some(Ordering::Greater),
                    Operator::Lt => ordering == Some(Ordering::Less),
                    Operator::Eq => ordering == Some(Ordering::Equal),
                    Operator::Ne => ordering.is_some_and(|o| o != Ordering::Equal),
                    _ => false,
                }
            }
            Plan::Contains(needle) => cell.as_str().is_some_and(|s| s.contains(needle.as_str())),
            Plan::Member { values, negate } => values.iter().any(|v| cell.matches(v)) != *negate,
            Plan::Unconstrained | Plan::NullCheck { .. } | Plan::Reject => false,
        };
        Verdict::from_bool(pass)
    }
}

/// Evaluate one clause against one cell.
///
/// Compiles the clause on every call; scans should compile once with
/// [`Predicate::compile`] instead.
pub fn evaluate(
    value: Option<&TypedValue>,
    clause: &FilterClause,
    column_type: Option<ColumnType>,
) -> bool {
    Predicate::compile(clause, column_type).evaluate(value).is_pass()
}
