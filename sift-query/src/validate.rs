//! Up-front checks on filter clauses.
//!
//! Validation is deliberately narrow: it catches the clauses a user would
//! want flagged before running a scan (a comparison with no operand, a date
//! that cannot be read) and accepts everything else, including columns the
//! schema does not know. Evaluation tolerates all of these anyway.

use sift_schema::Schema;

use crate::coerce::coerce;
use crate::error::FilterError;
use crate::filter::{FilterClause, FilterSpec};

/// Check one clause against `schema`.
pub fn validate(clause: &FilterClause, schema: &Schema) -> Result<(), FilterError> {
    let Some(ty) = schema.type_of(&clause.column) else {
        return Ok(());
    };

    if !clause.operator.takes_operand() {
        return Ok(());
    }

    if clause.literal.is_null() {
        return Err(FilterError::MissingOperand {
            column: clause.column.to_string(),
            operator: clause.operator,
        });
    }

    if ty.is_temporal() {
        coerce(ty, &clause.literal).map_err(|source| FilterError::Coercion {
            column: clause.column.to_string(),
            source,
        })?;
    }

    Ok(())
}

/// Whether `clause` passes [`validate`].
pub fn is_valid(clause: &FilterClause, schema: &Schema) -> bool {
    validate(clause, schema).is_ok()
}

/// Validate every clause of `spec`, returning the failures with their
/// positions.
pub fn validate_spec(spec: &FilterSpec, schema: &Schema) -> Vec<(usize, FilterError)> {
    spec.clauses
        .iter()
        .enumerate()
        .filter_map(|(i, clause)| validate(clause, schema).err().map(|e| (i, e)))
        .collect()
}
