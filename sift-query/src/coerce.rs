//! Literal coercion: raw operands into a column's value domain.
//!
//! Numbers, strings and booleans must already be of the column's kind.
//! Date and datetime columns also accept epoch milliseconds, structured
//! chrono values and strings in any of a fixed list of formats. All naive
//! times are read as UTC; date columns drop the time of day.
//!
//! Accepted date strings, tried in order:
//!
//! | Format        | Example      |
//! |---------------|--------------|
//! | `%Y-%m-%d`    | `2018-10-01` |
//! | `%m/%d/%Y`    | `10/01/2018` |
//! | `%m-%d-%Y`    | `10-01-2018` |
//! | `%Y/%m/%d`    | `2018/10/01` |
//!
//! followed by every datetime format below, with the time discarded.
//!
//! Accepted datetime strings, tried in order:
//!
//! | Format                   | Example                   |
//! |--------------------------|---------------------------|
//! | `%Y-%m-%d %H:%M:%S`      | `2019-11-02 11:11:11`     |
//! | `%Y-%m-%d %H:%M:%S%.f`   | `2019-11-02 11:11:11.111` |
//! | `%Y-%m-%dT%H:%M:%S%.f`   | `2019-11-02T11:11:11.111` |
//! | `%Y/%m/%d %H:%M:%S`      | `2020/12/01 23:30:55`     |
//! | `%m/%d/%Y %H:%M:%S`      | `12/01/2020 23:30:55`     |
//! | `%m/%d/%Y, %I:%M:%S %p`  | `3/1/2020, 12:30:55 PM`   |
//! | RFC 3339                 | `2020-03-01T12:30:55+02:00` |
//!
//! followed by every date format above, at midnight.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use sift_schema::{ColumnType, TypedValue, date_to_millis, millis_to_date};
use thiserror::Error;

use crate::filter::{Literal, Operator};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y, %I:%M:%S %p",
];

/// Why an operand could not be coerced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Operand of the wrong kind for the column.
    #[error("expected a {expected} operand, found {found}")]
    TypeMismatch {
        expected: ColumnType,
        found: &'static str,
    },

    /// String matched none of the date formats.
    #[error("`{0}` is not a recognised date")]
    UnparseableDate(String),

    /// String matched none of the datetime formats.
    #[error("`{0}` is not a recognised datetime")]
    UnparseableDatetime(String),

    /// Numeric timestamp outside the representable range.
    #[error("{0} is outside the representable date range")]
    OutOfRange(String),

    /// List operand given to a scalar operator.
    #[error("list operands are only valid for `in` and `not in`")]
    UnexpectedList,

    /// Scalar operand given to `in` / `not in`.
    #[error("`in` and `not in` require a list operand")]
    ExpectedList,
}

/// An operand in the column's value domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// The operand was null: the clause constrains nothing.
    Absent,
    /// A single value.
    Scalar(TypedValue),
    /// A list of values, for `in` / `not in`.
    List(Vec<TypedValue>),
}

/// Coerce `literal` into the domain of `target`.
///
/// A null literal is not an error; it comes back as [`Coerced::Absent`].
/// Null elements inside a list are dropped, any other failing element fails
/// the whole list.
pub fn coerce(target: ColumnType, literal: &Literal) -> Result<Coerced, CoercionError> {
    match literal {
        Literal::Null => Ok(Coerced::Absent),
        Literal::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Literal::Null => continue,
                    Literal::List(_) => return Err(CoercionError::UnexpectedList),
                    scalar => out.push(coerce_scalar(target, scalar)?),
                }
            }
            Ok(Coerced::List(out))
        }
        scalar => coerce_scalar(target, scalar).map(Coerced::Scalar),
    }
}

/// Coerce `literal` for use with `operator`, checking the list/scalar shape.
pub fn coerce_for(
    operator: Operator,
    target: ColumnType,
    literal: &Literal,
) -> Result<Coerced, CoercionError> {
    if !operator.takes_operand() {
        return Ok(Coerced::Absent);
    }
    match literal {
        Literal::Null => Ok(Coerced::Absent),
        Literal::List(_) if !operator.takes_list() => Err(CoercionError::UnexpectedList),
        Literal::List(_) => coerce(target, literal),
        _ if operator.takes_list() => Err(CoercionError::ExpectedList),
        _ => coerce(target, literal),
    }
}

fn coerce_scalar(target: ColumnType, literal: &Literal) -> Result<TypedValue, CoercionError> {
    let mismatch = || CoercionError::TypeMismatch {
        expected: target,
        found: literal.kind(),
    };

    match target {
        ColumnType::Integer => match literal {
            Literal::Int(i) => Ok(TypedValue::Integer(*i)),
            Literal::Float(f) => Ok(integral(*f)
                .map(TypedValue::Integer)
                .unwrap_or(TypedValue::Float(*f))),
            _ => Err(mismatch()),
        },
        ColumnType::Float => match literal {
            Literal::Int(i) => Ok(TypedValue::Float(*i as f64)),
            Literal::Float(f) => Ok(TypedValue::Float(*f)),
            _ => Err(mismatch()),
        },
        ColumnType::String => match literal {
            Literal::Text(s) => Ok(TypedValue::String(s.clone())),
            _ => Err(mismatch()),
        },
        ColumnType::Boolean => match literal {
            Literal::Bool(b) => Ok(TypedValue::Boolean(*b)),
            _ => Err(mismatch()),
        },
        ColumnType::Date => match literal {
            Literal::Int(ms) => day_of(*ms),
            Literal::Float(ms) => day_of(float_millis(*ms)?),
            Literal::Date(d) => Ok(TypedValue::Date(*d)),
            Literal::Datetime(dt) => Ok(TypedValue::Date(dt.date())),
            Literal::Text(s) => parse_date(s)
                .map(TypedValue::Date)
                .ok_or_else(|| CoercionError::UnparseableDate(s.clone())),
            _ => Err(mismatch()),
        },
        ColumnType::Datetime => match literal {
            Literal::Int(ms) => Ok(TypedValue::Datetime(*ms)),
            Literal::Float(ms) => float_millis(*ms).map(TypedValue::Datetime),
            Literal::Date(d) => Ok(TypedValue::Datetime(date_to_millis(*d))),
            Literal::Datetime(dt) => Ok(TypedValue::Datetime(dt.and_utc().timestamp_millis())),
            Literal::Text(s) => parse_datetime_millis(s)
                .map(TypedValue::Datetime)
                .ok_or_else(|| CoercionError::UnparseableDatetime(s.clone())),
            _ => Err(mismatch()),
        },
    }
}

/// `f` as an `i64` when it has no fractional part and fits.
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn float_millis(ms: f64) -> Result<i64, CoercionError> {
    integral(ms.trunc()).ok_or_else(|| CoercionError::OutOfRange(ms.to_string()))
}

fn day_of(ms: i64) -> Result<TypedValue, CoercionError> {
    millis_to_date(ms)
        .map(TypedValue::Date)
        .ok_or_else(|| CoercionError::OutOfRange(ms.to_string()))
}

/// Parse a date string against the fixed format list.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.date()))
}

/// Parse a datetime string against the fixed format list, returning UTC
/// epoch milliseconds.
pub fn parse_datetime_millis(s: &str) -> Option<i64> {
    parse_naive_datetime(s.trim()).map(|dt| dt.and_utc().timestamp_millis())
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_null_is_absent() {
        for ty in [ColumnType::Integer, ColumnType::String, ColumnType::Date] {
            assert_eq!(coerce(ty, &Literal::Null), Ok(Coerced::Absent));
        }
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            coerce(ColumnType::Integer, &Literal::Float(2.0)),
            Ok(Coerced::Scalar(TypedValue::Integer(2)))
        );
        assert_eq!(
            coerce(ColumnType::Integer, &Literal::Float(2.5)),
            Ok(Coerced::Scalar(TypedValue::Float(2.5)))
        );
        assert_eq!(
            coerce(ColumnType::Float, &Literal::Int(3)),
            Ok(Coerced::Scalar(TypedValue::Float(3.0)))
        );
    }

    #[test]
    fn test_kind_mismatch() {
        assert_eq!(
            coerce(ColumnType::Integer, &Literal::Text(String::new())),
            Err(CoercionError::TypeMismatch {
                expected: ColumnType::Integer,
                found: "string",
            })
        );
        assert!(coerce(ColumnType::Boolean, &Literal::Int(1)).is_err());
        assert!(coerce(ColumnType::String, &Literal::Bool(true)).is_err());
    }

    #[test]
    fn test_date_representations_agree() {
        let expected = Ok(Coerced::Scalar(TypedValue::Date(ymd(2018, 10, 1))));
        assert_eq!(coerce(ColumnType::Date, &Literal::Int(1538352000000)), expected);
        assert_eq!(coerce(ColumnType::Date, &Literal::from("10/01/2018")), expected);
        assert_eq!(coerce(ColumnType::Date, &Literal::from(ymd(2018, 10, 1))), expected);
        assert_eq!(coerce(ColumnType::Date, &Literal::from("2018-10-01")), expected);
    }

    #[test]
    fn test_date_discards_time() {
        let late = ymd(2018, 10, 1).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(
            coerce(ColumnType::Date, &Literal::Datetime(late)),
            Ok(Coerced::Scalar(TypedValue::Date(ymd(2018, 10, 1))))
        );
        assert_eq!(parse_date("2018-10-01 08:00:00"), Some(ymd(2018, 10, 1)));
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(parse_date("01-01-1970"), Some(ymd(1970, 1, 1)));
        assert_eq!(parse_date("1/1/2019"), Some(ymd(2019, 1, 1)));
        assert_eq!(parse_date("2019/01/02"), Some(ymd(2019, 1, 2)));
        assert_eq!(parse_date(" 2019-01-02 "), Some(ymd(2019, 1, 2)));
        assert_eq!(parse_date("1234"), None);
        assert_eq!(
            coerce(ColumnType::Date, &Literal::from("1234")),
            Err(CoercionError::UnparseableDate("1234".into()))
        );
    }

    #[test]
    fn test_datetime_formats() {
        let ms = |y, mo, d, h, mi, s, milli| {
            ymd(y, mo, d)
                .and_hms_milli_opt(h, mi, s, milli)
                .unwrap()
                .and_utc()
                .timestamp_millis()
        };

        let cases = [
            ("2019-11-02 11:11:11.111", ms(2019, 11, 2, 11, 11, 11, 111)),
            ("2019-11-02 11:11:11", ms(2019, 11, 2, 11, 11, 11, 0)),
            ("2020/12/01 23:30:55", ms(2020, 12, 1, 23, 30, 55, 0)),
            ("3/1/2020, 12:30:55 PM", ms(2020, 3, 1, 12, 30, 55, 0)),
            ("2020-03-01T14:30:55+02:00", ms(2020, 3, 1, 12, 30, 55, 0)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_datetime_millis(input), Some(expected), "{input}");
        }
        assert_eq!(parse_datetime_millis("10/01/2018"), Some(ms(2018, 10, 1, 0, 0, 0, 0)));
        assert_eq!(parse_datetime_millis("2019-11-02 11:11:11:111"), None);
    }

    #[test]
    fn test_datetime_numeric() {
        assert_eq!(
            coerce(ColumnType::Datetime, &Literal::Float(1500.9)),
            Ok(Coerced::Scalar(TypedValue::Datetime(1500)))
        );
        assert!(matches!(
            coerce(ColumnType::Datetime, &Literal::Float(f64::INFINITY)),
            Err(CoercionError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_list_coercion() {
        let list = Literal::List(vec![Literal::from("a"), Literal::Null, Literal::from("b")]);
        assert_eq!(
            coerce(ColumnType::String, &list),
            Ok(Coerced::List(vec![TypedValue::from("a"), TypedValue::from("b")]))
        );

        let bad = Literal::List(vec![Literal::from("a"), Literal::Int(1)]);
        assert!(coerce(ColumnType::String, &bad).is_err());
    }

    #[test]
    fn test_operator_shape() {
        assert_eq!(
            coerce_for(Operator::In, ColumnType::String, &Literal::from("a")),
            Err(CoercionError::ExpectedList)
        );
        assert_eq!(
            coerce_for(Operator::Eq, ColumnType::String, &Literal::from(vec!["a"])),
            Err(CoercionError::UnexpectedList)
        );
        assert_eq!(
            coerce_for(Operator::IsNull, ColumnType::String, &Literal::from(1)),
            Ok(Coerced::Absent)
        );
        assert_eq!(
            coerce_for(Operator::In, ColumnType::String, &Literal::Null),
            Ok(Coerced::Absent)
        );
    }
}
