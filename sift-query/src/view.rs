//! Filtered views over a table.
//!
//! A [`View`] keeps its spec and the mask of the rows it has seen. It holds
//! no borrow of the table: rows are materialized by lending the source to
//! [`View::rows`], so the table must outlive any iterator drawn from it but
//! the view itself can be stored anywhere. Appended rows are picked up with
//! [`View::refresh`], which evaluates only the new tail.

use indexmap::IndexMap;
use serde_json::Value;
use sift_schema::{ColumnSource, TypedValue};
use tracing::debug;

use crate::engine::{FilterEngine, Mask};
use crate::filter::FilterSpec;

/// A filter spec bound to the rows it has evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    spec: FilterSpec,
    mask: Mask,
}

impl View {
    /// Evaluate `spec` over `source` and keep the result.
    pub fn new<S>(engine: &FilterEngine, source: &S, spec: FilterSpec) -> Self
    where
        S: ColumnSource + Sync + ?Sized,
    {
        let mask = engine.evaluate_filter(source, &spec);
        Self { spec, mask }
    }

    /// Evaluate rows appended to `source` since the last refresh.
    ///
    /// Returns the number of newly evaluated rows.
    pub fn refresh<S>(&mut self, engine: &FilterEngine, source: &S) -> usize
    where
        S: ColumnSource + Sync + ?Sized,
    {
        let added = engine.extend_mask(&mut self.mask, source, &self.spec);
        if added > 0 {
            debug!(added, rows = self.mask.len(), "View::refresh()");
        }
        added
    }

    /// The spec this view applies.
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// The per-row selection.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Number of rows evaluated so far.
    pub fn row_bound(&self) -> usize {
        self.mask.len()
    }

    /// Number of rows that pass the filter.
    pub fn num_rows(&self) -> usize {
        self.mask.count()
    }

    /// Iterate selected rows as `column -> value` maps in schema order.
    ///
    /// Dates render as epoch milliseconds at UTC midnight; nulls as JSON null.
    pub fn rows<'a, S>(&'a self, source: &'a S) -> Rows<'a>
    where
        S: ColumnSource + ?Sized,
    {
        let columns = source
            .schema()
            .iter()
            .map(|(name, _)| (name, source.column(name)))
            .collect();
        let bound = self.mask.len().min(source.row_count());
        Rows {
            columns,
            flags: &self.mask.as_slice()[..bound],
            next: 0,
        }
    }

    /// Collect [`View::rows`] into a JSON array.
    pub fn to_json<S>(&self, source: &S) -> Value
    where
        S: ColumnSource + ?Sized,
    {
        Value::Array(
            self.rows(source)
                .map(|row| Value::Object(row.into_iter().collect()))
                .collect(),
        )
    }
}

/// Iterator over the selected rows of a [`View`].
#[derive(Debug)]
pub struct Rows<'a> {
    columns: Vec<(&'a str, Option<&'a [Option<TypedValue>]>)>,
    flags: &'a [bool],
    next: usize,
}

impl Rows<'_> {
    fn materialize(&self, row: usize) -> IndexMap<String, Value> {
        self.columns
            .iter()
            .map(|(name, cells)| {
                let value = cells
                    .and_then(|c| c.get(row))
                    .and_then(Option::as_ref)
                    .map_or(Value::Null, TypedValue::to_json);
                ((*name).to_string(), value)
            })
            .collect()
    }
}

impl Iterator for Rows<'_> {
    type Item = IndexMap<String, Value>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.flags.len() {
            let row = self.next;
            self.next += 1;
            if self.flags[row] {
                return Some(self.materialize(row));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.flags.len() - self.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterClause;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sift_schema::{ColumnType, Row, Schema, SharedTable, Table};

    fn schema() -> Schema {
        Schema::new()
            .with_column("x", ColumnType::Integer)
            .with_column("y", ColumnType::String)
            .with_column("z", ColumnType::Date)
    }

    #[test]
    fn test_rows_materialize_in_schema_order() {
        let day = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        let table = Table::with_rows(
            schema(),
            [
                Row::new().set("x", 1).set("y", "a").set("z", day),
                Row::new().set("x", 2).null("y"),
            ],
        )
        .unwrap();

        let view = View::new(&FilterEngine::new(), &table, FilterSpec::new());
        assert_eq!(view.num_rows(), 2);
        assert_eq!(
            view.to_json(&table),
            json!([
                {"x": 1, "y": "a", "z": 1_538_352_000_000_i64},
                {"x": 2, "y": null, "z": null},
            ])
        );

        let keys: Vec<String> = view.rows(&table).next().unwrap().into_keys().collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_rows_is_restartable() {
        let table = Table::with_rows(schema(), (1..=5).map(|x| Row::new().set("x", x))).unwrap();
        let view = View::new(
            &FilterEngine::new(),
            &table,
            FilterSpec::and([FilterClause::gt("x", 3)]),
        );
        assert_eq!(view.rows(&table).count(), 2);
        assert_eq!(view.rows(&table).count(), 2);
    }

    #[test]
    fn test_refresh_picks_up_appends() {
        let shared = SharedTable::new(Table::new(schema()));
        shared
            .append([Row::new().set("x", 1), Row::new().set("x", 5)])
            .unwrap();

        let engine = FilterEngine::new();
        let spec = FilterSpec::and([FilterClause::gt("x", 2)]);
        let mut view = View::new(&engine, &*shared.read(), spec);
        assert_eq!(view.num_rows(), 1);

        shared.append([Row::new().set("x", 9)]).unwrap();
        assert_eq!(view.num_rows(), 1);

        assert_eq!(view.refresh(&engine, &*shared.read()), 1);
        assert_eq!(view.num_rows(), 2);
        assert_eq!(view.row_bound(), 3);
        assert_eq!(view.refresh(&engine, &*shared.read()), 0);
    }

    #[test]
    fn test_snapshot_taken_before_append() {
        let mut table = Table::with_rows(schema(), [Row::new().set("x", 3)]).unwrap();
        let engine = FilterEngine::new();
        let view = {
            let snapshot = table.snapshot();
            View::new(&engine, &snapshot, FilterSpec::new())
        };

        table.append([Row::new().set("x", 4)]).unwrap();
        assert_eq!(view.row_bound(), 1);
        assert_eq!(view.rows(&table).count(), 1);
    }
}
