//! Columnar tables and the read interface the filter engine consumes.
//!
//! A [`Table`] owns one [`Column`] per schema entry. Every column always has
//! the same length; [`Table::append`] validates a whole batch before touching
//! any column so a bad row never leaves the table ragged.
//!
//! The filter engine only ever reads through [`ColumnSource`], which both
//! [`Table`] and [`TableSnapshot`] implement. A snapshot pins the row count at
//! the moment it was taken.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::types::{ColumnType, TypedValue, millis_to_date};

/// Ordered mapping of column name to declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: IndexMap<SmolStr, ColumnType>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing the type of an existing column with that name.
    pub fn with_column(mut self, name: impl Into<SmolStr>, ty: ColumnType) -> Self {
        self.columns.insert(name.into(), ty);
        self
    }

    /// Add a column, failing if one with that name already exists.
    pub fn try_with_column(
        mut self,
        name: impl Into<SmolStr>,
        ty: ColumnType,
    ) -> SchemaResult<Self> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(SchemaError::duplicate_column(name.as_str()));
        }
        self.columns.insert(name, ty);
        Ok(self)
    }

    /// Parse a schema from a JSON object such as `{"x": "integer"}`.
    pub fn from_json(value: &serde_json::Value) -> SchemaResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SchemaError::invalid_schema("expected an object of column types"))?;

        let mut columns = IndexMap::with_capacity(object.len());
        for (name, ty) in object {
            let token = ty
                .as_str()
                .ok_or_else(|| SchemaError::unknown_type(name.as_str(), ty.to_string()))?;
            let ty = ColumnType::from_str(token)
                .ok_or_else(|| SchemaError::unknown_type(name.as_str(), token))?;
            columns.insert(SmolStr::new(name), ty);
        }
        Ok(Self { columns })
    }

    /// Look up the declared type of a column.
    ///
    /// `None` means the column is unknown, which the filter layer treats
    /// permissively rather than as an error.
    pub fn type_of(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// Check if the schema declares a column.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(name, type)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> + '_ {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }
}

/// A named, typed sequence of optional values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: SmolStr,
    ty: ColumnType,
    values: Vec<Option<TypedValue>>,
}

impl Column {
    /// Create an empty column.
    pub fn new(name: impl Into<SmolStr>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            values: Vec::new(),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn column_type(&self) -> ColumnType {
        self.ty
    }

    /// All cells, `None` for null.
    pub fn values(&self) -> &[Option<TypedValue>] {
        &self.values
    }

    /// Cell at `row`, flattened so out-of-range and null both read as `None`.
    pub fn get(&self, row: usize) -> Option<&TypedValue> {
        self.values.get(row).and_then(Option::as_ref)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fit a value to this column's type.
    fn conform(&self, value: TypedValue) -> SchemaResult<TypedValue> {
        match (self.ty, value) {
            (ColumnType::Float, TypedValue::Integer(v)) => Ok(TypedValue::Float(v as f64)),
            (ColumnType::Datetime, TypedValue::Integer(ms)) => Ok(TypedValue::Datetime(ms)),
            (ColumnType::Datetime, TypedValue::Date(d)) => {
                Ok(TypedValue::Datetime(crate::types::date_to_millis(d)))
            }
            (ColumnType::Date, TypedValue::Integer(ms)) => {
                self.conform_date(ms, ColumnType::Integer)
            }
            (ColumnType::Date, TypedValue::Datetime(ms)) => {
                self.conform_date(ms, ColumnType::Datetime)
            }
            (ty, value) if value.column_type() == ty => Ok(value),
            (ty, value) => Err(SchemaError::type_mismatch(
                self.name.as_str(),
                ty,
                value.column_type(),
            )),
        }
    }

    /// Epoch milliseconds to the UTC calendar day.
    fn conform_date(&self, ms: i64, found: ColumnType) -> SchemaResult<TypedValue> {
        millis_to_date(ms)
            .map(TypedValue::Date)
            .ok_or_else(|| SchemaError::type_mismatch(self.name.as_str(), ColumnType::Date, found))
    }
}

/// One row of input for [`Table::append`]. Missing columns are stored as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: IndexMap<SmolStr, Option<TypedValue>>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell.
    pub fn set(mut self, column: impl Into<SmolStr>, value: impl Into<TypedValue>) -> Self {
        self.cells.insert(column.into(), Some(value.into()));
        self
    }

    /// Set a cell to null.
    pub fn null(mut self, column: impl Into<SmolStr>) -> Self {
        self.cells.insert(column.into(), None);
        self
    }

    /// Set a cell from an optional value.
    pub fn set_opt<V>(mut self, column: impl Into<SmolStr>, value: Option<V>) -> Self
    where
        V: Into<TypedValue>,
    {
        self.cells.insert(column.into(), value.map(Into::into));
        self
    }

    /// Iterate over the cells that were set.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TypedValue>)> + '_ {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// Read access to a table's columns.
///
/// This is the only surface the filter engine depends on.
pub trait ColumnSource {
    /// The table schema.
    fn schema(&self) -> &Schema;

    /// Cells of a column, truncated to [`ColumnSource::row_count`].
    fn column(&self, name: &str) -> Option<&[Option<TypedValue>]>;

    /// Number of rows visible through this source.
    fn row_count(&self) -> usize;
}

/// An in-memory columnar table with a fixed schema.
#[derive(Debug, Clone, Default)]
pub struct Table {
    schema: Schema,
    columns: IndexMap<SmolStr, Column>,
    row_count: usize,
}

impl Table {
    /// Create an empty table for `schema`.
    pub fn new(schema: Schema) -> Self {
        let columns = schema
            .iter()
            .map(|(name, ty)| (SmolStr::new(name), Column::new(name, ty)))
            .collect();
        Self {
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Create a table and append `rows` to it.
    pub fn with_rows(schema: Schema, rows: impl IntoIterator<Item = Row>) -> SchemaResult<Self> {
        let mut table = Self::new(schema);
        table.append(rows)?;
        Ok(table)
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Append rows to every column at once.
    ///
    /// The batch is checked in full first; on error the table is unchanged.
    /// Returns the number of rows appended.
    pub fn append(&mut self, rows: impl IntoIterator<Item = Row>) -> SchemaResult<usize> {
        let mut staged: Vec<Vec<Option<TypedValue>>> = Vec::new();

        for row in rows {
            let mut cells: Vec<Option<TypedValue>> = vec![None; self.columns.len()];
            for (name, value) in row.cells {
                let Some((index, _, column)) = self.columns.get_full(name.as_str()) else {
                    return Err(SchemaError::unknown_column(name.as_str()));
                };
                cells[index] = match value {
                    Some(value) => Some(column.conform(value)?),
                    None => None,
                };
            }
            staged.push(cells);
        }

        let appended = staged.len();
        for column in self.columns.values_mut() {
            column.values.reserve(appended);
        }
        for cells in staged {
            for (column, cell) in self.columns.values_mut().zip(cells) {
                column.values.push(cell);
            }
        }
        self.row_count += appended;

        debug!(appended, row_count = self.row_count, "Table::append()");
        Ok(appended)
    }

    /// Pin the current row count.
    pub fn snapshot(&self) -> TableSnapshot<'_> {
        TableSnapshot {
            table: self,
            row_count: self.row_count,
        }
    }
}

impl ColumnSource for Table {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn column(&self, name: &str) -> Option<&[Option<TypedValue>]> {
        self.columns.get(name).map(Column::values)
    }

    fn row_count(&self) -> usize {
        self.row_count
    }
}

/// A read view over a table with the row count fixed at creation.
#[derive(Debug, Clone, Copy)]
pub struct TableSnapshot<'a> {
    table: &'a Table,
    row_count: usize,
}

impl<'a> TableSnapshot<'a> {
    /// Narrow the snapshot to the first `rows` rows.
    pub fn truncated(self, rows: usize) -> Self {
        Self {
            table: self.table,
            row_count: rows.min(self.row_count),
        }
    }
}

impl ColumnSource for TableSnapshot<'_> {
    fn schema(&self) -> &Schema {
        &self.table.schema
    }

    fn column(&self, name: &str) -> Option<&[Option<TypedValue>]> {
        self.table
            .columns
            .get(name)
            .map(|c| &c.values()[..self.row_count])
    }

    fn row_count(&self) -> usize {
        self.row_count
    }
}

/// A table shared between an appending owner and any number of readers.
#[derive(Debug, Clone, Default)]
pub struct SharedTable {
    inner: Arc<RwLock<Table>>,
}

impl SharedTable {
    /// Wrap a table.
    pub fn new(table: Table) -> Self {
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// Acquire a read guard; take snapshots from it with [`Table::snapshot`].
    pub fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.inner.read()
    }

    /// Append rows under the write lock.
    pub fn append(&self, rows: impl IntoIterator<Item = Row>) -> SchemaResult<usize> {
        self.inner.write().append(rows)
    }

    /// Current row count.
    pub fn row_count(&self) -> usize {
        self.inner.read().row_count()
    }

    /// A copy of the schema.
    pub fn schema(&self) -> Schema {
        self.inner.read().schema().clone()
    }
}

impl From<Table> for SharedTable {
    fn from(table: Table) -> Self {
        Self::new(table)
    }
}
