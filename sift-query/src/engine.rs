//! Scanning a table with a filter spec.
//!
//! [`FilterEngine`] compiles each clause once against the source schema,
//! then walks the rows and folds the per-clause verdicts with the spec's
//! combinator. Scans at or above the parallel threshold are split into
//! contiguous chunks evaluated on scoped worker threads; the result is
//! identical to a sequential scan.
//!
//! ```rust
//! use sift_query::{FilterClause, FilterEngine, FilterSpec};
//! use sift_schema::{ColumnType, Row, Schema, Table};
//!
//! let schema = Schema::new().with_column("x", ColumnType::Integer);
//! let table = Table::with_rows(schema, (1..=4).map(|x| Row::new().set("x", x)))?;
//!
//! let engine = FilterEngine::new();
//! let mask = engine.evaluate_filter(&table, &FilterSpec::and([FilterClause::gt("x", 2)]));
//! assert_eq!(mask.selected().collect::<Vec<_>>(), vec![2, 3]);
//! # Ok::<(), sift_schema::SchemaError>(())
//! ```

use std::ops::Index;

use sift_schema::{ColumnSource, Schema, SiftConfig, TypedValue};
use tracing::debug;

use crate::combine::combine;
use crate::error::QueryResult;
use crate::evaluate::Predicate;
use crate::filter::{Combinator, FilterClause, FilterSpec};
use crate::validate;

/// Per-row selection produced by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// Create an empty mask.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no rows are covered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether row `index` is selected; `None` past the end.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&keep| keep).count()
    }

    /// Indices of selected rows, ascending.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
    }

    /// Iterate the per-row flags.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// The flags as a slice.
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Unwrap into the flags.
    pub fn into_vec(self) -> Vec<bool> {
        self.0
    }

    fn extend(&mut self, flags: Vec<bool>) {
        self.0.extend(flags);
    }
}

impl From<Vec<bool>> for Mask {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

impl Index<usize> for Mask {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.0[index]
    }
}

impl IntoIterator for Mask {
    type Item = bool;
    type IntoIter = std::vec::IntoIter<bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A spec compiled against one source.
struct CompiledFilter<'s> {
    clauses: Vec<(Predicate, Option<&'s [Option<TypedValue>]>)>,
    combinator: Combinator,
}

impl<'s> CompiledFilter<'s> {
    fn compile<S>(source: &'s S, spec: &FilterSpec, log_filters: bool) -> Self
    where
        S: ColumnSource + ?Sized,
    {
        let schema = source.schema();
        let clauses = spec
            .clauses
            .iter()
            .map(|clause| {
                let predicate = Predicate::compile(clause, schema.type_of(&clause.column));
                if log_filters {
                    debug!(
                        clause = %clause,
                        unconstrained = predicate.is_unconstrained(),
                        "compiled filter clause"
                    );
                }
                (predicate, source.column(&clause.column))
            })
            .collect();
        Self {
            clauses,
            combinator: spec.combinator,
        }
    }

    fn keeps(&self, row: usize) -> bool {
        combine(
            self.combinator,
            self.clauses.iter().map(|(predicate, cells)| {
                let cell = cells.and_then(|c| c.get(row)).and_then(Option::as_ref);
                predicate.evaluate(cell)
            }),
        )
    }

    fn evaluate_range(&self, start: usize, end: usize) -> Vec<bool> {
        (start..end).map(|row| self.keeps(row)).collect()
    }
}

/// Evaluates filter specs over column sources.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    parallel_threshold: usize,
    worker_threads: usize,
    default_combinator: Combinator,
    log_filters: bool,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self {
            parallel_threshold: 65_536,
            worker_threads: 0,
            default_combinator: Combinator::And,
            log_filters: false,
        }
    }
}

impl FilterEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from a loaded `sift.toml`.
    pub fn from_config(config: &SiftConfig) -> Self {
        Self {
            parallel_threshold: config.engine.parallel_threshold,
            worker_threads: config.engine.worker_threads,
            default_combinator: config.filter.default_combinator.into(),
            log_filters: config.debug.log_filters,
        }
    }

    /// Set the row count at or above which scans run in parallel.
    pub fn with_parallel_threshold(mut self, rows: usize) -> Self {
        self.parallel_threshold = rows;
        self
    }

    /// Set the worker count for parallel scans; `0` uses the CPU count.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Set the combinator applied to parsed specs that do not name one.
    pub fn with_default_combinator(mut self, combinator: Combinator) -> Self {
        self.default_combinator = combinator;
        self
    }

    /// Log every compiled clause at debug level.
    pub fn with_log_filters(mut self, enabled: bool) -> Self {
        self.log_filters = enabled;
        self
    }

    /// The combinator for specs that do not name one.
    pub fn default_combinator(&self) -> Combinator {
        self.default_combinator
    }

    /// Parse a JSON spec, filling in the default combinator when absent.
    pub fn parse_spec(&self, json: &str) -> QueryResult<FilterSpec> {
        FilterSpec::from_value_or(serde_json::from_str(json)?, self.default_combinator)
    }

    /// Evaluate `spec` over every row of `source`.
    pub fn evaluate_filter<S>(&self, source: &S, spec: &FilterSpec) -> Mask
    where
        S: ColumnSource + Sync + ?Sized,
    {
        let rows = source.row_count();
        debug!(
            rows,
            clauses = spec.clauses.len(),
            combinator = %spec.combinator,
            "FilterEngine::evaluate_filter()"
        );

        let compiled = CompiledFilter::compile(source, spec, self.log_filters);
        let mask = Mask(self.scan(&compiled, 0, rows));

        debug!(rows, selected = mask.count(), "filter scan finished");
        mask
    }

    /// Evaluate only the rows of `source` past the end of `mask`.
    ///
    /// Rows already covered keep their outcome. Returns the number of rows
    /// added.
    pub fn extend_mask<S>(&self, mask: &mut Mask, source: &S, spec: &FilterSpec) -> usize
    where
        S: ColumnSource + Sync + ?Sized,
    {
        let start = mask.len();
        let end = source.row_count();
        if end <= start {
            return 0;
        }

        debug!(start, end, "FilterEngine::extend_mask()");
        let compiled = CompiledFilter::compile(source, spec, self.log_filters);
        mask.extend(self.scan(&compiled, start, end));
        end - start
    }

    /// Whether `clause` is acceptable against `schema`.
    pub fn is_valid_filter(&self, schema: &Schema, clause: &FilterClause) -> bool {
        validate::is_valid(clause, schema)
    }

    fn workers(&self) -> usize {
        match self.worker_threads {
            0 => num_cpus::get(),
            n => n,
        }
    }

    fn scan(&self, compiled: &CompiledFilter<'_>, start: usize, end: usize) -> Vec<bool> {
        self.run_chunked(start, end, |lo, hi| compiled.evaluate_range(lo, hi))
    }

    /// Run `eval` over `start..end`, split across workers when large enough.
    ///
    /// A panicking worker is re-raised on the calling thread.
    fn run_chunked<F>(&self, start: usize, end: usize, eval: F) -> Vec<bool>
    where
        F: Fn(usize, usize) -> Vec<bool> + Sync,
    {
        let rows = end - start;
        let workers = self.workers().min(rows);
        if rows < self.parallel_threshold || workers < 2 {
            return eval(start, end);
        }

        let chunk = rows.div_ceil(workers);
        let eval = &eval;
        let mut flags = Vec::with_capacity(rows);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (start..end)
                .step_by(chunk)
                .map(|lo| {
                    let hi = (lo + chunk).min(end);
                    (lo, hi, scope.spawn(move || eval(lo, hi)))
                })
                .collect();

            for (lo, hi, handle) in handles {
                crate::sift_trace!(lo, hi, "joining filter chunk");
                match handle.join() {
                    Ok(part) => flags.extend(part),
                    Err(payload) => std::panic::resume_unwind(payload),
                }
            }
        });
        flags
    }
}

/// Evaluate `spec` over `source` with a default engine.
pub fn evaluate_filter<S>(source: &S, spec: &FilterSpec) -> Mask
where
    S: ColumnSource + Sync + ?Sized,
{
    FilterEngine::new().evaluate_filter(source, spec)
}

/// Whether `clause` is acceptable against `schema`.
pub fn is_valid_filter(schema: &Schema, clause: &FilterClause) -> bool {
    validate::is_valid(clause, schema)
}
