//! Event capture for planner diagnostics.
//!
//! A `tracing` subscriber that files every `info!` event under its target and
//! lays the event fields out as columns. Tests use it to see what a matching
//! pass or a save-game load actually did without threading a log through
//! every call.
//!
//! # Usage
//!
//! ```ignore
//! // In planner code:
//! tracing::info!(target: "wish_assigned", wish = %wish_id, carrier = %carrier_id, value);
//!
//! // In a test:
//! let (report, events) = instrument::capture(|| run_matching_pass(...));
//! assert_eq!(events.rows("wish_assigned"), report.assigned.len());
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// One column of an event table.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill the column up to `rows` entries with the type's zero value.
    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        match self {
            TypedColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TypedColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TypedColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// All events recorded under one target.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: HashMap<String, TypedColumn>,
    pub row_count: usize,
}

impl EventTable {
    fn align(&mut self) {
        let rows = self.row_count;
        for col in self.columns.values_mut() {
            col.pad_to(rows);
        }
    }

    /// String values of a field, one per recorded event.
    pub fn strings(&self, field: &str) -> Option<&[String]> {
        match self.columns.get(field)? {
            TypedColumn::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Unsigned values of a field, one per recorded event.
    pub fn u64s(&self, field: &str) -> Option<&[u64]> {
        match self.columns.get(field)? {
            TypedColumn::U64(v) => Some(v),
            _ => None,
        }
    }
}

/// Event tables keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: HashMap<String, EventTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    /// Number of events recorded under `target` (0 if none).
    pub fn rows(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, |t| t.row_count)
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

struct ColumnVisitor<'a> {
    table: &'a mut EventTable,
}

impl ColumnVisitor<'_> {
    fn column(&mut self, field: &Field, empty: fn(usize) -> TypedColumn) -> &mut TypedColumn {
        let rows = self.table.row_count;
        self.table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| empty(rows))
    }
}

impl Visit for ColumnVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let TypedColumn::U64(v) = self.column(field, |n| TypedColumn::U64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let TypedColumn::I64(v) = self.column(field, |n| TypedColumn::I64(vec![0; n])) {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let TypedColumn::F64(v) = self.column(field, |n| TypedColumn::F64(vec![0.0; n])) {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let TypedColumn::Bool(v) = self.column(field, |n| TypedColumn::Bool(vec![false; n])) {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let TypedColumn::Str(v) =
            self.column(field, |n| TypedColumn::Str(vec![String::new(); n]))
        {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%display` fields arrive here; their Debug form is the Display text.
        self.record_str(field, &format!("{:?}", value));
    }
}

/// Subscriber that files info-level events into the thread-local recorder.
pub struct EventSubscriber;

impl Subscriber for EventSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();

        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            let table = recorder.tables.entry(target).or_default();
            table.align();
            event.record(&mut ColumnVisitor { table: &mut *table });
            table.row_count += 1;
            table.align();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Take everything recorded on this thread so far.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

/// Discard everything recorded on this thread so far.
pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

/// Run `f` with the event subscriber scoped to this thread and return its
/// result along with the events it emitted.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Recorder) {
    clear();
    let out = tracing::subscriber::with_default(EventSubscriber, f);
    (out, drain())
}

// === Polars Integration ===

use polars::prelude::*;

impl EventTable {
    /// Convert this table to a polars DataFrame.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut names: Vec<&String> = self.columns.keys().collect();
        names.sort();

        let columns = names
            .into_iter()
            .map(|name| match &self.columns[name] {
                TypedColumn::U64(v) => Column::new(name.into(), v),
                TypedColumn::I64(v) => Column::new(name.into(), v),
                TypedColumn::F64(v) => Column::new(name.into(), v),
                TypedColumn::Bool(v) => Column::new(name.into(), v),
                TypedColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();

        DataFrame::new(columns)
    }
}

impl Recorder {
    /// Convert every table to a DataFrame, skipping any that fail to build.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}
