//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EventRow, OutputResult, TraceRow};

/// Implemented by the CSV, SQLite and Parquet writers.
///
/// Errors surface through [`TraceObserver::take_error`][crate::TraceObserver::take_error]
/// when the writer is driven by the observer.
pub trait OutputWriter {
    fn write_trace(&mut self, row: &TraceRow) -> OutputResult<()>;

    /// Write one tick's agent events.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
