//! `TraceObserver<W>`: bridges `TickObserver` to an `OutputWriter`.

use fc_control::{RunSummary, TickObserver, TickReport};

use crate::row::{EventRow, TraceRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`TickObserver`] that writes trace rows and agent events to any
/// [`OutputWriter`] backend.
///
/// Observer methods cannot fail, so the first write error is stored and
/// later writes still go ahead.  Check it with
/// [`take_error`][Self::take_error] once the run returns.
pub struct TraceObserver<W: OutputWriter> {
    writer:     W,
    events:     bool,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> TraceObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, events: true, last_error: None }
    }

    /// Skip the per-agent event stream and write trace rows only.
    pub fn without_events(mut self) -> Self {
        self.events = false;
        self
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Close the writer.  [`FleetController::run`][fc_control::FleetController::run]
    /// does this through `on_run_end`; call it after `run_ticks`.
    pub fn finish(&mut self) -> OutputResult<()> {
        self.writer.finish()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> TickObserver for TraceObserver<W> {
    fn on_tick_end(&mut self, report: &TickReport<'_>) {
        if !self.events || report.events.is_empty() {
            return;
        }
        let rows: Vec<EventRow> = report.events.iter().map(|e| EventRow::new(report, e)).collect();
        let result = self.writer.write_events(&rows);
        self.store_err(result);
    }

    fn on_trace(&mut self, report: &TickReport<'_>) {
        let result = self.writer.write_trace(&TraceRow::from(report));
        self.store_err(result);
    }

    fn on_run_end(&mut self, _summary: &RunSummary) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
