//! CSV output backend.
//!
//! Creates two files in the output directory:
//! - `trace.csv`
//! - `events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputResult, TraceRow};

pub struct CsvWriter {
    trace:    Writer<File>,
    events:   Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create both files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut trace = Writer::from_path(dir.join("trace.csv"))?;
        trace.write_record([
            "tick",
            "second",
            "active",
            "parked",
            "uncontrolled_pending",
            "uncontrolled_total",
            "forced_total",
        ])?;

        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(["tick", "second", "agent", "kind"])?;

        Ok(Self { trace, events, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_trace(&mut self, row: &TraceRow) -> OutputResult<()> {
        self.trace.write_record(&[
            row.tick.to_string(),
            row.second.to_string(),
            row.active.to_string(),
            row.parked.to_string(),
            row.uncontrolled_pending.to_string(),
            row.uncontrolled_total.to_string(),
            row.forced_total.to_string(),
        ])?;
        Ok(())
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.tick.to_string(),
                row.second.to_string(),
                row.agent.to_string(),
                row.kind.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trace.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
