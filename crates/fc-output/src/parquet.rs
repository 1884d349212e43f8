//! Parquet output backend (feature `parquet`).
//!
//! Creates two files in the output directory:
//! - `trace.parquet`
//! - `events.parquet`
//!
//! Trace rows arrive one per traced tick, so they are buffered and written
//! as one row group per [`TRACE_BATCH`] rows.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputResult, TraceRow};

/// Trace rows held in memory before a batch is written.
pub const TRACE_BATCH: usize = 1024;

fn trace_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",                 DataType::UInt64, false),
        Field::new("second",               DataType::UInt64, false),
        Field::new("active",               DataType::UInt32, false),
        Field::new("parked",               DataType::UInt32, false),
        Field::new("uncontrolled_pending", DataType::UInt32, false),
        Field::new("uncontrolled_total",   DataType::UInt64, false),
        Field::new("forced_total",         DataType::UInt64, false),
    ]))
}

fn event_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",   DataType::UInt64, false),
        Field::new("second", DataType::UInt64, false),
        Field::new("agent",  DataType::UInt32, false),
        Field::new("kind",   DataType::Utf8,   false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Writes the fleet trace to two Parquet files.
///
/// `finish()` **must** be called to flush buffered trace rows and write the
/// file footers; files written without it cannot be opened by Parquet readers.
pub struct ParquetWriter {
    trace:        Option<ArrowWriter<File>>,
    events:       Option<ArrowWriter<File>>,
    trace_schema: Arc<Schema>,
    event_schema: Arc<Schema>,
    pending:      Vec<TraceRow>,
}

impl ParquetWriter {
    /// Create both Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let trace_schema = trace_schema();
        let event_schema = event_schema();

        let trace_file = File::create(dir.join("trace.parquet"))?;
        let trace = ArrowWriter::try_new(trace_file, Arc::clone(&trace_schema), Some(snappy_props()))?;

        let event_file = File::create(dir.join("events.parquet"))?;
        let events = ArrowWriter::try_new(event_file, Arc::clone(&event_schema), Some(snappy_props()))?;

        Ok(Self {
            trace: Some(trace),
            events: Some(events),
            trace_schema,
            event_schema,
            pending: Vec::with_capacity(TRACE_BATCH),
        })
    }

    fn flush_trace(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.trace.as_mut() else {
            self.pending.clear();
            return Ok(());
        };

        let mut ticks     = UInt64Builder::new();
        let mut seconds   = UInt64Builder::new();
        let mut active    = UInt32Builder::new();
        let mut parked    = UInt32Builder::new();
        let mut pending   = UInt32Builder::new();
        let mut unc_total = UInt64Builder::new();
        let mut forced    = UInt64Builder::new();

        for row in self.pending.drain(..) {
            ticks.append_value(row.tick);
            seconds.append_value(row.second);
            active.append_value(row.active);
            parked.append_value(row.parked);
            pending.append_value(row.uncontrolled_pending);
            unc_total.append_value(row.uncontrolled_total);
            forced.append_value(row.forced_total);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.trace_schema),
            vec![
                Arc::new(ticks.finish()),
                Arc::new(seconds.finish()),
                Arc::new(active.finish()),
                Arc::new(parked.finish()),
                Arc::new(pending.finish()),
                Arc::new(unc_total.finish()),
                Arc::new(forced.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }
}

impl OutputWriter for ParquetWriter {
    fn write_trace(&mut self, row: &TraceRow) -> OutputResult<()> {
        self.pending.push(*row);
        if self.pending.len() >= TRACE_BATCH {
            self.flush_trace()?;
        }
        Ok(())
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.events.as_mut() else {
            return Ok(());
        };

        let mut ticks   = UInt64Builder::new();
        let mut seconds = UInt64Builder::new();
        let mut agents  = UInt32Builder::new();
        let mut kinds   = StringBuilder::new();

        for row in rows {
            ticks.append_value(row.tick);
            seconds.append_value(row.second);
            agents.append_value(row.agent);
            kinds.append_value(row.kind);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.event_schema),
            vec![
                Arc::new(ticks.finish()),
                Arc::new(seconds.finish()),
                Arc::new(agents.finish()),
                Arc::new(kinds.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.flush_trace()?;
        if let Some(w) = self.trace.take() {
            w.close()?;
        }
        if let Some(w) = self.events.take() {
            w.close()?;
        }
        Ok(())
    }
}
