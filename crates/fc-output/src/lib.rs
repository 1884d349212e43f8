//! `fc-output`: fleet trace writers.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                        |
//! |-----------|---------|--------------------------------------|
//! | *(none)*  | CSV     | `trace.csv`, `events.csv`            |
//! | `sqlite`  | SQLite  | `output.db`                          |
//! | `parquet` | Parquet | `trace.parquet`, `events.parquet`    |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`TraceObserver`], which implements `fc_control::TickObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fc_output::{CsvWriter, TraceObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = TraceObserver::new(writer);
//! controller.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TraceObserver;
pub use row::{EventRow, TraceRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
