//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` in the output directory with two tables,
//! `trace` and `events`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputResult, TraceRow};

pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS trace (
                 tick                 INTEGER PRIMARY KEY,
                 second               INTEGER NOT NULL,
                 active               INTEGER NOT NULL,
                 parked               INTEGER NOT NULL,
                 uncontrolled_pending INTEGER NOT NULL,
                 uncontrolled_total   INTEGER NOT NULL,
                 forced_total         INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS events (
                 tick   INTEGER NOT NULL,
                 second INTEGER NOT NULL,
                 agent  INTEGER NOT NULL,
                 kind   TEXT    NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_trace(&mut self, row: &TraceRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO trace \
             (tick, second, active, parked, uncontrolled_pending, uncontrolled_total, forced_total) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                row.tick,
                row.second,
                row.active,
                row.parked,
                row.uncontrolled_pending,
                row.uncontrolled_total,
                row.forced_total,
            ],
        )?;
        Ok(())
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (tick, second, agent, kind) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.tick, row.second, row.agent, row.kind])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
