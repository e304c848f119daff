//! Per-turn trace artifacts.
//!
//! One JSON object per line, written as turns complete, so an interrupted
//! game still leaves a readable prefix. Intended for offline inspection of
//! how a game went; the format is deliberately flat.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::protocol::TurnReport;

/// One line of the trace file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Turn number.
    pub turn: u32,
    /// Own units alive.
    pub ants: usize,
    /// Orders committed.
    pub moves: usize,
    /// Milliseconds left on the clock at the end of the turn.
    pub remaining_ms: i64,
}

impl From<&TurnReport> for TraceRecord {
    fn from(report: &TurnReport) -> Self {
        Self {
            turn: report.turn,
            ants: report.own_ants,
            moves: report.moves,
            remaining_ms: report.remaining_ms,
        }
    }
}

/// Appends [`TraceRecord`]s to a file as JSON lines.
#[derive(Debug)]
pub struct TraceWriter {
    writer: BufWriter<File>,
}

impl TraceWriter {
    /// Create (truncating) the trace file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }

    /// Append one record and flush it to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn record(&mut self, record: &TraceRecord) -> io::Result<()> {
        let json = serde_json::to_string(record).map_err(io::Error::other)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()
    }
}
