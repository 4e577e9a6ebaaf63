// Debug logging module for per-decision JSONL records
//
// Each decision appends one JSON object per line. The search is synchronous,
// so writes happen inline on a buffered file. Failures are logged and the
// logger disables itself; a broken log never interrupts a game.

use log::error;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use crate::engine::SearchStats;
use crate::tree::ChildSummary;
use crate::types::{Direction, Position, Tactic};

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
pub struct DecisionRecord {
    pub turn: u32,
    pub position: Position,
    pub chosen_move: Direction,
    pub tactic: Tactic,
    pub fallback: bool,
    pub stats: SearchStats,
    pub root_visits: f64,
    pub tree_size: usize,
    pub children: Vec<ChildSummary>,
}

#[derive(Debug, Serialize)]
struct DebugLogEntry<'a> {
    #[serde(flatten)]
    record: &'a DecisionRecord,
    timestamp: String,
}

pub struct DecisionLogger {
    writer: Option<BufWriter<File>>,
}

impl DecisionLogger {
    /// Creates a new decision logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DecisionLogger {
                    writer: Some(BufWriter::new(file)),
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled decision logger (no-op)
    pub fn disabled() -> Self {
        DecisionLogger { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Appends one record and flushes it
    pub fn log_decision(&mut self, record: &DecisionRecord) {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return,
        };

        let entry = DebugLogEntry {
            record,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let result = serde_json::to_string(&entry)
            .map_err(|e| format!("Failed to serialize debug log entry: {}", e))
            .and_then(|line| {
                writeln!(writer, "{}", line)
                    .and_then(|_| writer.flush())
                    .map_err(|e| format!("Failed to write debug log entry: {}", e))
            });

        if let Err(message) = result {
            error!("{}", message);
            self.writer = None;
        }
    }
}
