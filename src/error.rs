//! Error Taxonomy
//!
//! A single error enum shared by every subsystem. Per-cell failures are kept
//! as data (`CellFailure`) so the coordinator can report the full set at once
//! instead of stopping at the first one.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::coordinator::types::{CellIndex, WorkerAddress};

#[derive(Debug, Error)]
pub enum MatmulError {
    /// Protocol decode failure (missing separators, bad integer, unequal lengths).
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("dimension mismatch: left is {left_rows}x{left_cols}, right is {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("connection to {addr} failed: {source}")]
    ConnectionFailure {
        addr: WorkerAddress,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {addr} did not answer in time")]
    Timeout { addr: WorkerAddress },

    /// The worker answered with an explicit error response.
    #[error("worker reported an error: {0}")]
    Remote(String),

    #[error("integer overflow while computing dot product")]
    Overflow,

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("{} of the result cells failed", .failures.len())]
    TaskFailure { failures: Vec<CellFailure> },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid matrix: {0}")]
    ValidationFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one dispatched task that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFailure {
    pub cell: CellIndex,
    pub worker: WorkerAddress,
    pub reason: String,
}

impl fmt::Display for CellFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell [{}][{}] via {}: {}",
            self.cell.row, self.cell.col, self.worker, self.reason
        )
    }
}

pub type Result<T> = std::result::Result<T, MatmulError>;
