//! Result Aggregator
//!
//! Fixed-size arena of output cells shared by every dispatch unit. Each cell
//! has exactly one writer, so cells are plain atomics without locks; the only
//! coordination is the settled-cell counter that drives the completion barrier.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::Notify;

use super::types::CellIndex;
use crate::error::{CellFailure, MatmulError, Result};
use crate::matrix::Matrix;

pub struct ResultMatrix {
    rows: usize,
    cols: usize,
    cells: Box<[AtomicI64]>,
    /// Set once a cell has received its value or its failure.
    settled_flags: Box<[AtomicBool]>,
    settled: AtomicUsize,
    failures: DashMap<CellIndex, CellFailure>,
    done: Notify,
}

impl ResultMatrix {
    /// Allocates a `rows x cols` grid initialised to zero.
    pub fn new(rows: usize, cols: usize) -> Self {
        let total = rows * cols;
        Self {
            rows,
            cols,
            cells: (0..total).map(|_| AtomicI64::new(0)).collect(),
            settled_flags: (0..total).map(|_| AtomicBool::new(false)).collect(),
            settled: AtomicUsize::new(0),
            failures: DashMap::new(),
            done: Notify::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.rows * self.cols
    }

    pub fn settled_count(&self) -> usize {
        self.settled.load(Ordering::Acquire)
    }

    /// False for cells outside the grid.
    pub fn is_settled(&self, cell: CellIndex) -> bool {
        self.offset(cell)
            .is_some_and(|offset| self.settled_flags[offset].load(Ordering::Acquire))
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    fn offset(&self, cell: CellIndex) -> Option<usize> {
        if cell.row < self.rows && cell.col < self.cols {
            Some(cell.row * self.cols + cell.col)
        } else {
            tracing::warn!(
                "Cell [{}][{}] is outside the {}x{} grid",
                cell.row,
                cell.col,
                self.rows,
                self.cols
            );
            None
        }
    }

    /// Claims the cell for its single write. Returns false if it was already
    /// settled, in which case the caller must not touch it.
    fn claim(&self, offset: usize) -> bool {
        !self.settled_flags[offset].swap(true, Ordering::AcqRel)
    }

    fn settle(&self) {
        let settled = self.settled.fetch_add(1, Ordering::AcqRel) + 1;
        if settled == self.total() {
            self.done.notify_one();
        }
    }

    /// Stores a computed value. Safe to call concurrently for disjoint cells.
    ///
    /// Returns false when the cell is out of range or already settled.
    pub fn record_value(&self, cell: CellIndex, value: i64) -> bool {
        let Some(offset) = self.offset(cell) else {
            return false;
        };
        if !self.claim(offset) {
            tracing::warn!("Ignoring second write to cell [{}][{}]", cell.row, cell.col);
            return false;
        }
        self.cells[offset].store(value, Ordering::Relaxed);
        self.settle();
        true
    }

    /// Marks the cell as failed; its slot keeps the zero default but the
    /// failure prevents the grid from ever being returned as a result.
    pub fn record_failure(&self, failure: CellFailure) -> bool {
        let Some(offset) = self.offset(failure.cell) else {
            return false;
        };
        if !self.claim(offset) {
            tracing::warn!(
                "Ignoring failure for already settled cell [{}][{}]",
                failure.cell.row,
                failure.cell.col
            );
            return false;
        }
        self.failures.insert(failure.cell, failure);
        self.settle();
        true
    }

    /// Join barrier: resolves once every cell has a value or a failure.
    pub async fn wait_all(&self) {
        while self.settled_count() < self.total() {
            self.done.notified().await;
        }
    }

    /// Failed cells sorted by position.
    pub fn failures(&self) -> Vec<CellFailure> {
        let mut failures: Vec<CellFailure> = self
            .failures
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        failures.sort_by_key(|failure| failure.cell);
        failures
    }

    /// Freezes the grid into a `Matrix`.
    ///
    /// Only valid after `wait_all`; fails with the complete set of failed
    /// cells if any task did not produce a value.
    pub fn finish(&self) -> Result<Matrix> {
        if self.settled_count() < self.total() {
            return Err(MatmulError::Cancelled);
        }
        if !self.failures.is_empty() {
            return Err(MatmulError::TaskFailure {
                failures: self.failures(),
            });
        }

        let data = self
            .cells
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect();
        Ok(Matrix::from_raw(self.rows, self.cols, data))
    }
}
