//! Cell-to-worker assignment.
//!
//! Assignment is a pure function of the cell and the worker count, so a plan
//! can be computed without any coordination between dispatch units and is
//! reproducible for a given worker ordering.

use super::types::CellIndex;

pub trait Assignment: Send + Sync {
    /// Index into the worker list for `cell`. `worker_count` is never zero.
    fn assign(&self, cell: CellIndex, worker_count: usize) -> usize;
}

/// `workers[(i + j) mod N]`: spreads each anti-diagonal over distinct workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagonalAssignment;

impl Assignment for DiagonalAssignment {
    fn assign(&self, cell: CellIndex, worker_count: usize) -> usize {
        assign_worker(cell.row, cell.col, worker_count)
    }
}

pub fn assign_worker(row: usize, col: usize, worker_count: usize) -> usize {
    (row + col) % worker_count
}

/// Worker index for every cell in row-major order.
pub fn assignment_plan(
    assignment: &dyn Assignment,
    rows: usize,
    cols: usize,
    worker_count: usize,
) -> Vec<(CellIndex, usize)> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| CellIndex::new(row, col)))
        .map(|cell| (cell, assignment.assign(cell, worker_count)))
        .collect()
}
