//! Dispatch Engine
//!
//! Turns `(left, right, workers)` into a completed product matrix.
//!
//! ## Execution model
//! - A fixed pool of `min(max_in_flight, cells)` dispatch units pulls cell
//!   indices from a shared atomic cursor, which acts as the work queue.
//! - Before opening a connection, a unit takes a permit from the destination
//!   worker's semaphore, capping simultaneous connections per worker.
//! - Every round-trip runs under the per-task timeout and races against the
//!   cancellation signal. Cancelling bumps an epoch counter; a job is aborted
//!   when the epoch moves past the value it started with, so later jobs on
//!   the same coordinator are unaffected.
//! - Results land in the shared `ResultMatrix`; its barrier releases once all
//!   cells are settled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;

use super::aggregator::ResultMatrix;
use super::assignment::{Assignment, DiagonalAssignment};
use super::client::request_dot_product;
use super::types::{CellIndex, JobId, Task, WorkerAddress};
use crate::config::ClusterConfig;
use crate::error::{CellFailure, MatmulError, Result};
use crate::matrix::Matrix;
use crate::matrix::reference::check_dimensions;

/// Aborts the multiplications running on the coordinator it came from.
///
/// Jobs started after `cancel` returns are not affected.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<u64>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        self.tx.send_modify(|epoch| *epoch += 1);
    }

    /// Number of times `cancel` has been called.
    pub fn cancel_count(&self) -> u64 {
        *self.tx.borrow()
    }
}

pub struct Coordinator {
    config: ClusterConfig,
    assignment: Arc<dyn Assignment>,
    cancel_tx: Arc<watch::Sender<u64>>,
}

/// Read-only state shared by the dispatch units of one job.
struct DispatchContext {
    job_id: JobId,
    left: Matrix,
    right: Matrix,
    workers: Vec<WorkerAddress>,
    worker_limits: Vec<Arc<Semaphore>>,
    assignment: Arc<dyn Assignment>,
    cursor: AtomicUsize,
    task_timeout: Duration,
    grid: Arc<ResultMatrix>,
    /// Cancel epoch observed when the job started.
    epoch: u64,
    /// Set once any cell was failed because of cancellation.
    cancelled_cells: AtomicBool,
}

impl Coordinator {
    pub fn new(config: ClusterConfig) -> Self {
        Self::with_assignment(config, Arc::new(DiagonalAssignment))
    }

    pub fn with_assignment(config: ClusterConfig, assignment: Arc<dyn Assignment>) -> Self {
        let (cancel_tx, _) = watch::channel(0u64);
        Self {
            config,
            assignment,
            cancel_tx: Arc::new(cancel_tx),
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
        }
    }

    /// Multiplies `left x right` by dispatching one dot product per cell.
    ///
    /// Returns only after every task has settled. Any failed cell fails the
    /// whole multiplication with the full list of failures.
    pub async fn multiply(&self, left: &Matrix, right: &Matrix) -> Result<Matrix> {
        check_dimensions(left, right)?;
        self.config.validate()?;

        let job_id = JobId::new();
        let mut cancel_rx = self.cancel_tx.subscribe();
        let epoch = *cancel_rx.borrow_and_update();
        let started = Instant::now();
        let grid = Arc::new(ResultMatrix::new(left.rows(), right.cols()));
        let total = grid.total();

        let ctx = Arc::new(DispatchContext {
            job_id: job_id.clone(),
            left: left.clone(),
            right: right.clone(),
            workers: self.config.workers.clone(),
            worker_limits: self
                .config
                .workers
                .iter()
                .map(|_| Arc::new(Semaphore::new(self.config.per_worker_limit)))
                .collect(),
            assignment: self.assignment.clone(),
            cursor: AtomicUsize::new(0),
            task_timeout: self.config.task_timeout(),
            grid: grid.clone(),
            epoch,
            cancelled_cells: AtomicBool::new(false),
        });

        let unit_count = self.config.max_in_flight.min(total);
        tracing::info!(
            "Job {}: {} x {} -> {} cells over {} workers ({} dispatch units)",
            job_id.0,
            left,
            right,
            total,
            ctx.workers.len(),
            unit_count
        );

        // Dropping the set (e.g. when this future is dropped) aborts every unit.
        let mut units = JoinSet::new();
        for unit_id in 0..unit_count {
            let ctx = ctx.clone();
            let cancel_rx = cancel_rx.clone();
            units.spawn(async move {
                ctx.unit_loop(unit_id, cancel_rx).await;
            });
        }

        while let Some(joined) = units.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Job {}: dispatch unit died: {}", job_id.0, e);
            }
        }

        ctx.settle_abandoned(ctx.is_cancelled(&cancel_rx));

        grid.wait_all().await;

        // A cancel that lands after every cell has its value changes nothing.
        if ctx.cancelled_cells.load(Ordering::Acquire) {
            tracing::warn!(
                "Job {}: cancelled after {:?} ({} cells failed or skipped)",
                job_id.0,
                started.elapsed(),
                grid.failure_count()
            );
            return Err(MatmulError::Cancelled);
        }

        match grid.finish() {
            Ok(matrix) => {
                tracing::info!(
                    "Job {}: completed {} cells in {:?}",
                    job_id.0,
                    total,
                    started.elapsed()
                );
                Ok(matrix)
            }
            Err(e) => {
                tracing::warn!(
                    "Job {}: {} of {} cells failed",
                    job_id.0,
                    grid.failure_count(),
                    total
                );
                Err(e)
            }
        }
    }
}

impl DispatchContext {
    fn cell_at(&self, index: usize) -> CellIndex {
        let cols = self.right.cols();
        CellIndex::new(index / cols, index % cols)
    }

    fn is_cancelled(&self, rx: &watch::Receiver<u64>) -> bool {
        *rx.borrow() != self.epoch
    }

    fn worker_for(&self, cell: CellIndex) -> usize {
        self.assignment.assign(cell, self.workers.len()) % self.workers.len()
    }

    async fn unit_loop(&self, unit_id: usize, mut cancel_rx: watch::Receiver<u64>) {
        tracing::trace!("Job {}: unit {} started", self.job_id.0, unit_id);

        loop {
            if self.is_cancelled(&cancel_rx) {
                break;
            }

            let index = self.cursor.fetch_add(1, Ordering::Relaxed);
            if index >= self.grid.total() {
                break;
            }

            let cell = self.cell_at(index);
            let worker_idx = self.worker_for(cell);
            let task = Task {
                cell,
                row: self.left.row(cell.row).to_vec(),
                col: self.right.column(cell.col),
            };

            let outcome = tokio::select! {
                outcome = self.dispatch(worker_idx, &task) => outcome,
                _ = wait_cancelled(&mut cancel_rx, self.epoch) => Err(MatmulError::Cancelled),
            };

            let worker = &self.workers[worker_idx];
            match outcome {
                Ok(value) => {
                    tracing::debug!(
                        "Job {}: computed [{}][{}] = {} by {}",
                        self.job_id.0,
                        cell.row,
                        cell.col,
                        value,
                        worker
                    );
                    self.grid.record_value(cell, value);
                }
                Err(e) => {
                    if matches!(e, MatmulError::Cancelled) {
                        self.cancelled_cells.store(true, Ordering::Release);
                    }
                    tracing::warn!(
                        "Job {}: cell [{}][{}] failed on {}: {}",
                        self.job_id.0,
                        cell.row,
                        cell.col,
                        worker,
                        e
                    );
                    self.grid.record_failure(CellFailure {
                        cell,
                        worker: worker.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::trace!("Job {}: unit {} finished", self.job_id.0, unit_id);
    }

    async fn dispatch(&self, worker_idx: usize, task: &Task) -> Result<i64> {
        let addr = &self.workers[worker_idx];
        let _permit = self.worker_limits[worker_idx]
            .acquire()
            .await
            .map_err(|_| MatmulError::Cancelled)?;

        match tokio::time::timeout(
            self.task_timeout,
            request_dot_product(addr, &task.row, &task.col),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MatmulError::Timeout { addr: addr.clone() }),
        }
    }

    /// Settles cells no unit got to, either because the job was cancelled or
    /// because a unit died mid-task.
    fn settle_abandoned(&self, cancelled: bool) {
        let reason = if cancelled {
            MatmulError::Cancelled.to_string()
        } else {
            "dispatch unit terminated before completing the task".to_string()
        };

        for index in 0..self.grid.total() {
            let cell = self.cell_at(index);
            if !self.grid.is_settled(cell) {
                if cancelled {
                    self.cancelled_cells.store(true, Ordering::Release);
                }
                let worker_idx = self.worker_for(cell);
                self.grid.record_failure(CellFailure {
                    cell,
                    worker: self.workers[worker_idx].clone(),
                    reason: reason.clone(),
                });
            }
        }
    }
}

/// Resolves once the epoch moves past `epoch`; never resolves if the sender
/// is gone.
async fn wait_cancelled(rx: &mut watch::Receiver<u64>, epoch: u64) {
    loop {
        if *rx.borrow_and_update() != epoch {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
