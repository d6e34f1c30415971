//! Dispatcher / Coordinator Module
//!
//! Decomposes a matrix product into one dot-product task per output cell and
//! executes them concurrently against a fixed list of remote workers.
//!
//! ## Flow
//! 1. **Validation**: `cols(left) == rows(right)`, otherwise `DimensionMismatch`.
//! 2. **Assignment**: cell `(i, j)` goes to `workers[(i + j) mod N]`.
//! 3. **Dispatch**: a bounded pool of units performs one TCP round-trip per cell.
//! 4. **Aggregation**: values are written into a shared `ResultMatrix` whose
//!    barrier releases once every cell has a value or a recorded failure.
//!
//! ## Submodules
//! - **`types`**: Cell coordinates, worker addresses, tasks and job ids.
//! - **`assignment`**: The deterministic cell-to-worker rule.
//! - **`client`**: A single request/response exchange with a worker.
//! - **`aggregator`**: The shared result grid and its completion barrier.
//! - **`dispatcher`**: The `Coordinator` driving the bounded dispatch pool.

pub mod aggregator;
pub mod assignment;
pub mod client;
pub mod dispatcher;
pub mod types;

pub use dispatcher::{CancelHandle, Coordinator};
