//! Distributed Matrix Multiplication Library
//!
//! Splits a dense integer matrix product into independent dot-product tasks,
//! ships them to a fixed set of TCP workers and reassembles the answers.
//! The binary (`main.rs`) exposes the worker and coordinator as run modes.
//!
//! ## Architecture Modules
//! - **`protocol`**: Length-prefixed frames carrying `row;col` requests and
//!   scalar (or explicit error) responses.
//! - **`worker`**: The stateless dot-product server, one request per connection.
//! - **`coordinator`**: Task decomposition, deterministic worker assignment,
//!   bounded concurrent dispatch and the shared result grid with its barrier.
//! - **`matrix`**: The matrix type plus text loader, pretty writer and the
//!   local serial baseline.
//! - **`config`**: Worker list and dispatch limits, loaded from TOML.
//! - **`error`**: The shared error taxonomy.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod matrix;
pub mod protocol;
pub mod worker;
