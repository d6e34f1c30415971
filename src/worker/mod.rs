//! Worker Service Module
//!
//! A long-running TCP listener that answers dot-product requests, one per
//! connection. No state survives across connections, so any worker can serve
//! any task and a repeated request always yields the same value.
//!
//! Per connection: `Accepted -> Reading -> Computing -> Responding -> Closed`.
//! A malformed request is answered with an explicit error response and never
//! affects the accept loop.

pub mod service;
