//! Integration test suite for diagdump.
//!
//! These tests drive the engine through its public API: a pipeline of
//! producer groups, a worker pool and the aggregator, wired together the
//! same way a real run wires them.
//!
//! # Test Categories
//!
//! - `pipeline`: Enumeration failures, the barrier and terminal gating
//! - `pool`: Worker pool sizing and result accounting
//! - `collect`: The standard collectors end to end against a scripted client
//!
//! # CI Compatibility
//!
//! No cluster or client binary is needed: every external command goes
//! through a scripted runner.

mod fixtures;

mod collect;
mod pool;
