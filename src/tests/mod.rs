//! Crate-internal test suites
//!
//! - `common`: shared fixtures
//! - `unit`: scenario tests per module
//! - `property`: proptest invariants of the turn engine

pub mod common;
mod property;
mod unit;
