//! Common Test Utilities
//!
//! Shared fixtures for building rosters, combat states and conditions.

pub mod fixtures;

pub use fixtures::*;
