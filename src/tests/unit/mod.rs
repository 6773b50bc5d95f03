//! Unit test suites

mod encounters;
mod session;
