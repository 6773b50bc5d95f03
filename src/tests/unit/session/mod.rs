//! Session Tests
//!
//! Turn engine, condition expiry and tracker scenarios.

mod conditions;
