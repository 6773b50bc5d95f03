//! Property-based tests for the combat engine
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Running Property Tests
//!
//! ```sh
//! cargo test property --release
//! ```
//!
//! ## Test Modules
//!
//! - `turn_engine_props`: turn pointer and round counter
//!   - Order length is unchanged and the pointer stays in range
//!   - A full lap adds exactly one round
//!   - Anchored conditions expire on exactly the right call
//!   - `rounds` conditions survive N-1 wraps
//!
//! - `roster_props`: roster edits
//!   - `normalize_order` always yields a permutation of the roster
//!   - Removal and reordering keep the structural invariants
//!   - Concentration cleanup removes all and only matching conditions
//!
//! - `input_props`: HP and dice input
//!   - HP results are always clamped to `[0, max]`
//!   - Dice totals fall between the expression's min and max
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable.

mod input_props;
mod turn_engine_props;
