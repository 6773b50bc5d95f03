/// Combat Tracker - initiative, hit points and timed conditions
///
/// Core library for running tabletop combat: a pure turn/round engine,
/// condition expiry, encounter expansion, undo history and JSON export.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
