pub mod dice;
pub mod encounter;
pub mod export;
pub mod logging;
pub mod rules;

// Live combat: turn engine, conditions, initiative, HP, undo
pub mod session;

// Persistence seam for combat states
pub mod store;
