//! Dice Expression Evaluator
//!
//! Parses and rolls compound dice expressions used for damage, healing and
//! initiative rolls:
//! - Single dice: d20, d6
//! - Counted dice: 2d6, 4d8
//! - Compound expressions: 2d6+3-1d4, d20+5, 8d6-2
//!
//! Randomness comes from a [`RollSource`], so tests can swap in
//! [`ScriptedRolls`] for deterministic results.
//!
//! ## Examples
//!
//! ```rust
//! use combat_tracker::core::dice::{roll_expression, DiceExpression, ScriptedRolls};
//!
//! let expression = DiceExpression::parse("2d6+3").unwrap();
//! assert_eq!(expression.min_total(), 5);
//! assert_eq!(expression.max_total(), 15);
//!
//! let mut rolls = ScriptedRolls::new([4, 2]);
//! let result = roll_expression("2d6+3", &mut rolls).unwrap();
//! assert_eq!(result.total, 9);
//! assert_eq!(result.detail, "2d6[4,2] +3");
//! ```

use std::fmt;

use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while parsing a dice expression
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Empty expression")]
    EmptyExpression,

    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Expression ends with an operator: {0}")]
    DanglingOperator(String),

    #[error("Invalid dice count: must be between 1 and {max}, got {got}")]
    InvalidCount { max: u32, got: u32 },

    #[error("Invalid dice sides: must be greater than 0, got {0}")]
    InvalidSides(u32),
}

/// Result type for dice operations
pub type DiceResult<T> = Result<T, DiceError>;

// ============================================================================
// Randomness
// ============================================================================

/// Source of uniform die results
pub trait RollSource {
    /// Roll one die, returning a value in `[1, sides]`
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl RollSource for ThreadRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.gen_range(1..=sides.max(1))
    }
}

impl RollSource for StdRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.gen_range(1..=sides.max(1))
    }
}

/// Deterministic roll source that replays a fixed script of results.
///
/// Values cycle once the script is exhausted and are clamped into the die's
/// range. An empty script always rolls 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    values: Vec<u32>,
    cursor: usize,
}

impl ScriptedRolls {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            cursor: 0,
        }
    }
}

impl RollSource for ScriptedRolls {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if self.values.is_empty() {
            return 1;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(1, sides.max(1))
    }
}

// ============================================================================
// Expression Types
// ============================================================================

/// Sign applied to a term's subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    fn factor(self) -> i64 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
        }
    }
}

/// One term of an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceTerm {
    /// `count` dice with `sides` faces, summed then signed
    Dice { sign: Sign, count: u32, sides: u32 },
    /// Flat modifier, already signed
    Flat(i64),
}

impl DiceTerm {
    fn parse(sign: Sign, text: &str) -> DiceResult<Self> {
        if let Some(d_pos) = text.find(['d', 'D']) {
            let count_str = &text[..d_pos];
            let sides_str = &text[d_pos + 1..];

            let count = if count_str.is_empty() {
                1
            } else {
                parse_digits(count_str).ok_or_else(|| DiceError::InvalidTerm(text.to_string()))?
            };
            let sides =
                parse_digits(sides_str).ok_or_else(|| DiceError::InvalidTerm(text.to_string()))?;

            if count == 0 || count > DiceExpression::MAX_DICE_COUNT {
                return Err(DiceError::InvalidCount {
                    max: DiceExpression::MAX_DICE_COUNT,
                    got: count,
                });
            }
            if sides == 0 {
                return Err(DiceError::InvalidSides(sides));
            }

            return Ok(DiceTerm::Dice { sign, count, sides });
        }

        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiceError::InvalidTerm(text.to_string()));
        }
        let value: i64 = text
            .parse()
            .map_err(|_| DiceError::InvalidTerm(text.to_string()))?;
        Ok(DiceTerm::Flat(value * sign.factor()))
    }
}

/// Digits only; rejects signs and empty strings that `str::parse` would accept
fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// A parsed dice expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub terms: Vec<DiceTerm>,
}

impl DiceExpression {
    /// Maximum number of dice allowed in a single term
    pub const MAX_DICE_COUNT: u32 = 100;

    /// Parse an expression such as `2d6+3-1d4`.
    ///
    /// Whitespace is ignored. A single leading sign is allowed; doubled or
    /// trailing operators are rejected.
    pub fn parse(expression: &str) -> DiceResult<Self> {
        let normalized: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
        if normalized.is_empty() {
            return Err(DiceError::EmptyExpression);
        }

        let mut terms = Vec::new();
        let mut sign = Sign::Plus;
        let mut start = 0;

        for (idx, ch) in normalized.char_indices() {
            if ch != '+' && ch != '-' {
                continue;
            }
            let text = &normalized[start..idx];
            if text.is_empty() {
                if idx != 0 {
                    return Err(DiceError::InvalidTerm(normalized[..=idx].to_string()));
                }
            } else {
                terms.push(DiceTerm::parse(sign, text)?);
            }
            sign = if ch == '-' { Sign::Minus } else { Sign::Plus };
            start = idx + 1;
        }

        let tail = &normalized[start..];
        if tail.is_empty() {
            return Err(DiceError::DanglingOperator(normalized));
        }
        terms.push(DiceTerm::parse(sign, tail)?);

        Ok(Self { terms })
    }

    /// Smallest possible total
    pub fn min_total(&self) -> i64 {
        self.terms
            .iter()
            .map(|term| match term {
                DiceTerm::Dice { sign: Sign::Plus, count, .. } => *count as i64,
                DiceTerm::Dice { sign: Sign::Minus, count, sides } => -(*count as i64 * *sides as i64),
                DiceTerm::Flat(value) => *value,
            })
            .sum()
    }

    /// Largest possible total
    pub fn max_total(&self) -> i64 {
        self.terms
            .iter()
            .map(|term| match term {
                DiceTerm::Dice { sign: Sign::Plus, count, sides } => *count as i64 * *sides as i64,
                DiceTerm::Dice { sign: Sign::Minus, count, .. } => -(*count as i64),
                DiceTerm::Flat(value) => *value,
            })
            .sum()
    }

    /// Roll using the thread-local RNG
    pub fn roll(&self) -> RollResult {
        self.roll_with(&mut rand::thread_rng())
    }

    /// Roll using the given source
    pub fn roll_with<S: RollSource + ?Sized>(&self, source: &mut S) -> RollResult {
        let mut total: i64 = 0;
        let mut parts = Vec::with_capacity(self.terms.len());
        let mut rolls = Vec::new();

        for term in &self.terms {
            match *term {
                DiceTerm::Flat(value) => {
                    total = total.saturating_add(value);
                    parts.push(if value >= 0 {
                        format!("+{}", value)
                    } else {
                        value.to_string()
                    });
                }
                DiceTerm::Dice { sign, count, sides } => {
                    let values: Vec<u32> = (0..count).map(|_| source.roll_die(sides)).collect();
                    let subtotal: i64 = values.iter().map(|v| *v as i64).sum::<i64>() * sign.factor();
                    total = total.saturating_add(subtotal);
                    rolls.extend(values.iter().map(|v| *v as i64 * sign.factor()));

                    let listed: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    let prefix = if sign == Sign::Minus { "-" } else { "" };
                    parts.push(format!("{}{}d{}[{}]", prefix, count, sides, listed.join(",")));
                }
            }
        }

        RollResult {
            total,
            detail: parts.join(" "),
            rolls,
        }
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, term) in self.terms.iter().enumerate() {
            match term {
                DiceTerm::Dice { sign, count, sides } => {
                    match (sign, idx) {
                        (Sign::Minus, _) => write!(f, "-")?,
                        (Sign::Plus, 0) => {}
                        (Sign::Plus, _) => write!(f, "+")?,
                    }
                    write!(f, "{}d{}", count, sides)?;
                }
                DiceTerm::Flat(value) if *value < 0 || idx == 0 => write!(f, "{}", value)?,
                DiceTerm::Flat(value) => write!(f, "+{}", value)?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Roll Results
// ============================================================================

/// Outcome of rolling an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// Grand total of all terms
    pub total: i64,
    /// Human-readable breakdown, e.g. `2d6[3,4] +3 -1d4[2]`
    pub detail: String,
    /// Every individual die, negated for subtracted terms
    pub rolls: Vec<i64>,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.total, self.detail)
    }
}

/// Parse and roll in one step. `None` means the expression could not be parsed.
pub fn roll_expression<S: RollSource + ?Sized>(expression: &str, source: &mut S) -> Option<RollResult> {
    match DiceExpression::parse(expression) {
        Ok(parsed) => Some(parsed.roll_with(source)),
        Err(e) => {
            log::debug!("Rejected dice expression {:?}: {}", expression, e);
            None
        }
    }
}

/// One-line summary: `"Fireball 8d6 = 27 (8d6[...])"`
pub fn format_roll_summary(label: &str, expression: &str, result: &RollResult) -> String {
    format!(
        "{} {} = {} ({})",
        label,
        expression,
        result.total,
        result.detail.trim()
    )
}

// ============================================================================
// Tests
// ============================================================================
