//! Hit Point Input
//!
//! The HP box accepts a tiny edit language:
//! - `=12` sets current HP to 12
//! - `-7` / `+5` / `5` adds a signed delta to current HP
//!
//! Results are rounded to the nearest integer and clamped to `[0, max]`.
//! Anything else leaves the hit points unchanged.

use super::combat::HitPoints;

/// Apply a raw HP edit. Unparseable input returns `hp` unchanged.
pub fn apply_hp_input(hp: &HitPoints, input: &str) -> HitPoints {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return *hp;
    }

    if let Some(target) = trimmed.strip_prefix('=') {
        return match parse_number(target) {
            Some(value) => HitPoints {
                current: clamp_hp(value, hp.max),
                ..*hp
            },
            None => *hp,
        };
    }

    match parse_number(trimmed) {
        Some(delta) => HitPoints {
            current: clamp_hp(hp.current as f64 + delta, hp.max),
            ..*hp
        },
        None => *hp,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Round half up, then clamp into `[0, max]`
fn clamp_hp(value: f64, max: i32) -> i32 {
    let rounded = (value + 0.5).floor();
    rounded.clamp(0.0, max.max(0) as f64) as i32
}
