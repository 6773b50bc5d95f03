//! 5e Rule Helpers
//!
//! Small arithmetic helpers shared by initiative rolling, encounter
//! expansion and display code.

/// Ability modifier for a score: `floor((score - 10) / 2)`
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Proficiency bonus for a monster challenge rating
pub fn proficiency_bonus_from_cr(cr: f32) -> i32 {
    match cr {
        cr if cr >= 29.0 => 9,
        cr if cr >= 25.0 => 8,
        cr if cr >= 21.0 => 7,
        cr if cr >= 17.0 => 6,
        cr if cr >= 13.0 => 5,
        cr if cr >= 9.0 => 4,
        cr if cr >= 5.0 => 3,
        _ => 2,
    }
}

/// Format a modifier with an explicit sign ("+2", "-1", "+0")
pub fn format_signed(value: i32) -> String {
    if value >= 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}
