//! Initiative Rolling
//!
//! d20 + DEX modifier for every combatant except lair slots, which always
//! act on initiative 20.

use super::combat::{now_millis, Combatant};
use crate::core::dice::RollSource;
use crate::core::rules::ability_modifier;

/// Initiative count a lair slot always acts on
pub const LAIR_INITIATIVE: i32 = 20;

/// Roll initiative for a roster. Returns the updated roster; turn order is
/// left to the caller.
pub fn roll_initiative<S: RollSource + ?Sized>(combatants: &[Combatant], source: &mut S) -> Vec<Combatant> {
    combatants
        .iter()
        .map(|combatant| {
            let mut next = combatant.clone();
            if combatant.is_lair() {
                next.initiative = LAIR_INITIATIVE;
                return next;
            }
            let modifier = combatant.dex.map(ability_modifier).unwrap_or(0);
            next.initiative = source.roll_die(20) as i32 + modifier;
            next.updated_at = now_millis();
            log::debug!("{} rolled initiative {}", next.name, next.initiative);
            next
        })
        .collect()
}

/// Turn order by initiative, highest first. Ties keep roster order.
pub fn order_by_initiative(combatants: &[Combatant]) -> Vec<String> {
    let mut sorted: Vec<&Combatant> = combatants.iter().collect();
    sorted.sort_by(|a, b| b.initiative.cmp(&a.initiative));
    sorted.into_iter().map(|c| c.id.clone()).collect()
}
