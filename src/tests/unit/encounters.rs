//! Encounter Expansion Tests

use crate::core::encounter::{
    create_combat_from_encounter, monster_combatants, CombatDefaults, Encounter, EncounterEntry, LairAction, Monster,
};
use crate::core::dice::ScriptedRolls;
use crate::core::session::{CombatTracker, CombatantKind, LAIR_INITIATIVE};

fn lair_monster(id: &str, name: &str) -> Monster {
    let mut monster = Monster::new(name);
    monster.id = id.to_string();
    monster.lair_actions.push(LairAction {
        id: format!("{}-lair", id),
        name: "Lair Action".into(),
        description: "Something happens.".into(),
    });
    monster
}

#[test]
fn test_config_defaults_flow_into_expansion() {
    let defaults = CombatDefaults { initiative: 5, hp: 25 };
    let encounter = Encounter::new("Unknowns").with_entry(EncounterEntry::new("Stranger", CombatantKind::Npc));

    let combat = create_combat_from_encounter(&encounter, &[], &defaults);
    let stranger = &combat.combatants[0];
    assert_eq!(stranger.initiative, 5);
    assert_eq!(stranger.hp.max, 25);
    assert_eq!(stranger.dex, None);
}

#[test]
fn test_two_lair_templates_spawn_two_lairs() {
    let monsters = vec![lair_monster("kraken", "Kraken"), lair_monster("lich", "Lich")];
    let encounter = Encounter::new("Bad Day")
        .with_entry(EncounterEntry::for_monster(&monsters[0], 1))
        .with_entry(EncounterEntry::for_monster(&monsters[1], 1));

    let combat = create_combat_from_encounter(&encounter, &monsters, &CombatDefaults::default());
    let lairs: Vec<&str> = combat
        .combatants
        .iter()
        .filter(|c| c.is_lair())
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(lairs, vec!["Kraken Lair", "Lich Lair"]);
}

#[test]
fn test_expanded_combat_runs_through_tracker() {
    let kraken = lair_monster("kraken", "Kraken");
    let encounter = Encounter::new("Deep")
        .with_entry(EncounterEntry::for_monster(&kraken, 2))
        .with_entry(EncounterEntry::new("Hero", CombatantKind::Pc));
    let combat = create_combat_from_encounter(&encounter, &[kraken], &CombatDefaults::default());

    let ids: Vec<String> = combat
        .combatants
        .iter()
        .filter(|c| c.kind == CombatantKind::Monster)
        .map(|c| c.id.clone())
        .collect();

    let mut tracker = CombatTracker::new(combat);
    tracker.remove_combatant(&ids[0]).unwrap();
    assert!(tracker.state().combatants.iter().any(|c| c.is_lair()));
    tracker.remove_combatant(&ids[1]).unwrap();
    assert!(tracker.state().combatants.iter().all(|c| !c.is_lair()));
    assert_eq!(tracker.state().combatants.len(), 1);
}

#[test]
fn test_quick_add_skips_existing_lair() {
    let kraken = lair_monster("kraken", "Kraken");
    let defaults = CombatDefaults::default();
    let first = monster_combatants(&kraken, 2, &[], &defaults);
    assert_eq!(first.iter().filter(|c| c.is_lair()).count(), 1);
    assert_eq!(first[0].name, "Kraken 1");

    let again = monster_combatants(&kraken, 1, &first, &defaults);
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].name, "Kraken 3");
}

#[test]
fn test_spawned_lair_keeps_initiative_through_reroll() {
    let kraken = lair_monster("kraken", "Kraken");
    let encounter = Encounter::new("Deep").with_entry(EncounterEntry::for_monster(&kraken, 1));
    let defaults = CombatDefaults { initiative: 3, hp: 40 };
    let combat = create_combat_from_encounter(&encounter, &[kraken], &defaults);

    let lair_before = combat.combatants.iter().find(|c| c.is_lair()).unwrap().initiative;
    assert_eq!(lair_before, LAIR_INITIATIVE);

    let mut rolls = ScriptedRolls::new(vec![5]);
    let rerolled = combat.reroll_initiative(&mut rolls);
    let lair_after = rerolled.combatants.iter().find(|c| c.is_lair()).unwrap().initiative;
    assert_eq!(lair_after, lair_before);
}
