use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use combat_tracker::config::AppConfig;
use combat_tracker::core::dice::{format_roll_summary, roll_expression, RollSource};
use combat_tracker::core::encounter::{create_combat_from_encounter, custom_combatant, monster_combatants};
use combat_tracker::core::export::ExportData;
use combat_tracker::core::rules::{ability_modifier, format_signed};
use combat_tracker::core::session::{
    CombatState, CombatTracker, CombatantKind, ConditionRequest, DurationChoice, HitPoints,
};
use combat_tracker::core::store::CombatStore;

#[derive(Parser)]
#[command(name = "combat-tracker", version)]
#[command(about = "Initiative, hit point and condition tracker for tabletop combat")]
struct Cli {
    /// Export file holding monsters, encounters and combats
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Combat to operate on (id or name; defaults to the most recent)
    #[arg(short, long, global = true)]
    combat: Option<String>,

    /// Log to stderr as well as the log file
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Copy, Clone, ValueEnum)]
enum Kind {
    Pc,
    Npc,
    Monster,
}

impl From<Kind> for CombatantKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Pc => CombatantKind::Pc,
            Kind::Npc => CombatantKind::Npc,
            Kind::Monster => CombatantKind::Monster,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum Duration {
    /// Until the start of the source's next turn
    Start,
    /// Until the end of the target's next turn
    End,
    /// A number of rounds
    Rounds,
    /// While the source concentrates
    Concentration,
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll a dice expression such as "2d6+3"
    Roll {
        expression: String,
        #[arg(long, default_value = "Roll")]
        label: String,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    #[command(flatten)]
    Combat(CombatCmd),
}

/// Commands that load, change and save a combat
#[derive(Subcommand)]
enum CombatCmd {
    /// Create an empty combat
    New {
        name: String,
    },
    /// Start a combat from a saved encounter
    Start {
        /// Encounter id or name
        encounter: String,
    },
    /// Add a custom combatant, or monster instances with --monster
    Add {
        name: String,
        #[arg(long, value_enum, default_value_t = Kind::Pc)]
        kind: Kind,
        /// Treat NAME as a monster template (id or name) and spawn instances
        #[arg(long)]
        monster: bool,
        #[arg(long, default_value_t = 1)]
        count: u32,
        #[arg(long)]
        initiative: Option<i32>,
        #[arg(long)]
        hp: Option<i32>,
    },
    /// Remove a combatant
    Remove {
        combatant: String,
    },
    /// Advance to the next turn
    Next {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Edit hit points: "=12" sets, "-7" / "+5" adjusts
    Hp {
        combatant: String,
        #[arg(allow_hyphen_values = true)]
        input: String,
    },
    /// Apply a condition
    Condition {
        target: String,
        name: String,
        #[arg(long, value_enum, default_value_t = Duration::Rounds)]
        duration: Duration,
        #[arg(long, default_value_t = 1)]
        rounds: u32,
        /// Combatant applying the condition
        #[arg(long)]
        source: Option<String>,
    },
    /// Roll initiative for everyone (or only re-sort with --sort)
    Initiative {
        #[arg(long)]
        sort: bool,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the turn order
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_origin) = AppConfig::load();
    config.logging.stderr |= cli.verbose;
    let _log_guard = match combat_tracker::core::logging::init(&config.logging, &config.log_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };
    log::info!("{} v{} starting", combat_tracker::NAME, combat_tracker::VERSION);
    config_origin.log();

    match cli.cmd {
        Cmd::Roll { expression, label, seed } => {
            let mut rng = rng_from(seed);
            let result = roll_expression(&expression, rng.as_mut())
                .ok_or_else(|| anyhow!("Invalid dice expression: {expression}"))?;
            println!("{}", format_roll_summary(&label, &expression, &result));
            Ok(())
        }
        Cmd::Combat(cmd) => {
            let path = cli.file.unwrap_or_else(|| config.default_export_path());
            run_combat(cmd, &path, cli.combat.as_deref(), &config)
        }
    }
}

fn run_combat(cmd: CombatCmd, path: &Path, selector: Option<&str>, config: &AppConfig) -> Result<()> {
    let mut data = if path.exists() {
        ExportData::read_file(path).with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        ExportData::default()
    };

    let store = data.combat_store();
    let defaults = config.combat.defaults();
    let state = match &cmd {
        CombatCmd::New { name } => CombatState::new(name.trim()),
        CombatCmd::Start { encounter } => {
            let encounter = data
                .encounters
                .iter()
                .find(|e| e.id == *encounter || e.name.eq_ignore_ascii_case(encounter))
                .ok_or_else(|| anyhow!("Encounter not found: {encounter}"))?;
            create_combat_from_encounter(encounter, &data.monsters, &defaults)
        }
        _ => select_combat(&store, selector)?,
    };

    let mut tracker = CombatTracker::with_undo_limit(state, config.combat.undo_limit);

    match cmd {
        CombatCmd::New { .. } | CombatCmd::Start { .. } => {
            println!("Created combat {} ({})", tracker.state().name, tracker.state().id);
        }
        CombatCmd::Add { name, kind, monster, count, initiative, hp } => {
            let mut added = if monster {
                let template = data
                    .monsters
                    .iter()
                    .find(|m| m.id == name || m.name.eq_ignore_ascii_case(&name))
                    .ok_or_else(|| anyhow!("Monster not found: {name}"))?;
                monster_combatants(template, count, &tracker.state().combatants, &defaults)
            } else {
                vec![custom_combatant(&name, kind.into())]
            };
            for combatant in added.iter_mut().filter(|c| !c.is_lair()) {
                if let Some(initiative) = initiative {
                    combatant.initiative = initiative;
                }
                if let Some(hp) = hp {
                    combatant.hp = HitPoints::full(hp);
                }
            }
            let names: Vec<String> = added.iter().map(|c| c.name.clone()).collect();
            tracker.add_combatants(added)?;
            println!("Added {}", names.join(", "));
        }
        CombatCmd::Remove { combatant } => {
            let id = resolve(tracker.state(), &combatant)?;
            tracker.remove_combatant(&id)?;
            println!("Removed {combatant}");
        }
        CombatCmd::Next { count } => {
            for _ in 0..count.max(1) {
                let report = tracker.next_turn()?;
                if report.new_round {
                    println!("Round {}", report.round);
                }
                if !report.expired_condition_ids.is_empty() {
                    println!("{} condition(s) expired", report.expired_condition_ids.len());
                }
            }
            if let Some(current) = tracker.state().current_combatant() {
                println!("Now acting: {}", current.name);
            }
        }
        CombatCmd::Hp { combatant, input } => {
            let id = resolve(tracker.state(), &combatant)?;
            tracker.apply_hp(&id, &input)?;
            if let Some(c) = tracker.state().combatant(&id) {
                println!("{}: {}/{} HP", c.name, c.hp.current, c.hp.max);
            }
        }
        CombatCmd::Condition { target, name, duration, rounds, source } => {
            let target_id = resolve(tracker.state(), &target)?;
            let choice = match duration {
                Duration::Start => DurationChoice::Start,
                Duration::End => DurationChoice::End,
                Duration::Rounds => DurationChoice::Rounds(rounds),
                Duration::Concentration => DurationChoice::Concentration,
            };
            let mut request = ConditionRequest::new(name, choice);
            if let Some(source) = source {
                request = request.from_source(resolve(tracker.state(), &source)?);
            }
            let id = tracker.apply_condition(&target_id, &request)?;
            println!("Applied {} ({})", request.name.trim(), id);
        }
        CombatCmd::Initiative { sort, seed } => {
            if sort {
                tracker.sort_by_initiative();
            } else {
                let mut rng = rng_from(seed);
                tracker.reroll_initiative(rng.as_mut());
            }
            print_order(tracker.state());
        }
        CombatCmd::Show => print_order(tracker.state()),
    }

    store.put(tracker.into_state())?;
    data.sync_combats(&store)?;
    data.write_file(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}

fn rng_from(seed: Option<u64>) -> Box<dyn RollSource> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    }
}

fn select_combat(store: &dyn CombatStore, selector: Option<&str>) -> Result<CombatState> {
    let combats = store.list()?;
    match selector {
        Some(selector) => combats
            .into_iter()
            .find(|c| c.id == selector || c.name.eq_ignore_ascii_case(selector))
            .ok_or_else(|| anyhow!("Combat not found: {selector}")),
        None => combats
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No combats yet; create one with `new` or `start`")),
    }
}

/// Combatant id from an id or a case-insensitive name
fn resolve(state: &CombatState, selector: &str) -> Result<String> {
    if let Some(c) = state.combatant(selector) {
        return Ok(c.id.clone());
    }
    let matches: Vec<&str> = state
        .combatants
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case(selector))
        .map(|c| c.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => bail!("Combatant not found: {selector}"),
        _ => bail!("Several combatants are named {selector}; use an id"),
    }
}

fn print_order(state: &CombatState) {
    println!("{} - round {}", state.name, state.round);
    let current = state.current_id();
    for id in &state.order {
        let Some(c) = state.combatant(id) else {
            continue;
        };
        let marker = if Some(id.as_str()) == current { ">" } else { " " };
        let mut line = format!("{} {:>3}  {}", marker, c.initiative, c.name);
        if !c.is_lair() {
            line.push_str(&format!("  {}/{} HP", c.hp.current, c.hp.max));
            if c.hp.temp > 0 {
                line.push_str(&format!(" ({} temp)", c.hp.temp));
            }
            if let Some(dex) = c.dex {
                line.push_str(&format!("  DEX {}", format_signed(ability_modifier(dex))));
            }
        }
        if c.is_concentrating {
            line.push_str("  [concentrating]");
        }
        println!("{line}");
        for condition in &c.conditions {
            println!("        - {} ({})", condition.name, condition.duration.description());
        }
    }
    if let Some(next) = state.on_deck() {
        println!("On deck: {}", next.name);
    }
}
