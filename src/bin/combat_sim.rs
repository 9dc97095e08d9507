//! Headless Combat Simulator
//!
//! Loads combatants from a definitions document, sets every side against the
//! others and prints a JSON or text summary of the fight.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use combat_engine::combatant::Combatant;
use combat_engine::core::config::{load_config, EngineConfig};
use combat_engine::core::error::{CombatError, Result};
use combat_engine::core::types::CombatantId;
use combat_engine::definitions::load_definitions;
use combat_engine::session::{Engine, SessionRules, TracingObserver};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Rules {
    Standard,
    Sparring,
    Consensual,
}

impl Rules {
    fn session_rules(self) -> SessionRules {
        match self {
            Rules::Standard => SessionRules::standard(),
            Rules::Sparring => SessionRules::sparring(),
            Rules::Consensual => SessionRules::consensual_leave(),
        }
    }
}

/// Headless Combat Simulator - fight combatants from a definitions file
#[derive(Parser, Debug)]
#[command(name = "combat_sim")]
#[command(about = "Run a fight between combatants loaded from a definitions file")]
struct Args {
    /// Definitions document with combatants and their gear
    #[arg(long, default_value = "data/duel.toml")]
    definitions: PathBuf,

    /// Engine configuration overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds before the fight is called
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f64,

    #[arg(long, value_enum, default_value_t = Rules::Standard)]
    rules: Rules,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Log every combat event
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct CombatantSummary {
    name: String,
    side: u32,
    state: String,
    health: f64,
    stamina: f64,
    wounds: usize,
}

impl CombatantSummary {
    fn of(combatant: &Combatant) -> Self {
        Self {
            name: combatant.name.clone(),
            side: combatant.side,
            state: format!("{:?}", combatant.state),
            health: combatant.body.health_fraction(),
            stamina: combatant.stamina.current,
            wounds: combatant.body.wounds.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulationResult {
    seed: u64,
    elapsed: f64,
    turns: usize,
    moves: usize,
    /// Still fighting when time ran out
    unfinished: bool,
    /// The only side left standing
    winner: Option<u32>,
    rejected_definitions: usize,
    combatants: Vec<CombatantSummary>,
}

fn run(args: &Args, seed: u64) -> Result<SimulationResult> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let report = load_definitions(&args.definitions)?;
    for err in &report.rejected {
        warn!(error = %err, "skipping definition");
    }
    let defs = &report.definitions;

    let mut builder = Engine::builder()
        .config(config)
        .seed(seed)
        .rules(args.rules.session_rules())
        .terrain(defs.world());
    if args.verbose {
        builder = builder.observer(TracingObserver);
    }
    let mut engine = builder.build()?;

    let mut ids = Vec::new();
    for (index, template) in defs.combatants.iter().enumerate() {
        let combatant = template.build(CombatantId(index as u64 + 1), defs)?;
        ids.push(engine.add_combatant(combatant));
    }

    let mut joined = 0;
    for &attacker in &ids {
        let target = engine.combatant(attacker).and_then(|me| {
            engine
                .combatants()
                .find(|other| other.is_opponent_of(me))
                .map(|other| other.id)
        });
        if let Some(target) = target {
            engine.join_combat(attacker, target)?;
            joined += 1;
        }
    }
    if joined == 0 {
        return Err(CombatError::InvalidDefinition {
            kind: "definitions",
            name: args.definitions.display().to_string(),
            reason: "no two combatants on opposing sides".to_string(),
        });
    }
    info!(combatants = ids.len(), seed, "fight started");

    let turns = engine.run_until(args.max_seconds)?;

    let standing: Vec<&Combatant> = engine
        .combatants()
        .filter(|c| !c.is_dead() && !c.is_incapacitated())
        .collect();
    let winner = match standing.first() {
        Some(first) if standing.iter().all(|c| c.side == first.side) => Some(first.side),
        _ => None,
    };

    let mut combatants: Vec<&Combatant> = engine.combatants().collect();
    combatants.sort_by_key(|c| c.id);

    let result = SimulationResult {
        seed,
        elapsed: engine.now(),
        turns,
        moves: engine.events().moves(),
        unfinished: engine.sessions().next().is_some(),
        winner,
        rejected_definitions: report.rejected.len(),
        combatants: combatants.into_iter().map(CombatantSummary::of).collect(),
    };
    Ok(result)
}

fn print_text(result: &SimulationResult) {
    println!("Combat Result");
    println!("=============");
    match result.winner {
        Some(side) => println!("Winner: side {}", side),
        None => println!("Winner: none"),
    }
    println!("Elapsed: {:.1}s", result.elapsed);
    println!("Turns: {}  Moves: {}", result.turns, result.moves);
    if result.unfinished {
        println!("(time ran out before the fight ended)");
    }
    println!("Seed: {}", result.seed);
    println!();
    for c in &result.combatants {
        println!(
            "  {:<16} side {} {:<12} health {:>5.1}% stamina {:>5.1} wounds {}",
            c.name,
            c.side,
            c.state,
            c.health * 100.0,
            c.stamina,
            c.wounds
        );
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);

    let result = match run(&args, seed) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.format {
        Format::Json => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Format::Text => print_text(&result),
    }
    ExitCode::SUCCESS
}
