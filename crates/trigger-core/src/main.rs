//! Headless trigger zone simulator.
//!
//! Builds a zone layout, random-walks a crowd of agents through it and logs
//! every Entering/Leaving event as JSONL.

use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use trigger_core::{
    demo_layout, AgentId, EventLogger, EventType, TriggerCode, TriggerConfig, TriggerEvent,
    TriggerSystem, Vec2, ZoneLayout,
};

/// Command line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "trigger_sim")]
#[command(about = "Random-walk agents through trigger zones and log the events")]
struct Args {
    /// Zone layout TOML file (a built-in demo town when omitted)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Trigger system configuration TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of agents to spawn
    #[arg(long, default_value_t = 50)]
    agents: usize,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// Maximum distance an agent moves per tick on each axis
    #[arg(long, default_value_t = 1.0)]
    step: f32,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output file for the JSONL event log
    #[arg(long, default_value = "output/events.jsonl")]
    events: PathBuf,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn random_point(rng: &mut SmallRng, system: &TriggerSystem) -> Vec2 {
    match system.world_bounds() {
        Some(world) => Vec2::new(
            rng.gen_range(world.min.x..=world.max.x),
            rng.gen_range(world.min.y..=world.max.y),
        ),
        None => Vec2::ZERO,
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    println!("Trigger Zone Simulator");
    println!("======================");
    println!("Seed: {}", args.seed);
    println!("Agents: {}", args.agents);
    println!("Ticks: {}", args.ticks);
    println!();

    let layout = match &args.layout {
        Some(path) => ZoneLayout::from_file(path)?,
        None => demo_layout(),
    };
    let config = match &args.config {
        Some(path) => TriggerConfig::from_file(path)?,
        None => TriggerConfig::default(),
    };

    // Build the zone graph
    let mut system = TriggerSystem::new(config);
    let ids = system.build(&layout.bounds())?;
    if let Some(stats) = system.stats() {
        println!(
            "Built {} zones: {} overlaps, {} colors, {} cells (max {} candidates per cell)",
            stats.zones, stats.overlaps, stats.colors_used, stats.cells, stats.max_cell_candidates
        );
    }

    // Every zone feeds one shared buffer, drained into the log each tick
    let buffer: Rc<RefCell<Vec<TriggerEvent>>> = Rc::new(RefCell::new(Vec::new()));
    for &zone in &ids {
        let buffer = Rc::clone(&buffer);
        system.add_callback(zone, move |event| buffer.borrow_mut().push(*event))?;
    }

    if let Some(parent) = args.events.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut logger = EventLogger::new(&args.events)?;
    let mut rng = SmallRng::seed_from_u64(args.seed);

    // Spawn agents
    let agents: Vec<AgentId> = (0..args.agents).map(|_| system.create_agent()).collect();
    for &agent in &agents {
        let start = random_point(&mut rng, &system);
        system.initialize_agent(agent, start)?;
    }
    logger.log_batch(0, &buffer.borrow_mut().drain(..).collect::<Vec<_>>())?;

    let mut entering = vec![0u64; ids.len()];
    let mut leaving = vec![0u64; ids.len()];
    let mut unreachable = 0u64;
    let step = args.step.abs();

    for tick in 1..=args.ticks {
        for &agent in &agents {
            let Some(current) = system.agent(agent) else {
                continue;
            };
            if !current.is_initialized() {
                let start = random_point(&mut rng, &system);
                system.initialize_agent(agent, start)?;
                continue;
            }

            let delta = Vec2::new(
                rng.gen_range(-step..=step),
                rng.gen_range(-step..=step),
            );
            let target = current.position() + delta;
            if system.update_position(agent, target)? == TriggerCode::UnreachablePosition {
                unreachable += 1;
            }

            // Walked off the map: respawn somewhere inside
            if system.world_bounds().is_some_and(|w| !w.contains(target)) {
                let start = random_point(&mut rng, &system);
                system.update_position(agent, start)?;
            }
        }

        let events: Vec<TriggerEvent> = buffer.borrow_mut().drain(..).collect();
        for event in &events {
            match event.event_type {
                EventType::Entering => entering[event.zone_id.index()] += 1,
                EventType::Leaving => leaving[event.zone_id.index()] += 1,
            }
        }
        logger.log_batch(tick, &events)?;
    }
    logger.flush()?;

    println!();
    println!("Simulation complete: {} events logged", logger.event_count());
    println!("Unreachable updates: {}", unreachable);
    println!();
    println!("{:<16} {:>10} {:>10}", "zone", "entering", "leaving");
    for &zone in &ids {
        let name = layout
            .name_of(zone)
            .map(str::to_string)
            .unwrap_or_else(|| zone.to_string());
        println!(
            "{:<16} {:>10} {:>10}",
            name,
            entering[zone.index()],
            leaving[zone.index()]
        );
    }
    println!();
    println!("Events written to {}", args.events.display());

    Ok(())
}
