mod generator;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tdr_budgets::{BudgetContext, BudgetSet};
use tdr_common::db::core::NetlistDB;
use tdr_common::db::indices::NetId;
use tdr_common::timing::{NS, TimingOracle};
use tdr_common::util::config::Config;
use tdr_common::util::logger;
use tdr_common::util::profiler::ScopedTimer;
use tdr_timing::StaEngine;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a benchmark, allocate route budgets and report them.
    Allocate,
    /// Allocate, then replay random congestion through the budget feedback loop.
    Simulate {
        #[arg(long, default_value_t = 20)]
        iterations: usize,
        #[arg(long, default_value_t = 0.6)]
        congestion_rate: f64,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = load_config(&args.config)?;
    config.validate()?;

    let command = args.command.unwrap_or(Commands::Allocate);
    if let Err(e) = run(&config, command) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            path
        );
        return Ok(Config::default());
    }
    log::info!("Loading configuration from {:?}", path);
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
    toml::from_str(&config_str).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
}

fn run(config: &Config, command: Commands) -> anyhow::Result<()> {
    let bench = generator::generate(&config.generator)?;

    let sta = StaEngine::new(&bench.graph, &bench.lookup, &config.timing)
        .map_err(|e| anyhow::anyhow!("Timing graph rejected: {}", e))?;
    let estimate = sta.refresh(&bench.delays);
    if let Some(wns) = estimate.worst_setup_slack() {
        log::info!("Worst setup slack at estimated delays: {:.3} ns", wns / NS);
    }

    let ctx = BudgetContext::new(&bench.db, &bench.lookup, &bench.delays);
    let mut budgets = BudgetSet::load(&ctx, &config.budgets, &sta, &estimate)
        .map_err(|e| anyhow::anyhow!("Route budget allocation failed: {}", e))?;

    match command {
        Commands::Allocate => Ok(()),
        Commands::Simulate {
            iterations,
            congestion_rate,
        } => simulate(
            &mut budgets,
            &bench.db,
            iterations,
            congestion_rate,
            config.generator.seed,
        ),
    }
}

/// Stands in for the router's negotiation loop: each iteration reports every
/// net congested or not at random, then relaxes chronically congested nets.
fn simulate(
    budgets: &mut BudgetSet,
    db: &NetlistDB,
    iterations: usize,
    congestion_rate: f64,
    seed: u64,
) -> anyhow::Result<()> {
    if !budgets.is_active() {
        log::warn!("Route budgets are disabled; congestion feedback has nothing to relax.");
        return Ok(());
    }

    let rate = congestion_rate.clamp(0.0, 1.0);
    if (rate - congestion_rate).abs() > f64::EPSILON {
        log::warn!(
            "Congestion rate {:.2} is out of range. Clamped to {:.2}",
            congestion_rate,
            rate
        );
    }

    let _timer = ScopedTimer::new("Congestion feedback simulation");
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut total_relaxed = 0;

    for iter in 1..=iterations {
        let mut congested = 0;
        for inet in 0..db.num_nets() {
            let net = NetId::new(inet);
            if rng.gen_bool(rate) {
                budgets.update_congested(net);
                congested += 1;
            } else {
                budgets.update_uncongested(net);
            }
        }

        let relaxed = budgets.relax();
        total_relaxed += relaxed;
        log::info!(
            "Iter {:>3}: {} nets congested, {} sink budgets relaxed, mean short-path criticality {:.4}",
            iter,
            congested,
            relaxed,
            mean_short_path_criticality(budgets, db)?
        );
    }

    log::info!(
        "Simulation finished: {} relaxations over {} iterations",
        total_relaxed,
        iterations
    );
    Ok(())
}

fn mean_short_path_criticality(budgets: &BudgetSet, db: &NetlistDB) -> anyhow::Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (inet, net) in db.nets.iter().enumerate() {
        for ipin in 1..net.pins.len() {
            sum += budgets.get_short_path_criticality(NetId::new(inet), ipin)?;
            count += 1;
        }
    }
    Ok(if count == 0 { 0.0 } else { sum / count as f64 })
}
