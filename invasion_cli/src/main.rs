use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use invasion_sim::mapgen::{grid_map, parse_grid_size};
use invasion_sim::{
    load_map, load_simulation_config_from_env, parse_alien_count, CityGraph, ExecutionMode,
    MoveCapPolicy, Simulation, SimulationConfig,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Alien invasion simulation", long_about = None)]
struct Cli {
    /// Number of aliens to unleash.
    #[arg(allow_hyphen_values = true)]
    aliens: String,
    /// Map file, one city per line.
    #[arg(long, default_value = "map.txt")]
    map: PathBuf,
    /// Generate a WIDTHxHEIGHT grid map instead of reading one.
    #[arg(long, value_name = "WxH")]
    grid: Option<String>,
    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_rounds: Option<u32>,
    /// Moves each alien may make before the cap policy applies.
    #[arg(long)]
    max_moves: Option<u32>,
    #[arg(long, value_enum)]
    move_cap_policy: Option<CapPolicyArg>,
    /// Run all workers on one thread, round by round.
    #[arg(long)]
    lockstep: bool,
    /// JSON config file; defaults to INVASION_CONFIG_PATH or the builtin.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the final outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CapPolicyArg {
    Stop,
    Retire,
}

impl From<CapPolicyArg> for MoveCapPolicy {
    fn from(arg: CapPolicyArg) -> Self {
        match arg {
            CapPolicyArg::Stop => MoveCapPolicy::StopSimulation,
            CapPolicyArg::Retire => MoveCapPolicy::RetireAlien,
        }
    }
}

impl Cli {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)?,
            None => load_simulation_config_from_env().0,
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.max_rounds = max_rounds;
        }
        if let Some(max_moves) = self.max_moves {
            config.max_moves_per_alien = max_moves;
        }
        if let Some(policy) = self.move_cap_policy {
            config.move_cap_policy = policy.into();
        }
        if self.lockstep {
            config.execution = ExecutionMode::Lockstep;
        }
        Ok(config)
    }

    fn city_graph(&self) -> Result<CityGraph> {
        match &self.grid {
            Some(raw) => {
                let (width, height) = parse_grid_size(raw)
                    .ok_or_else(|| eyre!("grid size must look like 8x5, got {raw:?}"))?;
                Ok(grid_map(width, height))
            }
            None => load_map(&self.map)
                .wrap_err_with(|| format!("could not load map {}", self.map.display())),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let aliens = parse_alien_count(&cli.aliens)?;
    let config = cli.simulation_config()?;
    let graph = cli.city_graph()?;
    info!(cities = graph.len(), aliens, "Starting invasion");

    let simulation = Simulation::new(graph, aliens, config)?;
    let json = cli.json;
    let outcome = simulation.run_with(move |report| {
        if !json {
            println!("{report}");
        }
    })?;

    info!(
        seed = outcome.seed,
        rounds = outcome.rounds,
        stop_reason = %outcome.stop_reason,
        "Invasion over"
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", outcome.remaining);
    }
    Ok(())
}
