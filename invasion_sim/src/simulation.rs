use std::sync::Arc;
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ExecutionMode, SimulationConfig};
use crate::deployer::ReserveDeployer;
use crate::destroyer::DestructionWorker;
use crate::driver::{SimulationDriver, StopReason};
use crate::graph::CityGraph;
use crate::hashing::stream_seed;
use crate::metrics::SimulationMetrics;
use crate::report::{DestructionReport, RemainingCities};
use crate::roster::{AlienId, DeathCause};
use crate::world::{SetupError, World};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

/// Everything a caller needs once the run is over.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub seed: u64,
    pub stop_reason: StopReason,
    pub rounds: u32,
    pub destroyed: Vec<DestructionReport>,
    pub remaining: RemainingCities,
    pub survivors: Vec<AlienId>,
    pub reserve: Vec<AlienId>,
    pub stranded: Vec<AlienId>,
    pub metrics: SimulationMetrics,
}

/// A populated world plus the configuration to run it with.
pub struct Simulation {
    world: Arc<World>,
    config: SimulationConfig,
    seed: u64,
}

impl Simulation {
    /// Populate `graph` with `alien_count` aliens. Placement and movement draw
    /// from separate streams of the configured seed, or of a fresh one.
    pub fn new(
        graph: CityGraph,
        alien_count: u32,
        config: SimulationConfig,
    ) -> Result<Self, SetupError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut placement_rng = ChaCha8Rng::seed_from_u64(stream_seed(seed, "placement"));
        let world = World::populate(graph, alien_count, &mut placement_rng)?;
        Ok(Self {
            world: Arc::new(world),
            config,
            seed,
        })
    }

    /// Run an already assembled world.
    pub fn from_world(world: World, config: SimulationConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            world: Arc::new(world),
            config,
            seed,
        }
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(self) -> Result<SimulationOutcome, SimulationError> {
        self.run_with(|_| {})
    }

    /// Run to completion, handing each destruction to `observer` as it
    /// happens.
    pub fn run_with<F>(self, observer: F) -> Result<SimulationOutcome, SimulationError>
    where
        F: FnMut(&DestructionReport) + Send + 'static,
    {
        info!(
            target: "invasion::simulation",
            seed = self.seed,
            execution = ?self.config.execution,
            "simulation.started"
        );
        match self.config.execution {
            ExecutionMode::Concurrent => self.run_concurrent(observer),
            ExecutionMode::Lockstep => Ok(self.run_lockstep(observer)),
        }
    }

    fn driver_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(stream_seed(self.seed, "driver"))
    }

    fn run_concurrent<F>(self, observer: F) -> Result<SimulationOutcome, SimulationError>
    where
        F: FnMut(&DestructionReport) + Send + 'static,
    {
        let (sender, receiver) =
            crossbeam_channel::bounded::<String>(self.config.destruction_queue_capacity);

        // The destroyer starts first: with a zero-capacity channel every
        // producer send waits for it to receive.
        let destroyer = DestructionWorker::new(Arc::clone(&self.world), observer);
        let destroyer_handle = thread::spawn(move || destroyer.run(receiver));

        let deployer = ReserveDeployer::new(
            Arc::clone(&self.world),
            sender.clone(),
            self.config.deployer_idle(),
        );
        let deployer_handle = thread::spawn(move || deployer.run());

        let driver =
            SimulationDriver::new(Arc::clone(&self.world), sender, self.driver_rng(), &self.config);
        let (stop_reason, rounds) = driver.run();

        deployer_handle
            .join()
            .map_err(|_| SimulationError::WorkerPanicked("deployer"))?;
        let destroyed = destroyer_handle
            .join()
            .map_err(|_| SimulationError::WorkerPanicked("destroyer"))?;

        Ok(self.outcome(stop_reason, rounds, destroyed))
    }

    fn run_lockstep<F>(self, observer: F) -> SimulationOutcome
    where
        F: FnMut(&DestructionReport),
    {
        let (sender, receiver) = crossbeam_channel::unbounded::<String>();
        let mut destroyer = DestructionWorker::new(Arc::clone(&self.world), observer);
        let mut deployer = ReserveDeployer::new(
            Arc::clone(&self.world),
            sender.clone(),
            self.config.deployer_idle(),
        );
        let mut driver =
            SimulationDriver::new(Arc::clone(&self.world), sender, self.driver_rng(), &self.config);

        let stop_reason = loop {
            if driver.round_limit_reached() {
                break StopReason::RoundLimit;
            }
            deployer.deploy_pass();
            destroyer.drain(&receiver);
            let summary = driver.run_round();
            destroyer.drain(&receiver);
            if let Some(reason) = driver.stop_reason(&summary) {
                break reason;
            }
        };
        let rounds = driver.finish(stop_reason);
        drop(deployer);
        destroyer.drain(&receiver);

        let destroyed = destroyer.into_reports();
        self.outcome(stop_reason, rounds, destroyed)
    }

    fn outcome(
        &self,
        stop_reason: StopReason,
        rounds: u32,
        destroyed: Vec<DestructionReport>,
    ) -> SimulationOutcome {
        let state = self.world.lock();
        for violation in state.invariant_violations() {
            warn!(target: "invasion::simulation", %violation, "world.invariant_broken");
        }

        let stranded = state
            .roster
            .dead()
            .iter()
            .filter(|(_, cause)| matches!(cause, DeathCause::Stranded { .. }))
            .map(|(id, _)| *id)
            .collect();

        SimulationOutcome {
            seed: self.seed,
            stop_reason,
            rounds,
            destroyed,
            remaining: RemainingCities::capture(&state.graph),
            survivors: state.roster.active_ids(),
            reserve: state.roster.reserve_ids(),
            stranded,
            metrics: state.metrics.clone(),
        }
    }
}
