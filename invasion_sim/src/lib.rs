//! Core engine for the alien invasion simulation.
//!
//! Aliens wander a directed map of cities one random road per round. Two
//! aliens in one city fight, destroying the city, each other and every road
//! leading there. Three workers share the [`World`] behind a single lock:
//! the [`SimulationDriver`] moves aliens, the [`DestructionWorker`] consumes
//! destruction events, and the [`ReserveDeployer`] lands aliens that did not
//! fit on the map at startup. [`Simulation`] wires them together.

pub mod config;
mod deployer;
mod destroyer;
mod driver;
mod graph;
pub mod hashing;
pub mod map_file;
pub mod mapgen;
pub mod metrics;
mod report;
mod roster;
mod simulation;
mod world;

pub use config::{
    load_simulation_config_from_env, ExecutionMode, MoveCapPolicy, SimulationConfig,
    SimulationConfigError,
};
pub use deployer::{DeployPass, ReserveDeployer};
pub use destroyer::DestructionWorker;
pub use driver::{RoundSummary, SimulationDriver, StopReason};
pub use graph::{opposite_direction, City, CityGraph, UnpairedRoad, CITY_CAPACITY};
pub use map_file::{format_map, load_map, parse_map, MapError};
pub use metrics::SimulationMetrics;
pub use report::{DestructionReport, RemainingCities, RemainingCity, RemainingRoad};
pub use roster::{
    Alien, AlienId, AlienRoster, DeathCause, Placement, Population, RosterError,
};
pub use simulation::{Simulation, SimulationError, SimulationOutcome};
pub use world::{parse_alien_count, SetupError, World, WorldState};
