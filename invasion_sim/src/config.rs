use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUILTIN_SIMULATION_CONFIG: &str = include_str!("data/simulation_config.json");

/// Environment variable naming a JSON file that overrides the builtin config.
pub const CONFIG_PATH_ENV: &str = "INVASION_CONFIG_PATH";

/// What happens when an alien reaches `max_moves_per_alien`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveCapPolicy {
    /// The first alien to hit the cap ends the whole simulation after the
    /// current round.
    #[default]
    StopSimulation,
    /// The alien stops moving but stays in its city, where it can still be
    /// caught in a battle.
    RetireAlien,
}

/// How the driver, destroyer and deployer are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Three threads sharing the world, joined at shutdown.
    #[default]
    Concurrent,
    /// Deployer pass, driver round and destroyer drain on one thread per
    /// round. Reproducible for a fixed seed.
    Lockstep,
}

/// Parameters for one invasion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_rounds: u32,
    pub max_moves_per_alien: u32,
    pub move_cap_policy: MoveCapPolicy,
    pub seed: Option<u64>,
    /// Capacity of the destruction channel. Zero is a synchronous handoff.
    pub destruction_queue_capacity: usize,
    pub deployer_idle_ms: u64,
    pub execution: ExecutionMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 10_000,
            max_moves_per_alien: 10_000,
            move_cap_policy: MoveCapPolicy::StopSimulation,
            seed: None,
            destruction_queue_capacity: 0,
            deployer_idle_ms: 1,
            execution: ExecutionMode::Concurrent,
        }
    }
}

impl SimulationConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_SIMULATION_CONFIG)
            .expect("builtin simulation config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimulationConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, SimulationConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| SimulationConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    pub fn deployer_idle(&self) -> Duration {
        Duration::from_millis(self.deployer_idle_ms)
    }
}

#[derive(Debug, Error)]
pub enum SimulationConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read simulation config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load the config named by `INVASION_CONFIG_PATH`, falling back to the
/// builtin defaults when the variable is unset or the file is unusable.
pub fn load_simulation_config_from_env() -> (SimulationConfig, Option<PathBuf>) {
    let Some(path) = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) else {
        tracing::debug!(target: "invasion::config", "simulation_config.loaded=builtin");
        return (SimulationConfig::builtin(), None);
    };

    match SimulationConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "invasion::config",
                path = %path.display(),
                "simulation_config.loaded=file"
            );
            (config, Some(path))
        }
        Err(err) => {
            tracing::warn!(
                target: "invasion::config",
                path = %path.display(),
                error = %err,
                "simulation_config.load_failed"
            );
            (SimulationConfig::builtin(), None)
        }
    }
}
