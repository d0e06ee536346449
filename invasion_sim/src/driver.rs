use std::fmt;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{MoveCapPolicy, SimulationConfig};
use crate::graph::City;
use crate::roster::{AlienId, DeathCause};
use crate::world::World;

/// Why the movement loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    RoundLimit,
    PopulationExhausted,
    MapEmpty,
    MoveCapReached,
    NoMovableAliens,
    DestroyerGone,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::RoundLimit => "round limit reached",
            StopReason::PopulationExhausted => "no aliens left",
            StopReason::MapEmpty => "no cities left",
            StopReason::MoveCapReached => "an alien reached its move cap",
            StopReason::NoMovableAliens => "every remaining alien reached its move cap",
            StopReason::DestroyerGone => "destruction channel closed",
        };
        f.write_str(text)
    }
}

/// What happened during one round of the movement loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub active: usize,
    pub moved: u32,
    pub stranded: u32,
    pub enqueued: u32,
    /// Some alien reached the per-alien move cap this round.
    pub exhausted: bool,
    pub disconnected: bool,
}

enum Step {
    Skipped,
    Moved { exhausted: bool },
    Blocked,
    Retired,
    Stranded,
    Collision(String),
}

/// Moves every active alien one random hop per round and reports full
/// cities to the destroyer.
pub struct SimulationDriver {
    world: Arc<World>,
    events: Sender<String>,
    rng: ChaCha8Rng,
    max_rounds: u32,
    max_moves_per_alien: u32,
    move_cap_policy: MoveCapPolicy,
    round: u32,
}

impl SimulationDriver {
    pub fn new(
        world: Arc<World>,
        events: Sender<String>,
        rng: ChaCha8Rng,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            world,
            events,
            rng,
            max_rounds: config.max_rounds,
            max_moves_per_alien: config.max_moves_per_alien,
            move_cap_policy: config.move_cap_policy,
            round: 0,
        }
    }

    pub fn rounds(&self) -> u32 {
        self.round
    }

    pub fn round_limit_reached(&self) -> bool {
        self.round >= self.max_rounds
    }

    /// Run rounds until a stop condition holds, then mark the world finished
    /// and drop the channel sender.
    pub fn run(mut self) -> (StopReason, u32) {
        let reason = loop {
            if self.round_limit_reached() {
                break StopReason::RoundLimit;
            }
            let summary = self.run_round();
            if let Some(reason) = self.stop_reason(&summary) {
                break reason;
            }
            if summary.active == 0 {
                // Nothing to move until the deployer or destroyer catches up.
                thread::yield_now();
            }
        };
        let rounds = self.finish(reason);
        (reason, rounds)
    }

    /// Advance every alien that was active when the round started.
    pub fn run_round(&mut self) -> RoundSummary {
        self.round += 1;
        let ids = self.world.lock().roster.active_ids();
        let mut summary = RoundSummary {
            round: self.round,
            active: ids.len(),
            ..RoundSummary::default()
        };

        for id in ids {
            match self.step(id) {
                Step::Moved { exhausted } => {
                    summary.moved += 1;
                    summary.exhausted |= exhausted;
                }
                Step::Stranded => summary.stranded += 1,
                Step::Collision(city) => {
                    if self.events.send(city).is_err() {
                        warn!(
                            target: "invasion::driver",
                            round = self.round,
                            "destruction_channel.closed"
                        );
                        summary.disconnected = true;
                        break;
                    }
                    summary.enqueued += 1;
                }
                Step::Skipped | Step::Blocked | Step::Retired => {}
            }
        }

        self.world.lock().metrics.rounds = self.round;
        debug!(
            target: "invasion::driver",
            round = summary.round,
            active = summary.active,
            moved = summary.moved,
            stranded = summary.stranded,
            enqueued = summary.enqueued,
            "round.complete"
        );
        summary
    }

    /// Move one alien. The world lock is released before the caller enqueues
    /// anything, so the destroyer can always make progress.
    fn step(&mut self, id: AlienId) -> Step {
        let mut guard = self.world.lock();
        let state = &mut *guard;

        if !state.roster.is_active(id) {
            return Step::Skipped;
        }
        let Some(alien) = state.roster.get(id) else {
            return Step::Skipped;
        };
        let Some(current) = alien.current_city().map(str::to_string) else {
            return Step::Skipped;
        };
        let moves = alien.moves();

        let Some(city) = state.graph.get(&current) else {
            return Step::Skipped;
        };
        if city.is_full() {
            state.metrics.events_enqueued += 1;
            return Step::Collision(current);
        }

        let roads = state.graph.roads_of(&current);
        if roads.is_empty() {
            if let Some(alien) = state.roster.get_mut(id) {
                state.graph.vacate(alien);
            }
            if let Err(err) = state.roster.kill(
                id,
                DeathCause::Stranded {
                    city: current.clone(),
                },
            ) {
                warn!(target: "invasion::driver", alien = %id, error = %err, "alien.strand_failed");
                return Step::Skipped;
            }
            state.metrics.stranded += 1;
            info!(target: "invasion::driver", alien = %id, city = %current, "alien.stranded");
            return Step::Stranded;
        }

        if self.move_cap_policy == MoveCapPolicy::RetireAlien && moves >= self.max_moves_per_alien
        {
            return Step::Retired;
        }

        let (_, target) = &roads[self.rng.gen_range(0..roads.len())];
        match state.graph.get(target).map(City::is_full) {
            None => {
                state.metrics.blocked_moves += 1;
                Step::Blocked
            }
            Some(true) => {
                state.metrics.events_enqueued += 1;
                Step::Collision(target.clone())
            }
            Some(false) => {
                if !state.invade(target, id) {
                    state.metrics.blocked_moves += 1;
                    return Step::Blocked;
                }
                let moves = state
                    .roster
                    .get_mut(id)
                    .map(|alien| alien.record_move())
                    .unwrap_or_default();
                state.metrics.moves += 1;
                Step::Moved {
                    exhausted: moves >= self.max_moves_per_alien,
                }
            }
        }
    }

    /// Evaluate the termination conditions after a round.
    pub fn stop_reason(&self, summary: &RoundSummary) -> Option<StopReason> {
        if summary.disconnected {
            return Some(StopReason::DestroyerGone);
        }

        let state = self.world.lock();
        if state.graph.is_empty() {
            return Some(StopReason::MapEmpty);
        }
        if state.roster.active_len() == 0 && state.roster.reserve_len() == 0 {
            return Some(StopReason::PopulationExhausted);
        }
        match self.move_cap_policy {
            MoveCapPolicy::StopSimulation if summary.exhausted => {
                Some(StopReason::MoveCapReached)
            }
            MoveCapPolicy::RetireAlien => {
                let can_move = state.roster.iter().any(|alien| {
                    state.roster.is_active(alien.id())
                        && alien.moves() < self.max_moves_per_alien
                });
                let battle_pending = state.graph.cities().any(|city| city.is_full());
                (!can_move && !battle_pending && state.roster.reserve_len() == 0)
                    .then_some(StopReason::NoMovableAliens)
            }
            MoveCapPolicy::StopSimulation => None,
        }
    }

    /// Mark the world finished so the deployer stops, and release the
    /// channel sender by consuming the driver.
    pub fn finish(self, reason: StopReason) -> u32 {
        self.world.lock().mark_finished();
        info!(
            target: "invasion::driver",
            rounds = self.round,
            reason = %reason,
            "simulation.stopped"
        );
        self.round
    }
}
