use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{info, trace, warn};

use crate::graph::City;
use crate::report::DestructionReport;
use crate::roster::DeathCause;
use crate::world::World;

/// Sole consumer of destruction events. Removes cities hosting a battle and
/// kills both combatants, at most once per city.
pub struct DestructionWorker<F> {
    world: Arc<World>,
    observer: F,
    reports: Vec<DestructionReport>,
}

impl<F> DestructionWorker<F>
where
    F: FnMut(&DestructionReport),
{
    pub fn new(world: Arc<World>, observer: F) -> Self {
        Self {
            world,
            observer,
            reports: Vec::new(),
        }
    }

    /// Consume events until every sender is dropped and the channel is empty.
    pub fn run(mut self, events: Receiver<String>) -> Vec<DestructionReport> {
        for city in events.iter() {
            self.process(&city);
        }
        trace!(
            target: "invasion::destroyer",
            destroyed = self.reports.len(),
            "destruction_channel.drained"
        );
        self.reports
    }

    /// Process whatever is queued right now without blocking.
    pub fn drain(&mut self, events: &Receiver<String>) -> usize {
        let mut processed = 0;
        while let Ok(city) = events.try_recv() {
            self.process(&city);
            processed += 1;
        }
        processed
    }

    /// Apply one destruction event. Stale events (already destroyed, missing,
    /// or no longer full) are skipped and only counted.
    pub fn process(&mut self, city: &str) -> Option<DestructionReport> {
        if city.is_empty() {
            return None;
        }

        let report = {
            let mut guard = self.world.lock();
            let state = &mut *guard;

            if state.is_destroyed(city) {
                state.metrics.duplicate_events += 1;
                trace!(target: "invasion::destroyer", city, "event.skipped=duplicate");
                return None;
            }
            let Some((first, second)) = state.graph.get(city).and_then(City::combatants) else {
                state.metrics.transient_events += 1;
                trace!(target: "invasion::destroyer", city, "event.skipped=not_full");
                return None;
            };

            state.mark_destroyed(city);
            let roads_removed = state
                .graph
                .remove_city(city)
                .map(|(_, roads_removed)| roads_removed)
                .unwrap_or_default();
            for id in [first, second] {
                let cause = DeathCause::Battle {
                    city: city.to_string(),
                };
                if let Err(err) = state.roster.kill(id, cause) {
                    warn!(target: "invasion::destroyer", alien = %id, error = %err, "alien.kill_failed");
                }
            }

            state.metrics.cities_destroyed += 1;
            state.metrics.aliens_killed += 2;
            state.metrics.roads_removed += roads_removed as u64;
            DestructionReport {
                sequence: state.metrics.cities_destroyed,
                city: city.to_string(),
                aliens: [first, second],
                roads_removed,
            }
        };

        info!(
            target: "invasion::destroyer",
            city = %report.city,
            first = %report.aliens[0],
            second = %report.aliens[1],
            roads_removed = report.roads_removed,
            "city.destroyed"
        );
        (self.observer)(&report);
        self.reports.push(report.clone());
        Some(report)
    }

    pub fn reports(&self) -> &[DestructionReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<DestructionReport> {
        self.reports
    }
}
