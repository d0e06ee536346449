use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::graph::CityGraph;
use crate::metrics::SimulationMetrics;
use crate::roster::{Alien, AlienId, AlienRoster};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("alien count must be a positive integer, got {0:?}")]
    InvalidAlienCount(String),
}

/// Validate a user-supplied alien count.
pub fn parse_alien_count(raw: &str) -> Result<u32, SetupError> {
    match raw.trim().parse::<i64>() {
        Ok(count) if count > 0 => {
            u32::try_from(count).map_err(|_| SetupError::InvalidAlienCount(raw.to_string()))
        }
        _ => Err(SetupError::InvalidAlienCount(raw.to_string())),
    }
}

/// Everything the workers share: the map, the roster and the bookkeeping
/// that ties them together. Only ever touched through [`World::lock`].
#[derive(Debug)]
pub struct WorldState {
    pub graph: CityGraph,
    pub roster: AlienRoster,
    destroyed: BTreeSet<String>,
    pub metrics: SimulationMetrics,
    finished: bool,
}

impl WorldState {
    pub fn new(graph: CityGraph, roster: AlienRoster) -> Self {
        Self {
            graph,
            roster,
            destroyed: BTreeSet::new(),
            metrics: SimulationMetrics::default(),
            finished: false,
        }
    }

    pub fn is_destroyed(&self, city: &str) -> bool {
        self.destroyed.contains(city)
    }

    /// Record `city` as destroyed. Returns `false` if it already was.
    pub(crate) fn mark_destroyed(&mut self, city: &str) -> bool {
        self.destroyed.insert(city.to_string())
    }

    pub fn destroyed(&self) -> &BTreeSet<String> {
        &self.destroyed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }

    /// Place an alien into `city` by id. Returns whether it moved in.
    pub(crate) fn invade(&mut self, city: &str, id: AlienId) -> bool {
        let Self { graph, roster, .. } = self;
        match roster.get_mut(id) {
            Some(alien) => graph.invade(city, alien),
            None => false,
        }
    }

    /// Cross-check the graph and the roster. Returns one message per broken
    /// invariant; an empty list means the state is consistent.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for city in self.graph.cities() {
            let occupants = city.occupants();
            if city.is_full() != occupants.iter().all(Option::is_some) {
                violations.push(format!("city {} has a stale full flag", city.name()));
            }
            for (slot, occupant) in occupants.iter().enumerate() {
                let Some(id) = occupant else { continue };
                let points_back = self
                    .roster
                    .get(*id)
                    .and_then(Alien::placement)
                    .is_some_and(|p| p.city == city.name() && p.slot == slot);
                if !points_back {
                    violations.push(format!(
                        "city {} slot {} holds alien {} placed elsewhere",
                        city.name(),
                        slot,
                        id
                    ));
                }
            }
        }

        for alien in self.roster.iter() {
            let active = self.roster.is_active(alien.id());
            if active != (alien.is_alive() && alien.placement().is_some()) {
                violations.push(format!("alien {} population disagrees with state", alien.id()));
            }
            if !alien.is_alive() && alien.placement().is_some() {
                violations.push(format!("dead alien {} still has a city", alien.id()));
            }
            if let Some(placement) = alien.placement() {
                let occupies = self
                    .graph
                    .get(&placement.city)
                    .is_some_and(|city| city.occupants()[placement.slot] == Some(alien.id()));
                if !occupies {
                    violations.push(format!(
                        "alien {} placed in {} but not in its slot",
                        alien.id(),
                        placement.city
                    ));
                }
            }
        }

        for name in &self.destroyed {
            if self.graph.contains(name) {
                violations.push(format!("destroyed city {} is still on the map", name));
            }
        }

        violations
    }
}

/// The shared aggregate handed to every worker behind one coarse lock.
#[derive(Debug)]
pub struct World {
    state: Mutex<WorldState>,
}

impl World {
    pub fn new(state: WorldState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Create `alien_count` aliens and spread them over the map, at most one
    /// per city in a shuffled city order. Aliens left without a city start
    /// in the reserve.
    pub fn populate<R: Rng + ?Sized>(
        mut graph: CityGraph,
        alien_count: u32,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        if alien_count == 0 {
            return Err(SetupError::InvalidAlienCount(alien_count.to_string()));
        }

        let mut city_names = graph.names();
        city_names.shuffle(rng);

        let mut roster = AlienRoster::new();
        let mut vacant = city_names.iter();
        for id in 1..=alien_count {
            let mut alien = Alien::new(AlienId(id));
            if let Some(city) = vacant.next() {
                graph.invade(city, &mut alien);
            }
            roster.enlist(alien);
        }

        tracing::info!(
            target: "invasion::world",
            cities = graph.len(),
            active = roster.active_len(),
            reserve = roster.reserve_len(),
            "world.populated"
        );
        Ok(Self::new(WorldState::new(graph, roster)))
    }

    pub fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().expect("world state mutex poisoned")
    }

    pub fn into_state(self) -> WorldState {
        self.state
            .into_inner()
            .expect("world state mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_file::parse_map;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn alien_count_validation() {
        assert_eq!(parse_alien_count("5"), Ok(5));
        assert_eq!(parse_alien_count(" 12 "), Ok(12));
        for raw in ["0", "-3", "ten", "", "99999999999"] {
            assert_eq!(
                parse_alien_count(raw),
                Err(SetupError::InvalidAlienCount(raw.to_string()))
            );
        }
    }

    #[test]
    fn zero_aliens_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = World::populate(parse_map("A north=B\n"), 0, &mut rng).unwrap_err();
        assert_eq!(err, SetupError::InvalidAlienCount("0".to_string()));
    }

    #[test]
    fn excess_aliens_wait_in_reserve() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let graph = parse_map("A north=B\nB south=A\nC west=A\n");
        let world = World::populate(graph, 5, &mut rng).expect("world builds");
        let state = world.lock();

        assert_eq!(state.roster.active_len(), 3);
        assert_eq!(state.roster.reserve_len(), 2);
        assert_eq!(state.roster.reserve_ids(), vec![AlienId(4), AlienId(5)]);
        assert!(state.graph.cities().all(|city| !city.is_full()));
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn placement_depends_on_seed_only() {
        let graph = parse_map("A north=B\nB south=A\nC west=A\nD east=C\n");
        let place = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let world = World::populate(graph.clone(), 2, &mut rng).expect("world builds");
            let state = world.into_state();
            state
                .roster
                .iter()
                .map(|alien| alien.current_city().map(str::to_string))
                .collect::<Vec<_>>()
        };
        assert_eq!(place(3), place(3));
    }

    #[test]
    fn invariant_check_flags_stale_destroyed_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let world = World::populate(parse_map("A north=B\n"), 1, &mut rng).expect("world builds");
        let mut state = world.lock();
        assert!(state.mark_destroyed("A"));
        assert!(!state.mark_destroyed("A"));
        assert_eq!(state.invariant_violations().len(), 1);
    }
}
