use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Identifier of an alien, assigned once at creation and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AlienId(pub u32);

impl AlienId {
    /// Occupant slot this alien prefers when entering a city.
    pub fn preferred_slot(self) -> usize {
        (self.0 % 2) as usize
    }
}

impl fmt::Display for AlienId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an alien currently stands: the city and the occupant slot it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub city: String,
    pub slot: usize,
}

#[derive(Debug, Clone)]
pub struct Alien {
    id: AlienId,
    placement: Option<Placement>,
    alive: bool,
    moves: u32,
}

impl Alien {
    pub fn new(id: AlienId) -> Self {
        Self {
            id,
            placement: None,
            alive: true,
            moves: 0,
        }
    }

    pub fn id(&self) -> AlienId {
        self.id
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn current_city(&self) -> Option<&str> {
        self.placement.as_ref().map(|placement| placement.city.as_str())
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }

    pub(crate) fn take_placement(&mut self) -> Option<Placement> {
        self.placement.take()
    }

    pub(crate) fn record_move(&mut self) -> u32 {
        self.moves = self.moves.saturating_add(1);
        self.moves
    }
}

/// Why an alien ended up in the dead population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum DeathCause {
    Battle { city: String },
    Stranded { city: String },
}

/// Population an alien currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    Active,
    Reserve,
    Dead,
}

/// Error returned when a population transition is requested for an alien
/// that is not in the expected source population.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("alien {0} is not registered")]
    UnknownAlien(AlienId),
    #[error("alien {id} is {actual:?}, expected {expected:?}")]
    WrongPopulation {
        id: AlienId,
        expected: Population,
        actual: Population,
    },
}

/// Full roster of aliens split into three disjoint populations.
///
/// Transitions are one-way: reserve → active and active → dead.
#[derive(Debug, Clone, Default)]
pub struct AlienRoster {
    aliens: BTreeMap<AlienId, Alien>,
    active: BTreeSet<AlienId>,
    reserve: BTreeSet<AlienId>,
    dead: BTreeMap<AlienId, DeathCause>,
}

impl AlienRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created alien. Placed aliens join the active
    /// population, unplaced ones wait in the reserve.
    pub fn enlist(&mut self, alien: Alien) {
        let id = alien.id;
        if alien.placement.is_some() {
            self.active.insert(id);
        } else {
            self.reserve.insert(id);
        }
        self.aliens.insert(id, alien);
    }

    pub fn get(&self, id: AlienId) -> Option<&Alien> {
        self.aliens.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: AlienId) -> Option<&mut Alien> {
        self.aliens.get_mut(&id)
    }

    pub fn population_of(&self, id: AlienId) -> Option<Population> {
        if self.active.contains(&id) {
            Some(Population::Active)
        } else if self.reserve.contains(&id) {
            Some(Population::Reserve)
        } else if self.dead.contains_key(&id) {
            Some(Population::Dead)
        } else {
            None
        }
    }

    pub fn is_active(&self, id: AlienId) -> bool {
        self.active.contains(&id)
    }

    /// Move a placed reserve alien into the active population.
    pub fn deploy(&mut self, id: AlienId) -> Result<(), RosterError> {
        self.expect_population(id, Population::Reserve)?;
        self.reserve.remove(&id);
        self.active.insert(id);
        Ok(())
    }

    /// Move an active alien into the dead population, clearing its placement.
    ///
    /// The caller is responsible for emptying the occupant slot it held.
    pub fn kill(&mut self, id: AlienId, cause: DeathCause) -> Result<(), RosterError> {
        self.expect_population(id, Population::Active)?;
        self.active.remove(&id);
        if let Some(alien) = self.aliens.get_mut(&id) {
            alien.alive = false;
            alien.placement = None;
        }
        self.dead.insert(id, cause);
        Ok(())
    }

    fn expect_population(&self, id: AlienId, expected: Population) -> Result<(), RosterError> {
        let actual = self
            .population_of(id)
            .ok_or(RosterError::UnknownAlien(id))?;
        if actual == expected {
            Ok(())
        } else {
            Err(RosterError::WrongPopulation {
                id,
                expected,
                actual,
            })
        }
    }

    pub fn active_ids(&self) -> Vec<AlienId> {
        self.active.iter().copied().collect()
    }

    pub fn reserve_ids(&self) -> Vec<AlienId> {
        self.reserve.iter().copied().collect()
    }

    pub fn dead(&self) -> &BTreeMap<AlienId, DeathCause> {
        &self.dead
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn reserve_len(&self) -> usize {
        self.reserve.len()
    }

    pub fn dead_len(&self) -> usize {
        self.dead.len()
    }

    pub fn len(&self) -> usize {
        self.aliens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alien> {
        self.aliens.values()
    }
}
