use std::collections::BTreeMap;

use crate::roster::{Alien, AlienId, Placement};

/// Number of occupant slots per city. A second arrival means battle.
pub const CITY_CAPACITY: usize = 2;

/// A node of the invasion map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    name: String,
    roads: BTreeMap<String, String>,
    occupants: [Option<AlienId>; CITY_CAPACITY],
    full: bool,
}

impl City {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roads: BTreeMap::new(),
            occupants: [None; CITY_CAPACITY],
            full: false,
        }
    }

    /// Builder-style helper used by map loading and tests.
    pub fn with_road(mut self, direction: impl Into<String>, target: impl Into<String>) -> Self {
        self.roads.insert(direction.into(), target.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roads(&self) -> &BTreeMap<String, String> {
        &self.roads
    }

    pub fn occupants(&self) -> [Option<AlienId>; CITY_CAPACITY] {
        self.occupants
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn is_vacant(&self) -> bool {
        self.occupants.iter().all(Option::is_none)
    }

    /// Both occupants, if the city currently hosts a battle.
    pub fn combatants(&self) -> Option<(AlienId, AlienId)> {
        match self.occupants {
            [Some(first), Some(second)] => Some((first, second)),
            _ => None,
        }
    }

    fn open_slot_for(&self, alien: AlienId) -> Option<usize> {
        let preferred = alien.preferred_slot();
        if self.occupants[preferred].is_none() {
            Some(preferred)
        } else {
            self.occupants.iter().position(Option::is_none)
        }
    }

    fn set_slot(&mut self, slot: usize, occupant: Option<AlienId>) {
        self.occupants[slot] = occupant;
        self.full = self.occupants.iter().all(Option::is_some);
    }
}

/// Opposite of a cardinal direction label. Other labels have no opposite.
pub fn opposite_direction(direction: &str) -> Option<&'static str> {
    match direction {
        "north" => Some("south"),
        "south" => Some("north"),
        "east" => Some("west"),
        "west" => Some("east"),
        _ => None,
    }
}

/// A cardinal road whose target does not lead back through the opposite label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpairedRoad {
    pub from: String,
    pub direction: String,
    pub to: String,
}

/// The mutable map: cities keyed by name, with directed labeled roads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityGraph {
    cities: BTreeMap<String, City>,
}

impl CityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a city, replacing any earlier city with the same name.
    pub fn insert(&mut self, city: City) {
        self.cities.insert(city.name.clone(), city);
    }

    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.cities.keys().cloned().collect()
    }

    pub fn road_count(&self) -> usize {
        self.cities.values().map(|city| city.roads.len()).sum()
    }

    /// Ordered `(direction, target)` pairs leaving `city`.
    pub fn roads_of(&self, city: &str) -> Vec<(String, String)> {
        self.cities
            .get(city)
            .map(|city| {
                city.roads
                    .iter()
                    .map(|(direction, target)| (direction.clone(), target.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First city, in name order, with a free occupant slot.
    pub fn first_open_city(&self) -> Option<&str> {
        self.cities
            .values()
            .find(|city| !city.full)
            .map(|city| city.name.as_str())
    }

    /// Move `alien` into `target`, leaving the city it currently occupies.
    ///
    /// The alien takes its parity slot when free, otherwise the other slot.
    /// Returns `false` without touching anything when the target is missing
    /// or already full. Re-entering the current city succeeds as a no-op.
    pub fn invade(&mut self, target: &str, alien: &mut Alien) -> bool {
        if alien.current_city() == Some(target) {
            return true;
        }
        let Some(slot) = self
            .cities
            .get(target)
            .and_then(|city| city.open_slot_for(alien.id()))
        else {
            return false;
        };

        self.vacate(alien);
        if let Some(city) = self.cities.get_mut(target) {
            city.set_slot(slot, Some(alien.id()));
        }
        alien.set_placement(Some(Placement {
            city: target.to_string(),
            slot,
        }));
        true
    }

    /// Clear the slot held by `alien`, if any, and drop its placement.
    pub fn vacate(&mut self, alien: &mut Alien) -> Option<Placement> {
        let placement = alien.take_placement()?;
        if let Some(city) = self.cities.get_mut(&placement.city) {
            if city.occupants[placement.slot] == Some(alien.id()) {
                city.set_slot(placement.slot, None);
            }
        }
        Some(placement)
    }

    /// Delete a city and every road in the graph that targets it.
    ///
    /// Roads are matched by target name, whatever their label, so no road to
    /// a destroyed city survives. Returns the removed city and the number of
    /// roads deleted from other cities.
    pub fn remove_city(&mut self, name: &str) -> Option<(City, usize)> {
        let removed = self.cities.remove(name)?;
        let mut roads_removed = 0;
        for city in self.cities.values_mut() {
            let before = city.roads.len();
            city.roads.retain(|_, target| target != name);
            roads_removed += before - city.roads.len();
        }
        Some((removed, roads_removed))
    }

    /// Cardinal roads whose target exists but has no road back under the
    /// opposite label.
    pub fn unpaired_roads(&self) -> Vec<UnpairedRoad> {
        let mut unpaired = Vec::new();
        for city in self.cities.values() {
            for (direction, target) in &city.roads {
                let Some(opposite) = opposite_direction(direction) else {
                    continue;
                };
                let Some(neighbor) = self.cities.get(target) else {
                    continue;
                };
                if neighbor.roads.get(opposite) != Some(&city.name) {
                    unpaired.push(UnpairedRoad {
                        from: city.name.clone(),
                        direction: direction.clone(),
                        to: target.clone(),
                    });
                }
            }
        }
        unpaired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> CityGraph {
        let mut graph = CityGraph::new();
        graph.insert(City::new("Foo").with_road("north", "Bar").with_road("west", "Baz"));
        graph.insert(City::new("Bar").with_road("south", "Foo"));
        graph.insert(City::new("Baz").with_road("portal", "Foo"));
        graph
    }

    #[test]
    fn invade_fills_slots_and_tracks_full() {
        let mut graph = graph();
        let mut first = Alien::new(AlienId(1));
        let mut second = Alien::new(AlienId(2));

        assert!(graph.invade("Foo", &mut first));
        let foo = graph.get("Foo").unwrap();
        assert_eq!(foo.occupants(), [None, Some(AlienId(1))]);
        assert!(!foo.is_full());
        assert_eq!(first.current_city(), Some("Foo"));

        assert!(graph.invade("Foo", &mut second));
        let foo = graph.get("Foo").unwrap();
        assert!(foo.is_full());
        assert_eq!(foo.combatants(), Some((AlienId(2), AlienId(1))));
    }

    #[test]
    fn invade_leaves_previous_city() {
        let mut graph = graph();
        let mut alien = Alien::new(AlienId(3));
        assert!(graph.invade("Foo", &mut alien));
        assert!(graph.invade("Bar", &mut alien));

        assert!(graph.get("Foo").unwrap().is_vacant());
        assert_eq!(graph.get("Bar").unwrap().occupants(), [None, Some(AlienId(3))]);
        assert_eq!(alien.placement().map(|p| p.slot), Some(1));
    }

    #[test]
    fn same_parity_aliens_share_a_city() {
        let mut graph = graph();
        let mut first = Alien::new(AlienId(2));
        let mut second = Alien::new(AlienId(4));
        assert!(graph.invade("Baz", &mut first));
        assert!(graph.invade("Baz", &mut second));

        let baz = graph.get("Baz").unwrap();
        assert!(baz.is_full());
        assert_eq!(second.placement().map(|p| p.slot), Some(1));
    }

    #[test]
    fn invade_rejects_full_or_missing_city() {
        let mut graph = graph();
        let mut a = Alien::new(AlienId(1));
        let mut b = Alien::new(AlienId(2));
        let mut c = Alien::new(AlienId(3));
        assert!(graph.invade("Foo", &mut a));
        assert!(graph.invade("Foo", &mut b));
        assert!(graph.invade("Bar", &mut c));

        assert!(!graph.invade("Foo", &mut c));
        assert_eq!(c.current_city(), Some("Bar"));
        assert!(!graph.invade("Nowhere", &mut c));
        assert_eq!(graph.get("Bar").unwrap().occupants(), [None, Some(AlienId(3))]);
    }

    #[test]
    fn reinvading_current_city_is_a_no_op() {
        let mut graph = graph();
        let mut alien = Alien::new(AlienId(1));
        assert!(graph.invade("Foo", &mut alien));
        assert!(graph.invade("Foo", &mut alien));
        assert_eq!(graph.get("Foo").unwrap().occupants(), [None, Some(AlienId(1))]);
    }

    #[test]
    fn remove_city_drops_every_road_to_it() {
        let mut graph = graph();
        let (removed, roads_removed) = graph.remove_city("Foo").expect("Foo exists");

        assert_eq!(removed.name(), "Foo");
        assert_eq!(roads_removed, 2);
        assert!(graph.get("Bar").unwrap().roads().is_empty());
        assert!(graph.get("Baz").unwrap().roads().is_empty());
        assert!(graph.remove_city("Foo").is_none());
    }

    #[test]
    fn unpaired_roads_only_reports_cardinal_labels() {
        let graph = graph();
        let unpaired = graph.unpaired_roads();
        assert_eq!(
            unpaired,
            vec![UnpairedRoad {
                from: "Foo".to_string(),
                direction: "west".to_string(),
                to: "Baz".to_string(),
            }]
        );
    }

    #[test]
    fn opposite_direction_table() {
        assert_eq!(opposite_direction("north"), Some("south"));
        assert_eq!(opposite_direction("south"), Some("north"));
        assert_eq!(opposite_direction("east"), Some("west"));
        assert_eq!(opposite_direction("west"), Some("east"));
        assert_eq!(opposite_direction(""), None);
        assert_eq!(opposite_direction("up"), None);
    }
}
