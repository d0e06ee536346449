use std::fmt;
use std::hash::Hasher;

use serde::Serialize;

use crate::graph::CityGraph;
use crate::hashing::FnvHasher;
use crate::map_file::format_city;
use crate::roster::AlienId;

/// One battle: a city and the two aliens that destroyed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestructionReport {
    /// Order in which the destroyer applied the destruction, from 1.
    pub sequence: u32,
    pub city: String,
    pub aliens: [AlienId; 2],
    pub roads_removed: usize,
}

impl fmt::Display for DestructionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has been destroyed by alien {} and alien {}!",
            self.city, self.aliens[0], self.aliens[1]
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemainingRoad {
    pub direction: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemainingCity {
    pub name: String,
    pub roads: Vec<RemainingRoad>,
    #[serde(skip)]
    line: String,
}

/// Snapshot of the map once the simulation has stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RemainingCities {
    cities: Vec<RemainingCity>,
}

impl RemainingCities {
    pub fn capture(graph: &CityGraph) -> Self {
        let cities = graph
            .cities()
            .map(|city| RemainingCity {
                name: city.name().to_string(),
                roads: city
                    .roads()
                    .iter()
                    .map(|(direction, target)| RemainingRoad {
                        direction: direction.clone(),
                        target: target.clone(),
                    })
                    .collect(),
                line: format_city(city),
            })
            .collect();
        Self { cities }
    }

    pub fn cities(&self) -> &[RemainingCity] {
        &self.cities
    }

    pub fn get(&self, name: &str) -> Option<&RemainingCity> {
        self.cities.iter().find(|city| city.name == name)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Stable FNV-1a digest of the printed listing.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FnvHasher::new();
        for city in &self.cities {
            hasher.write(city.line.as_bytes());
            hasher.write_u8(b'\n');
        }
        hasher.finish()
    }
}

impl fmt::Display for RemainingCities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Remaining cities:")?;
        if self.cities.is_empty() {
            return writeln!(f, "none");
        }
        for city in &self.cities {
            writeln!(f, "{}", city.line)?;
        }
        Ok(())
    }
}
