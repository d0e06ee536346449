//! Text codec for invasion maps.
//!
//! One city per line: `Name direction=Target direction=Target ...`.
//! Malformed road tokens and lines with fewer than two tokens are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::graph::{City, CityGraph};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn load_map(path: &Path) -> Result<CityGraph, MapError> {
    let contents = fs::read_to_string(path).map_err(|source| MapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_map(&contents);

    tracing::info!(
        target: "invasion::map",
        path = %path.display(),
        cities = graph.len(),
        roads = graph.road_count(),
        "map.loaded"
    );
    for road in graph.unpaired_roads() {
        tracing::debug!(
            target: "invasion::map",
            from = %road.from,
            direction = %road.direction,
            to = %road.to,
            "map.road_unpaired"
        );
    }
    Ok(graph)
}

pub fn parse_map(contents: &str) -> CityGraph {
    let mut graph = CityGraph::new();
    for line in contents.lines() {
        if let Some(city) = parse_line(line) {
            graph.insert(city);
        }
    }
    graph
}

fn parse_line(line: &str) -> Option<City> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?;
    let roads: Vec<&str> = tokens.collect();
    if roads.is_empty() {
        return None;
    }

    let mut city = City::new(name);
    for token in roads {
        match parse_road(token) {
            Some((direction, target)) => city = city.with_road(direction, target),
            None => tracing::trace!(target: "invasion::map", city = name, token, "map.token_skipped"),
        }
    }
    Some(city)
}

fn parse_road(token: &str) -> Option<(&str, &str)> {
    let (direction, target) = token.split_once('=')?;
    if direction.is_empty() || target.is_empty() || target.contains('=') {
        return None;
    }
    Some((direction, target))
}

/// Render a city in map-file form: the name followed by its roads.
pub fn format_city(city: &City) -> String {
    let mut line = city.name().to_string();
    for (direction, target) in city.roads() {
        line.push(' ');
        line.push_str(direction);
        line.push('=');
        line.push_str(target);
    }
    line
}

pub fn format_map(graph: &CityGraph) -> String {
    graph
        .cities()
        .map(|city| format_city(city) + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Foo north=Bar west=Baz south=Qu-ux
Bar south=Foo west=Bee

Baz east=Foo junk =Foo east= a=b=c
Lonely
Qu-ux north=Foo
";

    #[test]
    fn parses_cities_and_roads() {
        let graph = parse_map(SAMPLE);
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.road_count(), 7);
        assert_eq!(graph.roads_of("Baz"), vec![("east".to_string(), "Foo".to_string())]);
        assert!(!graph.contains("Lonely"));
    }

    #[test]
    fn line_with_only_malformed_tokens_still_declares_city() {
        let graph = parse_map("Island nowhere\n");
        let island = graph.get("Island").expect("city declared");
        assert!(island.roads().is_empty());
    }

    #[test]
    fn repeated_entries_keep_the_last_value() {
        let graph = parse_map("A north=B north=C\nA east=D\n");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.roads_of("A"), vec![("east".to_string(), "D".to_string())]);
    }

    #[test]
    fn format_round_trips() {
        let graph = parse_map(SAMPLE);
        let reparsed = parse_map(&format_map(&graph));
        assert_eq!(graph, reparsed);
        insta::assert_snapshot!(format_map(&graph), @r"
        Bar south=Foo west=Bee
        Baz east=Foo
        Foo north=Bar south=Qu-ux west=Baz
        Qu-ux north=Foo
        ");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_map(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, MapError::Read { .. }));
    }
}
