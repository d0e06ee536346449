use crate::graph::{City, CityGraph};

/// Name of the grid city at column `x`, row `y`.
pub fn grid_city_name(x: u32, y: u32) -> String {
    format!("C{}_{}", x, y)
}

/// Build a `width` x `height` grid where every city links to its cardinal
/// neighbours. Row 0 is the northern edge.
pub fn grid_map(width: u32, height: u32) -> CityGraph {
    let mut graph = CityGraph::new();
    for y in 0..height {
        for x in 0..width {
            let mut city = City::new(grid_city_name(x, y));
            if y > 0 {
                city = city.with_road("north", grid_city_name(x, y - 1));
            }
            if y + 1 < height {
                city = city.with_road("south", grid_city_name(x, y + 1));
            }
            if x + 1 < width {
                city = city.with_road("east", grid_city_name(x + 1, y));
            }
            if x > 0 {
                city = city.with_road("west", grid_city_name(x - 1, y));
            }
            graph.insert(city);
        }
    }
    graph
}

/// Parse a `WIDTHxHEIGHT` grid size such as `8x5`.
pub fn parse_grid_size(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
