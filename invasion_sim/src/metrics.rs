use serde::Serialize;

/// Counters collected while the world lock is held, so they are always
/// consistent with the graph and roster they describe.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationMetrics {
    pub rounds: u32,
    pub moves: u64,
    pub blocked_moves: u64,
    pub stranded: u32,
    pub deployed: u32,
    pub events_enqueued: u64,
    pub cities_destroyed: u32,
    pub aliens_killed: u32,
    pub roads_removed: u64,
    /// Events for cities that had already been destroyed.
    pub duplicate_events: u64,
    /// Events for cities that were no longer full when processed.
    pub transient_events: u64,
}
