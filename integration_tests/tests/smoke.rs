mod common;

use invasion_sim::{load_map, load_simulation_config_from_env, Simulation};

#[test]
fn fixture_map_runs_to_completion() -> anyhow::Result<()> {
    common::ensure_test_config();
    let (config, path) = load_simulation_config_from_env();
    assert!(path.is_some(), "fixture config was not picked up");

    let graph = load_map(&common::fixture("test_map.txt"))?;
    let outcome = Simulation::new(graph, 8, config)?.run()?;

    assert!(outcome.rounds <= 500);
    for report in &outcome.destroyed {
        assert!(outcome.remaining.get(&report.city).is_none());
    }
    Ok(())
}
