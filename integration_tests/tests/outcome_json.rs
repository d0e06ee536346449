use invasion_sim::{parse_map, ExecutionMode, Simulation, SimulationConfig};
use serde_json::json;

#[test]
fn outcome_serializes_for_the_cli() -> anyhow::Result<()> {
    let config = SimulationConfig {
        seed: Some(11),
        execution: ExecutionMode::Lockstep,
        ..SimulationConfig::default()
    };
    let outcome = Simulation::new(parse_map("A north=B\nB south=A\nC east=D\n"), 2, config)?
        .run()?;
    let value = serde_json::to_value(&outcome)?;

    assert_eq!(value["seed"], json!(11));
    assert!(value["stop_reason"].is_string());
    assert_eq!(
        value["remaining"].as_array().map(Vec::len),
        Some(outcome.remaining.len())
    );
    for city in value["remaining"].as_array().into_iter().flatten() {
        assert!(city["name"].is_string());
        assert!(city["roads"].is_array());
        assert!(city.get("line").is_none());
    }
    assert_eq!(
        value["destroyed"].as_array().map(Vec::len),
        Some(outcome.destroyed.len())
    );
    assert!(value["metrics"]["rounds"].is_u64());
    Ok(())
}
