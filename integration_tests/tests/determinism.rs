use invasion_sim::mapgen::grid_map;
use invasion_sim::{ExecutionMode, Simulation, SimulationConfig, SimulationOutcome};

fn run_simulation(seed: u64) -> SimulationOutcome {
    let config = SimulationConfig {
        seed: Some(seed),
        max_rounds: 250,
        execution: ExecutionMode::Lockstep,
        ..SimulationConfig::default()
    };
    Simulation::new(grid_map(10, 10), 150, config)
        .expect("simulation builds")
        .run()
        .expect("simulation completes")
}

#[test]
fn deterministic_outcomes_match() {
    let outcome_a = run_simulation(0xfeed);
    let outcome_b = run_simulation(0xfeed);

    assert_eq!(outcome_a.stop_reason, outcome_b.stop_reason);
    assert_eq!(outcome_a.rounds, outcome_b.rounds);
    assert_eq!(outcome_a.destroyed, outcome_b.destroyed);
    assert_eq!(outcome_a.remaining, outcome_b.remaining);
    assert_eq!(outcome_a.survivors, outcome_b.survivors);
    assert_eq!(outcome_a.reserve, outcome_b.reserve);
    assert_eq!(outcome_a.metrics, outcome_b.metrics);
}

#[test]
fn outcome_reports_the_seed_it_ran_with() {
    let config = SimulationConfig {
        execution: ExecutionMode::Lockstep,
        max_rounds: 50,
        ..SimulationConfig::default()
    };
    let first = Simulation::new(grid_map(4, 4), 10, config.clone())
        .expect("simulation builds")
        .run()
        .expect("simulation completes");

    let replay = Simulation::new(
        grid_map(4, 4),
        10,
        SimulationConfig {
            seed: Some(first.seed),
            ..config
        },
    )
    .expect("simulation builds")
    .run()
    .expect("simulation completes");

    assert_eq!(first.destroyed, replay.destroyed);
    assert_eq!(first.remaining.fingerprint(), replay.remaining.fingerprint());
}
