//! Scenario-level simulation tests
//!
//! Determinism (bit-identical metrics for identical seed and inputs), the
//! capacity invariant under heavy overload, and the empty-system boundary
//! case.

use route_optimizer_core_rs::models::demand::{DemandIndex, DemandLevel, DemandRecord, TimeWindow};
use route_optimizer_core_rs::models::topology::{Route, ServiceType, Stop, Topology};
use route_optimizer_core_rs::{ScenarioState, SimConfig, SimulationScenario};

fn line_topology(num_stops: usize, capacity: u32, headway_s: u64) -> Topology {
    let stops: Vec<Stop> = (0..num_stops)
        .map(|i| Stop::new(format!("S{}", i), format!("Stop {}", i), 0.0, i as f64 * 0.01))
        .collect();
    let stop_ids = stops.iter().map(|s| s.id.clone()).collect();
    let routes = vec![Route::new("R1", stop_ids, capacity, headway_s, ServiceType::Bus)];
    Topology::new(stops, routes).unwrap()
}

fn demand(records: Vec<(&str, u64, f64)>) -> DemandIndex {
    DemandIndex::from_records(
        records
            .into_iter()
            .map(|(stop, hour, riders)| DemandRecord {
                stop_id: stop.into(),
                route_id: "R1".into(),
                time_window: TimeWindow::hour(hour),
                predicted_riders: riders,
                demand_level: DemandLevel::from_ratio(riders / 50.0),
            })
            .collect(),
    )
}

fn config(hours: u64, seed: u64) -> SimConfig {
    SimConfig {
        simulation_hours: hours,
        random_seed: seed,
        ..SimConfig::default()
    }
}

#[test]
fn test_identical_seed_identical_metrics() {
    let run = |seed: u64| {
        let mut scenario = SimulationScenario::new(
            "det",
            line_topology(5, 50, 600),
            demand(vec![("S0", 1, 80.0), ("S1", 1, 60.0), ("S2", 2, 40.0)]),
            config(4, seed),
        );
        scenario.run().unwrap()
    };

    let a = run(42);
    let b = run(42);
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());

    // A different seed produces a genuinely different realization
    let c = run(43);
    assert_ne!(a.fingerprint(), c.fingerprint());
}

#[test]
fn test_overloaded_stop_increases_waits_not_loads() {
    // Capacity 5 with ~200 riders/hour: vehicles leave full and the queue
    // backs up. The capacity invariant is asserted inside the simulator;
    // the observable signal is stranded passengers and inflated waits.
    let mut scenario = SimulationScenario::new(
        "crush",
        line_topology(3, 5, 1_200),
        demand(vec![("S0", 0, 200.0), ("S0", 1, 200.0)]),
        config(2, 42),
    );

    let crush = scenario.run().unwrap();
    assert_eq!(scenario.state(), ScenarioState::Completed);
    assert!(crush.passengers_stranded > 0);
    assert!(crush.avg_load_factor > 0.5);

    // Same demand with ample capacity waits far less
    let mut relaxed = SimulationScenario::new(
        "relaxed",
        line_topology(3, 500, 1_200),
        demand(vec![("S0", 0, 200.0), ("S0", 1, 200.0)]),
        config(2, 42),
    );
    let roomy = relaxed.run().unwrap();

    assert!(crush.avg_wait_s > roomy.avg_wait_s);
}

#[test]
fn test_empty_system_boundary() {
    // 24 simulated hours, zero passenger arrivals
    let mut scenario = SimulationScenario::new(
        "empty",
        line_topology(4, 50, 600),
        DemandIndex::default(),
        config(24, 42),
    );

    let metrics = scenario.run().unwrap();

    assert_eq!(metrics.avg_wait_s, 0.0);
    assert_eq!(metrics.vehicle_utilization, 0.0);
    assert_eq!(metrics.passengers_served, 0);
    assert_eq!(metrics.passengers_stranded, 0);
}

#[test]
fn test_shorter_headway_reduces_waits() {
    let run = |headway_s: u64| {
        let mut scenario = SimulationScenario::new(
            "headway",
            line_topology(4, 50, headway_s),
            demand(vec![("S0", 1, 60.0), ("S1", 1, 60.0), ("S2", 1, 60.0)]),
            config(4, 42),
        );
        scenario.run().unwrap()
    };

    let slow = run(1_200);
    let fast = run(300);

    assert!(fast.avg_wait_s < slow.avg_wait_s);
    assert!(fast.vehicle_trips > slow.vehicle_trips);
}

#[test]
fn test_short_turn_overlay_serves_base_route_queues() {
    let base = line_topology(6, 50, 900);
    let with_overlay = {
        let proposal = route_optimizer_core_rs::OptimizationProposal::short_turn(
            "R1",
            TimeWindow::hour(1),
            1.2,
            "S1",
            "S3",
            1,
            3,
            300,
        );
        base.with_proposal(&proposal).unwrap()
    };

    let run = |topology: Topology| {
        let mut scenario = SimulationScenario::new(
            "overlay",
            topology,
            demand(vec![("S1", 1, 90.0), ("S2", 1, 90.0)]),
            config(3, 42),
        );
        scenario.run().unwrap()
    };

    let baseline = run(base);
    let boosted = run(with_overlay);

    // Extra trips over the congested span pick passengers up sooner
    assert!(boosted.vehicle_trips > baseline.vehicle_trips);
    assert!(boosted.avg_wait_s < baseline.avg_wait_s);
}
