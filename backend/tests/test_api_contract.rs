//! Wire contract tests
//!
//! The request/response field names are a stable contract with the API
//! layer; these tests pin them.

use route_optimizer_core_rs::api::{run_optimization, OptimizationRequest};

fn request() -> OptimizationRequest {
    let json = r#"{
        "forecasted_demand": [
            {
                "stop_id": "S1",
                "route_id": "R1",
                "time_window": {"start_s": 3600, "end_s": 7200},
                "predicted_riders": 100.0,
                "demand_level": "Overloaded"
            },
            {
                "stop_id": "S2",
                "route_id": "R1",
                "time_window": {"start_s": 3600, "end_s": 7200},
                "predicted_riders": 90.0,
                "demand_level": "Overloaded"
            }
        ],
        "current_route_topology": {
            "stops": [
                {"stop_id": "S1", "stop_name": "First", "lat": 33.75, "lon": -84.39},
                {"stop_id": "S2", "stop_name": "Second", "lat": 33.76, "lon": -84.39},
                {"stop_id": "S3", "stop_name": "Third", "lat": 33.77, "lon": -84.39}
            ],
            "routes": [
                {"route_id": "R1", "stop_ids": ["S1", "S2", "S3"], "headway_minutes": 10}
            ]
        },
        "bus_capacity_assumptions": {"default_bus_capacity": 50},
        "optimization_constraints": {
            "max_short_turns": 3,
            "max_detour_time": 15,
            "min_headway": 5,
            "max_headway": 30,
            "simulation_hours": 4,
            "random_seed": 42
        }
    }"#;

    serde_json::from_str(json).expect("request json parses")
}

#[test]
fn test_response_carries_stable_top_level_fields() {
    let response = run_optimization(&request()).unwrap();
    let value: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert!(value.get("proposed_routes").is_some());
    assert!(value.get("load_balancing_simulation").is_some());
    assert!(value.get("impact_metrics").is_some());

    let sim = &value["load_balancing_simulation"];
    assert!(sim.get("baseline").is_some());
    assert!(sim.get("scenarios").is_some());
    assert!(sim.get("partial").is_some());

    let impact = &value["impact_metrics"];
    assert!(impact.get("total_wait_reduction_s").is_some());
    assert!(impact.get("vehicle_hours_delta").is_some());
    assert!(impact.get("rejections").is_some());
}

#[test]
fn test_proposed_routes_reference_evaluated_scenarios() {
    let response = run_optimization(&request()).unwrap();

    assert_eq!(
        response.proposed_routes.len(),
        response.load_balancing_simulation.scenarios.len()
    );
    assert_eq!(
        response.proposed_routes.len(),
        response.impact_metrics.accepted_count
    );

    for (route, scenario) in response
        .proposed_routes
        .iter()
        .zip(&response.load_balancing_simulation.scenarios)
    {
        assert_eq!(route.proposal_id, scenario.proposal_id);
        assert_eq!(route.route_id, "R1");
    }
}

#[test]
fn test_request_round_trips_through_json() {
    let original = request();
    let json = serde_json::to_string(&original).unwrap();
    let back: OptimizationRequest = serde_json::from_str(&json).unwrap();

    assert_eq!(back.forecasted_demand.len(), 2);
    assert_eq!(back.current_route_topology.routes[0].route_id, "R1");
    assert_eq!(back.optimization_constraints.min_headway, Some(5));
}

#[test]
fn test_unknown_stop_in_topology_is_fatal() {
    let mut request = request();
    request.current_route_topology.routes[0]
        .stop_ids
        .push("MISSING".to_string());

    let err = run_optimization(&request).unwrap_err();
    assert!(err.to_string().contains("MISSING"));
}
