//! Machine-readable optimization request/response contract
//!
//! The wire types the API-layer collaborators exchange with this engine.
//! Field names are stable across versions — `forecasted_demand`,
//! `current_route_topology`, `bus_capacity_assumptions` and
//! `optimization_constraints` on the way in; `proposed_routes`,
//! `load_balancing_simulation` and `impact_metrics` on the way out — so
//! the surrounding platform stays decoupled from engine internals.
//!
//! Constraint fields use the operator-facing minute units of the
//! surrounding platform; conversion to the engine's second-based
//! configuration happens here and nowhere else.

use crate::models::demand::{DemandIndex, DemandRecord, TimeWindow};
use crate::models::proposal::{ProposalKind, Rejection};
use crate::models::topology::{Route, ServiceType, Stop, Topology};
use crate::orchestrator::{
    compare, MetricComparison, OptimizeError, OptimizerConfig, OptimizerEngine,
};
use crate::sim::ScenarioMetrics;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request
// ============================================================================

/// A stop row in the topology payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopSpec {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// A route row in the topology payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub route_id: String,
    pub stop_ids: Vec<String>,
    /// Falls back to the request's capacity assumption when absent
    #[serde(default)]
    pub capacity: Option<u32>,
    pub headway_minutes: u64,
    #[serde(default)]
    pub service_type: Option<ServiceType>,
}

/// Static topology sourced from schedule data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    pub stops: Vec<StopSpec>,
    pub routes: Vec<RouteSpec>,
}

/// Capacity assumptions applied to routes without a declared capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityAssumptions {
    pub default_bus_capacity: u32,
}

impl Default for CapacityAssumptions {
    fn default() -> Self {
        Self {
            default_bus_capacity: 50,
        }
    }
}

/// Operator-tunable constraints, minute units as in the dashboards
///
/// Absent fields fall back to the engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    #[serde(default)]
    pub max_short_turns: Option<usize>,
    #[serde(default)]
    pub max_detour_time: Option<u64>,
    #[serde(default)]
    pub min_headway: Option<u64>,
    #[serde(default)]
    pub max_headway: Option<u64>,
    #[serde(default)]
    pub overload_threshold: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub optimization_timeout: Option<u64>,
    #[serde(default)]
    pub simulation_hours: Option<u64>,
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// A complete optimization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub forecasted_demand: Vec<DemandRecord>,
    pub current_route_topology: TopologySpec,
    #[serde(default)]
    pub bus_capacity_assumptions: CapacityAssumptions,
    #[serde(default)]
    pub optimization_constraints: OptimizationConstraints,
}

impl OptimizationRequest {
    /// Resolve the engine configuration this request implies
    pub fn config(&self) -> OptimizerConfig {
        let defaults = OptimizerConfig::default();
        let c = &self.optimization_constraints;

        let mut config = OptimizerConfig {
            max_short_turns: c.max_short_turns.unwrap_or(defaults.max_short_turns),
            max_detour_time_s: c
                .max_detour_time
                .map(|m| m * 60)
                .unwrap_or(defaults.max_detour_time_s),
            min_headway_s: c.min_headway.map(|m| m * 60).unwrap_or(defaults.min_headway_s),
            max_headway_s: c.max_headway.map(|m| m * 60).unwrap_or(defaults.max_headway_s),
            overload_threshold: c.overload_threshold.unwrap_or(defaults.overload_threshold),
            optimization_timeout_ms: c
                .optimization_timeout
                .map(|s| s * 1_000)
                .unwrap_or(defaults.optimization_timeout_ms),
            ..defaults
        };
        if let Some(hours) = c.simulation_hours {
            config.sim.simulation_hours = hours;
        }
        if let Some(seed) = c.random_seed {
            config.sim.random_seed = seed;
        }
        config
    }

    /// Build the engine topology from the request payload
    pub fn topology(&self) -> Result<Topology, OptimizeError> {
        let stops = self
            .current_route_topology
            .stops
            .iter()
            .map(|s| Stop::new(&s.stop_id, &s.stop_name, s.lat, s.lon))
            .collect();

        let routes = self
            .current_route_topology
            .routes
            .iter()
            .map(|r| {
                Route::new(
                    &r.route_id,
                    r.stop_ids.clone(),
                    r.capacity
                        .unwrap_or(self.bus_capacity_assumptions.default_bus_capacity),
                    r.headway_minutes * 60,
                    r.service_type.unwrap_or(ServiceType::Bus),
                )
            })
            .collect();

        Ok(Topology::new(stops, routes)?)
    }
}

// ============================================================================
// Response
// ============================================================================

/// One accepted service change on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedRoute {
    pub proposal_id: String,
    pub route_id: String,
    pub time_window: TimeWindow,
    pub severity: f64,
    pub expected_severity_reduction: f64,
    pub change: ProposalKind,
}

/// Simulated evidence for one accepted proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub proposal_id: String,
    pub optimized: ScenarioMetrics,
    pub comparison: Vec<MetricComparison>,
}

/// Baseline and per-proposal scenario outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancingSimulation {
    pub baseline: ScenarioMetrics,
    pub scenarios: Vec<ScenarioComparison>,
    pub partial: bool,
}

/// Session-level impact figures and the discard list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactMetrics {
    pub routes_analyzed: usize,
    pub segments_detected: usize,
    pub candidates_evaluated: usize,
    pub accepted_count: usize,
    pub total_wait_reduction_s: f64,
    pub vehicle_hours_delta: f64,
    pub rejections: Vec<Rejection>,
}

/// A complete optimization response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub proposed_routes: Vec<ProposedRoute>,
    pub load_balancing_simulation: LoadBalancingSimulation,
    pub impact_metrics: ImpactMetrics,
}

/// Run one optimization session for a wire request
pub fn run_optimization(
    request: &OptimizationRequest,
) -> Result<OptimizationResponse, OptimizeError> {
    run_optimization_with_report(request).map(|(response, _)| response)
}

/// Run one session and also return the full report (for callers that want
/// the text rendering alongside the wire response)
pub fn run_optimization_with_report(
    request: &OptimizationRequest,
) -> Result<(OptimizationResponse, crate::orchestrator::OptimizationReport), OptimizeError> {
    let topology = request.topology()?;
    let demand = DemandIndex::from_records(request.forecasted_demand.clone());

    let mut engine = OptimizerEngine::new(topology, demand, request.config())?;
    let report = engine.run()?;
    let response = response_from_report(&report);
    Ok((response, report))
}

fn response_from_report(
    report: &crate::orchestrator::OptimizationReport,
) -> OptimizationResponse {
    OptimizationResponse {
        proposed_routes: report
            .accepted
            .iter()
            .map(|a| ProposedRoute {
                proposal_id: a.proposal.id.clone(),
                route_id: a.proposal.route_id.clone(),
                time_window: a.proposal.window,
                severity: a.proposal.severity,
                expected_severity_reduction: a.proposal.expected_severity_reduction,
                change: a.proposal.kind.clone(),
            })
            .collect(),
        load_balancing_simulation: LoadBalancingSimulation {
            baseline: report.baseline.clone(),
            scenarios: report
                .accepted
                .iter()
                .map(|a| ScenarioComparison {
                    proposal_id: a.proposal.id.clone(),
                    optimized: a.optimized.clone(),
                    comparison: compare(&a.baseline, &a.optimized),
                })
                .collect(),
            partial: report.partial,
        },
        impact_metrics: ImpactMetrics {
            routes_analyzed: report.summary.routes_analyzed,
            segments_detected: report.summary.segments_detected,
            candidates_evaluated: report.summary.candidates_evaluated,
            accepted_count: report.accepted.len(),
            total_wait_reduction_s: report.summary.total_wait_reduction_s,
            vehicle_hours_delta: report.summary.vehicle_hours_delta,
            rejections: report.rejections.clone(),
        },
    }
}
