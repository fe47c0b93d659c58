//! Optimization session engine
//!
//! Coordinates one optimization session end to end:
//!
//! 1. Scan the demand index for overloaded segments
//! 2. Generate candidate proposals (short-turn loops, headway changes)
//! 3. Simulate the baseline once
//! 4. For each candidate in severity-descending order: simulate its
//!    scenario, compare against the baseline, accept greedily
//! 5. After each acceptance, scale the affected demand down before the next
//!    candidate is evaluated — sequential-improvement search, not
//!    exhaustive combinatorial search
//!
//! # Determinism
//!
//! Candidate ordering is fully deterministic and baseline/candidate
//! scenarios share one explicit seed, so a session is reproducible end to
//! end from its inputs.
//!
//! # Example
//!
//! ```rust,ignore
//! use route_optimizer_core_rs::orchestrator::{OptimizerConfig, OptimizerEngine};
//!
//! let mut engine = OptimizerEngine::new(topology, demand, OptimizerConfig::default())?;
//! let report = engine.run()?;
//! println!("{}", report.render_text());
//! ```

use crate::detector;
use crate::models::demand::DemandIndex;
use crate::models::proposal::{OptimizationProposal, ProposalKind, Rejection};
use crate::models::topology::{Topology, TopologyError};
use crate::orchestrator::report::{
    AcceptedProposal, ImpactSummary, OptimizationReport,
};
use crate::proposals;
use crate::sim::SimulationScenario;
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

/// Simulation parameters shared by every scenario in a session
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Length of the simulated service window, hours
    pub simulation_hours: u64,

    /// Fixed boarding time per passenger, seconds
    pub boarding_s_per_passenger: u64,

    /// Fixed alighting time per passenger, seconds
    pub alighting_s_per_passenger: u64,

    /// Uniform travel-time draw between adjacent stops, seconds
    pub travel_time_min_s: u64,
    pub travel_time_max_s: u64,

    /// Longest wait still counted as on time, seconds
    pub max_wait_s: u64,

    /// Wall-clock execution budget per scenario, milliseconds
    pub scenario_wall_clock_ms: u64,

    /// Explicit seed; baseline and candidates all start from it so the
    /// comparison is paired, not confounded by independent randomness
    pub random_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation_hours: 24,
            boarding_s_per_passenger: 2,
            alighting_s_per_passenger: 1,
            travel_time_min_s: 180,
            travel_time_max_s: 480,
            max_wait_s: 1_800,
            scenario_wall_clock_ms: 10_000,
            random_seed: 42,
        }
    }
}

/// Full session configuration
///
/// An immutable value threaded through every entry point; there is no
/// process-wide configuration singleton.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Maximum short-turn loops proposed per route
    pub max_short_turns: usize,

    /// Ceiling on a short-turn loop's implied insertion time, seconds
    pub max_detour_time_s: u64,

    /// Policy band for headway proposals, seconds
    pub min_headway_s: u64,
    pub max_headway_s: u64,

    /// Hot-stop detection threshold as a fraction of capacity
    pub overload_threshold: f64,

    /// Planning estimate of one interstop hop (travel plus dwell), seconds;
    /// used for detour and fleet-size arithmetic before simulation
    pub planning_interstop_s: u64,

    /// Extra vehicle-hours a single headway proposal may cost
    pub vehicle_hours_budget: f64,

    /// Minimum simulated average-wait reduction to accept, seconds
    pub min_improvement_s: f64,

    /// Session deadline; remaining candidates are skipped once exceeded,
    /// milliseconds
    pub optimization_timeout_ms: u64,

    pub sim: SimConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_short_turns: 3,
            max_detour_time_s: 900,
            min_headway_s: 300,
            max_headway_s: 1_800,
            overload_threshold: 0.8,
            planning_interstop_s: 150,
            vehicle_hours_budget: 6.0,
            min_improvement_s: 15.0,
            optimization_timeout_ms: 300_000,
            sim: SimConfig::default(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal session errors
///
/// Everything else — a route without demand data, a candidate violating a
/// constraint, a scenario failure — is recorded as a rejection and the
/// session continues. Only unusable inputs propagate to the caller.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("demand table unavailable: no forecast records supplied")]
    NoDemandData,

    #[error("baseline scenario failed: {0}")]
    BaselineFailed(String),
}

// ============================================================================
// Engine
// ============================================================================

/// One optimization session over a topology and a demand forecast
#[derive(Debug)]
pub struct OptimizerEngine {
    config: OptimizerConfig,
    topology: Topology,

    /// Session demand view; scaled down after each acceptance (the greedy
    /// loop's single serialization point)
    demand: DemandIndex,
}

impl OptimizerEngine {
    /// Create an engine, validating configuration and inputs
    pub fn new(
        topology: Topology,
        demand: DemandIndex,
        config: OptimizerConfig,
    ) -> Result<Self, OptimizeError> {
        Self::validate_config(&config)?;

        if demand.is_empty() {
            return Err(OptimizeError::NoDemandData);
        }

        Ok(Self {
            config,
            topology,
            demand,
        })
    }

    fn validate_config(config: &OptimizerConfig) -> Result<(), OptimizeError> {
        if !(config.overload_threshold > 0.0 && config.overload_threshold <= 2.0) {
            return Err(OptimizeError::InvalidConfig(
                "overload_threshold must be in (0, 2]".to_string(),
            ));
        }
        if config.min_headway_s == 0 || config.min_headway_s > config.max_headway_s {
            return Err(OptimizeError::InvalidConfig(
                "headway band must satisfy 0 < min_headway <= max_headway".to_string(),
            ));
        }
        if config.sim.travel_time_min_s == 0
            || config.sim.travel_time_min_s > config.sim.travel_time_max_s
        {
            return Err(OptimizeError::InvalidConfig(
                "travel time draw must satisfy 0 < min <= max".to_string(),
            ));
        }
        if config.sim.simulation_hours == 0 {
            return Err(OptimizeError::InvalidConfig(
                "simulation_hours must be > 0".to_string(),
            ));
        }
        if config.planning_interstop_s == 0 {
            return Err(OptimizeError::InvalidConfig(
                "planning_interstop_s must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run the session to completion (or to its deadline)
    pub fn run(&mut self) -> Result<OptimizationReport, OptimizeError> {
        let session_start = Instant::now();
        let deadline = Duration::from_millis(self.config.optimization_timeout_ms);

        // Detection and generation are pure over the session inputs
        let detection = detector::scan(&self.topology, &self.demand, self.config.overload_threshold);
        let mut rejections = detection.skipped;

        log::info!(
            "session: {} routes, {} overloaded segments, {} skipped routes",
            self.topology.num_routes(),
            detection.segments.len(),
            rejections.len()
        );

        let generated = proposals::generate(&detection.segments, &self.topology, &self.config);
        rejections.extend(generated.rejections);

        let mut candidates = generated.proposals;
        candidates.sort_by(|a, b| {
            b.severity
                .total_cmp(&a.severity)
                .then(a.window.cmp(&b.window))
                .then(a.route_id.cmp(&b.route_id))
                .then(a.kind.name().cmp(b.kind.name()))
        });

        // Baseline runs once per session and is reused for every comparison
        let baseline = {
            let mut scenario = SimulationScenario::new(
                "baseline",
                self.topology.clone(),
                self.demand.clone(),
                self.config.sim.clone(),
            );
            scenario
                .run()
                .map_err(|e| OptimizeError::BaselineFailed(e.to_string()))?
        };

        let mut accepted: Vec<AcceptedProposal> = Vec::new();
        let mut evaluated = 0;
        let mut partial = false;

        for proposal in candidates {
            if session_start.elapsed() >= deadline {
                partial = true;
                rejections.push(Rejection::new(
                    &proposal.route_id,
                    format!("session deadline reached before candidate {}", proposal.id),
                ));
                continue;
            }

            let Some(view) = self.topology.with_proposal(&proposal) else {
                rejections.push(Rejection::new(
                    &proposal.route_id,
                    format!("candidate {} targets a route missing from the topology", proposal.id),
                ));
                continue;
            };

            let mut scenario = SimulationScenario::new(
                format!("candidate_{}", proposal.id),
                view,
                self.demand.clone(),
                self.config.sim.clone(),
            );

            evaluated += 1;
            let optimized = match scenario.run() {
                Ok(metrics) => metrics,
                Err(err) => {
                    rejections.push(Rejection::new(&proposal.route_id, err.to_string()));
                    continue;
                }
            };

            let wait_reduction_s = baseline.avg_wait_s - optimized.avg_wait_s;
            if !proposal.constraints_satisfied || wait_reduction_s < self.config.min_improvement_s {
                rejections.push(Rejection::new(
                    &proposal.route_id,
                    format!(
                        "candidate {}: simulated wait reduction {:.1}s below threshold {:.1}s",
                        proposal.id, wait_reduction_s, self.config.min_improvement_s
                    ),
                ));
                continue;
            }

            log::info!(
                "accepted {} on route {}: wait {:.1}s → {:.1}s",
                proposal.kind.name(),
                proposal.route_id,
                baseline.avg_wait_s,
                optimized.avg_wait_s
            );

            // Serialization point: scale the affected demand before the
            // next candidate is evaluated
            self.apply_acceptance(&proposal);

            let vehicle_hours_delta = self.vehicle_hours_delta(&proposal);
            accepted.push(AcceptedProposal {
                proposal,
                baseline: baseline.clone(),
                optimized,
                vehicle_hours_delta,
            });
        }

        let summary = ImpactSummary {
            routes_analyzed: self.topology.num_routes(),
            segments_detected: detection.segments.len(),
            candidates_evaluated: evaluated,
            total_wait_reduction_s: accepted.iter().map(|a| a.wait_reduction_s()).sum(),
            vehicle_hours_delta: accepted.iter().map(|a| a.vehicle_hours_delta).sum(),
        };

        Ok(OptimizationReport {
            accepted,
            baseline,
            summary,
            rejections,
            partial,
        })
    }

    /// Scale the demand of the stops an accepted proposal relieves
    fn apply_acceptance(&mut self, proposal: &OptimizationProposal) {
        let Some(route) = self.topology.route(&proposal.route_id) else {
            return;
        };

        let stops: Vec<String> = match &proposal.kind {
            ProposalKind::ShortTurnLoop {
                entry_index,
                exit_index,
                ..
            } => route.stop_ids[*entry_index..=*exit_index].to_vec(),
            ProposalKind::HeadwayChange { .. } => route.stop_ids.clone(),
        };

        let remaining = 1.0 - proposal.expected_severity_reduction;
        self.demand
            .apply_reduction(&proposal.route_id, &stops, proposal.window, remaining);
    }

    /// Operating cost of a proposal in additional vehicle-hours over its
    /// window
    fn vehicle_hours_delta(&self, proposal: &OptimizationProposal) -> f64 {
        let Some(route) = self.topology.route(&proposal.route_id) else {
            return 0.0;
        };
        let window_s = proposal.window.duration_s() as f64;

        match &proposal.kind {
            ProposalKind::ShortTurnLoop {
                insertion_time_s, ..
            } => {
                let trips = window_s / route.headway_s as f64;
                trips * *insertion_time_s as f64 / 3_600.0
            }
            ProposalKind::HeadwayChange {
                current_headway_s,
                target_headway_s,
            } => {
                let cycle_s = route.num_stops() as f64 * self.config.planning_interstop_s as f64;
                let vehicles = |h: f64| (cycle_s / h).ceil().max(1.0);
                (vehicles(*target_headway_s as f64) - vehicles(*current_headway_s as f64))
                    * window_s
                    / 3_600.0
            }
        }
    }
}
