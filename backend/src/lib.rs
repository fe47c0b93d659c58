//! Route Optimization & Simulation Engine - Rust Core
//!
//! Turns a forecasted per-stop demand signal into concrete transit-service
//! change proposals (short-turn loops, headway adjustments) and quantifies
//! their impact via discrete-event simulation before any change is applied
//! operationally.
//!
//! # Architecture
//!
//! - **core**: Simulation clock
//! - **models**: Domain types (Topology, DemandIndex, OptimizationProposal)
//! - **detector**: Overloaded-segment detection
//! - **proposals**: Proposal strategies (short-turn loops, headway changes)
//! - **sim**: Discrete-event simulator producing ScenarioMetrics
//! - **orchestrator**: Greedy impact evaluation and the final report
//! - **api**: Stable request/response wire contract
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All simulated time values are u64 (seconds)
//! 2. All randomness is deterministic (seeded RNG, one per scenario)
//! 3. Onboard passenger counts never exceed vehicle capacity
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod api;
pub mod core;
pub mod detector;
pub mod models;
pub mod orchestrator;
pub mod proposals;
pub mod rng;
pub mod sim;

// Re-exports for convenience
pub use crate::core::time::SimClock;
pub use api::{run_optimization, OptimizationRequest, OptimizationResponse};
pub use detector::{InsufficientDataError, OverloadedSegment};
pub use models::{
    demand::{DemandIndex, DemandLevel, DemandRecord, TimeWindow},
    proposal::{OptimizationProposal, ProposalKind, Rejection},
    topology::{Route, ServiceType, Stop, Topology, TopologyError},
};
pub use orchestrator::{
    OptimizationReport, OptimizeError, OptimizerConfig, OptimizerEngine, SimConfig,
};
pub use rng::RngManager;
pub use sim::{ScenarioError, ScenarioMetrics, ScenarioState, SimulationScenario};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn route_optimizer_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyOptimizationEngine>()?;
    Ok(())
}
