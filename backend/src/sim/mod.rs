//! Discrete-event simulator
//!
//! Simulates passenger arrivals, vehicle movement, boarding/alighting and
//! dwell for one scenario at a time, producing `ScenarioMetrics`. Every
//! scenario is isolated: its own clock, RNG, event queue and entity arenas.

pub mod entities;
pub mod event_queue;
pub mod metrics;
pub mod scenario;

pub use entities::{SimPassenger, SimVehicle};
pub use event_queue::{EventQueue, SimEvent};
pub use metrics::ScenarioMetrics;
pub use scenario::{ScenarioError, ScenarioState, SimulationScenario};
