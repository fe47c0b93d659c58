//! Optimization proposals
//!
//! Candidate service changes emitted by the proposal strategies. A proposal
//! is a tagged variant — short-turn loop or headway change — so downstream
//! code matches exhaustively instead of inspecting loosely-typed maps.

use crate::models::demand::TimeWindow;
use serde::{Deserialize, Serialize};

/// The concrete service change a proposal describes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposalKind {
    /// Partial-route trips turning around before the terminus to add
    /// capacity on a congested segment
    ShortTurnLoop {
        /// Scheduled stop where the loop enters service
        entry_stop: String,
        /// Scheduled stop where the loop turns around
        exit_stop: String,
        /// Position of `entry_stop` on the target route
        entry_index: usize,
        /// Position of `exit_stop` on the target route
        exit_index: usize,
        /// Implied insertion time for one loop trip, seconds
        insertion_time_s: u64,
    },

    /// Substituted headway on the target route
    HeadwayChange {
        current_headway_s: u64,
        target_headway_s: u64,
    },
}

impl ProposalKind {
    /// Short human-readable name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            ProposalKind::ShortTurnLoop { .. } => "short_turn_loop",
            ProposalKind::HeadwayChange { .. } => "headway_change",
        }
    }
}

/// A candidate service change, ready for simulation
///
/// Emitted only when every hard constraint is satisfied; candidates that
/// violate a constraint are discarded at generation time with a recorded
/// reason, so `constraints_satisfied` is an invariant of emitted proposals
/// rather than a filter for the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationProposal {
    /// Unique proposal identifier (UUID)
    pub id: String,

    /// Target route
    pub route_id: String,

    /// Time window the source overload was observed in
    pub window: TimeWindow,

    /// Severity of the source overloaded segment (max riders/capacity);
    /// drives severity-descending evaluation order
    pub severity: f64,

    /// The proposed change
    pub kind: ProposalKind,

    /// Estimated fractional demand reduction on the affected segment,
    /// prior to simulation
    pub expected_severity_reduction: f64,

    /// All hard constraints held at generation time
    pub constraints_satisfied: bool,
}

impl OptimizationProposal {
    #[allow(clippy::too_many_arguments)]
    pub fn short_turn(
        route_id: impl Into<String>,
        window: TimeWindow,
        severity: f64,
        entry_stop: impl Into<String>,
        exit_stop: impl Into<String>,
        entry_index: usize,
        exit_index: usize,
        insertion_time_s: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            route_id: route_id.into(),
            window,
            severity,
            kind: ProposalKind::ShortTurnLoop {
                entry_stop: entry_stop.into(),
                exit_stop: exit_stop.into(),
                entry_index,
                exit_index,
                insertion_time_s,
            },
            expected_severity_reduction: expected_reduction_for_severity(severity),
            constraints_satisfied: true,
        }
    }

    pub fn headway_change(
        route_id: impl Into<String>,
        window: TimeWindow,
        severity: f64,
        current_headway_s: u64,
        target_headway_s: u64,
    ) -> Self {
        // Reduction proportional to the frequency gain
        let reduction = if current_headway_s > 0 {
            1.0 - target_headway_s as f64 / current_headway_s as f64
        } else {
            0.0
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            route_id: route_id.into(),
            window,
            severity,
            kind: ProposalKind::HeadwayChange {
                current_headway_s,
                target_headway_s,
            },
            expected_severity_reduction: reduction.clamp(0.0, 1.0),
            constraints_satisfied: true,
        }
    }
}

/// Tiered demand-reduction estimate for a short-turn loop
///
/// Severity at or above 1.0 (demand exceeds capacity) is credited the
/// largest relief, overloaded-but-servable segments a moderate one, and
/// anything below the overload band a token one.
pub fn expected_reduction_for_severity(severity: f64) -> f64 {
    if severity >= 1.0 {
        0.4
    } else if severity >= 0.8 {
        0.3
    } else {
        0.1
    }
}

/// A discarded or skipped candidate with its human-readable reason
///
/// Rejections never abort the session; they are collected and surfaced in
/// the final report for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub route_id: String,
    pub reason: String,
}

impl Rejection {
    pub fn new(route_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            reason: reason.into(),
        }
    }
}
