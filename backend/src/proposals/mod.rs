//! Proposal generation
//!
//! Two independent strategies consume overloaded segments and emit
//! candidate service changes:
//!
//! 1. **ShortTurnProposer**: partial-route loop trips bracketing the
//!    congested segment
//! 2. **HeadwayAdjuster**: more frequent service on the whole route
//!
//! Both implement the [`ProposalStrategy`] trait and are pure given their
//! inputs — no global state — so each is independently testable. Candidates
//! that violate a hard constraint are discarded at generation time with a
//! recorded reason, never emitted.

use crate::detector::OverloadedSegment;
use crate::models::proposal::{OptimizationProposal, ProposalKind, Rejection};
use crate::models::topology::Topology;
use crate::orchestrator::OptimizerConfig;
use std::collections::HashMap;

mod headway;
mod short_turn;

pub use headway::HeadwayAdjuster;
pub use short_turn::ShortTurnProposer;

/// Proposals and discards produced by one strategy invocation
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    pub proposals: Vec<OptimizationProposal>,
    pub rejections: Vec<Rejection>,
}

impl StrategyOutput {
    pub fn rejected(route_id: &str, reason: impl Into<String>) -> Self {
        Self {
            proposals: Vec::new(),
            rejections: vec![Rejection::new(route_id, reason)],
        }
    }
}

/// A proposal strategy: overloaded segment in, zero or more candidates out
pub trait ProposalStrategy {
    /// Strategy name for logs and rejection reasons
    fn name(&self) -> &'static str;

    /// Evaluate one overloaded segment
    fn propose(
        &self,
        segment: &OverloadedSegment,
        topology: &Topology,
        config: &OptimizerConfig,
    ) -> StrategyOutput;
}

/// Run both strategies over every segment, enforcing the per-route
/// short-turn cap
///
/// Segments arrive severity-descending from the detector, so when a route
/// hits its `max_short_turns` cap it keeps the loops aimed at its worst
/// segments.
pub fn generate(
    segments: &[OverloadedSegment],
    topology: &Topology,
    config: &OptimizerConfig,
) -> StrategyOutput {
    let strategies: [&dyn ProposalStrategy; 2] = [&ShortTurnProposer, &HeadwayAdjuster];
    let mut output = StrategyOutput::default();
    let mut short_turns_per_route: HashMap<String, usize> = HashMap::new();

    for segment in segments {
        for strategy in strategies {
            let mut result = strategy.propose(segment, topology, config);

            result.proposals.retain(|proposal| {
                if !matches!(proposal.kind, ProposalKind::ShortTurnLoop { .. }) {
                    return true;
                }
                let count = short_turns_per_route
                    .entry(proposal.route_id.clone())
                    .or_insert(0);
                if *count >= config.max_short_turns {
                    output.rejections.push(Rejection::new(
                        &proposal.route_id,
                        format!(
                            "short-turn cap of {} reached for route {}",
                            config.max_short_turns, proposal.route_id
                        ),
                    ));
                    false
                } else {
                    *count += 1;
                    true
                }
            });

            output.proposals.append(&mut result.proposals);
            output.rejections.append(&mut result.rejections);
        }
    }

    log::info!(
        "proposal generation: {} candidates, {} rejections",
        output.proposals.len(),
        output.rejections.len()
    );

    output
}
