//! Short-turn loop proposer
//!
//! A short-turn loop is a partial-route trip turning around before the
//! normal terminus, adding vehicles exactly where demand exceeds capacity.
//! The proposer picks a turnaround pair (entry stop, exit stop) bracketing
//! the overloaded segment:
//!
//! - both must be scheduled stops on the route, with exit after entry
//! - the implied insertion time for one loop trip must stay within
//!   `max_detour_time_s`
//! - among feasible brackets, the narrowest fully-covering one wins
//!   (least operational disruption), ties going to the bracket whose
//!   midpoint sits closest to the route midpoint
//!
//! A segment with no feasible bracket yields zero proposals — that is an
//! expected outcome, not an error.

use super::{ProposalStrategy, StrategyOutput};
use crate::detector::OverloadedSegment;
use crate::models::proposal::OptimizationProposal;
use crate::models::topology::Topology;
use crate::orchestrator::OptimizerConfig;

pub struct ShortTurnProposer;

/// A candidate turnaround pair under evaluation
struct Bracket {
    entry: usize,
    exit: usize,
    width: usize,
    midpoint_distance: usize,
    insertion_time_s: u64,
}

impl ProposalStrategy for ShortTurnProposer {
    fn name(&self) -> &'static str {
        "short_turn"
    }

    fn propose(
        &self,
        segment: &OverloadedSegment,
        topology: &Topology,
        config: &OptimizerConfig,
    ) -> StrategyOutput {
        let Some(route) = topology.route(&segment.route_id) else {
            return StrategyOutput::rejected(
                &segment.route_id,
                format!("short_turn: route {} not in topology", segment.route_id),
            );
        };

        let route_midpoint = route.midpoint_index();
        let mut best: Option<Bracket> = None;

        // Entry at or before the segment, exit at or after it; a loop needs
        // at least two distinct stops.
        for entry in 0..=segment.start_index {
            for exit in segment.end_index..route.num_stops() {
                if exit <= entry {
                    continue;
                }

                let width = exit - entry;
                let insertion_time_s = width as u64 * config.planning_interstop_s;
                if insertion_time_s > config.max_detour_time_s {
                    continue;
                }

                let bracket_midpoint = (entry + exit) / 2;
                let candidate = Bracket {
                    entry,
                    exit,
                    width,
                    midpoint_distance: bracket_midpoint.abs_diff(route_midpoint),
                    insertion_time_s,
                };

                let better = match &best {
                    None => true,
                    Some(current) => (candidate.width, candidate.midpoint_distance)
                        < (current.width, current.midpoint_distance),
                };
                if better {
                    best = Some(candidate);
                }
            }
        }

        match best {
            Some(bracket) => {
                let proposal = OptimizationProposal::short_turn(
                    &segment.route_id,
                    segment.window,
                    segment.severity,
                    &route.stop_ids[bracket.entry],
                    &route.stop_ids[bracket.exit],
                    bracket.entry,
                    bracket.exit,
                    bracket.insertion_time_s,
                );
                StrategyOutput {
                    proposals: vec![proposal],
                    rejections: Vec::new(),
                }
            }
            None => StrategyOutput::rejected(
                &segment.route_id,
                format!(
                    "short_turn: no turnaround bracket covers stops {}..{} within {}s detour",
                    segment.start_index, segment.end_index, config.max_detour_time_s
                ),
            ),
        }
    }
}
