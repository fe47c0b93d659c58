//! Headway adjuster
//!
//! Computes a demand-proportional target headway for the overloaded
//! route: `target = current_headway / severity`, clamped to the policy
//! band `[min_headway_s, max_headway_s]`. Only reductions (more frequent
//! service) are proposed — severity below 1.0 implies a headway increase,
//! which is outside this engine's remit — and a reduction is emitted only
//! when the implied additional vehicle-hours stay within the configured
//! budget.

use super::{ProposalStrategy, StrategyOutput};
use crate::detector::OverloadedSegment;
use crate::models::proposal::OptimizationProposal;
use crate::models::topology::{Route, Topology};
use crate::orchestrator::OptimizerConfig;

pub struct HeadwayAdjuster;

impl HeadwayAdjuster {
    /// Vehicles needed to hold a headway over one full route cycle
    fn vehicles_for_headway(route: &Route, headway_s: u64, config: &OptimizerConfig) -> u64 {
        let cycle_s = route.num_stops() as u64 * config.planning_interstop_s;
        cycle_s.div_ceil(headway_s).max(1)
    }
}

impl ProposalStrategy for HeadwayAdjuster {
    fn name(&self) -> &'static str {
        "headway"
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
                format!("headway: route {} not in topology", segment.route_id),
            );
        };

        let current = route.headway_s;
        let target = ((current as f64 / segment.severity).round() as u64)
            .clamp(config.min_headway_s, config.max_headway_s);

        if target >= current {
            return StrategyOutput::rejected(
                &segment.route_id,
                format!(
                    "headway: severity {:.2} in {} implies {}s ≥ current {}s, no reduction",
                    segment.severity,
                    segment.window.label(),
                    target,
                    current
                ),
            );
        }

        // Budget check: extra vehicles held for the whole window
        let extra_vehicles = Self::vehicles_for_headway(route, target, config)
            .saturating_sub(Self::vehicles_for_headway(route, current, config));
        let extra_vehicle_hours =
            extra_vehicles as f64 * segment.window.duration_s() as f64 / 3_600.0;

        if extra_vehicle_hours > config.vehicle_hours_budget {
            return StrategyOutput::rejected(
                &segment.route_id,
                format!(
                    "headway: {}s → {}s needs {:.1} extra vehicle-hours, budget is {:.1}",
                    current, target, extra_vehicle_hours, config.vehicle_hours_budget
                ),
            );
        }

        StrategyOutput {
            proposals: vec![OptimizationProposal::headway_change(
                &segment.route_id,
                segment.window,
                segment.severity,
                current,
                target,
            )],
            rejections: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::demand::TimeWindow;
    use crate::models::proposal::ProposalKind;
    use crate::models::topology::{ServiceType, Stop};

    fn topology(headway_s: u64) -> Topology {
        let stops = vec![
            Stop::new("S1", "a", 0.0, 0.0),
            Stop::new("S2", "b", 0.0, 0.1),
            Stop::new("S3", "c", 0.0, 0.2),
        ];
        let routes = vec![Route::new(
            "R1",
            vec!["S1".into(), "S2".into(), "S3".into()],
            50,
            headway_s,
            ServiceType::Bus,
        )];
        Topology::new(stops, routes).unwrap()
    }

    fn segment(severity: f64) -> OverloadedSegment {
        OverloadedSegment {
            route_id: "R1".into(),
            stop_ids: vec!["S2".into()],
            start_index: 1,
            end_index: 1,
            window: TimeWindow::hour(8),
            severity,
        }
    }

    #[test]
    fn test_halves_headway_at_severity_two() {
        // 10 min headway, severity 2.0 → 5 min, exactly min_headway
        let topology = topology(600);
        let config = OptimizerConfig::default();

        let output = HeadwayAdjuster.propose(&segment(2.0), &topology, &config);

        assert_eq!(output.proposals.len(), 1);
        match output.proposals[0].kind {
            ProposalKind::HeadwayChange {
                current_headway_s,
                target_headway_s,
            } => {
                assert_eq!(current_headway_s, 600);
                assert_eq!(target_headway_s, 300);
            }
            ref other => panic!("expected headway change, got {:?}", other),
        }
    }

    #[test]
    fn test_clamped_to_min_headway() {
        // Severity 4.0 wants 150s; policy floor is 300s
        let topology = topology(600);
        let config = OptimizerConfig::default();

        let output = HeadwayAdjuster.propose(&segment(4.0), &topology, &config);

        match output.proposals[0].kind {
            ProposalKind::HeadwayChange {
                target_headway_s, ..
            } => assert_eq!(target_headway_s, config.min_headway_s),
            ref other => panic!("expected headway change, got {:?}", other),
        }
    }

    #[test]
    fn test_low_severity_proposes_no_change() {
        // Severity 0.5 would double the headway: clamped to the policy band
        // and rejected because it is not a reduction
        let topology = topology(600);
        let config = OptimizerConfig::default();

        let output = HeadwayAdjuster.propose(&segment(0.5), &topology, &config);

        assert!(output.proposals.is_empty());
        assert_eq!(output.rejections.len(), 1);
        assert!(output.rejections[0].reason.contains("no reduction"));
    }

    #[test]
    fn test_vehicle_hours_budget_enforced() {
        // 900s → 300s triples the fleet on a 450s cycle; zero budget
        let topology = topology(900);
        let mut config = OptimizerConfig::default();
        config.vehicle_hours_budget = 0.0;

        let output = HeadwayAdjuster.propose(&segment(3.0), &topology, &config);

        assert!(output.proposals.is_empty());
        assert!(output.rejections[0].reason.contains("budget"));
    }
}
