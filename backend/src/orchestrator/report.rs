//! Optimization report
//!
//! The session's final output: accepted proposals with their paired
//! baseline/optimized metrics, the discard list with reasons, and an
//! overall impact summary. Serializes to the structured document the
//! reporting collaborators consume; `render_text` produces the
//! operator-facing report the CLI prints.

use crate::models::proposal::{OptimizationProposal, ProposalKind, Rejection};
use crate::sim::ScenarioMetrics;
use serde::{Deserialize, Serialize};

/// An accepted proposal with its simulated evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedProposal {
    pub proposal: OptimizationProposal,

    /// Session baseline the candidate was compared against
    pub baseline: ScenarioMetrics,

    /// Metrics with the proposal applied
    pub optimized: ScenarioMetrics,

    /// Additional vehicle-hours the change costs over its window
    pub vehicle_hours_delta: f64,
}

impl AcceptedProposal {
    /// Simulated average-wait reduction, seconds
    pub fn wait_reduction_s(&self) -> f64 {
        self.baseline.avg_wait_s - self.optimized.avg_wait_s
    }
}

/// One metric's baseline/optimized pair for the comparison table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub baseline: f64,
    pub optimized: f64,
    pub improvement_absolute: f64,
    pub improvement_percent: f64,
}

/// Baseline-vs-optimized comparison across the headline metrics
pub fn compare(baseline: &ScenarioMetrics, optimized: &ScenarioMetrics) -> Vec<MetricComparison> {
    let rows: [(&str, f64, f64); 5] = [
        ("avg_wait_s", baseline.avg_wait_s, optimized.avg_wait_s),
        ("p90_wait_s", baseline.p90_wait_s, optimized.p90_wait_s),
        (
            "avg_load_factor",
            baseline.avg_load_factor,
            optimized.avg_load_factor,
        ),
        ("on_time_rate", baseline.on_time_rate, optimized.on_time_rate),
        (
            "vehicle_utilization",
            baseline.vehicle_utilization,
            optimized.vehicle_utilization,
        ),
    ];

    rows.iter()
        .map(|(metric, base, opt)| MetricComparison {
            metric: metric.to_string(),
            baseline: *base,
            optimized: *opt,
            improvement_absolute: opt - base,
            improvement_percent: if *base != 0.0 {
                (opt - base) / base * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

/// Aggregate impact of the whole session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub routes_analyzed: usize,
    pub segments_detected: usize,
    pub candidates_evaluated: usize,

    /// Sum of per-proposal average-wait reductions, seconds
    pub total_wait_reduction_s: f64,

    /// Net additional vehicle-hours across accepted proposals
    pub vehicle_hours_delta: f64,
}

/// Final output of one optimization session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Accepted proposals in acceptance (severity) order
    pub accepted: Vec<AcceptedProposal>,

    /// The session baseline every candidate was compared against
    pub baseline: ScenarioMetrics,

    pub summary: ImpactSummary,

    /// Skipped routes and discarded candidates, with reasons
    pub rejections: Vec<Rejection>,

    /// True when the session deadline cut evaluation short
    pub partial: bool,
}

impl OptimizationReport {
    /// Operator-facing text rendering
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Route Optimization Report\n");
        out.push_str("=========================\n\n");

        out.push_str("SUMMARY\n-------\n");
        out.push_str(&format!(
            "Routes analyzed:      {}\n",
            self.summary.routes_analyzed
        ));
        out.push_str(&format!(
            "Overloaded segments:  {}\n",
            self.summary.segments_detected
        ));
        out.push_str(&format!(
            "Candidates evaluated: {}\n",
            self.summary.candidates_evaluated
        ));
        out.push_str(&format!("Accepted proposals:   {}\n", self.accepted.len()));
        out.push_str(&format!(
            "Total wait reduction: {:.1} s\n",
            self.summary.total_wait_reduction_s
        ));
        out.push_str(&format!(
            "Vehicle-hours delta:  {:+.1}\n",
            self.summary.vehicle_hours_delta
        ));
        if self.partial {
            out.push_str("NOTE: session deadline reached, results are partial\n");
        }
        out.push('\n');

        out.push_str("ACCEPTED PROPOSALS\n------------------\n");
        if self.accepted.is_empty() {
            out.push_str("(none)\n");
        }
        for (i, accepted) in self.accepted.iter().enumerate() {
            let p = &accepted.proposal;
            out.push_str(&format!(
                "{}. route {} [{}] {}\n",
                i + 1,
                p.route_id,
                p.window.label(),
                describe_kind(&p.kind)
            ));
            out.push_str(&format!(
                "   severity {:.2}, wait {:.1}s → {:.1}s ({:+.1}s), vehicle-hours {:+.1}\n",
                p.severity,
                accepted.baseline.avg_wait_s,
                accepted.optimized.avg_wait_s,
                -accepted.wait_reduction_s(),
                accepted.vehicle_hours_delta
            ));
            for row in compare(&accepted.baseline, &accepted.optimized) {
                out.push_str(&format!(
                    "   {:<20} {:>10.3} → {:>10.3} ({:+.1}%)\n",
                    row.metric, row.baseline, row.optimized, row.improvement_percent
                ));
            }
        }
        out.push('\n');

        if !self.rejections.is_empty() {
            out.push_str("REJECTIONS\n----------\n");
            for rejection in &self.rejections {
                out.push_str(&format!("- {}: {}\n", rejection.route_id, rejection.reason));
            }
        }

        out
    }
}

fn describe_kind(kind: &ProposalKind) -> String {
    match kind {
        ProposalKind::ShortTurnLoop {
            entry_stop,
            exit_stop,
            ..
        } => format!("short-turn loop {} ↔ {}", entry_stop, exit_stop),
        ProposalKind::HeadwayChange {
            current_headway_s,
            target_headway_s,
        } => format!(
            "headway {}m → {}m",
            current_headway_s / 60,
            target_headway_s / 60
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::demand::TimeWindow;

    fn metrics(avg_wait: f64) -> ScenarioMetrics {
        ScenarioMetrics {
            avg_wait_s: avg_wait,
            p90_wait_s: avg_wait * 2.0,
            avg_load_factor: 0.5,
            on_time_rate: 0.9,
            vehicle_utilization: 0.4,
            passengers_served: 100,
            passengers_stranded: 5,
            vehicle_trips: 20,
        }
    }

    #[test]
    fn test_compare_improvement_percent() {
        let rows = compare(&metrics(100.0), &metrics(80.0));
        let wait = rows.iter().find(|r| r.metric == "avg_wait_s").unwrap();

        assert_eq!(wait.improvement_absolute, -20.0);
        assert!((wait.improvement_percent + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_text_mentions_partial() {
        let report = OptimizationReport {
            accepted: vec![],
            baseline: metrics(100.0),
            summary: ImpactSummary::default(),
            rejections: vec![Rejection::new("R1", "no demand data")],
            partial: true,
        };

        let text = report.render_text();
        assert!(text.contains("partial"));
        assert!(text.contains("R1: no demand data"));
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = OptimizationReport {
            accepted: vec![AcceptedProposal {
                proposal: OptimizationProposal::headway_change(
                    "R1",
                    TimeWindow::hour(8),
                    2.0,
                    600,
                    300,
                ),
                baseline: metrics(100.0),
                optimized: metrics(60.0),
                vehicle_hours_delta: 2.0,
            }],
            baseline: metrics(100.0),
            summary: ImpactSummary::default(),
            rejections: vec![],
            partial: false,
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: OptimizationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.accepted.len(), 1);
        assert_eq!(back.accepted[0].wait_reduction_s(), 40.0);
    }
}
