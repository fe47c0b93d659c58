//! Overload detector
//!
//! Scans the demand index against per-route vehicle capacity and flags
//! contiguous overloaded stop segments per time window. No side effects:
//! the detector only reads the topology and the demand index.
//!
//! # Ordering
//!
//! Output is sorted severity-descending with deterministic tie-breaks
//! (earlier time window, then route id) so repeated runs over the same
//! inputs evaluate candidates in the same order.

use crate::models::demand::{DemandIndex, TimeWindow};
use crate::models::proposal::Rejection;
use crate::models::topology::{Route, Topology};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A route has no demand records for any window
///
/// Caller-visible but non-fatal: the route is skipped and the session
/// continues with the remaining routes.
#[derive(Debug, Error, PartialEq)]
#[error("route {route_id} has no demand records for any time window")]
pub struct InsufficientDataError {
    pub route_id: String,
}

/// A contiguous run of overloaded stops on one route in one time window
///
/// Invariant: `stop_ids` appear consecutively on the named route
/// (`start_index..=end_index`), and `severity` is the maximum
/// riders/capacity ratio observed inside the run, always at or above the
/// detection threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverloadedSegment {
    pub route_id: String,
    pub stop_ids: Vec<String>,
    pub start_index: usize,
    pub end_index: usize,
    pub window: TimeWindow,
    pub severity: f64,
}

impl OverloadedSegment {
    pub fn num_stops(&self) -> usize {
        self.stop_ids.len()
    }
}

/// Result of a full-network scan
#[derive(Debug, Clone, Default)]
pub struct DetectorOutput {
    /// Overloaded segments, severity-descending
    pub segments: Vec<OverloadedSegment>,

    /// Routes skipped for lack of demand data
    pub skipped: Vec<Rejection>,
}

/// Scan one route's stop sequence across all of its demand windows
///
/// A stop is "hot" in a window when `predicted_riders / capacity` meets the
/// threshold; consecutive hot stops merge into one segment.
pub fn scan_route(
    route: &Route,
    demand: &DemandIndex,
    threshold: f64,
) -> Result<Vec<OverloadedSegment>, InsufficientDataError> {
    if !demand.has_route(&route.id) {
        return Err(InsufficientDataError {
            route_id: route.id.clone(),
        });
    }

    let mut segments = Vec::new();

    for window in demand.windows_for_route(&route.id) {
        let mut run_start: Option<usize> = None;
        let mut run_severity = 0.0_f64;

        for (idx, stop_id) in route.stop_ids.iter().enumerate() {
            let ratio = demand
                .utilization(&route.id, stop_id, window, route.capacity)
                .unwrap_or(0.0);

            if ratio >= threshold {
                run_start.get_or_insert(idx);
                run_severity = run_severity.max(ratio);
            } else if let Some(start) = run_start.take() {
                segments.push(make_segment(route, start, idx - 1, window, run_severity));
                run_severity = 0.0;
            }
        }

        if let Some(start) = run_start {
            segments.push(make_segment(
                route,
                start,
                route.stop_ids.len() - 1,
                window,
                run_severity,
            ));
        }
    }

    Ok(segments)
}

/// Scan every route in the topology
///
/// Routes without demand data are reported in `skipped` rather than
/// aborting the scan.
pub fn scan(topology: &Topology, demand: &DemandIndex, threshold: f64) -> DetectorOutput {
    let mut output = DetectorOutput::default();

    for route in topology.routes() {
        match scan_route(route, demand, threshold) {
            Ok(mut segments) => output.segments.append(&mut segments),
            Err(err) => {
                log::debug!("overload scan skipping route: {}", err);
                output.skipped.push(Rejection::new(&route.id, err.to_string()));
            }
        }
    }

    output.segments.sort_by(|a, b| {
        b.severity
            .total_cmp(&a.severity)
            .then(a.window.cmp(&b.window))
            .then(a.route_id.cmp(&b.route_id))
    });

    output
}

fn make_segment(
    route: &Route,
    start: usize,
    end: usize,
    window: TimeWindow,
    severity: f64,
) -> OverloadedSegment {
    OverloadedSegment {
        route_id: route.id.clone(),
        stop_ids: route.stop_ids[start..=end].to_vec(),
        start_index: start,
        end_index: end,
        window,
        severity,
    }
}
