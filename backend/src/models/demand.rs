//! Forecasted demand view
//!
//! The demand table is produced externally (forecasting models upstream of
//! this engine) and consumed here read-only, keyed by stop, route and time
//! window. The one sanctioned mutation is [`DemandIndex::apply_reduction`]:
//! after a proposal is accepted, the affected cells are scaled down before
//! the next candidate is evaluated. That update is the greedy session's
//! single serialization point.

use crate::core::time::SECONDS_PER_HOUR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordinal demand level attached to each forecast row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DemandLevel {
    Low,
    Normal,
    High,
    Overloaded,
}

impl DemandLevel {
    /// Numeric utilization equivalent of an ordinal level
    ///
    /// Matches the platform's level↔ratio mapping so ordinal-only forecast
    /// rows can still parameterize arrivals.
    pub fn as_ratio(self) -> f64 {
        match self {
            DemandLevel::Low => 0.2,
            DemandLevel::Normal => 0.5,
            DemandLevel::High => 0.8,
            DemandLevel::Overloaded => 1.0,
        }
    }

    /// Classify a utilization ratio back into an ordinal level
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            DemandLevel::Overloaded
        } else if ratio >= 0.6 {
            DemandLevel::High
        } else if ratio >= 0.3 {
            DemandLevel::Normal
        } else {
            DemandLevel::Low
        }
    }
}

/// Half-open time window [start_s, end_s) in seconds from service start
///
/// Ordering is by start then end, which gives the "earlier window first"
/// tie-break everywhere windows are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_s: u64,
    pub end_s: u64,
}

impl TimeWindow {
    /// # Panics
    /// Panics if the window is empty or inverted
    pub fn new(start_s: u64, end_s: u64) -> Self {
        assert!(end_s > start_s, "time window must have positive duration");
        Self { start_s, end_s }
    }

    /// The one-hour window starting at `hour` (0-23)
    pub fn hour(hour: u64) -> Self {
        Self::new(hour * SECONDS_PER_HOUR, (hour + 1) * SECONDS_PER_HOUR)
    }

    pub fn duration_s(&self) -> u64 {
        self.end_s - self.start_s
    }

    pub fn contains(&self, t_s: u64) -> bool {
        t_s >= self.start_s && t_s < self.end_s
    }

    /// "HH:MM-HH:MM" label for reports and rejection reasons
    pub fn label(&self) -> String {
        let fmt = |s: u64| format!("{:02}:{:02}", s / SECONDS_PER_HOUR, (s % SECONDS_PER_HOUR) / 60);
        format!("{}-{}", fmt(self.start_s), fmt(self.end_s))
    }
}

/// One row of the forecasted demand table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRecord {
    pub stop_id: String,
    pub route_id: String,
    pub time_window: TimeWindow,
    /// Predicted boardings at this stop for this route over the window
    pub predicted_riders: f64,
    pub demand_level: DemandLevel,
}

/// Queryable view over the forecasted demand table
///
/// Cells are held in ordered maps so every scan over the index is
/// deterministic.
///
/// # Example
/// ```
/// use route_optimizer_core_rs::models::demand::{
///     DemandIndex, DemandLevel, DemandRecord, TimeWindow,
/// };
///
/// let index = DemandIndex::from_records(vec![DemandRecord {
///     stop_id: "S1".into(),
///     route_id: "R1".into(),
///     time_window: TimeWindow::hour(8),
///     predicted_riders: 55.0,
///     demand_level: DemandLevel::Overloaded,
/// }]);
///
/// assert_eq!(index.riders("R1", "S1", TimeWindow::hour(8)), Some(55.0));
/// assert_eq!(index.riders("R1", "S1", TimeWindow::hour(9)), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemandIndex {
    /// (route_id, stop_id) → window → predicted riders
    cells: BTreeMap<(String, String), BTreeMap<TimeWindow, f64>>,
}

impl DemandIndex {
    pub fn from_records(records: Vec<DemandRecord>) -> Self {
        let mut cells: BTreeMap<(String, String), BTreeMap<TimeWindow, f64>> = BTreeMap::new();

        for record in records {
            cells
                .entry((record.route_id, record.stop_id))
                .or_default()
                .insert(record.time_window, record.predicted_riders.max(0.0));
        }

        Self { cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Predicted riders for one cell
    pub fn riders(&self, route_id: &str, stop_id: &str, window: TimeWindow) -> Option<f64> {
        self.cells
            .get(&(route_id.to_string(), stop_id.to_string()))
            .and_then(|windows| windows.get(&window))
            .copied()
    }

    /// Utilization ratio of one cell against a vehicle capacity
    pub fn utilization(
        &self,
        route_id: &str,
        stop_id: &str,
        window: TimeWindow,
        capacity: u32,
    ) -> Option<f64> {
        if capacity == 0 {
            return None;
        }
        self.riders(route_id, stop_id, window)
            .map(|riders| riders / capacity as f64)
    }

    /// Whether the index has any record for this route
    pub fn has_route(&self, route_id: &str) -> bool {
        self.cells.keys().any(|(r, _)| r == route_id)
    }

    /// All windows with a record for this route, earliest first
    pub fn windows_for_route(&self, route_id: &str) -> Vec<TimeWindow> {
        let mut windows: Vec<TimeWindow> = self
            .cells
            .iter()
            .filter(|((r, _), _)| r == route_id)
            .flat_map(|(_, by_window)| by_window.keys().copied())
            .collect();
        windows.sort();
        windows.dedup();
        windows
    }

    /// The demand window covering `t_s` for a cell, with its riders
    pub fn window_containing(
        &self,
        route_id: &str,
        stop_id: &str,
        t_s: u64,
    ) -> Option<(TimeWindow, f64)> {
        self.cells
            .get(&(route_id.to_string(), stop_id.to_string()))?
            .iter()
            .find(|(window, _)| window.contains(t_s))
            .map(|(window, riders)| (*window, *riders))
    }

    /// Passenger arrival rate (riders per second) at a stop for a route at
    /// an instant; zero when no window covers `t_s`
    pub fn arrival_rate_at(&self, route_id: &str, stop_id: &str, t_s: u64) -> f64 {
        self.window_containing(route_id, stop_id, t_s)
            .map(|(window, riders)| riders / window.duration_s() as f64)
            .unwrap_or(0.0)
    }

    /// Start of the next demand window at or after `t_s` for a cell
    ///
    /// Lets the arrival process jump over gaps between forecast windows
    /// instead of sampling a zero-rate process.
    pub fn next_window_start(&self, route_id: &str, stop_id: &str, t_s: u64) -> Option<u64> {
        self.cells
            .get(&(route_id.to_string(), stop_id.to_string()))?
            .keys()
            .find(|window| window.end_s > t_s)
            .map(|window| window.start_s.max(t_s))
    }

    /// Scale the demand of the given stops on a route within a window
    ///
    /// Applied after a proposal is accepted: `factor` is the fraction of
    /// demand that remains (e.g. 0.6 after a 40% expected reduction).
    pub fn apply_reduction(
        &mut self,
        route_id: &str,
        stop_ids: &[String],
        window: TimeWindow,
        factor: f64,
    ) {
        let factor = factor.clamp(0.0, 1.0);
        for stop_id in stop_ids {
            if let Some(by_window) = self
                .cells
                .get_mut(&(route_id.to_string(), stop_id.to_string()))
            {
                if let Some(riders) = by_window.get_mut(&window) {
                    *riders *= factor;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stop: &str, route: &str, hour: u64, riders: f64) -> DemandRecord {
        DemandRecord {
            stop_id: stop.into(),
            route_id: route.into(),
            time_window: TimeWindow::hour(hour),
            predicted_riders: riders,
            demand_level: DemandLevel::from_ratio(riders / 50.0),
        }
    }

    #[test]
    fn test_level_ratio_round_trip() {
        assert_eq!(DemandLevel::from_ratio(DemandLevel::Overloaded.as_ratio()), DemandLevel::Overloaded);
        assert_eq!(DemandLevel::from_ratio(0.5), DemandLevel::Normal);
        assert_eq!(DemandLevel::from_ratio(0.1), DemandLevel::Low);
        assert_eq!(DemandLevel::from_ratio(0.7), DemandLevel::High);
    }

    #[test]
    fn test_window_ordering_is_earlier_first() {
        let mut windows = vec![TimeWindow::hour(9), TimeWindow::hour(7), TimeWindow::hour(8)];
        windows.sort();
        assert_eq!(windows[0], TimeWindow::hour(7));
        assert_eq!(windows[2], TimeWindow::hour(9));
    }

    #[test]
    fn test_window_label() {
        assert_eq!(TimeWindow::hour(8).label(), "08:00-09:00");
    }

    #[test]
    fn test_arrival_rate() {
        let index = DemandIndex::from_records(vec![record("S1", "R1", 8, 36.0)]);

        // 36 riders over one hour = 0.01 riders/second
        let rate = index.arrival_rate_at("R1", "S1", 8 * 3600 + 100);
        assert!((rate - 0.01).abs() < 1e-12);

        assert_eq!(index.arrival_rate_at("R1", "S1", 100), 0.0);
        assert_eq!(index.arrival_rate_at("R1", "MISSING", 8 * 3600), 0.0);
    }

    #[test]
    fn test_next_window_start_skips_gap() {
        let index =
            DemandIndex::from_records(vec![record("S1", "R1", 8, 10.0), record("S1", "R1", 12, 10.0)]);

        // Inside hour 8 the current window applies
        assert_eq!(index.next_window_start("R1", "S1", 8 * 3600 + 10), Some(8 * 3600 + 10));
        // In the gap we jump to hour 12
        assert_eq!(index.next_window_start("R1", "S1", 10 * 3600), Some(12 * 3600));
        // After the last window there is nothing left
        assert_eq!(index.next_window_start("R1", "S1", 13 * 3600), None);
    }

    #[test]
    fn test_apply_reduction_scales_only_targets() {
        let mut index = DemandIndex::from_records(vec![
            record("S1", "R1", 8, 50.0),
            record("S2", "R1", 8, 50.0),
            record("S1", "R1", 9, 50.0),
        ]);

        index.apply_reduction("R1", &["S1".to_string()], TimeWindow::hour(8), 0.6);

        assert_eq!(index.riders("R1", "S1", TimeWindow::hour(8)), Some(30.0));
        assert_eq!(index.riders("R1", "S2", TimeWindow::hour(8)), Some(50.0));
        assert_eq!(index.riders("R1", "S1", TimeWindow::hour(9)), Some(50.0));
    }

    #[test]
    fn test_windows_for_route() {
        let index = DemandIndex::from_records(vec![
            record("S1", "R1", 9, 10.0),
            record("S2", "R1", 8, 10.0),
            record("S1", "R2", 7, 10.0),
        ]);

        assert_eq!(
            index.windows_for_route("R1"),
            vec![TimeWindow::hour(8), TimeWindow::hour(9)]
        );
        assert!(index.has_route("R2"));
        assert!(!index.has_route("R3"));
    }
}
