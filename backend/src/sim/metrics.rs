//! Scenario metrics
//!
//! Aggregated once at scenario completion and immutable afterwards. The
//! SHA-256 fingerprint over the canonical JSON form backs the engine's
//! replay-identity checks: identical seed and inputs must reproduce an
//! identical fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Performance metrics of one completed scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Mean wait between queue join and boarding, seconds
    pub avg_wait_s: f64,

    /// 90th percentile wait (nearest-rank), seconds
    pub p90_wait_s: f64,

    /// Mean onboard/capacity ratio sampled at each stop departure
    pub avg_load_factor: f64,

    /// Share of boarded passengers who waited at most the acceptable-wait
    /// threshold
    pub on_time_rate: f64,

    /// Passenger-seconds carried over capacity-seconds offered
    pub vehicle_utilization: f64,

    /// Passengers who boarded a vehicle
    pub passengers_served: u64,

    /// Passengers the service window never picked up
    pub passengers_stranded: u64,

    /// Vehicle trips dispatched
    pub vehicle_trips: u64,
}

impl ScenarioMetrics {
    /// Metrics of a scenario that carried nobody
    pub fn empty(vehicle_trips: u64) -> Self {
        Self {
            avg_wait_s: 0.0,
            p90_wait_s: 0.0,
            avg_load_factor: 0.0,
            // Vacuously on time: nobody waited
            on_time_rate: 1.0,
            vehicle_utilization: 0.0,
            passengers_served: 0,
            passengers_stranded: 0,
            vehicle_trips,
        }
    }

    /// SHA-256 over the canonical JSON form, hex-encoded
    ///
    /// Two runs with the same seed and inputs must produce the same
    /// fingerprint; used by the determinism tests and surfaced in the
    /// report for replay verification.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("metrics serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Nearest-rank percentile of a sorted sample
pub(crate) fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1] as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_boundary() {
        let metrics = ScenarioMetrics::empty(12);
        assert_eq!(metrics.avg_wait_s, 0.0);
        assert_eq!(metrics.vehicle_utilization, 0.0);
        assert_eq!(metrics.on_time_rate, 1.0);
        assert_eq!(metrics.vehicle_trips, 12);
    }

    #[test]
    fn test_fingerprint_stable_and_sensitive() {
        let a = ScenarioMetrics::empty(3);
        let b = ScenarioMetrics::empty(3);
        let c = ScenarioMetrics::empty(4);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let sample: Vec<u64> = (1..=10).collect();
        assert_eq!(percentile(&sample, 90.0), 9.0);
        assert_eq!(percentile(&sample, 100.0), 10.0);
        assert_eq!(percentile(&sample, 10.0), 1.0);
        assert_eq!(percentile(&[], 90.0), 0.0);
    }
}
