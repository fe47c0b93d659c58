//! Scenario entities
//!
//! Vehicles and passengers exist only for the lifetime of one scenario.
//! Both live in per-scenario arenas (`Vec`s owned by the scenario) and are
//! referenced by index; dropping the scenario drops every entity at once,
//! which keeps cross-scenario isolation explicit and avoids per-entity
//! heap churn during the run.

/// A vehicle working one trip on one trip pattern
#[derive(Debug, Clone)]
pub struct SimVehicle {
    /// Index of the trip pattern (route) in the scenario topology
    pub route_idx: usize,

    /// Position of the current (or next) stop on the pattern
    pub stop_pos: usize,

    /// Onboard passengers, by arena index
    pub onboard: Vec<usize>,

    /// Vehicle capacity (passengers)
    pub capacity: u32,

    /// When the trip entered service, seconds
    pub service_start_s: u64,

    /// When the trip retired at its last stop; `None` while in service
    pub service_end_s: Option<u64>,
}

impl SimVehicle {
    pub fn new(route_idx: usize, capacity: u32, service_start_s: u64) -> Self {
        Self {
            route_idx,
            stop_pos: 0,
            onboard: Vec::new(),
            capacity,
            service_start_s,
            service_end_s: None,
        }
    }

    /// Seats still free
    pub fn available_capacity(&self) -> usize {
        self.capacity as usize - self.onboard.len()
    }

    /// Current load factor (onboard / capacity)
    pub fn load_factor(&self) -> f64 {
        self.onboard.len() as f64 / self.capacity as f64
    }

    /// In-service duration, cut off at `horizon_s` for trips still running
    /// when the window closes
    pub fn service_duration_s(&self, horizon_s: u64) -> u64 {
        let end = self.service_end_s.unwrap_or(horizon_s).min(horizon_s);
        end.saturating_sub(self.service_start_s)
    }
}

/// One aggregate passenger flow unit
///
/// `board_s`/`alight_s` stay `None` for passengers the service window never
/// picked up or delivered; metrics read them off the arena at completion.
#[derive(Debug, Clone)]
pub struct SimPassenger {
    pub origin_stop: String,
    pub destination_stop: String,

    /// When the passenger joined the stop queue, seconds
    pub arrival_s: u64,

    pub board_s: Option<u64>,
    pub alight_s: Option<u64>,
}

impl SimPassenger {
    pub fn new(origin_stop: String, destination_stop: String, arrival_s: u64) -> Self {
        Self {
            origin_stop,
            destination_stop,
            arrival_s,
            board_s: None,
            alight_s: None,
        }
    }

    /// Observed wait between joining the queue and boarding
    pub fn wait_s(&self) -> Option<u64> {
        self.board_s.map(|b| b - self.arrival_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_capacity() {
        let mut vehicle = SimVehicle::new(0, 3, 0);
        assert_eq!(vehicle.available_capacity(), 3);

        vehicle.onboard.push(7);
        vehicle.onboard.push(9);
        assert_eq!(vehicle.available_capacity(), 1);
        assert!((vehicle.load_factor() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_service_duration_cut_at_horizon() {
        let mut vehicle = SimVehicle::new(0, 50, 1_000);

        // Still running at the horizon
        assert_eq!(vehicle.service_duration_s(5_000), 4_000);

        vehicle.service_end_s = Some(3_000);
        assert_eq!(vehicle.service_duration_s(5_000), 2_000);
    }

    #[test]
    fn test_passenger_wait() {
        let mut passenger = SimPassenger::new("S1".into(), "S3".into(), 100);
        assert_eq!(passenger.wait_s(), None);

        passenger.board_s = Some(160);
        assert_eq!(passenger.wait_s(), Some(60));
    }
}
