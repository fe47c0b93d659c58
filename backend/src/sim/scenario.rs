//! Simulation scenario
//!
//! One complete, isolated discrete-event run: either the baseline or a
//! candidate proposal applied to the topology view. The scenario owns its
//! clock, its RNG, its event queue and its entity arenas; nothing is shared
//! with other scenarios, so runs cannot contaminate each other.
//!
//! # State machine
//!
//! `Initialized` (entities constructed, clock at 0) → `Running` on start →
//! `Completed` when the clock reaches the horizon (metrics frozen) or
//! `Failed` (event queue starved of vehicles, or wall-clock budget
//! exceeded). A `Failed` scenario is reported, not retried.
//!
//! # Event flow
//!
//! - `PassengerArrival`: spawn a passenger at a stop with a uniformly drawn
//!   downstream destination, join the stop's FIFO queue, schedule the
//!   chain's next arrival from the demand index (exponential gaps — a
//!   Poisson-like process per stop and route).
//! - `VehicleArrival`: alight passengers destined here, board waiting
//!   passengers FIFO up to capacity (skipping riders whose destination the
//!   trip no longer serves — short-turn trips end early), dwell per fixed
//!   per-passenger boarding/alighting times, schedule departure.
//! - `VehicleDeparture`: advance to the next stop after a uniform
//!   travel-time draw.
//!
//! A passenger left behind by a full vehicle stays queued and is
//! re-evaluated at the next arrival; the longer observed wait is the
//! primary overload signal the impact evaluator reads.

use crate::core::time::SimClock;
use crate::models::demand::DemandIndex;
use crate::models::topology::Topology;
use crate::orchestrator::SimConfig;
use crate::rng::RngManager;
use crate::sim::entities::{SimPassenger, SimVehicle};
use crate::sim::event_queue::{EventQueue, SimEvent};
use crate::sim::metrics::{percentile, ScenarioMetrics};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use thiserror::Error;

/// Lifecycle of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Initialized,
    Running,
    Completed,
    Failed,
}

/// Ways a scenario can fail
///
/// Failures reject the candidate under evaluation but never abort the
/// session.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario {name}: event queue starved, no vehicles dispatchable")]
    Starved { name: String },

    #[error("scenario {name}: wall-clock budget of {budget_ms}ms exceeded")]
    WallClockExceeded { name: String, budget_ms: u64 },
}

/// One isolated discrete-event simulation run
pub struct SimulationScenario {
    name: String,
    topology: Topology,
    demand: DemandIndex,
    config: SimConfig,

    state: ScenarioState,
    clock: SimClock,
    rng: RngManager,
    seed: u64,
    queue: EventQueue,

    /// Entity arenas, dropped wholesale with the scenario
    vehicles: Vec<SimVehicle>,
    passengers: Vec<SimPassenger>,

    /// FIFO queues of waiting passengers, keyed (service group, stop id)
    waiting: HashMap<(String, String), VecDeque<usize>>,

    // Metric accumulators
    passenger_seconds: f64,
    load_factor_sum: f64,
    load_factor_samples: u64,
}

impl SimulationScenario {
    /// Construct a scenario in the `Initialized` state
    ///
    /// Dispatches one vehicle trip per pattern headway across the horizon
    /// and starts one arrival chain per (route, stop) cell that has demand.
    /// The topology passed in is already the scenario's view (baseline or
    /// proposal applied); the demand index is a snapshot taken at session
    /// level.
    pub fn new(
        name: impl Into<String>,
        topology: Topology,
        demand: DemandIndex,
        config: SimConfig,
    ) -> Self {
        let seed = config.random_seed;
        let mut scenario = Self {
            name: name.into(),
            topology,
            demand,
            clock: SimClock::new(config.simulation_hours),
            rng: RngManager::new(seed),
            seed,
            config,
            state: ScenarioState::Initialized,
            queue: EventQueue::new(),
            vehicles: Vec::new(),
            passengers: Vec::new(),
            waiting: HashMap::new(),
            passenger_seconds: 0.0,
            load_factor_sum: 0.0,
            load_factor_samples: 0,
        };

        scenario.dispatch_vehicles();
        scenario.start_arrival_chains();
        scenario
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One trip per headway interval per pattern, first trip at time 0
    fn dispatch_vehicles(&mut self) {
        for (route_idx, route) in self.topology.routes().iter().enumerate() {
            let mut depart_s = 0;
            while self.clock.within_horizon(depart_s) {
                let vehicle_idx = self.vehicles.len();
                self.vehicles
                    .push(SimVehicle::new(route_idx, route.capacity, depart_s));
                self.queue
                    .push(depart_s, SimEvent::VehicleArrival { vehicle_idx });
                depart_s += route.headway_s;
            }
        }
    }

    /// Start an arrival chain for every demand cell on base patterns
    ///
    /// Overlay patterns (short-turn loops) never get their own chains: they
    /// serve the queues of their service group's base route.
    fn start_arrival_chains(&mut self) {
        let base_routes: Vec<usize> = self
            .topology
            .routes()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.service_group == r.id)
            .map(|(idx, _)| idx)
            .collect();

        for route_idx in base_routes {
            // Passengers never originate at the terminus
            let last = self.topology.routes()[route_idx].num_stops() - 1;
            for stop_pos in 0..last {
                self.schedule_next_arrival(route_idx, stop_pos, 0);
            }
        }
    }

    /// Schedule the next exponential arrival for one (route, stop) chain
    ///
    /// The demand rate is piecewise-constant per window; a draw landing
    /// past its window's end re-anchors at the next window so gaps and
    /// rate changes are respected.
    fn schedule_next_arrival(&mut self, route_idx: usize, stop_pos: usize, from_s: u64) {
        let (route_id, stop_id) = {
            let route = &self.topology.routes()[route_idx];
            (route.id.clone(), route.stop_ids[stop_pos].clone())
        };

        let mut anchor = from_s;
        loop {
            let Some(window_start) = self.demand.next_window_start(&route_id, &stop_id, anchor)
            else {
                return;
            };
            let Some((window, riders)) =
                self.demand.window_containing(&route_id, &stop_id, window_start)
            else {
                return;
            };

            let rate = riders / window.duration_s() as f64;
            let Some(gap) = self.rng.exp_interval_s(rate) else {
                anchor = window.end_s;
                continue;
            };

            let t = window_start + gap;
            if t >= window.end_s {
                anchor = window.end_s;
                continue;
            }
            if !self.clock.within_horizon(t) {
                return;
            }

            self.queue
                .push(t, SimEvent::PassengerArrival { route_idx, stop_pos });
            return;
        }
    }

    /// Run the scenario to the horizon
    ///
    /// Transitions `Initialized → Running`, drains the event queue in
    /// (time, insertion) order, then freezes metrics in `Completed`. Fails
    /// without retrying when no vehicles are dispatchable or the wall-clock
    /// budget runs out.
    pub fn run(&mut self) -> Result<ScenarioMetrics, ScenarioError> {
        assert_eq!(
            self.state,
            ScenarioState::Initialized,
            "scenario can only run once"
        );

        if self.vehicles.is_empty() {
            self.state = ScenarioState::Failed;
            return Err(ScenarioError::Starved {
                name: self.name.clone(),
            });
        }

        self.state = ScenarioState::Running;
        let started = Instant::now();
        let mut processed: u64 = 0;

        while let Some(scheduled) = self.queue.pop() {
            // Events at or past the horizon are outside the service window
            if !self.clock.within_horizon(scheduled.time_s) {
                break;
            }
            self.clock.advance_to(scheduled.time_s);

            match scheduled.event {
                SimEvent::PassengerArrival {
                    route_idx,
                    stop_pos,
                } => self.on_passenger_arrival(route_idx, stop_pos),
                SimEvent::VehicleArrival { vehicle_idx } => self.on_vehicle_arrival(vehicle_idx),
                SimEvent::VehicleDeparture { vehicle_idx } => {
                    self.on_vehicle_departure(vehicle_idx)
                }
            }

            processed += 1;
            if processed % 1024 == 0
                && started.elapsed().as_millis() as u64 > self.config.scenario_wall_clock_ms
            {
                self.state = ScenarioState::Failed;
                return Err(ScenarioError::WallClockExceeded {
                    name: self.name.clone(),
                    budget_ms: self.config.scenario_wall_clock_ms,
                });
            }
        }

        let horizon = self.clock.horizon_s();
        self.clock.advance_to(horizon);
        self.state = ScenarioState::Completed;

        log::debug!(
            "scenario {} completed: {} passengers, {} trips, {} events",
            self.name,
            self.passengers.len(),
            self.vehicles.len(),
            processed
        );

        Ok(self.compute_metrics())
    }

    fn on_passenger_arrival(&mut self, route_idx: usize, stop_pos: usize) {
        let now = self.clock.now_s();

        let (group, origin, destination) = {
            let route = &self.topology.routes()[route_idx];
            let dest_pos = self
                .rng
                .range(stop_pos as i64 + 1, route.num_stops() as i64)
                as usize;
            (
                route.service_group.clone(),
                route.stop_ids[stop_pos].clone(),
                route.stop_ids[dest_pos].clone(),
            )
        };

        let passenger_idx = self.passengers.len();
        self.passengers
            .push(SimPassenger::new(origin.clone(), destination, now));
        self.waiting
            .entry((group, origin))
            .or_default()
            .push_back(passenger_idx);

        self.schedule_next_arrival(route_idx, stop_pos, now);
    }

    fn on_vehicle_arrival(&mut self, vehicle_idx: usize) {
        let now = self.clock.now_s();

        let (route_idx, stop_pos) = {
            let vehicle = &self.vehicles[vehicle_idx];
            (vehicle.route_idx, vehicle.stop_pos)
        };
        let (group, stop_id, downstream, is_last) = {
            let route = &self.topology.routes()[route_idx];
            (
                route.service_group.clone(),
                route.stop_ids[stop_pos].clone(),
                route.stop_ids[stop_pos + 1..].to_vec(),
                stop_pos + 1 == route.num_stops(),
            )
        };

        // Alight: everyone destined here; everyone at the end of the trip
        let mut alighted: u64 = 0;
        {
            let vehicle = &mut self.vehicles[vehicle_idx];
            let mut kept = Vec::with_capacity(vehicle.onboard.len());
            for &passenger_idx in &vehicle.onboard {
                let passenger = &mut self.passengers[passenger_idx];
                if is_last || passenger.destination_stop == stop_id {
                    passenger.alight_s = Some(now);
                    if let Some(board_s) = passenger.board_s {
                        self.passenger_seconds += (now - board_s) as f64;
                    }
                    alighted += 1;
                } else {
                    kept.push(passenger_idx);
                }
            }
            vehicle.onboard = kept;
        }

        // Board: FIFO by arrival, up to capacity, only riders this trip can
        // actually deliver; everyone else keeps their place in the queue
        let mut boarded: u64 = 0;
        if !is_last {
            if let Some(queue) = self.waiting.get_mut(&(group, stop_id)) {
                let vehicle = &mut self.vehicles[vehicle_idx];
                let mut remaining = VecDeque::with_capacity(queue.len());

                while let Some(passenger_idx) = queue.pop_front() {
                    let can_board = vehicle.available_capacity() > 0
                        && downstream.contains(&self.passengers[passenger_idx].destination_stop);

                    if can_board {
                        self.passengers[passenger_idx].board_s = Some(now);
                        vehicle.onboard.push(passenger_idx);
                        boarded += 1;
                    } else {
                        remaining.push_back(passenger_idx);
                    }
                }
                *queue = remaining;

                assert!(
                    vehicle.onboard.len() <= vehicle.capacity as usize,
                    "onboard count exceeds capacity on vehicle {}",
                    vehicle_idx
                );
            }
        }

        let dwell_s = boarded * self.config.boarding_s_per_passenger
            + alighted * self.config.alighting_s_per_passenger;

        let vehicle = &mut self.vehicles[vehicle_idx];
        if is_last {
            vehicle.service_end_s = Some(now + dwell_s);
        } else {
            self.load_factor_sum += vehicle.load_factor();
            self.load_factor_samples += 1;
            self.queue
                .push(now + dwell_s, SimEvent::VehicleDeparture { vehicle_idx });
        }
    }

    fn on_vehicle_departure(&mut self, vehicle_idx: usize) {
        let now = self.clock.now_s();

        let travel_s = self.rng.range(
            self.config.travel_time_min_s as i64,
            self.config.travel_time_max_s as i64 + 1,
        ) as u64;

        let vehicle = &mut self.vehicles[vehicle_idx];
        vehicle.stop_pos += 1;
        self.queue
            .push(now + travel_s, SimEvent::VehicleArrival { vehicle_idx });
    }

    fn compute_metrics(&self) -> ScenarioMetrics {
        let mut waits: Vec<u64> = self.passengers.iter().filter_map(|p| p.wait_s()).collect();
        waits.sort_unstable();

        let served = waits.len() as u64;
        let stranded = self.passengers.len() as u64 - served;
        let trips = self.vehicles.len() as u64;

        if served == 0 {
            let mut metrics = ScenarioMetrics::empty(trips);
            metrics.passengers_stranded = stranded;
            return metrics;
        }

        let avg_wait_s = waits.iter().sum::<u64>() as f64 / served as f64;
        let on_time = waits
            .iter()
            .filter(|&&w| w <= self.config.max_wait_s)
            .count() as f64
            / served as f64;

        let horizon = self.clock.horizon_s();
        let capacity_seconds: f64 = self
            .vehicles
            .iter()
            .map(|v| v.capacity as f64 * v.service_duration_s(horizon) as f64)
            .sum();
        let vehicle_utilization = if capacity_seconds > 0.0 {
            self.passenger_seconds / capacity_seconds
        } else {
            0.0
        };

        let avg_load_factor = if self.load_factor_samples > 0 {
            self.load_factor_sum / self.load_factor_samples as f64
        } else {
            0.0
        };

        ScenarioMetrics {
            avg_wait_s,
            p90_wait_s: percentile(&waits, 90.0),
            avg_load_factor,
            on_time_rate: on_time,
            vehicle_utilization,
            passengers_served: served,
            passengers_stranded: stranded,
            vehicle_trips: trips,
        }
    }
}
