//! Static route topology
//!
//! Routes, ordered stop sequences and stop geography, sourced from static
//! schedule data. Pure data: the topology is immutable within one
//! optimization run and is never mutated, only referenced. Candidate
//! proposals are applied by deriving a per-scenario *view* with
//! [`Topology::with_proposal`]; the baseline always simulates the original.

use crate::models::proposal::{OptimizationProposal, ProposalKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Declared service type of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Bus,
    Rail,
}

/// Errors raised while assembling a topology
///
/// These are fatal for the session: without a valid topology there is
/// nothing to optimize.
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("route {route_id} references unknown stop {stop_id}")]
    UnknownStop { route_id: String, stop_id: String },

    #[error("duplicate route id {0}")]
    DuplicateRoute(String),

    #[error("duplicate stop id {0}")]
    DuplicateStop(String),

    #[error("route {0} must have at least two stops")]
    TooFewStops(String),

    #[error("route {0} must have positive capacity and headway")]
    InvalidService(String),

    #[error("topology contains no routes")]
    NoRoutes,
}

/// A transit stop with its geographic position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Stop {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// A route: an ordered stop sequence plus its service parameters
///
/// `service_group` ties overlay trip patterns (short-turn loops) back to the
/// route whose passengers they serve; for a plain route it equals `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Unique route identifier
    pub id: String,

    /// Ordered stop ids from first to last scheduled stop
    pub stop_ids: Vec<String>,

    /// Vehicle capacity (passengers)
    pub capacity: u32,

    /// Scheduled headway between successive vehicles, seconds
    pub headway_s: u64,

    /// Declared service type
    pub service_type: ServiceType,

    /// Route whose passenger queues this pattern serves
    pub service_group: String,
}

impl Route {
    pub fn new(
        id: impl Into<String>,
        stop_ids: Vec<String>,
        capacity: u32,
        headway_s: u64,
        service_type: ServiceType,
    ) -> Self {
        let id = id.into();
        Self {
            service_group: id.clone(),
            id,
            stop_ids,
            capacity,
            headway_s,
            service_type,
        }
    }

    /// Position of a stop on this route (first occurrence)
    pub fn stop_index(&self, stop_id: &str) -> Option<usize> {
        self.stop_ids.iter().position(|s| s == stop_id)
    }

    /// Index of the route's midpoint stop
    pub fn midpoint_index(&self) -> usize {
        self.stop_ids.len() / 2
    }

    pub fn num_stops(&self) -> usize {
        self.stop_ids.len()
    }
}

/// Static representation of the route network
///
/// Routes are held in id order so every walk over the network is
/// deterministic regardless of input ordering.
///
/// # Example
/// ```
/// use route_optimizer_core_rs::models::topology::{Route, ServiceType, Stop, Topology};
///
/// let stops = vec![
///     Stop::new("S1", "First St", 33.75, -84.39),
///     Stop::new("S2", "Second St", 33.76, -84.39),
/// ];
/// let routes = vec![Route::new(
///     "R1",
///     vec!["S1".to_string(), "S2".to_string()],
///     50,
///     600,
///     ServiceType::Bus,
/// )];
///
/// let topology = Topology::new(stops, routes).unwrap();
/// assert_eq!(topology.num_routes(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// All stops, indexed by id
    stops: HashMap<String, Stop>,

    /// All routes, sorted by id
    routes: Vec<Route>,
}

impl Topology {
    /// Assemble and validate a topology
    ///
    /// Validates referential integrity (every route stop exists), uniqueness
    /// of ids, and basic service sanity (at least two stops, positive
    /// capacity and headway).
    pub fn new(stops: Vec<Stop>, mut routes: Vec<Route>) -> Result<Self, TopologyError> {
        if routes.is_empty() {
            return Err(TopologyError::NoRoutes);
        }

        let mut stop_map = HashMap::with_capacity(stops.len());
        for stop in stops {
            if stop_map.contains_key(&stop.id) {
                return Err(TopologyError::DuplicateStop(stop.id));
            }
            stop_map.insert(stop.id.clone(), stop);
        }

        routes.sort_by(|a, b| a.id.cmp(&b.id));
        for pair in routes.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(TopologyError::DuplicateRoute(pair[0].id.clone()));
            }
        }

        for route in &routes {
            if route.stop_ids.len() < 2 {
                return Err(TopologyError::TooFewStops(route.id.clone()));
            }
            if route.capacity == 0 || route.headway_s == 0 {
                return Err(TopologyError::InvalidService(route.id.clone()));
            }
            for stop_id in &route.stop_ids {
                if !stop_map.contains_key(stop_id) {
                    return Err(TopologyError::UnknownStop {
                        route_id: route.id.clone(),
                        stop_id: stop_id.clone(),
                    });
                }
            }
        }

        Ok(Self {
            stops: stop_map,
            routes,
        })
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// Routes in id order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn stops(&self) -> &HashMap<String, Stop> {
        &self.stops
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    /// Derive the scenario view of this topology with one proposal applied
    ///
    /// - `ShortTurnLoop`: inserts an overlay trip pattern covering the
    ///   bracketed stops, in the same service group as the target route, so
    ///   the extra vehicles serve the congested segment's queues.
    /// - `HeadwayChange`: substitutes the target route's headway.
    ///
    /// The receiver is left untouched; returns `None` when the proposal's
    /// target route does not exist in this topology.
    pub fn with_proposal(&self, proposal: &OptimizationProposal) -> Option<Topology> {
        let mut view = self.clone();
        let route = view.routes.iter_mut().find(|r| r.id == proposal.route_id)?;

        match &proposal.kind {
            ProposalKind::HeadwayChange {
                target_headway_s, ..
            } => {
                route.headway_s = *target_headway_s;
            }
            ProposalKind::ShortTurnLoop {
                entry_index,
                exit_index,
                ..
            } => {
                if *exit_index >= route.stop_ids.len() || entry_index >= exit_index {
                    return None;
                }
                let overlay = Route {
                    id: format!("{}_short_turn", route.id),
                    stop_ids: route.stop_ids[*entry_index..=*exit_index].to_vec(),
                    capacity: route.capacity,
                    headway_s: route.headway_s,
                    service_type: route.service_type,
                    service_group: route.service_group.clone(),
                };
                view.routes.push(overlay);
                view.routes.sort_by(|a, b| a.id.cmp(&b.id));
            }
        }

        Some(view)
    }
}
