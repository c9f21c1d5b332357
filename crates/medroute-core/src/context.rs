//! Request-scoped planning context.
//!
//! One context holds one request's snapshot of the fleet and the restricted
//! areas, plus a memo of legs already searched. It is built per request and
//! dropped with it; the leg memo lives in a `RefCell`, so the context cannot
//! be shared between threads.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::models::{DroneCapability, DroneId, DroneRecord, LngLat, Order, RestrictedArea};
use crate::pathfinder::{PathOutcome, Pathfinder};

/// A full planning request as read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    /// Candidate drones, already filtered for capability and availability.
    pub drones: Vec<DroneRecord>,
    #[serde(default)]
    pub restricted_areas: Vec<RestrictedArea>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl PlanRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Exact endpoints of a leg, by bit pattern.
type LegKey = [u64; 4];

fn leg_key(from: LngLat, to: LngLat) -> LegKey {
    [
        from.lng.to_bits(),
        from.lat.to_bits(),
        to.lng.to_bits(),
        to.lat.to_bits(),
    ]
}

pub struct PlanningContext {
    drone_ids: Vec<DroneId>,
    origins: HashMap<DroneId, LngLat>,
    capabilities: HashMap<DroneId, DroneCapability>,
    pathfinder: Pathfinder,
    legs: RefCell<HashMap<LegKey, Option<Vec<LngLat>>>>,
}

impl PlanningContext {
    /// Build a context from separately fetched fleet data.
    ///
    /// `drone_ids` fixes the order drones are tried in. Ids missing from
    /// `origins` or `capabilities` are kept; the allocator skips them.
    pub fn new(
        drone_ids: Vec<DroneId>,
        origins: HashMap<DroneId, LngLat>,
        capabilities: HashMap<DroneId, DroneCapability>,
        restricted_areas: Vec<RestrictedArea>,
        config: PlannerConfig,
    ) -> Result<Self> {
        for origin in origins.values() {
            origin.validate()?;
        }
        Ok(Self {
            drone_ids,
            origins,
            capabilities,
            pathfinder: Pathfinder::new(restricted_areas, config)?,
            legs: RefCell::new(HashMap::new()),
        })
    }

    /// Build a context from combined drone records, in the given order.
    pub fn from_fleet(
        drones: &[DroneRecord],
        restricted_areas: Vec<RestrictedArea>,
        config: PlannerConfig,
    ) -> Result<Self> {
        let drone_ids = drones.iter().map(|d| d.id).collect();
        let origins = drones.iter().map(|d| (d.id, d.origin)).collect();
        let capabilities = drones
            .iter()
            .map(|d| (d.id, d.capability.clone()))
            .collect();
        Self::new(drone_ids, origins, capabilities, restricted_areas, config)
    }

    pub fn from_request(request: &PlanRequest, config: PlannerConfig) -> Result<Self> {
        Self::from_fleet(&request.drones, request.restricted_areas.clone(), config)
    }

    pub fn config(&self) -> &PlannerConfig {
        self.pathfinder.config()
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Candidate drones in the order they are tried.
    pub fn drone_ids(&self) -> &[DroneId] {
        &self.drone_ids
    }

    /// Origin and capability of a drone.
    pub fn drone(&self, id: DroneId) -> Result<(LngLat, &DroneCapability)> {
        match (self.origins.get(&id), self.capabilities.get(&id)) {
            (Some(origin), Some(capability)) => Ok((*origin, capability)),
            _ => Err(PlannerError::MissingDroneData(id)),
        }
    }

    /// Step path from `from` to near `to`, or `None` when unreachable.
    ///
    /// Results, including failures, are memoised for the life of the context.
    pub fn leg(&self, from: LngLat, to: LngLat) -> Option<Vec<LngLat>> {
        let key = leg_key(from, to);
        if let Some(cached) = self.legs.borrow().get(&key) {
            return cached.clone();
        }

        let search = self.pathfinder.find_path(from, to);
        let path = match search.outcome {
            PathOutcome::Found(path) => {
                tracing::trace!(
                    moves = path.len() - 1,
                    iterations = search.iterations,
                    elapsed_ms = search.elapsed.as_millis() as u64,
                    "leg found"
                );
                Some(path)
            }
            outcome => {
                tracing::debug!(
                    ?outcome,
                    ?from,
                    ?to,
                    iterations = search.iterations,
                    elapsed_ms = search.elapsed.as_millis() as u64,
                    "no path for leg"
                );
                None
            }
        };
        self.legs.borrow_mut().insert(key, path.clone());
        path
    }

    /// Number of distinct legs searched so far.
    pub fn cached_legs(&self) -> usize {
        self.legs.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability() -> DroneCapability {
        DroneCapability {
            cooling: false,
            heating: false,
            capacity: 4.0,
            max_moves: 2000,
            cost_per_move: 0.01,
            cost_initial: 4.3,
            cost_final: 6.5,
        }
    }

    #[test]
    fn missing_drone_data_is_reported() {
        let mut origins = HashMap::new();
        origins.insert(1, LngLat { lng: -3.186, lat: 55.944 });
        let ctx = PlanningContext::new(
            vec![1, 2],
            origins,
            HashMap::from([(1, capability()), (2, capability())]),
            Vec::new(),
            PlannerConfig::default(),
        )
        .unwrap();

        assert!(ctx.drone(1).is_ok());
        assert_eq!(ctx.drone(2).unwrap_err(), PlannerError::MissingDroneData(2));
        assert_eq!(ctx.drone_ids(), &[1, 2]);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let origins = HashMap::from([(1, LngLat { lng: 500.0, lat: 0.0 })]);
        let result = PlanningContext::new(
            vec![1],
            origins,
            HashMap::new(),
            Vec::new(),
            PlannerConfig::default(),
        );
        assert!(matches!(result, Err(PlannerError::InvalidPosition { .. })));
    }

    #[test]
    fn legs_are_memoised() {
        let ctx = PlanningContext::from_fleet(&[], Vec::new(), PlannerConfig::default()).unwrap();
        let from = LngLat { lng: -3.186, lat: 55.944 };
        let to = LngLat { lng: -3.185, lat: 55.945 };

        let first = ctx.leg(from, to);
        let second = ctx.leg(from, to);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(ctx.cached_legs(), 1);

        ctx.leg(to, from);
        assert_eq!(ctx.cached_legs(), 2);
    }

    #[test]
    fn request_parses_from_json() {
        let request = PlanRequest::from_json(
            r#"{
                "drones": [{
                    "id": 1,
                    "origin": { "lng": -3.186874, "lat": 55.944494 },
                    "capability": {
                        "cooling": true, "heating": false, "capacity": 4.0, "maxMoves": 2000,
                        "costPerMove": 0.01, "costInitial": 4.3, "costFinal": 6.5
                    }
                }],
                "restrictedAreas": [{
                    "name": "George Square Area",
                    "vertices": [
                        { "lng": -3.190578, "lat": 55.944494 },
                        { "lng": -3.187730, "lat": 55.944494 },
                        { "lng": -3.187730, "lat": 55.942617 },
                        { "lng": -3.190578, "lat": 55.942617 },
                        { "lng": -3.190578, "lat": 55.944494 }
                    ]
                }],
                "orders": [{
                    "id": 11,
                    "requirements": { "capacity": 1.0 },
                    "delivery": { "lng": -3.186, "lat": 55.945 }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(request.drones.len(), 1);
        assert_eq!(request.restricted_areas[0].vertices.len(), 5);
        let ctx = PlanningContext::from_request(&request, PlannerConfig::default()).unwrap();
        assert_eq!(ctx.pathfinder().restricted_areas().count(), 1);
    }

    #[test]
    fn malformed_request_is_an_error() {
        assert!(matches!(
            PlanRequest::from_json("{\"drones\": 3}"),
            Err(PlannerError::Request(_))
        ));
    }
}
