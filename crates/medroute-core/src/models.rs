//! Core data models for the delivery planner.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

pub type DroneId = u32;
pub type OrderId = u32;

// ========== POSITIONS ==========

/// A (longitude, latitude) pair in decimal degrees.
///
/// Positions built through [`LngLat::new`] or deserialized from JSON are
/// guaranteed finite and inside the geographic range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLngLat")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Deserialize)]
struct RawLngLat {
    lng: f64,
    lat: f64,
}

impl TryFrom<RawLngLat> for LngLat {
    type Error = PlannerError;

    fn try_from(raw: RawLngLat) -> Result<Self> {
        LngLat::new(raw.lng, raw.lat)
    }
}

impl LngLat {
    /// Create a validated position.
    pub fn new(lng: f64, lat: f64) -> Result<Self> {
        let position = Self { lng, lat };
        position.validate()?;
        Ok(position)
    }

    /// Check finiteness and range.
    pub fn validate(&self) -> Result<()> {
        let reason = if !self.lng.is_finite() || !self.lat.is_finite() {
            "coordinates must be finite"
        } else if !(-180.0..=180.0).contains(&self.lng) {
            "longitude must be between -180 and 180"
        } else if !(-90.0..=90.0).contains(&self.lat) {
            "latitude must be between -90 and 90"
        } else {
            return Ok(());
        };
        Err(PlannerError::InvalidPosition {
            lng: self.lng,
            lat: self.lat,
            reason: reason.to_string(),
        })
    }
}

// ========== FLEET ==========

/// Capability and cost model of a single drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneCapability {
    #[serde(default)]
    pub cooling: bool,
    #[serde(default)]
    pub heating: bool,
    pub capacity: f64,
    pub max_moves: u32,
    pub cost_per_move: f64,
    pub cost_initial: f64,
    pub cost_final: f64,
}

impl DroneCapability {
    /// Cost of one round trip with the given number of moves.
    pub fn flight_cost(&self, moves: u32) -> f64 {
        self.cost_initial + self.cost_final + moves as f64 * self.cost_per_move
    }
}

/// A drone as delivered by the fleet snapshot: id, home position, capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneRecord {
    pub id: DroneId,
    pub origin: LngLat,
    pub capability: DroneCapability,
}

// ========== ORDERS ==========

/// Payload and environmental requirements of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub capacity: f64,
    #[serde(default)]
    pub cooling: bool,
    #[serde(default)]
    pub heating: bool,
    /// Ceiling on the share of the flight cost attributed to this order.
    #[serde(default)]
    pub max_cost: Option<f64>,
}

impl Requirements {
    pub fn with_capacity(capacity: f64) -> Self {
        Self {
            capacity,
            cooling: false,
            heating: false,
            max_cost: None,
        }
    }

    /// True when the drone provides the cooling/heating this order needs.
    pub fn satisfied_by(&self, capability: &DroneCapability) -> bool {
        (!self.cooling || capability.cooling) && (!self.heating || capability.heating)
    }
}

/// A medical dispatch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Dispatch date; availability was checked upstream.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Dispatch time (`HH:MM:SS`); availability was checked upstream.
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub requirements: Requirements,
    #[serde(default)]
    pub delivery: Option<LngLat>,
}

impl Order {
    pub fn new(id: OrderId, delivery: LngLat, requirements: Requirements) -> Self {
        Self {
            id,
            date: None,
            time: None,
            requirements,
            delivery: Some(delivery),
        }
    }
}

// ========== RESTRICTED AREAS ==========

/// A named no-fly polygon (closed ring - first == last, at least 4 vertices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictedArea {
    pub name: String,
    pub vertices: Vec<LngLat>,
}

impl RestrictedArea {
    pub fn new(name: impl Into<String>, vertices: Vec<LngLat>) -> Self {
        Self {
            name: name.into(),
            vertices,
        }
    }

    /// Validate the polygon ring.
    pub fn validate(&self) -> Result<()> {
        crate::geometry::validate_polygon(&self.vertices)
            .map_err(|e| match e {
                PlannerError::InvalidPolygon(msg) => {
                    PlannerError::InvalidPolygon(format!("{}: {}", self.name, msg))
                }
                other => other,
            })
    }
}

// ========== FLIGHTS & PLANS ==========

/// One round trip from a drone's origin through one or more deliveries.
///
/// `path` contains hover duplicates; `hover_indices[i]` is the index of the
/// hover point that marks delivery of `orders[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub orders: Vec<OrderId>,
    pub path: Vec<LngLat>,
    pub hover_indices: Vec<usize>,
    pub moves: u32,
    pub cost: f64,
}

/// Path flown for a single delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPath {
    pub delivery_id: OrderId,
    pub flight_path: Vec<LngLat>,
}

/// All deliveries flown by one drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DronePath {
    pub drone_id: DroneId,
    pub deliveries: Vec<DeliveryPath>,
}

/// Terminal output of a multi-drone planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPlan {
    pub total_cost: f64,
    pub total_moves: u32,
    pub drone_paths: Vec<DronePath>,
}

impl DeliveryPlan {
    pub fn empty() -> Self {
        Self {
            total_cost: 0.0,
            total_moves: 0,
            drone_paths: Vec::new(),
        }
    }
}

/// GeoJSON-style LineString used for single-flight visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    pub fn from_path(path: &[LngLat]) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates: path.iter().map(|p| [p.lng, p.lat]).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::from_path(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lnglat_rejects_out_of_range_and_non_finite() {
        assert!(LngLat::new(-3.19, 55.94).is_ok());
        assert!(LngLat::new(180.0, -90.0).is_ok());
        assert!(LngLat::new(180.5, 0.0).is_err());
        assert!(LngLat::new(0.0, 90.1).is_err());
        assert!(LngLat::new(f64::NAN, 0.0).is_err());
        assert!(LngLat::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn lnglat_deserialization_validates() {
        let ok: std::result::Result<LngLat, _> =
            serde_json::from_str(r#"{"lng": -3.19, "lat": 55.94}"#);
        assert_eq!(ok.unwrap(), LngLat { lng: -3.19, lat: 55.94 });

        let bad: std::result::Result<LngLat, _> =
            serde_json::from_str(r#"{"lng": 200.0, "lat": 55.94}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn order_parses_optional_fields() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 7,
            "date": "2025-12-22",
            "time": "14:30:00",
            "requirements": { "capacity": 0.75, "cooling": true, "maxCost": 13.5 },
            "delivery": { "lng": -3.186, "lat": 55.944 }
        }))
        .unwrap();

        assert_eq!(order.id, 7);
        assert!(order.date.is_some());
        assert!(order.time.is_some());
        assert!(order.requirements.cooling);
        assert!(!order.requirements.heating);
        assert_eq!(order.requirements.max_cost, Some(13.5));
    }

    #[test]
    fn requirements_match_capability_flags() {
        let caps = DroneCapability {
            cooling: true,
            heating: false,
            capacity: 4.0,
            max_moves: 2000,
            cost_per_move: 0.01,
            cost_initial: 4.3,
            cost_final: 6.5,
        };
        let mut req = Requirements::with_capacity(1.0);
        assert!(req.satisfied_by(&caps));
        req.cooling = true;
        assert!(req.satisfied_by(&caps));
        req.heating = true;
        assert!(!req.satisfied_by(&caps));
    }

    #[test]
    fn plan_serializes_camel_case() {
        let plan = DeliveryPlan {
            total_cost: 12.5,
            total_moves: 3,
            drone_paths: vec![DronePath {
                drone_id: 4,
                deliveries: vec![DeliveryPath {
                    delivery_id: 9,
                    flight_path: vec![LngLat { lng: 1.0, lat: 2.0 }],
                }],
            }],
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["totalCost"], 12.5);
        assert_eq!(value["totalMoves"], 3);
        assert_eq!(value["dronePaths"][0]["droneId"], 4);
        assert_eq!(value["dronePaths"][0]["deliveries"][0]["deliveryId"], 9);
        assert_eq!(
            value["dronePaths"][0]["deliveries"][0]["flightPath"][0]["lng"],
            1.0
        );
    }

    #[test]
    fn empty_line_string_keeps_type() {
        let value = serde_json::to_value(LineString::empty()).unwrap();
        assert_eq!(value["type"], "LineString");
        assert_eq!(value["coordinates"].as_array().map(|a| a.len()), Some(0));
    }
}
