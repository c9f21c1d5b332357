//! Error types for the delivery planner.

use thiserror::Error;

use crate::models::DroneId;

/// Planner error type.
///
/// Unreachable legs and infeasible flights are not errors; the pathfinder and
/// flight builder report those as outcomes so the allocator can move on to the
/// next drone or order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("invalid position ({lng}, {lat}): {reason}")]
    InvalidPosition { lng: f64, lat: f64, reason: String },

    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("angle {0} must be one of 0, 22.5, 45, ..., 360")]
    InvalidAngle(f64),

    #[error("drone {0} has no origin or capability record")]
    MissingDroneData(DroneId),

    #[error("could not allocate {remaining} order(s) after {round} round(s)")]
    AllocationFailed { remaining: usize, round: usize },

    #[error("malformed request: {0}")]
    Request(String),
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::Request(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
