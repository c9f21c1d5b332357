pub mod allocator;
pub mod config;
pub mod context;
pub mod error;
pub mod flight;
pub mod geometry;
pub mod models;
pub mod pathfinder;
pub mod plan;

pub use allocator::{allocate, select_single_flight, validate_deliveries, Allocation};
pub use config::{PlannerConfig, SingleFlightPolicy};
pub use context::{PlanRequest, PlanningContext};
pub use error::{PlannerError, Result};
pub use flight::{build_flight, count_moves, Rejection};
pub use geometry::{
    angle_to_direction, distance, is_close, is_in_region, next_position, step_from, Direction16,
    CLOSE_RADIUS, STEP_SIZE,
};
pub use models::{
    DeliveryPath, DeliveryPlan, DroneCapability, DroneId, DronePath, DroneRecord, Flight,
    LineString, LngLat, Order, OrderId, Requirements, RestrictedArea,
};
pub use pathfinder::{PathOutcome, PathSearch, Pathfinder};
