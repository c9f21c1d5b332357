//! Planar geometry for step-quantized drone movement and no-fly polygons.
//!
//! Distances are Euclidean in degrees, which is accurate enough at city
//! scale and matches the fixed step size the drones fly.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::models::LngLat;

/// Length of one move in degrees.
pub const STEP_SIZE: f64 = 0.00015;

/// Goal radius for pathfinding; equal to one step.
pub const CLOSE_RADIUS: f64 = STEP_SIZE;

/// Tolerance (degrees) for "point lies on a polygon edge".
pub const BOUNDARY_EPS: f64 = 1e-12;

/// Tolerance for orientation cross products (squared degrees).
const ORIENT_EPS: f64 = 1e-20;

/// Angular spacing between the 16 compass directions.
pub const DIRECTION_SPACING_DEG: f64 = 22.5;

/// Euclidean distance between two positions.
pub fn distance(a: LngLat, b: LngLat) -> f64 {
    (a.lng - b.lng).hypot(a.lat - b.lat)
}

/// True if `b` is within one step of `a`.
pub fn is_close(a: LngLat, b: LngLat) -> bool {
    distance(a, b) < CLOSE_RADIUS
}

/// The 16 compass directions, counter-clockwise from east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction16 {
    E,
    ENE,
    NE,
    NNE,
    N,
    NNW,
    NW,
    WNW,
    W,
    WSW,
    SW,
    SSW,
    S,
    SSE,
    SE,
    ESE,
}

impl Direction16 {
    pub const ALL: [Direction16; 16] = [
        Direction16::E,
        Direction16::ENE,
        Direction16::NE,
        Direction16::NNE,
        Direction16::N,
        Direction16::NNW,
        Direction16::NW,
        Direction16::WNW,
        Direction16::W,
        Direction16::WSW,
        Direction16::SW,
        Direction16::SSW,
        Direction16::S,
        Direction16::SSE,
        Direction16::SE,
        Direction16::ESE,
    ];

    /// Bearing in degrees, 0 = east, 90 = north.
    pub fn bearing_deg(self) -> f64 {
        self as usize as f64 * DIRECTION_SPACING_DEG
    }
}

/// Map a bearing onto one of the 16 directions.
///
/// Only exact multiples of 22.5 in `[0, 360]` are accepted; 360 maps to east.
pub fn angle_to_direction(bearing_deg: f64) -> Result<Direction16> {
    if !(0.0..=360.0).contains(&bearing_deg) || bearing_deg % DIRECTION_SPACING_DEG != 0.0 {
        return Err(PlannerError::InvalidAngle(bearing_deg));
    }
    let idx = (bearing_deg % 360.0 / DIRECTION_SPACING_DEG) as usize % Direction16::ALL.len();
    Ok(Direction16::ALL[idx])
}

/// Translate `pos` by one step along `direction`.
pub fn step_from(pos: LngLat, direction: Direction16) -> LngLat {
    let rad = direction.bearing_deg().to_radians();
    LngLat {
        lng: pos.lng + rad.cos() * STEP_SIZE,
        lat: pos.lat + rad.sin() * STEP_SIZE,
    }
}

/// Next position after one step at a raw bearing.
pub fn next_position(start: LngLat, bearing_deg: f64) -> Result<LngLat> {
    Ok(step_from(start, angle_to_direction(bearing_deg)?))
}

/// Check the ring is closed and has at least 4 vertices.
pub fn validate_polygon(vertices: &[LngLat]) -> Result<()> {
    if vertices.len() < 4 {
        return Err(PlannerError::InvalidPolygon(format!(
            "polygon must have at least 4 vertices, got {}",
            vertices.len()
        )));
    }
    let first = vertices[0];
    let last = vertices[vertices.len() - 1];
    if first != last {
        return Err(PlannerError::InvalidPolygon(
            "polygon must be closed (last vertex repeats first)".to_string(),
        ));
    }
    Ok(())
}

/// True if `point` is inside the polygon or on its boundary.
///
/// Fails with [`PlannerError::InvalidPolygon`] for open rings or rings with
/// fewer than 4 vertices.
pub fn is_in_region(point: LngLat, vertices: &[LngLat]) -> Result<bool> {
    validate_polygon(vertices)?;
    Ok(contains_point(point, vertices))
}

/// Boundary-inclusive containment for an already validated closed ring.
pub(crate) fn contains_point(point: LngLat, vertices: &[LngLat]) -> bool {
    if vertices
        .windows(2)
        .any(|edge| on_segment(point, edge[0], edge[1]))
    {
        return true;
    }

    // Even-odd ray casting along +lng.
    let mut inside = false;
    for edge in vertices.windows(2) {
        let (a, b) = (edge[0], edge[1]);
        if (a.lat > point.lat) != (b.lat > point.lat) {
            let crossing_lng = (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if point.lng < crossing_lng {
                inside = !inside;
            }
        }
    }
    inside
}

/// True if `p` lies on segment `ab` within [`BOUNDARY_EPS`].
fn on_segment(p: LngLat, a: LngLat, b: LngLat) -> bool {
    let min_lng = a.lng.min(b.lng) - BOUNDARY_EPS;
    let max_lng = a.lng.max(b.lng) + BOUNDARY_EPS;
    let min_lat = a.lat.min(b.lat) - BOUNDARY_EPS;
    let max_lat = a.lat.max(b.lat) + BOUNDARY_EPS;
    if p.lng < min_lng || p.lng > max_lng || p.lat < min_lat || p.lat > max_lat {
        return false;
    }

    let nx = a.lat - b.lat;
    let ny = b.lng - a.lng;
    let norm = nx.hypot(ny);
    if norm <= BOUNDARY_EPS {
        // Zero-length edge.
        return distance(p, a) <= BOUNDARY_EPS;
    }
    let c = -(nx * a.lng + ny * a.lat);
    (nx * p.lng + ny * p.lat + c).abs() / norm <= BOUNDARY_EPS
}

/// Orientation-based intersection test for segments `a1a2` and `b1b2`.
///
/// Touching and collinear-overlapping segments count as intersecting. A
/// zero-length segment degrades to a point-on-segment distance check.
pub fn segments_intersect(a1: LngLat, a2: LngLat, b1: LngLat, b2: LngLat) -> bool {
    if distance(a1, a2) <= BOUNDARY_EPS {
        return on_segment(a1, b1, b2);
    }
    if distance(b1, b2) <= BOUNDARY_EPS {
        return on_segment(b1, a1, a2);
    }

    fn orient(p: LngLat, q: LngLat, r: LngLat) -> f64 {
        (q.lng - p.lng) * (r.lat - p.lat) - (q.lat - p.lat) * (r.lng - p.lng)
    }

    fn within(a: f64, b: f64, value: f64) -> bool {
        value >= a.min(b) - BOUNDARY_EPS && value <= a.max(b) + BOUNDARY_EPS
    }

    fn in_box(p: LngLat, q: LngLat, r: LngLat) -> bool {
        within(p.lng, q.lng, r.lng) && within(p.lat, q.lat, r.lat)
    }

    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1.abs() <= ORIENT_EPS && in_box(a1, a2, b1) {
        return true;
    }
    if o2.abs() <= ORIENT_EPS && in_box(a1, a2, b2) {
        return true;
    }
    if o3.abs() <= ORIENT_EPS && in_box(b1, b2, a1) {
        return true;
    }
    if o4.abs() <= ORIENT_EPS && in_box(b1, b2, a2) {
        return true;
    }

    let a_crosses = (o1 > ORIENT_EPS && o2 < -ORIENT_EPS) || (o1 < -ORIENT_EPS && o2 > ORIENT_EPS);
    let b_crosses = (o3 > ORIENT_EPS && o4 < -ORIENT_EPS) || (o3 < -ORIENT_EPS && o4 > ORIENT_EPS);
    a_crosses && b_crosses
}

/// True if the segment `p1p2` touches or crosses any edge of the ring.
pub fn segment_crosses_polygon_edge(p1: LngLat, p2: LngLat, vertices: &[LngLat]) -> bool {
    vertices
        .windows(2)
        .any(|edge| segments_intersect(p1, p2, edge[0], edge[1]))
}
