//! Plan assembly and the top-level planning entry points.

use std::time::Instant;

use crate::allocator::{allocate, select_single_flight, validate_deliveries, Allocation};
use crate::context::PlanningContext;
use crate::error::Result;
use crate::models::{DeliveryPath, DeliveryPlan, DronePath, Flight, LineString, Order};

/// Split a flight's path into one segment per delivered order.
///
/// Segment `i` runs from the previous hover point (or the origin) to the
/// hover point of order `i`, inclusive. The last segment also carries the
/// return leg.
fn split_flight(flight: &Flight) -> Vec<DeliveryPath> {
    let last = flight.orders.len().saturating_sub(1);
    let end_of_path = flight.path.len().saturating_sub(1);

    flight
        .orders
        .iter()
        .enumerate()
        .map(|(i, &order_id)| {
            let start = if i == 0 { 0 } else { flight.hover_indices[i - 1] };
            let end = if i == last {
                end_of_path
            } else {
                flight.hover_indices[i]
            };
            DeliveryPath {
                delivery_id: order_id,
                flight_path: flight.path[start..=end].to_vec(),
            }
        })
        .collect()
}

impl Allocation {
    /// Group flights by drone, in the order drones first flew, and slice
    /// each flight per delivery.
    pub fn into_plan(self) -> DeliveryPlan {
        let mut drone_paths: Vec<DronePath> = Vec::new();
        for (drone_id, flight) in &self.flights {
            let deliveries = split_flight(flight);
            match drone_paths.iter_mut().find(|p| p.drone_id == *drone_id) {
                Some(existing) => existing.deliveries.extend(deliveries),
                None => drone_paths.push(DronePath {
                    drone_id: *drone_id,
                    deliveries,
                }),
            }
        }
        DeliveryPlan {
            total_cost: self.total_cost,
            total_moves: self.total_moves,
            drone_paths,
        }
    }
}

impl PlanningContext {
    /// Allocate `orders` across the fleet and assemble the delivery plan.
    pub fn try_calc_delivery_plan(&self, orders: &[Order]) -> Result<DeliveryPlan> {
        let started = Instant::now();
        tracing::info!(
            orders = orders.len(),
            drones = self.drone_ids().len(),
            "planning deliveries"
        );

        let plan = allocate(self, orders)?.into_plan();

        tracing::info!(
            total_cost = plan.total_cost,
            total_moves = plan.total_moves,
            drones_used = plan.drone_paths.len(),
            legs_searched = self.cached_legs(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "delivery plan ready"
        );
        Ok(plan)
    }

    /// Like [`try_calc_delivery_plan`](Self::try_calc_delivery_plan), but an
    /// allocation failure yields the empty plan.
    pub fn calc_delivery_plan(&self, orders: &[Order]) -> DeliveryPlan {
        match self.try_calc_delivery_plan(orders) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(error = %e, "delivery planning failed, returning empty plan");
                DeliveryPlan::empty()
            }
        }
    }

    /// One flight carrying every order, as a LineString. Empty coordinates
    /// when there are no orders or no drone can fly them all.
    pub fn try_calc_delivery_path(&self, orders: &[Order]) -> Result<LineString> {
        validate_deliveries(orders)?;
        if orders.is_empty() {
            return Ok(LineString::empty());
        }

        let started = Instant::now();
        let line = match select_single_flight(self, orders) {
            Some((drone_id, flight)) => {
                tracing::info!(
                    drone_id,
                    moves = flight.moves,
                    cost = flight.cost,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "single flight selected"
                );
                LineString::from_path(&flight.path)
            }
            None => {
                tracing::warn!(orders = orders.len(), "no drone can fly every order");
                LineString::empty()
            }
        };
        Ok(line)
    }

    /// Like [`try_calc_delivery_path`](Self::try_calc_delivery_path), but
    /// invalid input yields the empty LineString.
    pub fn calc_delivery_path(&self, orders: &[Order]) -> LineString {
        match self.try_calc_delivery_path(orders) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "single flight planning failed, returning empty path");
                LineString::empty()
            }
        }
    }
}
