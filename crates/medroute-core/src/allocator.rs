//! Greedy multi-drone order allocation.
//!
//! Each round visits the drones in input order. A drone takes its remaining
//! orders nearest-first and keeps every order whose addition still yields a
//! feasible flight. A round in which no drone flies anything ends allocation
//! with an error.

use std::collections::HashSet;

use crate::config::SingleFlightPolicy;
use crate::context::PlanningContext;
use crate::error::{PlannerError, Result};
use crate::flight::build_flight;
use crate::geometry::distance;
use crate::models::{DroneId, Flight, Order};

/// Flights assigned to drones, in the order they were built.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub flights: Vec<(DroneId, Flight)>,
    pub total_cost: f64,
    pub total_moves: u32,
}

impl Allocation {
    fn new() -> Self {
        Self {
            flights: Vec::new(),
            total_cost: 0.0,
            total_moves: 0,
        }
    }

    fn push(&mut self, drone_id: DroneId, flight: Flight) {
        self.total_cost += flight.cost;
        self.total_moves += flight.moves;
        self.flights.push((drone_id, flight));
    }
}

/// Reject orders whose delivery position is out of range or not finite.
pub fn validate_deliveries(orders: &[Order]) -> Result<()> {
    for delivery in orders.iter().filter_map(|o| o.delivery) {
        delivery.validate()?;
    }
    Ok(())
}

/// Assign every order to exactly one flight.
pub fn allocate(ctx: &PlanningContext, orders: &[Order]) -> Result<Allocation> {
    validate_deliveries(orders)?;
    let mut allocation = Allocation::new();
    let mut remaining: Vec<usize> = (0..orders.len()).collect();

    for order in orders.iter().filter(|o| o.delivery.is_none()) {
        tracing::warn!(order_id = order.id, "order has no delivery position");
    }

    let max_rounds = ctx.config().max_rounds;
    for round in 1..=max_rounds {
        if remaining.is_empty() {
            break;
        }
        let mut progressed = false;

        for &drone_id in ctx.drone_ids() {
            if remaining.is_empty() {
                break;
            }
            let (origin, caps) = match ctx.drone(drone_id) {
                Ok(drone) => drone,
                Err(e) => {
                    tracing::warn!(drone_id, error = %e, "skipping drone");
                    continue;
                }
            };

            let mut candidates: Vec<(usize, f64)> = remaining
                .iter()
                .filter_map(|&i| orders[i].delivery.map(|d| (i, distance(origin, d))))
                .collect();
            candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut chosen: Vec<usize> = Vec::new();
            let mut load = 0.0;
            let mut flight = None;
            for (index, _) in candidates {
                let order = &orders[index];
                if load + order.requirements.capacity > caps.capacity {
                    continue;
                }
                let trial: Vec<&Order> = chosen
                    .iter()
                    .chain(std::iter::once(&index))
                    .map(|&i| &orders[i])
                    .collect();
                match build_flight(ctx, origin, caps, &trial) {
                    Ok(built) => {
                        chosen.push(index);
                        load += order.requirements.capacity;
                        flight = Some(built);
                    }
                    Err(rejection) => {
                        tracing::trace!(drone_id, order_id = order.id, %rejection, "order not added");
                    }
                }
            }

            if let Some(flight) = flight {
                tracing::debug!(
                    drone_id,
                    round,
                    orders = ?flight.orders,
                    moves = flight.moves,
                    cost = flight.cost,
                    "flight assigned"
                );
                let taken: HashSet<usize> = chosen.into_iter().collect();
                remaining.retain(|i| !taken.contains(i));
                allocation.push(drone_id, flight);
                progressed = true;
            }
        }

        if !progressed {
            return Err(PlannerError::AllocationFailed {
                remaining: remaining.len(),
                round,
            });
        }
    }

    if !remaining.is_empty() {
        return Err(PlannerError::AllocationFailed {
            remaining: remaining.len(),
            round: max_rounds,
        });
    }
    Ok(allocation)
}

/// One flight that carries every order, chosen per the configured policy.
///
/// An empty order list has no flight.
pub fn select_single_flight(ctx: &PlanningContext, orders: &[Order]) -> Option<(DroneId, Flight)> {
    if orders.is_empty() {
        return None;
    }
    let trial: Vec<&Order> = orders.iter().collect();
    let policy = ctx.config().selection;
    let mut best: Option<(DroneId, Flight)> = None;

    for &drone_id in ctx.drone_ids() {
        let Ok((origin, caps)) = ctx.drone(drone_id) else {
            tracing::warn!(drone_id, "skipping drone with missing data");
            continue;
        };
        let flight = match build_flight(ctx, origin, caps, &trial) {
            Ok(flight) => flight,
            Err(rejection) => {
                tracing::debug!(drone_id, %rejection, "drone cannot fly all orders");
                continue;
            }
        };
        match policy {
            SingleFlightPolicy::FirstFeasible => return Some((drone_id, flight)),
            SingleFlightPolicy::Cheapest => {
                if best.as_ref().map_or(true, |(_, b)| flight.cost < b.cost) {
                    best = Some((drone_id, flight));
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::models::{DroneCapability, DroneRecord, LngLat, OrderId, Requirements};

    fn drone(id: DroneId, capacity: f64, cost_initial: f64) -> DroneRecord {
        DroneRecord {
            id,
            origin: LngLat { lng: -3.186874, lat: 55.944494 },
            capability: DroneCapability {
                cooling: false,
                heating: false,
                capacity,
                max_moves: 2000,
                cost_per_move: 0.01,
                cost_initial,
                cost_final: 6.5,
            },
        }
    }

    fn order(id: OrderId, lng: f64, lat: f64, capacity: f64) -> Order {
        Order::new(id, LngLat { lng, lat }, Requirements::with_capacity(capacity))
    }

    fn ctx(drones: &[DroneRecord], config: PlannerConfig) -> PlanningContext {
        PlanningContext::from_fleet(drones, Vec::new(), config).unwrap()
    }

    fn assigned(allocation: &Allocation) -> Vec<OrderId> {
        let mut ids: Vec<OrderId> = allocation
            .flights
            .iter()
            .flat_map(|(_, f)| f.orders.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn every_order_is_assigned_once() {
        let ctx = ctx(&[drone(1, 4.0, 4.3), drone(2, 4.0, 4.3)], PlannerConfig::default());
        let orders = vec![
            order(1, -3.1860, 55.9450, 1.0),
            order(2, -3.1850, 55.9455, 1.0),
            order(3, -3.1875, 55.9440, 1.0),
        ];
        let allocation = allocate(&ctx, &orders).unwrap();

        assert_eq!(assigned(&allocation), vec![1, 2, 3]);
        let cost: f64 = allocation.flights.iter().map(|(_, f)| f.cost).sum();
        let moves: u32 = allocation.flights.iter().map(|(_, f)| f.moves).sum();
        assert!((allocation.total_cost - cost).abs() < 1e-9);
        assert_eq!(allocation.total_moves, moves);
    }

    #[test]
    fn capacity_splits_orders_across_rounds() {
        let ctx = ctx(&[drone(1, 4.0, 4.3)], PlannerConfig::default());
        let orders = vec![
            order(1, -3.1860, 55.9450, 2.0),
            order(2, -3.1855, 55.9452, 2.0),
            order(3, -3.1865, 55.9447, 2.0),
        ];
        let allocation = allocate(&ctx, &orders).unwrap();

        assert_eq!(allocation.flights.len(), 2);
        assert!(allocation.flights.iter().all(|(id, _)| *id == 1));
        assert_eq!(allocation.flights[0].1.orders.len(), 2);
        assert_eq!(assigned(&allocation), vec![1, 2, 3]);
    }

    #[test]
    fn nearest_order_goes_first() {
        let ctx = ctx(&[drone(1, 4.0, 4.3)], PlannerConfig::default());
        let orders = vec![
            order(1, -3.1840, 55.9460, 1.0),
            order(2, -3.1865, 55.9447, 1.0),
        ];
        let allocation = allocate(&ctx, &orders).unwrap();
        assert_eq!(allocation.flights[0].1.orders, vec![2, 1]);
    }

    #[test]
    fn oversized_order_fails_allocation() {
        let ctx = ctx(&[drone(1, 1.0, 4.3)], PlannerConfig::default());
        let orders = vec![order(1, -3.1860, 55.9450, 0.5), order(2, -3.1850, 55.9455, 2.0)];
        assert_eq!(
            allocate(&ctx, &orders),
            Err(PlannerError::AllocationFailed { remaining: 1, round: 2 })
        );
    }

    #[test]
    fn no_drones_fails_in_first_round() {
        let ctx = ctx(&[], PlannerConfig::default());
        let orders = vec![order(1, -3.1860, 55.9450, 0.5)];
        assert_eq!(
            allocate(&ctx, &orders),
            Err(PlannerError::AllocationFailed { remaining: 1, round: 1 })
        );
    }

    #[test]
    fn empty_order_list_allocates_nothing() {
        let ctx = ctx(&[drone(1, 4.0, 4.3)], PlannerConfig::default());
        let allocation = allocate(&ctx, &[]).unwrap();
        assert!(allocation.flights.is_empty());
        assert_eq!(allocation.total_moves, 0);
    }

    #[test]
    fn round_limit_is_respected() {
        let config = PlannerConfig {
            max_rounds: 1,
            ..PlannerConfig::default()
        };
        let ctx = ctx(&[drone(1, 1.0, 4.3)], config);
        let orders = vec![order(1, -3.1860, 55.9450, 1.0), order(2, -3.1850, 55.9455, 1.0)];
        assert_eq!(
            allocate(&ctx, &orders),
            Err(PlannerError::AllocationFailed { remaining: 1, round: 1 })
        );
    }

    #[test]
    fn drones_with_missing_data_are_skipped() {
        let record = drone(2, 4.0, 4.3);
        let ctx = PlanningContext::new(
            vec![1, 2],
            [(2, record.origin)].into_iter().collect(),
            [(1, record.capability.clone()), (2, record.capability)]
                .into_iter()
                .collect(),
            Vec::new(),
            PlannerConfig::default(),
        )
        .unwrap();
        let allocation = allocate(&ctx, &[order(1, -3.1860, 55.9450, 1.0)]).unwrap();
        assert_eq!(allocation.flights[0].0, 2);
    }

    #[test]
    fn single_flight_policies() {
        let drones = [drone(1, 4.0, 9.0), drone(2, 4.0, 4.3)];
        let orders = vec![order(1, -3.1860, 55.9450, 1.0), order(2, -3.1850, 55.9455, 1.0)];

        let first = ctx(&drones, PlannerConfig::default());
        let (id, flight) = select_single_flight(&first, &orders).unwrap();
        assert_eq!(id, 1);
        assert_eq!(flight.orders, vec![1, 2]);

        let cheapest = ctx(
            &drones,
            PlannerConfig {
                selection: SingleFlightPolicy::Cheapest,
                ..PlannerConfig::default()
            },
        );
        assert_eq!(select_single_flight(&cheapest, &orders).unwrap().0, 2);
    }

    #[test]
    fn out_of_range_delivery_is_invalid_position() {
        let ctx = ctx(&[drone(1, 4.0, 4.3)], PlannerConfig::default());
        let orders = vec![
            order(1, -3.1860, 55.9450, 1.0),
            order(2, 500.0, 55.9, 1.0),
        ];
        assert!(matches!(
            allocate(&ctx, &orders),
            Err(PlannerError::InvalidPosition { lng, .. }) if lng == 500.0
        ));

        let nan = vec![order(3, f64::NAN, 55.9, 1.0)];
        assert!(matches!(
            validate_deliveries(&nan),
            Err(PlannerError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn single_flight_none_without_orders() {
        let ctx = ctx(&[drone(1, 4.0, 4.3)], PlannerConfig::default());
        assert!(select_single_flight(&ctx, &[]).is_none());
    }

    #[test]
    fn single_flight_none_when_infeasible() {
        let ctx = ctx(&[drone(1, 1.0, 4.3)], PlannerConfig::default());
        let orders = vec![order(1, -3.1860, 55.9450, 1.0), order(2, -3.1850, 55.9455, 1.0)];
        assert!(select_single_flight(&ctx, &orders).is_none());
    }
}
