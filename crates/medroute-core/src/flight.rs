//! Flight construction: origin -> deliveries in order -> origin.

use thiserror::Error;

use crate::context::PlanningContext;
use crate::models::{DroneCapability, Flight, LngLat, Order, OrderId};

/// Why a drone cannot fly a given sequence of orders.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("order {0} has no delivery position")]
    MissingDelivery(OrderId),

    #[error("order {0} needs cooling or heating the drone lacks")]
    Capability(OrderId),

    #[error("payload {required} exceeds capacity {capacity}")]
    Capacity { required: f64, capacity: f64 },

    /// `order` is `None` for the leg back to the origin.
    #[error("no path for leg to {order:?}")]
    Unreachable { order: Option<OrderId> },

    #[error("{moves} moves exceeds budget of {max_moves}")]
    MoveBudget { moves: u32, max_moves: u32 },

    #[error("order {order} share {share:.2} exceeds max cost {max_cost:.2}")]
    CostCeiling {
        order: OrderId,
        share: f64,
        max_cost: f64,
    },
}

/// Number of consecutive position pairs that differ.
///
/// Hover duplicates and zero-length legs contribute nothing.
pub fn count_moves(path: &[LngLat]) -> u32 {
    path.windows(2).filter(|w| w[0] != w[1]).count() as u32
}

/// Build the round trip visiting `orders` in the given sequence.
///
/// Each delivery appends the leg (minus its first point), the exact delivery
/// position, and the same position again as the hover. The next leg starts
/// from the exact delivery position. The return leg ends within one step of
/// the origin.
pub fn build_flight(
    ctx: &PlanningContext,
    origin: LngLat,
    caps: &DroneCapability,
    orders: &[&Order],
) -> Result<Flight, Rejection> {
    let mut required = 0.0;
    let mut targets = Vec::with_capacity(orders.len());
    for order in orders {
        let delivery = order
            .delivery
            .ok_or(Rejection::MissingDelivery(order.id))?;
        if !order.requirements.satisfied_by(caps) {
            return Err(Rejection::Capability(order.id));
        }
        required += order.requirements.capacity;
        targets.push((order.id, delivery));
    }
    if required > caps.capacity {
        return Err(Rejection::Capacity {
            required,
            capacity: caps.capacity,
        });
    }

    let mut path = vec![origin];
    let mut hover_indices = Vec::with_capacity(targets.len());
    let mut current = origin;

    for (order_id, delivery) in &targets {
        let leg = ctx
            .leg(current, *delivery)
            .ok_or(Rejection::Unreachable {
                order: Some(*order_id),
            })?;
        path.extend_from_slice(&leg[1..]);
        path.push(*delivery);
        path.push(*delivery);
        hover_indices.push(path.len() - 1);
        current = *delivery;

        let moves = count_moves(&path);
        if moves > caps.max_moves {
            return Err(Rejection::MoveBudget {
                moves,
                max_moves: caps.max_moves,
            });
        }
    }

    let back = ctx
        .leg(current, origin)
        .ok_or(Rejection::Unreachable { order: None })?;
    path.extend_from_slice(&back[1..]);

    let moves = count_moves(&path);
    if moves > caps.max_moves {
        return Err(Rejection::MoveBudget {
            moves,
            max_moves: caps.max_moves,
        });
    }

    let cost = caps.flight_cost(moves);
    if ctx.config().enforce_max_cost && !orders.is_empty() {
        let share = cost / orders.len() as f64;
        for order in orders {
            if let Some(max_cost) = order.requirements.max_cost {
                if share > max_cost {
                    return Err(Rejection::CostCeiling {
                        order: order.id,
                        share,
                        max_cost,
                    });
                }
            }
        }
    }

    Ok(Flight {
        orders: orders.iter().map(|o| o.id).collect(),
        path,
        hover_indices,
        moves,
        cost,
    })
}
