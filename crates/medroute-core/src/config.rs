//! Planner tunables.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// How the single-flight visualization picks among feasible drones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleFlightPolicy {
    /// Stop at the first drone (input order) that can fly every order.
    #[default]
    FirstFeasible,
    /// Try every drone and keep the cheapest feasible flight.
    Cheapest,
}

impl SingleFlightPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" | "first_feasible" => Some(Self::FirstFeasible),
            "cheapest" => Some(Self::Cheapest),
            _ => None,
        }
    }
}

/// Configuration for pathfinding and allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// A* iteration cap per pathfinding call
    pub max_iterations: usize,
    /// A* wall-clock budget per pathfinding call (milliseconds)
    pub time_limit_ms: u64,
    /// Allocation rounds before giving up
    pub max_rounds: usize,
    /// A* progress is traced every this many iterations
    pub log_interval: usize,
    pub selection: SingleFlightPolicy,
    /// Reject flights where an order's share of the cost exceeds its maxCost
    pub enforce_max_cost: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            time_limit_ms: 5_000,
            max_rounds: 100,
            log_interval: 10_000,
            selection: SingleFlightPolicy::FirstFeasible,
            enforce_max_cost: true,
        }
    }
}

impl PlannerConfig {
    /// Defaults overlaid with `MEDROUTE_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_iterations: env::var("MEDROUTE_MAX_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_iterations),
            time_limit_ms: env::var("MEDROUTE_TIME_LIMIT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.time_limit_ms),
            max_rounds: env::var("MEDROUTE_MAX_ROUNDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_rounds),
            log_interval: defaults.log_interval,
            selection: env::var("MEDROUTE_SELECTION")
                .ok()
                .and_then(|s| SingleFlightPolicy::parse(&s))
                .unwrap_or(defaults.selection),
            enforce_max_cost: env::var("MEDROUTE_ENFORCE_MAX_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.enforce_max_cost),
        }
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}
