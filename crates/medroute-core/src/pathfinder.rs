//! A* search over the step-quantized position space.
//!
//! Nodes live in an append-only arena owned by a single search call. Each
//! node points at its parent by arena index; relaxing a grid cell pushes a
//! fresh node rather than mutating the old one, so the parent links always
//! form a tree.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::geometry::{
    contains_point, distance, is_close, segment_crosses_polygon_edge, step_from, Direction16,
    STEP_SIZE,
};
use crate::models::{LngLat, RestrictedArea};

/// Position rounded to the nearest multiple of the step size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub x: i64,
    pub y: i64,
}

impl GridKey {
    pub fn of(pos: LngLat) -> Self {
        Self {
            x: (pos.lng / STEP_SIZE).round() as i64,
            y: (pos.lat / STEP_SIZE).round() as i64,
        }
    }
}

/// Search-tree element.
#[derive(Debug, Clone)]
struct SearchNode {
    pos: LngLat,
    g: f64,
    h: f64,
    parent: Option<usize>,
}

impl SearchNode {
    fn f(&self) -> f64 {
        self.g + self.h
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f_score: FloatOrd,
    g_score: FloatOrd,
    index: usize,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| other.g_score.cmp(&self.g_score))
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Why a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    /// Positions from origin to a point within one step of the target.
    Found(Vec<LngLat>),
    OriginRestricted,
    TargetRestricted,
    /// Frontier ran dry; the target is walled off.
    Exhausted,
    IterationLimit,
    TimedOut,
}

/// Result of one pathfinding call.
///
/// Every non-`Found` outcome means "no path"; the variant and counters are
/// for diagnostics only.
#[derive(Debug, Clone)]
pub struct PathSearch {
    pub outcome: PathOutcome,
    pub iterations: usize,
    pub nodes_created: usize,
    pub elapsed: Duration,
}

impl PathSearch {
    fn immediate(outcome: PathOutcome, started: Instant) -> Self {
        Self {
            outcome,
            iterations: 0,
            nodes_created: 0,
            elapsed: started.elapsed(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, PathOutcome::Found(_))
    }

    /// The path, or an empty vector for any failure.
    pub fn into_path(self) -> Vec<LngLat> {
        match self.outcome {
            PathOutcome::Found(path) => path,
            _ => Vec::new(),
        }
    }

    /// Number of moves along a found path.
    pub fn move_count(&self) -> usize {
        match &self.outcome {
            PathOutcome::Found(path) => path.len().saturating_sub(1),
            _ => 0,
        }
    }
}

/// A restricted area with its bounding box, for quick rejection.
#[derive(Debug, Clone)]
struct Fence {
    area: RestrictedArea,
    min: LngLat,
    max: LngLat,
}

impl Fence {
    fn new(area: RestrictedArea) -> Self {
        let mut min = LngLat {
            lng: f64::INFINITY,
            lat: f64::INFINITY,
        };
        let mut max = LngLat {
            lng: f64::NEG_INFINITY,
            lat: f64::NEG_INFINITY,
        };
        for v in &area.vertices {
            min.lng = min.lng.min(v.lng);
            min.lat = min.lat.min(v.lat);
            max.lng = max.lng.max(v.lng);
            max.lat = max.lat.max(v.lat);
        }
        Self { area, min, max }
    }

    fn bbox_overlaps(&self, a: LngLat, b: LngLat) -> bool {
        a.lng.max(b.lng) >= self.min.lng
            && a.lng.min(b.lng) <= self.max.lng
            && a.lat.max(b.lat) >= self.min.lat
            && a.lat.min(b.lat) <= self.max.lat
    }

    fn contains(&self, point: LngLat) -> bool {
        self.bbox_overlaps(point, point) && contains_point(point, &self.area.vertices)
    }

    fn blocks_segment(&self, from: LngLat, to: LngLat) -> bool {
        self.bbox_overlaps(from, to) && segment_crosses_polygon_edge(from, to, &self.area.vertices)
    }
}

/// A* pathfinder over a fixed set of restricted areas.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    fences: Vec<Fence>,
    config: PlannerConfig,
}

impl Pathfinder {
    /// Build a pathfinder, validating every restricted-area polygon.
    pub fn new(areas: Vec<RestrictedArea>, config: PlannerConfig) -> Result<Self> {
        let mut fences = Vec::with_capacity(areas.len());
        for area in areas {
            area.validate()?;
            fences.push(Fence::new(area));
        }
        Ok(Self { fences, config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn restricted_areas(&self) -> impl Iterator<Item = &RestrictedArea> {
        self.fences.iter().map(|fence| &fence.area)
    }

    /// True if `point` lies inside (or on the edge of) any restricted area.
    pub fn is_restricted(&self, point: LngLat) -> bool {
        self.fences.iter().any(|fence| fence.contains(point))
    }

    fn blocks_move(&self, from: LngLat, to: LngLat) -> bool {
        self.fences
            .iter()
            .any(|fence| fence.contains(to) || fence.blocks_segment(from, to))
    }

    /// Find a step path from `origin` to within one step of `target`.
    ///
    /// The returned path starts at `origin` and ends at the first expanded
    /// node that is close to `target`; it does not include `target` itself.
    pub fn find_path(&self, origin: LngLat, target: LngLat) -> PathSearch {
        let started = Instant::now();

        if self.is_restricted(target) {
            return PathSearch::immediate(PathOutcome::TargetRestricted, started);
        }
        if self.is_restricted(origin) {
            return PathSearch::immediate(PathOutcome::OriginRestricted, started);
        }
        if is_close(origin, target) && !self.blocks_move(origin, target) {
            return PathSearch::immediate(PathOutcome::Found(vec![origin]), started);
        }

        let time_limit = self.config.time_limit();
        let log_interval = self.config.log_interval.max(1);

        let mut nodes: Vec<SearchNode> = vec![SearchNode {
            pos: origin,
            g: 0.0,
            h: distance(origin, target),
            parent: None,
        }];
        let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
        open_set.push(Reverse(OpenNode {
            f_score: FloatOrd(nodes[0].f()),
            g_score: FloatOrd(0.0),
            index: 0,
        }));
        // Best known node per grid cell: (g, arena index).
        let mut best: HashMap<GridKey, (f64, usize)> = HashMap::new();
        best.insert(GridKey::of(origin), (0.0, 0));
        let mut closed_set: HashSet<GridKey> = HashSet::new();

        let mut iterations = 0usize;
        let outcome = loop {
            if iterations >= self.config.max_iterations {
                break PathOutcome::IterationLimit;
            }
            if started.elapsed() > time_limit {
                break PathOutcome::TimedOut;
            }
            let Some(Reverse(current)) = open_set.pop() else {
                break PathOutcome::Exhausted;
            };
            iterations += 1;

            let current_node = nodes[current.index].clone();
            let current_key = GridKey::of(current_node.pos);
            match best.get(&current_key) {
                Some(&(_, index)) if index == current.index => {}
                // Superseded by a cheaper node for the same cell.
                _ => continue,
            }
            if !closed_set.insert(current_key) {
                continue;
            }

            if iterations % log_interval == 0 {
                tracing::trace!(
                    iterations,
                    open = open_set.len(),
                    closed = closed_set.len(),
                    remaining = current_node.h,
                    "A* progress"
                );
            }

            // The caller finishes with a short hop onto the exact target, so
            // that hop must be clear as well.
            if is_close(current_node.pos, target) && !self.blocks_move(current_node.pos, target) {
                break PathOutcome::Found(reconstruct_path(&nodes, current.index));
            }

            for direction in Direction16::ALL {
                let next = step_from(current_node.pos, direction);
                let next_key = GridKey::of(next);
                if closed_set.contains(&next_key) {
                    continue;
                }
                let tentative_g = current_node.g + STEP_SIZE;
                if let Some(&(known_g, _)) = best.get(&next_key) {
                    if known_g <= tentative_g {
                        continue;
                    }
                }
                if self.blocks_move(current_node.pos, next) {
                    continue;
                }

                let node = SearchNode {
                    pos: next,
                    g: tentative_g,
                    h: distance(next, target),
                    parent: Some(current.index),
                };
                let index = nodes.len();
                open_set.push(Reverse(OpenNode {
                    f_score: FloatOrd(node.f()),
                    g_score: FloatOrd(node.g),
                    index,
                }));
                nodes.push(node);
                best.insert(next_key, (tentative_g, index));
            }
        };

        PathSearch {
            outcome,
            iterations,
            nodes_created: nodes.len(),
            elapsed: started.elapsed(),
        }
    }
}

fn reconstruct_path(nodes: &[SearchNode], goal: usize) -> Vec<LngLat> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(index) = current {
        path.push(nodes[index].pos);
        current = nodes[index].parent;
    }
    path.reverse();
    path
}
