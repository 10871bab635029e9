//! Per-run search context and goal guidance.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::cost::{CostModel, NoSolutionReason, RouteOutcome, Waypoint, ENERGY_EPSILON};
use crate::graph::{Graph, StationIdx};

/// Smallest charge gain that re-queues a station during the reachability
/// check.
const REACH_IMPROVEMENT_KWH: f64 = 1e-6;

/// Total-ordered `f64` key for the binary heaps below.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Key(f64);

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Read-only data derived from the graph for one goal.
///
/// - `cost_to_goal[v]`: cheapest edge-cost sum from `v` to the goal,
///   ignoring charging. A lower bound on any route's remaining cost.
/// - `energy_to_refuel[v]`: least energy needed from `v` to reach a charger
///   or the goal.
#[derive(Debug, Clone)]
pub struct Guidance {
    pub cost_to_goal: Vec<f64>,
    pub energy_to_refuel: Vec<f64>,
    verdict: Option<NoSolutionReason>,
}

impl Guidance {
    pub fn new(model: &CostModel, start: StationIdx, goal: StationIdx) -> Self {
        let graph = model.graph();
        let cost_to_goal = reverse_dijkstra(graph, &[goal], |seg| model.edge_cost(seg));

        let mut refuel_sources: Vec<StationIdx> = (0..graph.station_count())
            .filter(|&s| graph.station(s).supports_charging())
            .collect();
        refuel_sources.push(goal);
        let energy_to_refuel =
            reverse_dijkstra(graph, &refuel_sources, |seg| model.segment_energy(seg));

        let verdict = if !cost_to_goal[start].is_finite() {
            Some(NoSolutionReason::Disconnected)
        } else if !energy_reachable(model, start, goal) {
            Some(NoSolutionReason::EnergyInfeasible)
        } else {
            None
        };

        Self {
            cost_to_goal,
            energy_to_refuel,
            verdict,
        }
    }

    /// Why no route can exist, if that is already known.
    pub fn verdict(&self) -> Option<NoSolutionReason> {
        self.verdict
    }
}

/// Everything an optimizer needs for one start/goal query.
///
/// The context borrows the shared [`CostModel`] and owns the goal-specific
/// [`Guidance`]. It is cheap to share by reference across threads.
#[derive(Debug, Clone)]
pub struct SearchContext<'a> {
    model: &'a CostModel,
    start: StationIdx,
    goal: StationIdx,
    guidance: Guidance,
}

impl<'a> SearchContext<'a> {
    /// # Panics
    /// Panics if `start` or `goal` is not a station of the model's graph.
    pub fn new(model: &'a CostModel, start: StationIdx, goal: StationIdx) -> Self {
        let count = model.graph().station_count();
        assert!(start < count && goal < count, "station index out of range");
        Self {
            model,
            start,
            goal,
            guidance: Guidance::new(model, start, goal),
        }
    }

    pub fn model(&self) -> &'a CostModel {
        self.model
    }

    pub fn graph(&self) -> &'a Graph {
        self.model.graph()
    }

    pub fn start(&self) -> StationIdx {
        self.start
    }

    pub fn goal(&self) -> StationIdx {
        self.goal
    }

    pub fn guidance(&self) -> &Guidance {
        &self.guidance
    }

    /// Resolves queries that need no search.
    ///
    /// Returns the single-stop route when start and goal coincide, and the
    /// matching `NoSolution` when the goal is disconnected or no
    /// battery-feasible route exists. `None` means the optimizer must
    /// search.
    pub fn precheck(&self) -> Option<RouteOutcome> {
        if self.start == self.goal {
            let route = self
                .model
                .evaluate(&[Waypoint::Pass(self.start)])
                .into_route();
            return Some(RouteOutcome::from_best(route, NoSolutionReason::EnergyInfeasible));
        }
        self.guidance.verdict().map(RouteOutcome::NoSolution)
    }
}

/// Multi-source shortest distances to `sources` along reversed segments.
fn reverse_dijkstra(
    graph: &Graph,
    sources: &[StationIdx],
    weight: impl Fn(usize) -> f64,
) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; graph.station_count()];
    let mut heap = BinaryHeap::new();
    for &s in sources {
        dist[s] = 0.0;
        heap.push(Reverse((Key(0.0), s)));
    }

    while let Some(Reverse((Key(d), node))) = heap.pop() {
        if d > dist[node] {
            continue;
        }
        for (seg, prev) in graph.predecessors(node) {
            let candidate = d + weight(seg);
            if candidate < dist[prev] {
                dist[prev] = candidate;
                heap.push(Reverse((Key(candidate), prev)));
            }
        }
    }
    dist
}

/// Whether any walk (revisits allowed) reaches the goal above the floor.
///
/// Propagates the best arrival charge per station. A higher arrival charge
/// dominates a lower one because the charge policy is monotone in the
/// arrival level.
fn energy_reachable(model: &CostModel, start: StationIdx, goal: StationIdx) -> bool {
    let graph = model.graph();
    let mut best = vec![f64::NEG_INFINITY; graph.station_count()];
    let mut queued = vec![false; graph.station_count()];
    let mut queue = VecDeque::new();

    best[start] = model.profile().initial_charge_kwh();
    queue.push_back(start);
    queued[start] = true;

    while let Some(node) = queue.pop_front() {
        queued[node] = false;
        if node == goal {
            continue;
        }
        let arrival = best[node];
        let departure = model
            .plan_charge(node, arrival)
            .map_or(arrival, |stop| arrival + stop.energy_kwh);

        for (seg, next) in graph.neighbors(node) {
            if !model.can_traverse(departure, seg) {
                continue;
            }
            let reached = departure - model.segment_energy(seg);
            if reached > best[next] + REACH_IMPROVEMENT_KWH {
                best[next] = reached;
                if !queued[next] {
                    queued[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    best[goal] >= model.floor_kwh() - ENERGY_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{SegmentRecord, StationRecord};
    use crate::test_utils::{grid_model, line_graph, model_for};

    #[test]
    fn test_line_with_charger_is_feasible() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        assert!(ctx.precheck().is_none());
        assert_eq!(ctx.guidance().energy_to_refuel[0], 50.0);
        assert_eq!(ctx.guidance().energy_to_refuel[1], 0.0);
    }

    #[test]
    fn test_line_without_charger_is_energy_infeasible() {
        let model = model_for(line_graph(false), 40.0);
        let ctx = SearchContext::new(&model, 0, 2);
        assert_eq!(
            ctx.precheck(),
            Some(RouteOutcome::NoSolution(NoSolutionReason::EnergyInfeasible))
        );
    }

    #[test]
    fn test_reverse_direction_is_disconnected() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 2, 0);
        assert_eq!(
            ctx.precheck(),
            Some(RouteOutcome::NoSolution(NoSolutionReason::Disconnected))
        );
        assert!(ctx.guidance().cost_to_goal[2].is_infinite());
    }

    #[test]
    fn test_same_start_and_goal_is_trivial() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 1, 1);
        let outcome = ctx.precheck().unwrap();
        let route = outcome.route().unwrap();
        assert_eq!(route.station_ids(), vec!["B"]);
        assert_eq!(route.cost, 0.0);
    }

    #[test]
    fn test_cost_to_goal_is_lower_bound() {
        let model = grid_model(3, 4, 40.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let g = ctx.guidance();
        assert_eq!(g.cost_to_goal[goal], 0.0);
        for (seg, next) in model.graph().neighbors(0) {
            assert!(g.cost_to_goal[0] <= model.edge_cost(seg) + g.cost_to_goal[next] + 1e-12);
        }
    }

    #[test]
    fn test_recharge_loop_makes_goal_reachable() {
        // A -> B (charger) -> A is needed to top up before A -> C.
        let graph = crate::graph::Graph::build(
            &[
                StationRecord::waypoint("A", 0.0, 0.0),
                StationRecord::charger("B", 0.0, 0.1, 50.0, 0.3),
                StationRecord::waypoint("C", 0.0, 1.0),
            ],
            &[
                SegmentRecord::new("A", "B", 5.0),
                SegmentRecord::new("B", "A", 5.0),
                SegmentRecord::new("A", "C", 55.0),
            ],
        )
        .unwrap();
        let model = model_for(graph, 60.0);
        let profile_low =
            crate::cost::VehicleProfile::new(60.0, 1.0).with_initial_charge_fraction(0.5);
        let model_low = CostModel::new(
            model.shared_graph(),
            profile_low,
            *model.weights(),
            *model.policy(),
        )
        .unwrap();
        assert!(energy_reachable(&model_low, 0, 2));
    }
}
