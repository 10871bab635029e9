//! Label-setting search over (station, charge bucket) states.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::debug;

use super::config::CspConfig;
use crate::cost::{NoSolutionReason, RouteOutcome, Waypoint, ENERGY_EPSILON};
use crate::error::Result;
use crate::graph::StationIdx;
use crate::plan::{RunClock, SearchContext};

/// Expansions between two wall-clock checks.
const CLOCK_CHECK_INTERVAL: usize = 256;

/// Result of a CSP run.
#[derive(Debug, Clone, PartialEq)]
pub struct CspResult {
    pub outcome: RouteOutcome,
    /// Labels settled.
    pub expansions: usize,
    pub cancelled: bool,
}

/// Lexicographic label priority: cost, then charge stops, then distance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LabelKey {
    cost: f64,
    stops: usize,
    distance_km: f64,
}

impl Eq for LabelKey {}

impl PartialOrd for LabelKey {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for LabelKey {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.stops.cmp(&other.stops))
            .then(self.distance_km.total_cmp(&other.distance_km))
    }
}

#[derive(Debug, Clone)]
struct Label {
    station: StationIdx,
    soc_kwh: f64,
    key: LabelKey,
    parent: Option<usize>,
    /// Produced by charging at `station` rather than by arriving there.
    charged: bool,
}

/// Whether `kept` makes `other` redundant: no dearer, at least as much
/// charge, and still free to recharge whenever `other` is.
fn dominates(kept: &Label, other: &Label) -> bool {
    kept.key <= other.key
        && kept.soc_kwh + ENERGY_EPSILON >= other.soc_kwh
        && (!kept.charged || other.charged)
}

/// Labels, the open heap, and the non-dominated labels of each
/// `(station, bucket)` state.
#[derive(Default)]
struct LabelStore {
    labels: Vec<Label>,
    dead: Vec<bool>,
    fronts: HashMap<(StationIdx, i64), Vec<usize>>,
    heap: BinaryHeap<Reverse<(LabelKey, usize)>>,
}

impl LabelStore {
    /// Queues `label` unless a label of the same state dominates it, and
    /// retires the queued labels it dominates.
    fn push(&mut self, label: Label, bucket: i64) {
        let Self {
            labels,
            dead,
            fronts,
            heap,
        } = self;
        let front = fronts.entry((label.station, bucket)).or_default();
        if front.iter().any(|&i| dominates(&labels[i], &label)) {
            return;
        }
        front.retain(|&i| {
            let keep = !dominates(&label, &labels[i]);
            if !keep {
                dead[i] = true;
            }
            keep
        });

        let idx = labels.len();
        front.push(idx);
        heap.push(Reverse((label.key, idx)));
        labels.push(label);
        dead.push(false);
    }

    fn pop(&mut self) -> Option<usize> {
        while let Some(Reverse((_, idx))) = self.heap.pop() {
            if !self.dead[idx] {
                return Some(idx);
            }
        }
        None
    }
}

/// Exact solver for the charge-constrained shortest path.
///
/// Runs a Dijkstra-style label-setting search where a state is a station
/// plus a discretized charge level. From each label the vehicle either
/// drives an outgoing segment (when the charge stays above the floor) or
/// recharges per the policy (at most once per visit).
///
/// A state keeps every label that no other label of that state dominates
/// on (cost, charge), so a cheap label never hides a dearer one that
/// still has the charge to finish. The first label popped at the goal is
/// the cheapest battery-feasible route.
///
/// # Usage
///
/// ```ignore
/// let ctx = SearchContext::new(&model, start, goal);
/// let result = CspSolver::solve(&ctx, &CspConfig::default())?;
/// ```
pub struct CspSolver;

impl CspSolver {
    pub fn solve(ctx: &SearchContext<'_>, config: &CspConfig) -> Result<CspResult> {
        Self::solve_with_cancel(ctx, config, None)
    }

    /// Solves with an optional cancellation flag, checked between
    /// expansions.
    pub fn solve_with_cancel(
        ctx: &SearchContext<'_>,
        config: &CspConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<CspResult> {
        config.validate()?;

        if let Some(outcome) = ctx.precheck() {
            return Ok(CspResult {
                outcome,
                expansions: 0,
                cancelled: false,
            });
        }

        let clock = RunClock::new(config.time_limit_ms, cancel);
        let model = ctx.model();
        let graph = ctx.graph();
        let guidance = ctx.guidance();
        let floor = model.floor_kwh();
        let bucket_of = |soc: f64| (soc / config.bucket_kwh).floor() as i64;

        let mut store = LabelStore::default();
        let initial_soc = model.profile().initial_charge_kwh();
        store.push(
            Label {
                station: ctx.start(),
                soc_kwh: initial_soc,
                key: LabelKey {
                    cost: 0.0,
                    stops: 0,
                    distance_km: 0.0,
                },
                parent: None,
                charged: false,
            },
            bucket_of(initial_soc),
        );

        let mut expansions = 0usize;
        let mut found = None;
        let mut stopped = false;

        while let Some(idx) = store.pop() {
            let label = store.labels[idx].clone();

            if label.station == ctx.goal() {
                found = Some(idx);
                break;
            }

            expansions += 1;
            if expansions >= config.max_expansions
                || (expansions % CLOCK_CHECK_INTERVAL == 0 && clock.should_stop())
            {
                stopped = true;
                break;
            }

            if !label.charged {
                if let Some(stop) = model.plan_charge(label.station, label.soc_kwh) {
                    let soc = label.soc_kwh + stop.energy_kwh;
                    store.push(
                        Label {
                            station: label.station,
                            soc_kwh: soc,
                            key: LabelKey {
                                cost: label.key.cost + model.charge_cost(&stop),
                                stops: label.key.stops + 1,
                                distance_km: label.key.distance_km,
                            },
                            parent: Some(idx),
                            charged: true,
                        },
                        bucket_of(soc),
                    );
                }
            }

            for (seg, next) in graph.neighbors(label.station) {
                if !guidance.cost_to_goal[next].is_finite() || !model.can_traverse(label.soc_kwh, seg)
                {
                    continue;
                }
                let soc = label.soc_kwh - model.segment_energy(seg);
                if soc - floor < guidance.energy_to_refuel[next] - ENERGY_EPSILON {
                    continue;
                }
                store.push(
                    Label {
                        station: next,
                        soc_kwh: soc,
                        key: LabelKey {
                            cost: label.key.cost + model.edge_cost(seg),
                            stops: label.key.stops,
                            distance_km: label.key.distance_km + graph.segment(seg).distance_km,
                        },
                        parent: Some(idx),
                        charged: false,
                    },
                    bucket_of(soc),
                );
            }
        }

        let cancelled = stopped && clock.cancelled();
        let outcome = match found {
            Some(idx) => {
                let route = model.evaluate(&reconstruct(&store.labels, idx)).into_route();
                RouteOutcome::from_best(route, NoSolutionReason::BudgetExhausted)
            }
            // The precheck already proved a battery-feasible route exists.
            None => RouteOutcome::NoSolution(NoSolutionReason::BudgetExhausted),
        };

        debug!(
            expansions,
            labels = store.labels.len(),
            cost = outcome.cost(),
            "csp search finished"
        );

        Ok(CspResult {
            outcome,
            expansions,
            cancelled,
        })
    }
}

/// Follows parent links back to the start and merges charge labels into
/// their station's waypoint.
fn reconstruct(labels: &[Label], goal_idx: usize) -> Vec<Waypoint> {
    let mut chain = Vec::new();
    let mut cursor = Some(goal_idx);
    while let Some(idx) = cursor {
        chain.push(idx);
        cursor = labels[idx].parent;
    }
    chain.reverse();

    let mut waypoints: Vec<Waypoint> = Vec::with_capacity(chain.len());
    for idx in chain {
        let label = &labels[idx];
        if label.charged {
            if let Some(last) = waypoints.last_mut() {
                *last = Waypoint::Charge(label.station);
            }
        } else {
            waypoints.push(Waypoint::Pass(label.station));
        }
    }
    waypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::{Charge, Pass};
    use crate::graph::{Graph, SegmentRecord, StationRecord};
    use crate::test_utils::{fork_graph, grid_model, line_graph, model_for};

    fn solve(ctx: &SearchContext<'_>) -> CspResult {
        CspSolver::solve(ctx, &CspConfig::default()).unwrap()
    }

    #[test]
    fn test_line_charges_at_b() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let result = solve(&ctx);
        let route = result.outcome.route().expect("route on charged line");
        assert_eq!(route.waypoints(), vec![Pass(0), Charge(1), Pass(2)]);
        assert_eq!(route.charge_stop_count(), 1);
        assert!(result.expansions > 0);
    }

    #[test]
    fn test_line_without_charger() {
        let model = model_for(line_graph(false), 40.0);
        let ctx = SearchContext::new(&model, 0, 2);
        assert_eq!(
            solve(&ctx).outcome,
            RouteOutcome::NoSolution(NoSolutionReason::EnergyInfeasible)
        );
    }

    #[test]
    fn test_prefers_cheaper_branch() {
        // Two ways from A to D; the one through C is shorter.
        let graph = Graph::build(
            &[
                StationRecord::waypoint("A", 0.0, 0.0),
                StationRecord::waypoint("B", 0.0, 1.0),
                StationRecord::waypoint("C", 1.0, 0.0),
                StationRecord::waypoint("D", 1.0, 1.0),
            ],
            &[
                SegmentRecord::new("A", "B", 20.0).with_travel_time(20.0),
                SegmentRecord::new("B", "D", 20.0).with_travel_time(20.0),
                SegmentRecord::new("A", "C", 10.0).with_travel_time(10.0),
                SegmentRecord::new("C", "D", 10.0).with_travel_time(10.0),
            ],
        )
        .unwrap();
        let model = model_for(graph, 100.0);
        let ctx = SearchContext::new(&model, 0, 3);
        let route = solve(&ctx).outcome.into_route().unwrap();
        assert_eq!(route.station_ids(), vec!["A", "C", "D"]);
    }

    #[test]
    fn test_takes_longer_branch_when_battery_requires() {
        // The short branch has no charger and is too long for one charge;
        // the long branch passes a charger.
        let graph = Graph::build(
            &[
                StationRecord::waypoint("A", 0.0, 0.0),
                StationRecord::charger("B", 0.0, 1.0, 100.0, 0.2),
                StationRecord::waypoint("C", 1.0, 0.0),
                StationRecord::waypoint("D", 1.0, 1.0),
            ],
            &[
                SegmentRecord::new("A", "B", 40.0),
                SegmentRecord::new("B", "D", 40.0),
                SegmentRecord::new("A", "C", 30.0),
                SegmentRecord::new("C", "D", 30.0),
            ],
        )
        .unwrap();
        let model = model_for(graph, 50.0);
        let ctx = SearchContext::new(&model, 0, 3);
        let route = solve(&ctx).outcome.into_route().unwrap();
        assert_eq!(route.station_ids(), vec!["A", "B", "D"]);
        assert_eq!(route.charge_stop_count(), 1);
    }

    #[test]
    fn test_keeps_dearer_label_with_more_charge() {
        // Both ways into X land in the same 1 kWh bucket; only the dearer
        // one arrives with the 10.5 kWh needed to finish.
        let model = model_for(fork_graph(), 20.0);
        let ctx = SearchContext::new(&model, 0, 4);
        let route = solve(&ctx).outcome.into_route().expect("slow branch is feasible");
        assert_eq!(route.station_ids(), vec!["A", "Y", "X", "W", "G"]);
        assert!((route.min_soc_kwh() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_width_does_not_change_optimum() {
        let model = model_for(fork_graph(), 20.0);
        let ctx = SearchContext::new(&model, 0, 4);
        let costs: Vec<f64> = [0.1, 1.0, 5.0, 20.0]
            .into_iter()
            .map(|kwh| {
                let config = CspConfig::default().with_bucket_kwh(kwh);
                CspSolver::solve(&ctx, &config).unwrap().outcome.cost().unwrap()
            })
            .collect();
        assert!(costs.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-12));
    }

    #[test]
    fn test_dominance_respects_charge_and_recharge() {
        let label = |cost: f64, soc_kwh: f64, charged: bool| Label {
            station: 0,
            soc_kwh,
            key: LabelKey {
                cost,
                stops: 0,
                distance_km: 0.0,
            },
            parent: None,
            charged,
        };
        assert!(dominates(&label(1.0, 10.0, false), &label(2.0, 9.0, false)));
        assert!(!dominates(&label(1.0, 9.0, false), &label(2.0, 10.0, false)));
        assert!(!dominates(&label(1.0, 10.0, true), &label(2.0, 9.0, false)));
        assert!(dominates(&label(1.0, 10.0, false), &label(1.0, 10.0, true)));
    }

    #[test]
    fn test_expansion_budget() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let config = CspConfig::default().with_max_expansions(1);
        let result = CspSolver::solve(&ctx, &config).unwrap();
        assert_eq!(result.outcome.reason(), Some(NoSolutionReason::BudgetExhausted));
    }

    #[test]
    fn test_grid_route_is_feasible() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let route = solve(&ctx).outcome.into_route().expect("grid is solvable");
        assert!(route.min_soc_kwh() >= model.floor_kwh() - 1e-9);
        assert!(route.cost + 1e-9 >= ctx.guidance().cost_to_goal[0]);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let config = CspConfig::default().with_bucket_kwh(0.0);
        assert!(CspSolver::solve(&ctx, &config).is_err());
    }
}
