//! Energy-aware constructive walks.
//!
//! A walk grows a [`VehicleState`] hop by hop. At each station only
//! *safe* hops are offered: unvisited neighbors that can still reach the
//! goal and that leave enough charge to reach the next charger (or the
//! goal) afterwards. When a hop is only safe after recharging here, the
//! walk recharges first.

use rand::Rng;

use super::context::SearchContext;
use crate::cost::{VehicleState, Waypoint, ENERGY_EPSILON};
use crate::graph::{SegmentIdx, StationIdx};

/// A safe next hop from the current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub segment: SegmentIdx,
    pub to: StationIdx,
    /// The vehicle must recharge before taking this hop.
    pub needs_charge: bool,
    /// Scalar cost of the hop, including the recharge when one is needed.
    pub step_cost: f64,
}

/// Lists the safe hops from `state`, in adjacency order.
pub fn candidates(ctx: &SearchContext<'_>, state: &VehicleState) -> Vec<Candidate> {
    let model = ctx.model();
    let guidance = ctx.guidance();
    let floor = model.floor_kwh();

    let charge = if state.charged_here() {
        None
    } else {
        model.plan_charge(state.station, state.soc_kwh)
    };
    let charged = charge
        .as_ref()
        .map(|stop| (state.soc_kwh + stop.energy_kwh, model.charge_cost(stop)));

    let mut out = Vec::new();
    for (seg, to) in ctx.graph().neighbors(state.station) {
        if state.has_visited(to) || !guidance.cost_to_goal[to].is_finite() {
            continue;
        }
        let required = model.segment_energy(seg) + floor + guidance.energy_to_refuel[to];
        if state.soc_kwh >= required - ENERGY_EPSILON {
            out.push(Candidate {
                segment: seg,
                to,
                needs_charge: false,
                step_cost: model.edge_cost(seg),
            });
        } else if let Some((soc, charge_cost)) = charged {
            if soc >= required - ENERGY_EPSILON {
                out.push(Candidate {
                    segment: seg,
                    to,
                    needs_charge: true,
                    step_cost: model.edge_cost(seg) + charge_cost,
                });
            }
        }
    }
    out
}

/// Continues `state` until it reaches the goal or a station accepted by
/// `stop_at`.
///
/// `choose` picks one of the offered candidates; returning `None` abandons
/// the walk. Returns `None` on a dead end or after `max_steps` hops.
pub fn extend_walk<R, C, S>(
    ctx: &SearchContext<'_>,
    mut state: VehicleState,
    max_steps: usize,
    rng: &mut R,
    mut choose: C,
    stop_at: S,
) -> Option<VehicleState>
where
    R: Rng,
    C: FnMut(&[Candidate], &mut R) -> Option<usize>,
    S: Fn(StationIdx) -> bool,
{
    let model = ctx.model();
    let arrived = |s: StationIdx| s == ctx.goal() || stop_at(s);

    for _ in 0..max_steps {
        if arrived(state.station) {
            return Some(state);
        }
        let options = candidates(ctx, &state);
        if options.is_empty() {
            return None;
        }
        let pick = options[choose(&options, rng)?];
        if pick.needs_charge {
            state.charge(model);
        }
        if !state.traverse(model, pick.segment) {
            return None;
        }
    }

    arrived(state.station).then_some(state)
}

/// Restricted-candidate-list choice.
///
/// Scores each candidate by its step cost plus the guidance bound to the
/// goal, then picks uniformly among those within `alpha` of the best score
/// (`alpha = 0` is pure greedy, `alpha = 1` is uniform).
pub fn rcl_choice<R: Rng>(
    ctx: &SearchContext<'_>,
    options: &[Candidate],
    alpha: f64,
    rng: &mut R,
) -> Option<usize> {
    if options.is_empty() {
        return None;
    }
    let bound = &ctx.guidance().cost_to_goal;
    let scores: Vec<f64> = options.iter().map(|c| c.step_cost + bound[c.to]).collect();
    let best = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let worst = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = best + alpha * (worst - best) + 1e-12;

    let pool: Vec<usize> = (0..options.len()).filter(|&i| scores[i] <= threshold).collect();
    Some(pool[rng.random_range(0..pool.len())])
}

/// A randomized greedy walk from the start to the goal.
pub fn guided_walk<R: Rng>(
    ctx: &SearchContext<'_>,
    alpha: f64,
    rng: &mut R,
) -> Option<Vec<Waypoint>> {
    let state = ctx.model().initial_state(ctx.start());
    let steps = ctx.graph().station_count();
    extend_walk(
        ctx,
        state,
        steps,
        rng,
        |options, rng| rcl_choice(ctx, options, alpha, rng),
        |_| false,
    )
    .map(VehicleState::into_waypoints)
}

/// Up to `attempts` guided walks; the first one that reaches the goal.
///
/// The first attempt uses `alpha`. Later attempts widen the candidate list
/// linearly, and the second half of the attempts choose uniformly among
/// the safe hops, so a goal that is only reachable through a poorly scored
/// branch is still found.
pub fn seed_walk<R: Rng>(
    ctx: &SearchContext<'_>,
    alpha: f64,
    attempts: usize,
    rng: &mut R,
) -> Option<Vec<Waypoint>> {
    (0..attempts).find_map(|attempt| guided_walk(ctx, widened_alpha(alpha, attempt, attempts), rng))
}

fn widened_alpha(alpha: f64, attempt: usize, attempts: usize) -> f64 {
    let widen = (2 * attempt) as f64 / attempts.max(1) as f64;
    alpha + (1.0 - alpha) * widen.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::{Charge, Pass};
    use crate::test_utils::{fork_graph, grid_model, line_graph, model_for, rng};
    use proptest::prelude::*;

    #[test]
    fn test_candidates_require_charge_on_line() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);

        let mut state = model.initial_state(0);
        let first = candidates(&ctx, &state);
        assert_eq!(first.len(), 1);
        assert!(!first[0].needs_charge);

        assert!(state.traverse(&model, first[0].segment));
        let second = candidates(&ctx, &state);
        assert_eq!(second.len(), 1);
        assert!(second[0].needs_charge);
        assert!(second[0].step_cost > model.edge_cost(second[0].segment));
    }

    #[test]
    fn test_guided_walk_on_line() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let walk = guided_walk(&ctx, 0.0, &mut rng(1)).unwrap();
        assert_eq!(walk, vec![Pass(0), Charge(1), Pass(2)]);
    }

    #[test]
    fn test_walk_dead_ends_without_charger() {
        let model = model_for(line_graph(false), 40.0);
        let ctx = SearchContext::new(&model, 0, 2);
        assert!(seed_walk(&ctx, 0.5, 5, &mut rng(3)).is_none());
    }

    #[test]
    fn test_greedy_walk_is_deterministic() {
        let model = grid_model(4, 4, 35.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let a = seed_walk(&ctx, 0.3, 10, &mut rng(11));
        let b = seed_walk(&ctx, 0.3, 10, &mut rng(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_widened_alpha_schedule() {
        assert_eq!(widened_alpha(0.3, 0, 10), 0.3);
        assert!((widened_alpha(0.2, 2, 10) - 0.52).abs() < 1e-12);
        assert!((widened_alpha(0.3, 5, 10) - 1.0).abs() < 1e-12);
        assert!((widened_alpha(0.3, 9, 10) - 1.0).abs() < 1e-12);
        assert_eq!(widened_alpha(0.0, 0, 1), 0.0);
    }

    #[test]
    fn test_seed_walk_escapes_greedy_dead_end() {
        let model = model_for(fork_graph(), 20.0);
        let ctx = SearchContext::new(&model, 0, 4);

        // Greedy walks always take the cheap branch into the dead end.
        assert!(guided_walk(&ctx, 0.3, &mut rng(5)).is_none());

        let walk = seed_walk(&ctx, 0.3, 20, &mut rng(5)).unwrap();
        let route = model.evaluate(&walk).into_route().unwrap();
        assert_eq!(route.station_ids(), vec!["A", "Y", "X", "W", "G"]);
    }

    proptest! {
        #[test]
        fn prop_walks_are_feasible_simple_paths(seed in 0u64..500, alpha in 0.0f64..1.0) {
            let model = grid_model(4, 5, 35.0);
            let goal = model.graph().station_count() - 1;
            let ctx = SearchContext::new(&model, 0, goal);
            if let Some(walk) = guided_walk(&ctx, alpha, &mut rng(seed)) {
                prop_assert_eq!(walk.first().map(|w| w.station()), Some(0));
                prop_assert_eq!(walk.last().map(|w| w.station()), Some(goal));

                let mut seen = std::collections::HashSet::new();
                prop_assert!(walk.iter().all(|w| seen.insert(w.station())));

                let route = model.evaluate(&walk).into_route();
                prop_assert!(route.is_some());
                prop_assert!(route.unwrap().min_soc_kwh() >= -1e-9);
            }
        }
    }
}
