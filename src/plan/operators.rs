//! Route-level operators shared by the population and trajectory
//! optimizers.
//!
//! All operators work on waypoint encodings and never score anything
//! themselves; callers pass the result to [`CostModel::evaluate`].
//!
//! [`CostModel::evaluate`]: crate::cost::CostModel::evaluate

use rand::Rng;

use super::context::SearchContext;
use super::walk::{extend_walk, rcl_choice};
use crate::cost::{VehicleState, Waypoint, ENERGY_EPSILON};

/// Rebuilds the vehicle state along `waypoints`.
///
/// Returns `None` if two consecutive stations are not linked or a leg
/// would drop the charge below the floor.
pub fn replay(ctx: &SearchContext<'_>, waypoints: &[Waypoint]) -> Option<VehicleState> {
    let model = ctx.model();
    let graph = ctx.graph();
    let first = waypoints.first()?;
    let mut state = model.initial_state(first.station());

    for pair in waypoints.windows(2) {
        if pair[0].charges() {
            state.charge(model);
        }
        let seg = graph.segment_between(pair[0].station(), pair[1].station())?;
        if !state.traverse(model, seg) {
            return None;
        }
    }
    Some(state)
}

/// Cuts cycles so that every station appears at most once.
///
/// When a station reappears, everything since its first visit is dropped
/// and the later visit's charging decision is kept.
pub fn remove_loops(waypoints: &mut Vec<Waypoint>, station_count: usize) {
    let mut position: Vec<Option<usize>> = vec![None; station_count];
    let mut out: Vec<Waypoint> = Vec::with_capacity(waypoints.len());

    for &wp in waypoints.iter() {
        match position[wp.station()] {
            Some(k) => {
                for dropped in out.drain(k + 1..) {
                    position[dropped.station()] = None;
                }
                out[k] = wp;
            }
            None => {
                position[wp.station()] = Some(out.len());
                out.push(wp);
            }
        }
    }
    *waypoints = out;
}

/// Rewrites the charging decisions of a path so the battery lasts.
///
/// One forward pass: at each charge-capable station the vehicle charges if
/// what is left would not carry it to the next charge-capable station (or
/// the final stop). Flags at stations without a charger, flags that would
/// add nothing, and a flag on the final stop are cleared. Existing charge
/// flags at capable stations are kept.
pub fn repair_charging(ctx: &SearchContext<'_>, waypoints: &mut [Waypoint]) {
    let model = ctx.model();
    let graph = ctx.graph();
    let floor = model.floor_kwh();
    let Some(last) = waypoints.len().checked_sub(1) else {
        return;
    };

    let leg_energy = |i: usize, wps: &[Waypoint]| {
        graph
            .segment_between(wps[i].station(), wps[i + 1].station())
            .map_or(0.0, |seg| model.segment_energy(seg))
    };

    let mut soc = model.profile().initial_charge_kwh();
    for i in 0..=last {
        let station = waypoints[i].station();
        if i == last {
            waypoints[i] = waypoints[i].with_charge(false);
            break;
        }

        if !graph.station(station).supports_charging() {
            waypoints[i] = waypoints[i].with_charge(false);
        } else if !waypoints[i].charges() {
            let mut needed = 0.0;
            for j in i..last {
                needed += leg_energy(j, waypoints);
                if j + 1 == last || graph.station(waypoints[j + 1].station()).supports_charging() {
                    break;
                }
            }
            if soc - needed < floor - ENERGY_EPSILON {
                waypoints[i] = waypoints[i].with_charge(true);
            }
        }

        if waypoints[i].charges() {
            match model.plan_charge(station, soc) {
                Some(stop) => soc += stop.energy_kwh,
                None => waypoints[i] = waypoints[i].with_charge(false),
            }
        }

        soc = (soc - leg_energy(i, waypoints)).max(floor);
    }
}

/// Reroutes part of a path.
///
/// Keeps a random prefix, then walks from its last station with
/// randomized greedy choices until the walk reaches the goal or rejoins
/// the remaining suffix. Returns `None` when the prefix cannot be driven
/// or the walk dead-ends.
pub fn detour<R: Rng>(
    ctx: &SearchContext<'_>,
    waypoints: &[Waypoint],
    alpha: f64,
    rng: &mut R,
) -> Option<Vec<Waypoint>> {
    let n = waypoints.len();
    if n < 2 {
        return None;
    }
    let cut = rng.random_range(0..n - 1);
    let state = replay(ctx, &waypoints[..=cut])?;

    let station_count = ctx.graph().station_count();
    let mut suffix_at: Vec<Option<usize>> = vec![None; station_count];
    for (k, wp) in waypoints.iter().enumerate().skip(cut + 1) {
        suffix_at[wp.station()] = Some(k);
    }

    let walked = extend_walk(
        ctx,
        state,
        station_count,
        rng,
        |options, rng| rcl_choice(ctx, options, alpha, rng),
        |s| suffix_at[s].is_some(),
    )?;

    let joined = walked.station;
    let mut out = walked.into_waypoints();
    if let Some(k) = suffix_at[joined] {
        if let Some(end) = out.last_mut() {
            *end = waypoints[k];
        }
        out.extend_from_slice(&waypoints[k + 1..]);
    }
    remove_loops(&mut out, station_count);
    Some(out)
}

/// Swaps two intermediate stations when both new links exist.
pub fn swap_stops<R: Rng>(
    ctx: &SearchContext<'_>,
    waypoints: &[Waypoint],
    rng: &mut R,
) -> Option<Vec<Waypoint>> {
    let n = waypoints.len();
    if n < 4 {
        return None;
    }
    let i = rng.random_range(1..n - 1);
    let mut j = rng.random_range(1..n - 2);
    if j >= i {
        j += 1;
    }
    let (i, j) = (i.min(j), i.max(j));

    let mut out = waypoints.to_vec();
    out.swap(i, j);
    let graph = ctx.graph();
    let linked = [i - 1, i, j - 1, j]
        .into_iter()
        .all(|k| graph.segment_between(out[k].station(), out[k + 1].station()).is_some());
    linked.then_some(out)
}

/// Flips the charging decision at a random charge-capable stop.
pub fn toggle_charge<R: Rng>(
    ctx: &SearchContext<'_>,
    waypoints: &[Waypoint],
    rng: &mut R,
) -> Option<Vec<Waypoint>> {
    let graph = ctx.graph();
    let n = waypoints.len();
    let capable: Vec<usize> = (0..n.saturating_sub(1))
        .filter(|&i| graph.station(waypoints[i].station()).supports_charging())
        .collect();
    if capable.is_empty() {
        return None;
    }
    let pick = capable[rng.random_range(0..capable.len())];
    let mut out = waypoints.to_vec();
    out[pick] = out[pick].toggled();
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::{Charge, Pass};
    use crate::plan::walk::guided_walk;
    use crate::test_utils::{grid_model, line_graph, model_for, rng};
    use proptest::prelude::*;

    #[test]
    fn test_repair_adds_missing_charge() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let mut wps = vec![Pass(0), Pass(1), Charge(2)];
        repair_charging(&ctx, &mut wps);
        assert_eq!(wps, vec![Pass(0), Charge(1), Pass(2)]);
        assert!(model.evaluate(&wps).is_feasible());
    }

    #[test]
    fn test_repair_clears_flags_without_charger() {
        let model = model_for(line_graph(false), 120.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let mut wps = vec![Charge(0), Charge(1), Pass(2)];
        repair_charging(&ctx, &mut wps);
        assert_eq!(wps, vec![Pass(0), Pass(1), Pass(2)]);
    }

    #[test]
    fn test_remove_loops() {
        let mut wps = vec![Pass(0), Pass(1), Pass(3), Charge(1), Pass(2)];
        remove_loops(&mut wps, 4);
        assert_eq!(wps, vec![Pass(0), Charge(1), Pass(2)]);

        let mut simple = vec![Pass(0), Pass(1), Pass(2)];
        remove_loops(&mut simple, 3);
        assert_eq!(simple, vec![Pass(0), Pass(1), Pass(2)]);
    }

    #[test]
    fn test_replay_stops_at_missing_link() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        assert!(replay(&ctx, &[Pass(0), Pass(2)]).is_none());
        let state = replay(&ctx, &[Pass(0), Charge(1), Pass(2)]).unwrap();
        assert_eq!(state.station, 2);
        assert_eq!(state.charge_stops, 1);
    }

    #[test]
    fn test_toggle_only_touches_capable_stops() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let out = toggle_charge(&ctx, &[Pass(0), Charge(1), Pass(2)], &mut rng(5)).unwrap();
        assert_eq!(out, vec![Pass(0), Pass(1), Pass(2)]);

        let bare = model_for(line_graph(false), 60.0);
        let ctx = SearchContext::new(&bare, 0, 2);
        assert!(toggle_charge(&ctx, &[Pass(0), Pass(1), Pass(2)], &mut rng(5)).is_none());
    }

    #[test]
    fn test_detour_keeps_endpoints() {
        let model = grid_model(4, 4, 60.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let mut r = rng(9);
        let base = guided_walk(&ctx, 0.0, &mut r).unwrap();
        for _ in 0..20 {
            if let Some(path) = detour(&ctx, &base, 0.8, &mut r) {
                assert_eq!(path.first().map(|w| w.station()), Some(0));
                assert_eq!(path.last().map(|w| w.station()), Some(goal));
                for pair in path.windows(2) {
                    assert!(model
                        .graph()
                        .segment_between(pair[0].station(), pair[1].station())
                        .is_some());
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_repair_restores_scrambled_charging(seed in 0u64..300, flips in 0usize..6) {
            let model = grid_model(4, 5, 40.0);
            let goal = model.graph().station_count() - 1;
            let ctx = SearchContext::new(&model, 0, goal);
            let mut r = rng(seed);
            if let Some(walk) = guided_walk(&ctx, 0.5, &mut r) {
                let mut path: Vec<Waypoint> = walk.iter().map(|w| w.with_charge(false)).collect();
                for _ in 0..flips {
                    let k = r.random_range(0..path.len());
                    path[k] = path[k].toggled();
                }
                repair_charging(&ctx, &mut path);
                prop_assert!(model.evaluate(&path).is_feasible(), "{:?}", path);
                prop_assert!(!path.last().unwrap().charges());
            }
        }
    }
}
