//! Route crossover and mutation.
//!
//! Both operators keep the encoding a connected start-to-goal path and
//! finish with [`repair_charging`], so offspring only fail feasibility when
//! a stretch between chargers is longer than one battery.

use rand::Rng;

use crate::cost::Waypoint;
use crate::plan::{
    detour, remove_loops, repair_charging, swap_stops, toggle_charge, SearchContext,
};

/// Common-station crossover.
///
/// Picks a station visited by both parents (other than the endpoints) and
/// swaps the tails behind it:
///
/// ```text
/// p1: S - a - X - b - G        c1: S - a - X - d - e - G
/// p2: S - c - X - d - e - G    c2: S - c - X - b - G
/// ```
///
/// Cycles created by the splice are cut. Returns `None` when the parents
/// share no intermediate station.
pub fn common_station_crossover<R: Rng>(
    ctx: &SearchContext<'_>,
    p1: &[Waypoint],
    p2: &[Waypoint],
    rng: &mut R,
) -> Option<(Vec<Waypoint>, Vec<Waypoint>)> {
    if p1.len() < 3 || p2.len() < 3 {
        return None;
    }
    let station_count = ctx.graph().station_count();

    let mut position_in_p2: Vec<Option<usize>> = vec![None; station_count];
    for (j, wp) in p2.iter().enumerate().take(p2.len() - 1).skip(1) {
        position_in_p2[wp.station()] = Some(j);
    }
    let shared: Vec<(usize, usize)> = p1
        .iter()
        .enumerate()
        .take(p1.len() - 1)
        .skip(1)
        .filter_map(|(i, wp)| position_in_p2[wp.station()].map(|j| (i, j)))
        .collect();
    if shared.is_empty() {
        return None;
    }
    let (i, j) = shared[rng.random_range(0..shared.len())];

    let splice = |head: &[Waypoint], tail: &[Waypoint]| {
        let mut child: Vec<Waypoint> = head.iter().chain(tail).copied().collect();
        remove_loops(&mut child, station_count);
        repair_charging(ctx, &mut child);
        child
    };
    Some((splice(&p1[..i], &p2[j..]), splice(&p2[..j], &p1[i..])))
}

/// Detour, charge-toggle or stop-swap mutation, drawn uniformly.
///
/// Falls back to the other moves in turn when the drawn one does not
/// apply, and returns the input unchanged (but repaired) when none does.
pub fn mutate<R: Rng>(
    ctx: &SearchContext<'_>,
    waypoints: &[Waypoint],
    rcl_alpha: f64,
    rng: &mut R,
) -> Vec<Waypoint> {
    const MOVES: usize = 3;
    let first = rng.random_range(0..MOVES);
    let mutated = (0..MOVES).find_map(|offset| match (first + offset) % MOVES {
        0 => detour(ctx, waypoints, rcl_alpha, rng),
        1 => toggle_charge(ctx, waypoints, rng),
        _ => swap_stops(ctx, waypoints, rng),
    });
    let mut child = mutated.unwrap_or_else(|| waypoints.to_vec());
    repair_charging(ctx, &mut child);
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::Pass;
    use crate::plan::seed_walk;
    use crate::graph::{Graph, SegmentRecord, StationRecord};
    use crate::test_utils::{grid_model, model_for, rng};

    #[test]
    fn test_crossover_swaps_tails() {
        // 3x3 grid: 0 1 2 / 3 4 5 / 6 7 8
        let model = grid_model(3, 3, 100.0);
        let ctx = SearchContext::new(&model, 0, 8);
        let p1 = vec![Pass(0), Pass(1), Pass(4), Pass(5), Pass(8)];
        let p2 = vec![Pass(0), Pass(3), Pass(4), Pass(7), Pass(8)];

        let (c1, c2) = common_station_crossover(&ctx, &p1, &p2, &mut rng(1)).unwrap();
        let stations = |c: &[Waypoint]| c.iter().map(|w| w.station()).collect::<Vec<_>>();
        assert_eq!(stations(&c1), vec![0, 1, 4, 7, 8]);
        assert_eq!(stations(&c2), vec![0, 3, 4, 5, 8]);
        assert!(model.evaluate(&c1).is_feasible());
        assert!(model.evaluate(&c2).is_feasible());
    }

    #[test]
    fn test_crossover_without_common_station() {
        let model = grid_model(3, 3, 100.0);
        let ctx = SearchContext::new(&model, 0, 8);
        let p1 = vec![Pass(0), Pass(1), Pass(2), Pass(5), Pass(8)];
        let p2 = vec![Pass(0), Pass(3), Pass(6), Pass(7), Pass(8)];
        assert!(common_station_crossover(&ctx, &p1, &p2, &mut rng(1)).is_none());
    }

    #[test]
    fn test_mutation_keeps_endpoints() {
        let model = grid_model(4, 4, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let mut r = rng(21);
        let mut current = seed_walk(&ctx, 0.0, 10, &mut r).unwrap();
        for _ in 0..25 {
            current = mutate(&ctx, &current, 0.5, &mut r);
            assert_eq!(current.first().map(|w| w.station()), Some(0));
            assert_eq!(current.last().map(|w| w.station()), Some(goal));
        }
    }

    #[test]
    fn test_mutation_can_swap_stops() {
        // B and C are linked both ways, so A-B-C-D swaps to A-C-B-D. Detours
        // rejoin the old suffix and there is no charger to toggle, so only
        // the swap produces that order.
        let graph = Graph::build(
            &["A", "B", "C", "D"].map(|id| StationRecord::waypoint(id, 0.0, 0.0)),
            &[
                SegmentRecord::new("A", "B", 10.0),
                SegmentRecord::new("A", "C", 10.0),
                SegmentRecord::new("B", "C", 10.0),
                SegmentRecord::new("C", "B", 10.0),
                SegmentRecord::new("B", "D", 10.0),
                SegmentRecord::new("C", "D", 10.0),
            ],
        )
        .unwrap();
        let model = model_for(graph, 100.0);
        let ctx = SearchContext::new(&model, 0, 3);
        let route = vec![Pass(0), Pass(1), Pass(2), Pass(3)];

        let mut r = rng(8);
        let swapped = (0..40).any(|_| {
            mutate(&ctx, &route, 0.5, &mut r) == vec![Pass(0), Pass(2), Pass(1), Pass(3)]
        });
        assert!(swapped);
    }
}
