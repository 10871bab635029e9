//! Neighborhood moves for route annealing.

use rand::Rng;

use crate::cost::Waypoint;
use crate::plan::{detour, repair_charging, swap_stops, toggle_charge, SearchContext};

/// A neighborhood move on a waypoint encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteMove {
    /// Exchange two intermediate stops when the swapped path stays connected.
    Swap,
    /// Flip the charging decision at a charge-capable stop.
    ToggleCharge,
    /// Replace a sub-path with a fresh guided walk.
    Detour,
}

impl RouteMove {
    pub const ALL: [RouteMove; 3] = [RouteMove::Swap, RouteMove::ToggleCharge, RouteMove::Detour];

    /// Applies the move and repairs the charging decisions of the result.
    ///
    /// Repair only adds missing charges, so switching off a charge the
    /// battery needs is undone while switching on an optional one sticks.
    /// `None` when the move does not apply to `waypoints`.
    pub fn apply<R: Rng>(
        self,
        ctx: &SearchContext<'_>,
        waypoints: &[Waypoint],
        rcl_alpha: f64,
        rng: &mut R,
    ) -> Option<Vec<Waypoint>> {
        let mut moved = match self {
            RouteMove::Swap => swap_stops(ctx, waypoints, rng),
            RouteMove::ToggleCharge => toggle_charge(ctx, waypoints, rng),
            RouteMove::Detour => detour(ctx, waypoints, rcl_alpha, rng),
        }?;
        repair_charging(ctx, &mut moved);
        Some(moved)
    }

    /// Draws a move uniformly and falls back to the others in turn.
    pub fn propose<R: Rng>(
        ctx: &SearchContext<'_>,
        waypoints: &[Waypoint],
        rcl_alpha: f64,
        rng: &mut R,
    ) -> Option<(RouteMove, Vec<Waypoint>)> {
        let first = rng.random_range(0..Self::ALL.len());
        (0..Self::ALL.len()).find_map(|offset| {
            let kind = Self::ALL[(first + offset) % Self::ALL.len()];
            kind.apply(ctx, waypoints, rcl_alpha, rng).map(|moved| (kind, moved))
        })
    }
}
