//! Route encoding and route results.

use crate::graph::{SegmentIdx, StationIdx};

/// One element of a route encoding.
///
/// Every optimizer proposes routes as a `Vec<Waypoint>` starting at the
/// start station and ending at the goal; [`CostModel::evaluate`] turns the
/// list into a scored [`Route`].
///
/// [`CostModel::evaluate`]: super::CostModel::evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Waypoint {
    /// Drive through the station without charging.
    Pass(StationIdx),
    /// Recharge (per the charge policy) before leaving the station.
    Charge(StationIdx),
}

impl Waypoint {
    pub fn station(self) -> StationIdx {
        match self {
            Waypoint::Pass(s) | Waypoint::Charge(s) => s,
        }
    }

    pub fn charges(self) -> bool {
        matches!(self, Waypoint::Charge(_))
    }

    /// Same station, with the charging decision set to `charge`.
    pub fn with_charge(self, charge: bool) -> Self {
        if charge {
            Waypoint::Charge(self.station())
        } else {
            Waypoint::Pass(self.station())
        }
    }

    /// Same station, with the charging decision flipped.
    pub fn toggled(self) -> Self {
        self.with_charge(!self.charges())
    }
}

/// A recharge performed at a station.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargeStop {
    pub station: StationIdx,
    /// Energy added to the battery.
    pub energy_kwh: f64,
    pub dwell_min: f64,
    /// Price paid for the energy drawn from the charger.
    pub monetary_cost: f64,
}

/// A station visited by a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStop {
    pub station: StationIdx,
    pub id: String,
    pub arrival_soc_kwh: f64,
    pub departure_soc_kwh: f64,
    /// Energy recharged here, zero when the vehicle just passes through.
    pub charged_kwh: f64,
}

/// One traversed segment with per-leg and cumulative values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteLeg {
    pub segment: SegmentIdx,
    pub from: StationIdx,
    pub to: StationIdx,
    pub distance_km: f64,
    pub energy_kwh: f64,
    pub travel_time_min: f64,
    pub monetary_cost: f64,
    /// Scalarized cost of this leg alone.
    pub cost: f64,
    /// Scalarized cost since departure, charges included.
    pub cumulative_cost: f64,
    /// Minutes since departure, charging dwell included.
    pub cumulative_time_min: f64,
    pub cumulative_energy_kwh: f64,
    pub cumulative_distance_km: f64,
    pub soc_after_kwh: f64,
}

/// A feasible route produced by an optimizer and scored by the cost model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub stops: Vec<RouteStop>,
    pub legs: Vec<RouteLeg>,
    pub charge_stops: Vec<ChargeStop>,
    /// Scalarized cost under the configured weights.
    pub cost: f64,
    pub distance_km: f64,
    pub energy_kwh: f64,
    /// Driving plus charging time.
    pub travel_time_min: f64,
    /// Segment costs plus charging costs.
    pub monetary_cost: f64,
}

impl Route {
    pub fn station_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn stations(&self) -> Vec<StationIdx> {
        self.stops.iter().map(|s| s.station).collect()
    }

    pub fn charge_stop_count(&self) -> usize {
        self.charge_stops.len()
    }

    /// The encoding that reproduces this route.
    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.stops
            .iter()
            .map(|s| Waypoint::Pass(s.station).with_charge(s.charged_kwh > 0.0))
            .collect()
    }

    /// Lowest state of charge reached anywhere along the route.
    pub fn min_soc_kwh(&self) -> f64 {
        self.stops
            .iter()
            .flat_map(|s| [s.arrival_soc_kwh, s.departure_soc_kwh])
            .fold(f64::INFINITY, f64::min)
    }
}

/// Why a run produced no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoSolutionReason {
    /// The goal cannot be reached from the start in the graph topology.
    Disconnected,
    /// Paths exist but none keeps the charge above the floor.
    EnergyInfeasible,
    /// The iteration, step or time budget ran out before a feasible route
    /// was found.
    BudgetExhausted,
    /// The learned policy's greedy rollout did not reach the goal.
    PolicyFailed,
}

impl std::fmt::Display for NoSolutionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Disconnected => "goal unreachable from start",
            Self::EnergyInfeasible => "no battery-feasible route",
            Self::BudgetExhausted => "budget exhausted before a feasible route was found",
            Self::PolicyFailed => "learned policy did not reach the goal",
        };
        f.write_str(text)
    }
}

/// The result of one optimizer run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteOutcome {
    Found(Route),
    NoSolution(NoSolutionReason),
}

impl RouteOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            RouteOutcome::NoSolution(_) => None,
        }
    }

    pub fn into_route(self) -> Option<Route> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            RouteOutcome::NoSolution(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }

    pub fn cost(&self) -> Option<f64> {
        self.route().map(|r| r.cost)
    }

    pub fn reason(&self) -> Option<NoSolutionReason> {
        match self {
            RouteOutcome::Found(_) => None,
            RouteOutcome::NoSolution(reason) => Some(*reason),
        }
    }

    /// `Found(route)` when `best` holds a route, otherwise `NoSolution(reason)`.
    pub fn from_best(best: Option<Route>, reason: NoSolutionReason) -> Self {
        match best {
            Some(route) => RouteOutcome::Found(route),
            None => RouteOutcome::NoSolution(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_toggle() {
        let w = Waypoint::Pass(3);
        assert!(!w.charges());
        assert_eq!(w.toggled(), Waypoint::Charge(3));
        assert_eq!(w.toggled().toggled(), w);
        assert_eq!(Waypoint::Charge(3).station(), 3);
    }

    #[test]
    fn test_outcome_accessors() {
        let none = RouteOutcome::NoSolution(NoSolutionReason::BudgetExhausted);
        assert!(!none.is_found());
        assert!(none.cost().is_none());
        assert_eq!(none.reason(), Some(NoSolutionReason::BudgetExhausted));

        let from_best = RouteOutcome::from_best(None, NoSolutionReason::PolicyFailed);
        assert_eq!(from_best.reason(), Some(NoSolutionReason::PolicyFailed));
    }
}
