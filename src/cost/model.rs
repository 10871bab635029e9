//! Multi-objective edge costs, charging and route evaluation.

use std::sync::Arc;

use super::config::{ChargePolicy, CostWeights, VehicleProfile};
use super::route::{ChargeStop, Route, RouteLeg, RouteStop, Waypoint};
use super::state::VehicleState;
use crate::error::Result;
use crate::graph::{Graph, SegmentIdx, StationIdx};

/// Slack for floating-point charge comparisons, in kWh.
pub const ENERGY_EPSILON: f64 = 1e-9;

/// Base penalty added to the cost of an infeasible route encoding.
///
/// Larger than the cost of any feasible route on realistic graphs, so every
/// feasible route ranks ahead of every infeasible one.
pub const INFEASIBLE_PENALTY: f64 = 1e6;

/// Penalty per unit of missing charge, as a fraction of capacity.
pub const DEFICIT_PENALTY: f64 = 1e4;

/// Normalization divisors for the scalarized objectives.
///
/// Each is the largest value of the attribute over all segments, or 1 when
/// that maximum is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostScale {
    pub energy_kwh: f64,
    pub time_min: f64,
    pub monetary: f64,
}

/// Result of replaying a waypoint list.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Feasible(Route),
    Infeasible {
        /// Scalar cost plus [`INFEASIBLE_PENALTY`] and deficit penalties.
        penalized_cost: f64,
        /// Total charge missing below the floor over all legs.
        deficit_kwh: f64,
        /// Consecutive waypoints with no connecting segment.
        broken_links: usize,
    },
}

impl Evaluation {
    /// Route cost when feasible, penalized cost otherwise.
    pub fn fitness(&self) -> f64 {
        match self {
            Evaluation::Feasible(route) => route.cost,
            Evaluation::Infeasible { penalized_cost, .. } => *penalized_cost,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Evaluation::Feasible(_))
    }

    pub fn into_route(self) -> Option<Route> {
        match self {
            Evaluation::Feasible(route) => Some(route),
            Evaluation::Infeasible { .. } => None,
        }
    }
}

/// Converts segment attributes and the vehicle profile into scalar costs
/// and feasibility decisions.
///
/// The model is immutable after construction and shares its [`Graph`]
/// through an [`Arc`], so it can be used by concurrent runs.
#[derive(Debug, Clone)]
pub struct CostModel {
    graph: Arc<Graph>,
    profile: VehicleProfile,
    weights: CostWeights,
    policy: ChargePolicy,
    enforce_reserve: bool,
    scale: CostScale,
    segment_energy: Vec<f64>,
    edge_costs: Vec<f64>,
}

impl CostModel {
    /// Validates the inputs and precomputes per-segment energy and cost.
    ///
    /// The reserve is enforced by default.
    pub fn new(
        graph: Arc<Graph>,
        profile: VehicleProfile,
        weights: CostWeights,
        policy: ChargePolicy,
    ) -> Result<Self> {
        profile.validate()?;
        weights.validate()?;
        policy.validate()?;

        let segment_energy: Vec<f64> = graph
            .segments()
            .iter()
            .map(|seg| {
                seg.predicted_energy_kwh
                    .unwrap_or(seg.distance_km * profile.consumption_kwh_per_km)
            })
            .collect();

        let max_of = |values: &mut dyn Iterator<Item = f64>| {
            let max = values.fold(0.0_f64, f64::max);
            if max > 0.0 {
                max
            } else {
                1.0
            }
        };
        let scale = CostScale {
            energy_kwh: max_of(&mut segment_energy.iter().copied()),
            time_min: max_of(&mut graph.segments().iter().map(|s| s.travel_time_min)),
            monetary: max_of(&mut graph.segments().iter().map(|s| s.monetary_cost)),
        };

        let edge_costs = graph
            .segments()
            .iter()
            .zip(&segment_energy)
            .map(|(seg, &energy)| {
                weights.energy * energy / scale.energy_kwh
                    + weights.time * seg.travel_time_min / scale.time_min
                    + weights.monetary * seg.monetary_cost / scale.monetary
            })
            .collect();

        Ok(Self {
            graph,
            profile,
            weights,
            policy,
            enforce_reserve: true,
            scale,
            segment_energy,
            edge_costs,
        })
    }

    /// Enables or disables the reserve floor.
    ///
    /// When disabled the feasibility floor is zero charge.
    pub fn with_reserve_enforced(mut self, enforce: bool) -> Self {
        self.enforce_reserve = enforce;
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn shared_graph(&self) -> Arc<Graph> {
        Arc::clone(&self.graph)
    }

    pub fn profile(&self) -> &VehicleProfile {
        &self.profile
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn policy(&self) -> &ChargePolicy {
        &self.policy
    }

    pub fn scale(&self) -> &CostScale {
        &self.scale
    }

    pub fn reserve_enforced(&self) -> bool {
        self.enforce_reserve
    }

    pub fn capacity_kwh(&self) -> f64 {
        self.profile.capacity_kwh
    }

    /// Lowest charge the battery may reach.
    pub fn floor_kwh(&self) -> f64 {
        if self.enforce_reserve {
            self.profile.reserve_kwh()
        } else {
            0.0
        }
    }

    /// Charge level a charging stop aims for.
    pub fn charge_target_kwh(&self) -> f64 {
        self.profile.capacity_kwh * self.policy.target_fraction
    }

    /// Energy consumed on a segment: the forecast, or the baseline rate
    /// times the distance.
    pub fn segment_energy(&self, seg: SegmentIdx) -> f64 {
        self.segment_energy[seg]
    }

    /// Scalarized cost of traversing a segment.
    pub fn edge_cost(&self, seg: SegmentIdx) -> f64 {
        self.edge_costs[seg]
    }

    /// The recharge a stop at `station` would perform with `soc_kwh` left.
    ///
    /// `None` when the station has no available charger or the policy
    /// target is already met.
    pub fn plan_charge(&self, station: StationIdx, soc_kwh: f64) -> Option<ChargeStop> {
        let info = self.graph.station(station);
        if !info.supports_charging() {
            return None;
        }

        let rate_kw = info.charging_power_kw * self.profile.charging_efficiency;
        let mut energy = self.charge_target_kwh() - soc_kwh;
        if let Some(max_dwell) = self.policy.max_dwell_min {
            energy = energy.min(rate_kw * max_dwell / 60.0);
        }
        if energy <= ENERGY_EPSILON {
            return None;
        }

        Some(ChargeStop {
            station,
            energy_kwh: energy,
            dwell_min: energy / rate_kw * 60.0,
            monetary_cost: energy / self.profile.charging_efficiency * info.price_per_kwh,
        })
    }

    /// The recharge `state` would get at its current station, or `None`
    /// when it already charged on this visit.
    pub fn charge(&self, state: &VehicleState) -> Option<ChargeStop> {
        if state.charged_here() {
            return None;
        }
        self.plan_charge(state.station, state.soc_kwh)
    }

    /// Scalarized cost of a charging stop.
    pub fn charge_cost(&self, stop: &ChargeStop) -> f64 {
        self.weights.charging_stops
            + self.weights.time * stop.dwell_min / self.scale.time_min
            + self.weights.monetary * stop.monetary_cost / self.scale.monetary
    }

    /// Whether the vehicle in `state` can traverse `seg` without dropping
    /// below the floor.
    ///
    /// Any recharge at the segment's origin must already be applied to
    /// `state`.
    pub fn is_feasible(&self, state: &VehicleState, seg: SegmentIdx) -> bool {
        self.can_traverse(state.soc_kwh, seg)
    }

    /// [`is_feasible`](Self::is_feasible) on a bare charge level.
    pub fn can_traverse(&self, soc_kwh: f64, seg: SegmentIdx) -> bool {
        soc_kwh - self.segment_energy[seg] >= self.floor_kwh() - ENERGY_EPSILON
    }

    /// A fresh state at `start` with the initial charge.
    pub fn initial_state(&self, start: StationIdx) -> VehicleState {
        VehicleState::new(start, self.profile.initial_charge_kwh(), self.graph.station_count())
    }

    /// Replays `waypoints` from the initial charge and scores the result.
    ///
    /// A `Charge` on the last waypoint is ignored. Missing segments and
    /// charge deficits make the evaluation infeasible but are still scored,
    /// so search operators can compare infeasible encodings.
    pub fn evaluate(&self, waypoints: &[Waypoint]) -> Evaluation {
        let Some(last_idx) = waypoints.len().checked_sub(1) else {
            return Evaluation::Infeasible {
                penalized_cost: INFEASIBLE_PENALTY * 2.0,
                deficit_kwh: 0.0,
                broken_links: 1,
            };
        };

        let floor = self.floor_kwh();
        let mut soc = self.profile.initial_charge_kwh();
        let mut cost = 0.0;
        let mut time = 0.0;
        let mut money = 0.0;
        let mut distance = 0.0;
        let mut energy_used = 0.0;
        let mut deficit = 0.0;
        let mut broken = 0usize;

        let mut stops = Vec::with_capacity(waypoints.len());
        let mut legs = Vec::with_capacity(last_idx);
        let mut charge_stops = Vec::new();

        for (i, wp) in waypoints.iter().enumerate() {
            let station = wp.station();
            let arrival = soc;
            let mut charged = 0.0;

            if wp.charges() && i < last_idx {
                if let Some(stop) = self.plan_charge(station, soc) {
                    soc += stop.energy_kwh;
                    time += stop.dwell_min;
                    money += stop.monetary_cost;
                    cost += self.charge_cost(&stop);
                    charged = stop.energy_kwh;
                    charge_stops.push(stop);
                }
            }

            stops.push(RouteStop {
                station,
                id: self.graph.station(station).id.clone(),
                arrival_soc_kwh: arrival,
                departure_soc_kwh: soc,
                charged_kwh: charged,
            });

            if i == last_idx {
                break;
            }

            let next = waypoints[i + 1].station();
            let Some(seg) = self.graph.segment_between(station, next) else {
                broken += 1;
                continue;
            };

            let info = self.graph.segment(seg);
            let energy = self.segment_energy[seg];
            let leg_cost = self.edge_costs[seg];

            soc -= energy;
            if soc < floor - ENERGY_EPSILON {
                deficit += floor - soc;
                soc = floor;
            }

            cost += leg_cost;
            time += info.travel_time_min;
            money += info.monetary_cost;
            distance += info.distance_km;
            energy_used += energy;

            legs.push(RouteLeg {
                segment: seg,
                from: station,
                to: next,
                distance_km: info.distance_km,
                energy_kwh: energy,
                travel_time_min: info.travel_time_min,
                monetary_cost: info.monetary_cost,
                cost: leg_cost,
                cumulative_cost: cost,
                cumulative_time_min: time,
                cumulative_energy_kwh: energy_used,
                cumulative_distance_km: distance,
                soc_after_kwh: soc,
            });
        }

        if deficit > 0.0 || broken > 0 {
            return Evaluation::Infeasible {
                penalized_cost: INFEASIBLE_PENALTY * (1.0 + broken as f64)
                    + DEFICIT_PENALTY * deficit / self.profile.capacity_kwh
                    + cost,
                deficit_kwh: deficit,
                broken_links: broken,
            };
        }

        Evaluation::Feasible(Route {
            stops,
            legs,
            charge_stops,
            cost,
            distance_km: distance,
            energy_kwh: energy_used,
            travel_time_min: time,
            monetary_cost: money,
        })
    }
}
