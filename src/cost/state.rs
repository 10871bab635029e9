//! Mutable vehicle state used while a route is being built.

use super::model::CostModel;
use super::route::{ChargeStop, Waypoint};
use crate::graph::{SegmentIdx, StationIdx};

/// Vehicle state during step-by-step route construction.
///
/// Walk-based optimizers advance a state with [`charge`](Self::charge) and
/// [`traverse`](Self::traverse), then hand [`waypoints`](Self::waypoints)
/// to [`CostModel::evaluate`] to get the scored route. A state is dropped
/// once the walk reaches the goal or dead-ends.
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub station: StationIdx,
    pub soc_kwh: f64,
    pub elapsed_min: f64,
    pub monetary_cost: f64,
    /// Scalarized cost accumulated so far.
    pub cost: f64,
    pub distance_km: f64,
    pub charge_stops: usize,
    history: Vec<Waypoint>,
    seen: Vec<bool>,
}

impl VehicleState {
    pub(crate) fn new(start: StationIdx, soc_kwh: f64, station_count: usize) -> Self {
        let mut seen = vec![false; station_count];
        seen[start] = true;
        Self {
            station: start,
            soc_kwh,
            elapsed_min: 0.0,
            monetary_cost: 0.0,
            cost: 0.0,
            distance_km: 0.0,
            charge_stops: 0,
            history: vec![Waypoint::Pass(start)],
            seen,
        }
    }

    pub fn has_visited(&self, station: StationIdx) -> bool {
        self.seen[station]
    }

    /// Whether the vehicle already charged during the current visit.
    pub fn charged_here(&self) -> bool {
        self.history.last().is_some_and(|w| w.charges())
    }

    /// Stations visited so far, in order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.history
    }

    pub fn into_waypoints(self) -> Vec<Waypoint> {
        self.history
    }

    /// Recharges at the current station per the model's policy.
    ///
    /// Returns `None` without touching the state when the station cannot
    /// charge, the target is already met, or the vehicle already charged
    /// on this visit.
    pub fn charge(&mut self, model: &CostModel) -> Option<ChargeStop> {
        let stop = model.charge(self)?;
        self.soc_kwh += stop.energy_kwh;
        self.elapsed_min += stop.dwell_min;
        self.monetary_cost += stop.monetary_cost;
        self.cost += model.charge_cost(&stop);
        self.charge_stops += 1;
        if let Some(last) = self.history.last_mut() {
            *last = Waypoint::Charge(self.station);
        }
        Some(stop)
    }

    /// Drives along `seg` if that keeps the charge above the floor.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    ///
    /// # Panics
    /// Panics if `seg` does not start at the current station.
    pub fn traverse(&mut self, model: &CostModel, seg: SegmentIdx) -> bool {
        let info = model.graph().segment(seg);
        assert_eq!(info.from, self.station, "segment must leave the current station");
        if !model.is_feasible(self, seg) {
            return false;
        }
        self.soc_kwh -= model.segment_energy(seg);
        self.elapsed_min += info.travel_time_min;
        self.monetary_cost += info.monetary_cost;
        self.cost += model.edge_cost(seg);
        self.distance_km += info.distance_km;
        self.station = info.to;
        self.seen[info.to] = true;
        self.history.push(Waypoint::Pass(info.to));
        true
    }
}
