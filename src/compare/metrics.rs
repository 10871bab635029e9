//! Per-run scalar metrics.

use crate::cost::NoSolutionReason;
use crate::engine::{Algorithm, RunReport};

/// Flattened view of one run for side-by-side comparison.
///
/// Route quantities are zero when the run found no route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunMetrics {
    pub algorithm: Algorithm,

    /// Scalar route cost; `None` without a route.
    pub cost: Option<f64>,

    pub distance_km: f64,
    pub energy_kwh: f64,

    /// Kilometres per kWh consumed; `None` when no energy was used.
    pub efficiency_km_per_kwh: Option<f64>,

    pub charge_stops: usize,
    pub travel_time_min: f64,
    pub monetary_cost: f64,

    /// Wall-clock time of the run in milliseconds.
    pub compute_ms: f64,

    pub iterations: usize,

    /// Why the run produced no route, if it did not.
    pub reason: Option<NoSolutionReason>,
}

impl RunMetrics {
    pub fn from_report(report: &RunReport) -> Self {
        let compute_ms = report.elapsed.as_secs_f64() * 1000.0;
        match report.outcome.route() {
            Some(route) => Self {
                algorithm: report.algorithm,
                cost: Some(route.cost),
                distance_km: route.distance_km,
                energy_kwh: route.energy_kwh,
                efficiency_km_per_kwh: (route.energy_kwh > 0.0)
                    .then(|| route.distance_km / route.energy_kwh),
                charge_stops: route.charge_stop_count(),
                travel_time_min: route.travel_time_min,
                monetary_cost: route.monetary_cost,
                compute_ms,
                iterations: report.iterations,
                reason: None,
            },
            None => Self {
                algorithm: report.algorithm,
                cost: None,
                distance_km: 0.0,
                energy_kwh: 0.0,
                efficiency_km_per_kwh: None,
                charge_stops: 0,
                travel_time_min: 0.0,
                monetary_cost: 0.0,
                compute_ms,
                iterations: report.iterations,
                reason: report.outcome.reason(),
            },
        }
    }

    pub fn is_found(&self) -> bool {
        self.cost.is_some()
    }
}
