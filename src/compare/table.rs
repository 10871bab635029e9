//! Side-by-side comparison of runs.

use std::fmt;

use super::metrics::RunMetrics;
use crate::engine::RunReport;

/// One run in a [`ComparisonTable`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonRow {
    pub metrics: RunMetrics,

    /// Relative cost gap to the best run, in percent. `None` without a route.
    pub gap_percent: Option<f64>,
}

/// Runs in input order plus the index of the cheapest one.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,

    /// Row with the lowest cost; the first one on ties.
    pub best: Option<usize>,
}

impl ComparisonTable {
    pub fn best_row(&self) -> Option<&ComparisonRow> {
        self.best.map(|i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds the comparison table of `reports`.
pub fn aggregate(reports: &[RunReport]) -> ComparisonTable {
    let metrics: Vec<RunMetrics> = reports.iter().map(RunMetrics::from_report).collect();

    let mut best: Option<(usize, f64)> = None;
    for (i, m) in metrics.iter().enumerate() {
        if let Some(cost) = m.cost {
            if best.map_or(true, |(_, b)| cost < b) {
                best = Some((i, cost));
            }
        }
    }

    let rows = metrics
        .into_iter()
        .map(|metrics| {
            let gap_percent = match (metrics.cost, best) {
                (Some(cost), Some((_, b))) if b > 0.0 => Some((cost - b) / b * 100.0),
                (Some(_), Some(_)) => Some(0.0),
                _ => None,
            };
            ComparisonRow {
                metrics,
                gap_percent,
            }
        })
        .collect();

    ComparisonTable {
        rows,
        best: best.map(|(i, _)| i),
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:>10} {:>10} {:>10} {:>8} {:>6} {:>10} {:>8}",
            "algo", "cost", "km", "kWh", "km/kWh", "stops", "ms", "gap %"
        )?;
        for (i, row) in self.rows.iter().enumerate() {
            let m = &row.metrics;
            let marker = if self.best == Some(i) { "*" } else { "" };
            match m.cost {
                Some(cost) => writeln!(
                    f,
                    "{:<6} {:>10.4} {:>10.1} {:>10.2} {:>8} {:>6} {:>10.1} {:>8}",
                    format!("{}{marker}", m.algorithm),
                    cost,
                    m.distance_km,
                    m.energy_kwh,
                    m.efficiency_km_per_kwh
                        .map_or_else(|| "-".to_string(), |e| format!("{e:.2}")),
                    m.charge_stops,
                    m.compute_ms,
                    row.gap_percent
                        .map_or_else(|| "-".to_string(), |g| format!("{g:.1}")),
                )?,
                None => writeln!(
                    f,
                    "{:<6} {:>10} ({})",
                    m.algorithm.to_string(),
                    "none",
                    m.reason.map_or_else(|| "unknown".to_string(), |r| r.to_string()),
                )?,
            }
        }
        Ok(())
    }
}
