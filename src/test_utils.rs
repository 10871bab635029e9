//! Shared fixtures for unit tests.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cost::{ChargePolicy, CostModel, CostWeights, VehicleProfile};
use crate::graph::{Graph, SegmentRecord, StationRecord};

/// `A -> B -> C`, 50 km per segment, 40 min and 2.0 money each.
///
/// `B` is a 50 kW charger at 0.3 per kWh when `b_charges` holds.
pub fn line_graph(b_charges: bool) -> Graph {
    let b = if b_charges {
        StationRecord::charger("B", 0.0, 0.5, 50.0, 0.3)
    } else {
        StationRecord::waypoint("B", 0.0, 0.5)
    };
    Graph::build(
        &[
            StationRecord::waypoint("A", 0.0, 0.0),
            b,
            StationRecord::waypoint("C", 0.0, 1.0),
        ],
        &[
            SegmentRecord::new("A", "B", 50.0)
                .with_travel_time(40.0)
                .with_monetary_cost(2.0),
            SegmentRecord::new("B", "C", 50.0)
                .with_travel_time(40.0)
                .with_monetary_cost(2.0),
        ],
    )
    .unwrap()
}

/// Two ways from `A` into `X`, then on to the goal `G` through `W`.
///
/// `A -> X` is fast but uses 9.9 kWh; `A -> Y -> X` is slow and uses
/// 9.1 kWh. `X -> W -> G` needs 10.5 kWh, so with a 20 kWh battery only
/// the slow branch reaches `G`. The charger `Q` hangs off `X` as a dead
/// end. Station indices: A 0, X 1, Y 2, W 3, G 4, Q 5.
pub fn fork_graph() -> Graph {
    let hop = |from: &str, to: &str, kwh: f64, minutes: f64| {
        SegmentRecord::new(from, to, kwh)
            .with_energy(kwh)
            .with_travel_time(minutes)
    };
    Graph::build(
        &[
            StationRecord::waypoint("A", 0.0, 0.0),
            StationRecord::waypoint("X", 0.0, 0.1),
            StationRecord::waypoint("Y", 0.1, 0.05),
            StationRecord::waypoint("W", 0.0, 0.2),
            StationRecord::waypoint("G", 0.0, 0.3),
            StationRecord::charger("Q", -0.1, 0.1, 50.0, 0.3),
        ],
        &[
            hop("A", "X", 9.9, 10.0),
            hop("A", "Y", 4.5, 30.0),
            hop("Y", "X", 4.6, 30.0),
            hop("X", "W", 1.0, 5.0),
            hop("W", "G", 9.5, 10.0),
            hop("X", "Q", 1.0, 5.0),
        ],
    )
    .unwrap()
}

/// Lossless vehicle using 1 kWh/km, balanced weights, full recharges.
pub fn model_for(graph: Graph, capacity_kwh: f64) -> CostModel {
    CostModel::new(
        Arc::new(graph),
        VehicleProfile::new(capacity_kwh, 1.0),
        CostWeights::balanced(),
        ChargePolicy::full(),
    )
    .unwrap()
}

/// A `rows x cols` grid with segments both ways between neighbors.
///
/// Stations are named `r{row}c{col}`, so index 0 is the top-left corner and
/// the last index the bottom-right one. Cells with `(row + col) % 3 == 1`
/// are chargers. Distances run 10 to 14 km.
pub fn grid_graph(rows: usize, cols: usize) -> Graph {
    let mut stations = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let id = format!("r{r}c{c}");
            let (lat, lon) = (r as f64 * 0.1, c as f64 * 0.1);
            let power = 40.0 + 10.0 * ((r + c) % 4) as f64;
            stations.push(if (r + c) % 3 == 1 {
                StationRecord::charger(id, lat, lon, power, 0.25 + 0.05 * (c % 3) as f64)
            } else {
                StationRecord::waypoint(id, lat, lon)
            });
        }
    }

    let mut segments = Vec::new();
    let mut link = |a: (usize, usize), b: (usize, usize)| {
        let km = 10.0 + ((a.0 * 7 + a.1 * 3 + b.0 + b.1) % 5) as f64;
        for (from, to) in [(a, b), (b, a)] {
            segments.push(
                SegmentRecord::new(
                    format!("r{}c{}", from.0, from.1),
                    format!("r{}c{}", to.0, to.1),
                    km,
                )
                .with_travel_time(km * (1.0 + 0.1 * ((from.0 + to.1) % 3) as f64))
                .with_monetary_cost(0.5 + 0.1 * km),
            );
        }
    };
    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                link((r, c), (r, c + 1));
            }
            if r + 1 < rows {
                link((r, c), (r + 1, c));
            }
        }
    }

    Graph::build(&stations, &segments).unwrap()
}

pub fn grid_model(rows: usize, cols: usize, capacity_kwh: f64) -> CostModel {
    model_for(grid_graph(rows, cols), capacity_kwh)
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
