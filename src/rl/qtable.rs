//! Flat action-value table.

use crate::graph::{Graph, StationIdx};

/// Action index of "recharge here". Action `k > 0` drives the station's
/// `k - 1`th outgoing segment.
pub const CHARGE_ACTION: usize = 0;

/// Action values for every `(station, charge bucket, action)` triple.
///
/// Each station owns `soc_buckets * (out_degree + 1)` contiguous slots.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Vec<f64>,
    offsets: Vec<usize>,
    action_counts: Vec<usize>,
    buckets: usize,
}

impl QTable {
    /// A zero-initialized table shaped after `graph`.
    pub fn new(graph: &Graph, buckets: usize) -> Self {
        let n = graph.station_count();
        let mut offsets = Vec::with_capacity(n);
        let mut action_counts = Vec::with_capacity(n);
        let mut total = 0;
        for s in 0..n {
            let actions = graph.outgoing(s).len() + 1;
            offsets.push(total);
            action_counts.push(actions);
            total += buckets * actions;
        }
        Self {
            values: vec![0.0; total],
            offsets,
            action_counts,
            buckets,
        }
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    pub fn action_count(&self, station: StationIdx) -> usize {
        self.action_counts[station]
    }

    /// Total number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn slot(&self, station: StationIdx, bucket: usize, action: usize) -> usize {
        debug_assert!(bucket < self.buckets && action < self.action_counts[station]);
        self.offsets[station] + bucket * self.action_counts[station] + action
    }

    pub fn get(&self, station: StationIdx, bucket: usize, action: usize) -> f64 {
        self.values[self.slot(station, bucket, action)]
    }

    pub fn set(&mut self, station: StationIdx, bucket: usize, action: usize, value: f64) {
        let slot = self.slot(station, bucket, action);
        self.values[slot] = value;
    }

    /// The highest-valued action among `valid`; ties go to the earliest.
    pub fn best_action(&self, station: StationIdx, bucket: usize, valid: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &action in valid {
            let q = self.get(station, bucket, action);
            if best.map_or(true, |(_, b)| q > b) {
                best = Some((action, q));
            }
        }
        best.map(|(action, _)| action)
    }

    /// `max Q` over `valid`, or 0 when nothing is valid.
    pub fn max_value(&self, station: StationIdx, bucket: usize, valid: &[usize]) -> f64 {
        self.best_action(station, bucket, valid)
            .map_or(0.0, |a| self.get(station, bucket, a))
    }
}
