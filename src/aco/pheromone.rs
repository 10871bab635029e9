//! Per-segment pheromone trails.

use crate::cost::Route;
use crate::graph::SegmentIdx;

/// Pheromone level of every segment, indexed by [`SegmentIdx`].
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneMatrix {
    levels: Vec<f64>,
    min: f64,
    max: f64,
}

impl PheromoneMatrix {
    /// A uniform matrix over `segment_count` segments.
    pub fn new(segment_count: usize, initial: f64, min: f64, max: f64) -> Self {
        Self {
            levels: vec![initial; segment_count],
            min,
            max,
        }
    }

    pub fn level(&self, seg: SegmentIdx) -> f64 {
        self.levels[seg]
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn evaporate(&mut self, rate: f64) {
        let keep = 1.0 - rate;
        for level in &mut self.levels {
            *level *= keep;
        }
    }

    /// Adds `amount` to every segment the route drives.
    pub fn deposit(&mut self, route: &Route, amount: f64) {
        for leg in &route.legs {
            self.levels[leg.segment] += amount;
        }
    }

    pub fn clamp(&mut self) {
        let (min, max) = (self.min, self.max);
        for level in &mut self.levels {
            *level = level.clamp(min, max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::{Charge, Pass};
    use crate::test_utils::{line_graph, model_for};

    #[test]
    fn test_evaporate_deposit_clamp() {
        let model = model_for(line_graph(true), 60.0);
        let route = model
            .evaluate(&[Pass(0), Charge(1), Pass(2)])
            .into_route()
            .unwrap();

        let mut trails = PheromoneMatrix::new(2, 1.0, 0.5, 1.2);
        trails.evaporate(0.6);
        assert!((trails.level(0) - 0.4).abs() < 1e-12);

        trails.clamp();
        assert_eq!(trails.levels(), &[0.5, 0.5]);

        trails.deposit(&route, 1.0);
        assert!((trails.level(0) - 1.5).abs() < 1e-12);
        trails.clamp();
        assert_eq!(trails.levels(), &[1.2, 1.2]);
    }
}
