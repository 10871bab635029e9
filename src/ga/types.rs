//! Population members of the route GA.

use crate::cost::{CostModel, Evaluation, Route, Waypoint};

/// Anything with a fitness to rank on.
///
/// Lower fitness is better.
pub trait Individual {
    fn fitness(&self) -> f64;
}

/// A candidate route in the GA population.
///
/// Carries its waypoint encoding plus the fitness assigned by the last
/// evaluation: the route cost when feasible, the penalized cost otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteIndividual {
    pub waypoints: Vec<Waypoint>,
    pub fitness: f64,
    pub feasible: bool,
}

impl RouteIndividual {
    /// An unevaluated individual with the worst fitness.
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            fitness: f64::INFINITY,
            feasible: false,
        }
    }

    /// Scores the encoding and stores fitness and feasibility.
    pub fn evaluate(&mut self, model: &CostModel) -> Evaluation {
        let evaluation = model.evaluate(&self.waypoints);
        self.fitness = evaluation.fitness();
        self.feasible = evaluation.is_feasible();
        evaluation
    }

    /// The scored route when the encoding is feasible.
    pub fn route(&self, model: &CostModel) -> Option<Route> {
        model.evaluate(&self.waypoints).into_route()
    }
}

impl Individual for RouteIndividual {
    fn fitness(&self) -> f64 {
        self.fitness
    }
}
