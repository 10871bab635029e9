//! Energy-feasible routing for electric vehicles over charging-station
//! networks.
//!
//! One shared graph and cost model, five interchangeable search
//! strategies:
//!
//! - **Constrained shortest path ([`csp`])**: exact label-setting search
//!   over `(station, discretized charge)` states.
//! - **Genetic Algorithm ([`ga`])**: evolves waypoint encodings with
//!   common-station crossover and detour/toggle mutation.
//! - **Ant-Colony Optimization ([`aco`])**: pheromone-guided stochastic
//!   route construction.
//! - **Simulated Annealing ([`sa`])**: a single route refined by swap,
//!   charge-toggle and detour moves.
//! - **Q-learning ([`rl`])**: a tabular agent trained on the network, then
//!   asked for its greedy route.
//!
//! Every strategy scores routes through [`cost::CostModel::evaluate`] and
//! honors the same battery invariant: the charge never drops below the
//! floor on any prefix of a returned route. Results are therefore directly
//! comparable; [`engine::Planner::compare`] runs a batch and
//! [`compare::aggregate`] tabulates it.
//!
//! # Example
//!
//! ```
//! use u_ecoroute::cost::{ChargePolicy, CostWeights, VehicleProfile};
//! use u_ecoroute::engine::{Algorithm, AlgorithmConfig, Planner, RunRequest};
//! use u_ecoroute::graph::{SegmentRecord, StationRecord};
//!
//! let stations = [
//!     StationRecord::waypoint("A", 0.0, 0.0),
//!     StationRecord::charger("B", 0.0, 0.5, 50.0, 0.3),
//!     StationRecord::waypoint("C", 0.0, 1.0),
//! ];
//! let segments = [
//!     SegmentRecord::new("A", "B", 50.0).with_travel_time(40.0),
//!     SegmentRecord::new("B", "C", 50.0).with_travel_time(40.0),
//! ];
//! let planner = Planner::new(
//!     &stations,
//!     &segments,
//!     VehicleProfile::new(60.0, 1.0),
//!     CostWeights::balanced(),
//!     ChargePolicy::full(),
//! )
//! .unwrap();
//!
//! let requests: Vec<RunRequest> = [Algorithm::Csp, Algorithm::Sa]
//!     .into_iter()
//!     .map(|a| RunRequest::new("A", "C", AlgorithmConfig::defaults(a)).with_seed(7))
//!     .collect();
//! let table = planner.compare(&requests).unwrap();
//! assert_eq!(table.best, Some(0));
//! ```
//!
//! # Features
//!
//! - `parallel` (default): rayon-backed GA evaluation, ACO ant
//!   construction and batch comparison.
//! - `serde`: `Serialize`/`Deserialize` on inputs, configs and outputs.

pub mod aco;
pub mod compare;
pub mod cost;
pub mod csp;
pub mod engine;
pub mod error;
pub mod ga;
pub mod graph;
pub mod plan;
pub mod rl;
pub mod sa;

#[cfg(test)]
mod test_utils;

pub use error::{Error, ErrorKind, Result};
