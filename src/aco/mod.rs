//! Ant-Colony Optimization over the station network.
//!
//! Pheromone lives on segments. Ants grow battery-safe walks from the
//! start, picking each hop with probability proportional to
//! `tau^alpha * (1 / step_cost)^beta`; ants that dead-end are dropped for
//! the iteration. After all ants of an iteration finish, trails evaporate
//! and the iteration-best route (plus, with elitism, the best route so far)
//! is reinforced by `deposit / cost`.
//!
//! # References
//!
//! - Dorigo & Stützle (2004), *Ant Colony Optimization*
//! - Stützle & Hoos (2000), "MAX-MIN Ant System"

mod config;
mod pheromone;
mod runner;

pub use config::AcoConfig;
pub use pheromone::PheromoneMatrix;
pub use runner::{AcoResult, AcoRunner};
