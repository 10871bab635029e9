//! Genetic Algorithm over waypoint encodings.
//!
//! Each individual is a start-to-goal path with per-stop charging flags.
//! The population is seeded by randomized, battery-safe guided walks and
//! evolved with selection, common-station crossover and detour/toggle
//! mutation. Offspring are repaired so charging decisions keep the battery
//! above the floor whenever the path allows it.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, selection, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Best route with run statistics
//! - [`RouteIndividual`]: A population member
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Ahn & Ramakrishna (2002), "A genetic algorithm for shortest path routing
//!   problem and the sizing of populations"

mod config;
mod operators;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use operators::{common_station_crossover, mutate};
pub use runner::{GaResult, GaRunner};
pub use selection::Selection;
pub use types::{Individual, RouteIndividual};
