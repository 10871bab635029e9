//! Search building blocks shared by the optimizers.
//!
//! - [`SearchContext`]: a start/goal query bound to a [`CostModel`], with
//!   reachability diagnosis and lower-bound [`Guidance`].
//! - Walks ([`guided_walk`], [`extend_walk`]): constructive, battery-safe
//!   path building with restricted-candidate-list choices.
//! - Operators ([`repair_charging`], [`detour`], [`swap_stops`],
//!   [`toggle_charge`], [`remove_loops`]): waypoint-level moves used by the
//!   genetic algorithm and simulated annealing.
//! - [`RunClock`]: time limit and cancellation polling.
//!
//! [`CostModel`]: crate::cost::CostModel

mod clock;
mod context;
mod operators;
mod walk;

pub use clock::RunClock;
pub use context::{Guidance, SearchContext};
pub use operators::{detour, remove_loops, repair_charging, replay, swap_stops, toggle_charge};
pub use walk::{candidates, extend_walk, guided_walk, rcl_choice, seed_walk, Candidate};
