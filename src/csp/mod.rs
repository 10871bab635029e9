//! Exact constrained shortest-path solver.
//!
//! Finds the minimum-cost route under the battery constraint by searching
//! over (station, charge bucket) states. It is the reference the heuristic
//! optimizers are measured against.
//!
//! # Discretization
//!
//! Charge levels are grouped into buckets of [`CspConfig::bucket_kwh`].
//! Labels keep the exact charge. Within a bucket a label is dropped only
//! when another is no dearer and holds at least as much charge, so the
//! result is exact for continuous charge whatever the bucket width.
//!
//! # Key Types
//!
//! - [`CspConfig`]: bucket width, expansion budget, time limit
//! - [`CspSolver`]: runs the search
//! - [`CspResult`]: outcome and expansion count

mod config;
mod solver;

pub use config::CspConfig;
pub use solver::{CspResult, CspSolver};
