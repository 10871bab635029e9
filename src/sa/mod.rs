//! Simulated Annealing (SA) over a single route.
//!
//! Starts from a guided walk and perturbs it with [`RouteMove`]s: swapping
//! two intermediate stops, toggling a charge stop, or rerouting a sub-path.
//! Every neighbor gets its charging decisions repaired before it is scored.
//! Worse neighbors are accepted with probability `exp(-Δ/T)`.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod runner;
mod types;

pub use config::{CoolingSchedule, SaConfig};
pub use runner::{SaResult, SaRunner};
pub use types::RouteMove;
