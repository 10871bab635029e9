//! Request-level entry point.
//!
//! A [`Planner`] owns the validated network and cost model. Each
//! [`RunRequest`] names its endpoints by station id, carries one
//! strategy's configuration in an [`AlgorithmConfig`] and a seed for the
//! run's random source; the planner answers with a [`RunReport`].
//! [`Planner::compare`] runs a batch and aggregates it into a
//! [`ComparisonTable`](crate::compare::ComparisonTable).

mod planner;
mod request;

pub use planner::Planner;
pub use request::{Algorithm, AlgorithmConfig, RunReport, RunRequest};
