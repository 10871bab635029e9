//! Cost and feasibility model.
//!
//! Turns raw segment attributes and the vehicle profile into:
//!
//! - a scalarized, normalized edge cost ([`CostModel::edge_cost`]),
//! - charging decisions and their cost ([`CostModel::plan_charge`]),
//! - the battery feasibility predicate ([`CostModel::is_feasible`]),
//! - the shared route scorer ([`CostModel::evaluate`]).
//!
//! Every optimizer encodes candidate routes as [`Waypoint`] lists and has
//! them scored here, which keeps results comparable across strategies.

mod config;
mod model;
mod route;
mod state;

pub use config::{ChargePolicy, CostWeights, VehicleProfile};
pub use model::{
    CostModel, CostScale, Evaluation, DEFICIT_PENALTY, ENERGY_EPSILON, INFEASIBLE_PENALTY,
};
pub use route::{ChargeStop, NoSolutionReason, Route, RouteLeg, RouteOutcome, RouteStop, Waypoint};
pub use state::VehicleState;
