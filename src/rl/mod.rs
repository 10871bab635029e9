//! Tabular Q-learning routing agent.
//!
//! The state is the current station plus the charge level quantized into
//! `soc_buckets` buckets. Action 0 recharges (when that adds energy and
//! has not happened on this visit); action `k` drives the station's
//! `k - 1`th outgoing segment to an unvisited station. Rewards are negated
//! edge and charge costs, a goal bonus on arrival, and a penalty when a
//! move would break the charge floor or no action remains.
//!
//! # References
//!
//! - Watkins & Dayan (1992), "Q-learning"
//! - Sutton & Barto (2018), *Reinforcement Learning: An Introduction*, ch. 6

mod agent;
mod config;
mod qtable;

pub use agent::{RoutingAgent, TrainingStats};
pub use config::RlConfig;
pub use qtable::{QTable, CHARGE_ACTION};
