//! Q-learning routing agent.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::config::RlConfig;
use super::qtable::{QTable, CHARGE_ACTION};
use crate::cost::{NoSolutionReason, RouteOutcome, VehicleState};
use crate::error::Result;
use crate::plan::{RunClock, SearchContext};

/// Summary of a training phase.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingStats {
    /// Episodes run.
    pub episodes: usize,

    /// Episodes that reached the goal.
    pub successes: usize,

    /// Exploration rate after the last episode.
    pub final_epsilon: f64,

    /// Undiscounted return of each episode.
    pub returns: Vec<f64>,

    /// Whether training was cancelled externally.
    pub cancelled: bool,
}

/// What one action did to the episode.
enum Step {
    /// The episode continues from the new state.
    Continue(f64),
    /// The episode ended; `true` on arrival at the goal.
    Terminal(f64, bool),
}

/// Tabular Q-learning over `(station, charge bucket)` states.
///
/// Training and route derivation are separate phases: [`train`] updates
/// the table with epsilon-greedy episodes, [`derive_route`] follows the
/// greedy policy once and reports the route it produces.
///
/// [`train`]: RoutingAgent::train
/// [`derive_route`]: RoutingAgent::derive_route
pub struct RoutingAgent<'a> {
    ctx: &'a SearchContext<'a>,
    config: RlConfig,
    table: QTable,
    epsilon: f64,
}

impl<'a> RoutingAgent<'a> {
    pub fn new(ctx: &'a SearchContext<'a>, config: RlConfig) -> Result<Self> {
        config.validate()?;
        let table = QTable::new(ctx.graph(), config.soc_buckets);
        let epsilon = config.epsilon;
        Ok(Self {
            ctx,
            config,
            table,
            epsilon,
        })
    }

    pub fn config(&self) -> &RlConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn train<R: Rng>(&mut self, rng: &mut R) -> TrainingStats {
        self.train_with_cancel(rng, None)
    }

    /// Runs the configured episodes, stopping early on the time limit or
    /// cancellation (checked between episodes).
    ///
    /// Does nothing when the goal is unreachable from the start.
    pub fn train_with_cancel<R: Rng>(
        &mut self,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> TrainingStats {
        let mut stats = TrainingStats {
            episodes: 0,
            successes: 0,
            final_epsilon: self.epsilon,
            returns: Vec::with_capacity(self.config.episodes),
            cancelled: false,
        };
        if self.ctx.precheck().is_some() {
            return stats;
        }

        let clock = RunClock::new(self.config.time_limit_ms, cancel);
        for episode in 0..self.config.episodes {
            if clock.cancelled() {
                stats.cancelled = true;
                break;
            }
            if clock.timed_out() {
                break;
            }

            let (ret, reached) = self.run_episode(rng);
            stats.episodes += 1;
            stats.successes += usize::from(reached);
            stats.returns.push(ret);
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);

            if episode % 50 == 0 {
                debug!(episode, ret, reached, epsilon = self.epsilon, "rl episode");
            }
        }
        stats.final_epsilon = self.epsilon;
        stats
    }

    /// Follows the greedy policy from the start.
    ///
    /// Returns `NoSolution(PolicyFailed)` when the policy would break the
    /// charge floor, runs out of actions, or exceeds the step cap.
    pub fn derive_route(&self) -> RouteOutcome {
        if let Some(outcome) = self.ctx.precheck() {
            return outcome;
        }
        let failed = RouteOutcome::NoSolution(NoSolutionReason::PolicyFailed);
        let model = self.ctx.model();

        let mut state = model.initial_state(self.ctx.start());
        for _ in 0..self.max_steps() {
            if state.station == self.ctx.goal() {
                return model
                    .evaluate(state.waypoints())
                    .into_route()
                    .map_or(failed, RouteOutcome::Found);
            }
            let valid = self.valid_actions(&state);
            let bucket = self.bucket(state.soc_kwh);
            let Some(action) = self.table.best_action(state.station, bucket, &valid) else {
                return failed;
            };
            if !self.apply(&mut state, action) {
                return failed;
            }
        }

        if state.station == self.ctx.goal() {
            return model
                .evaluate(state.waypoints())
                .into_route()
                .map_or(failed, RouteOutcome::Found);
        }
        failed
    }

    fn max_steps(&self) -> usize {
        self.config
            .max_steps
            .unwrap_or(2 * self.ctx.graph().station_count())
    }

    /// Charge bucket of a charge level.
    fn bucket(&self, soc_kwh: f64) -> usize {
        let capacity = self.ctx.model().capacity_kwh();
        let buckets = self.config.soc_buckets;
        let b = (soc_kwh / capacity * buckets as f64).floor();
        if b <= 0.0 {
            0
        } else {
            (b as usize).min(buckets - 1)
        }
    }

    /// Actions open in `state`: recharge when it adds energy and has not
    /// happened on this visit, and moves to unvisited stations.
    fn valid_actions(&self, state: &VehicleState) -> Vec<usize> {
        let model = self.ctx.model();
        let mut actions = Vec::new();
        if !state.charged_here() && model.plan_charge(state.station, state.soc_kwh).is_some() {
            actions.push(CHARGE_ACTION);
        }
        let graph = self.ctx.graph();
        for (k, &seg) in graph.outgoing(state.station).iter().enumerate() {
            if !state.has_visited(graph.segment(seg).to) {
                actions.push(k + 1);
            }
        }
        actions
    }

    /// Applies an action; `false` when a move would break the floor.
    fn apply(&self, state: &mut VehicleState, action: usize) -> bool {
        let model = self.ctx.model();
        if action == CHARGE_ACTION {
            return state.charge(model).is_some();
        }
        let seg = self.ctx.graph().outgoing(state.station)[action - 1];
        state.traverse(model, seg)
    }

    /// Executes one action and returns its reward and whether the episode
    /// goes on.
    fn step(&self, state: &mut VehicleState, action: usize) -> Step {
        let before = state.cost;
        if !self.apply(state, action) {
            let edge = match action {
                CHARGE_ACTION => 0.0,
                k => self
                    .ctx
                    .model()
                    .edge_cost(self.ctx.graph().outgoing(state.station)[k - 1]),
            };
            return Step::Terminal(-edge - self.config.failure_penalty, false);
        }
        let reward = before - state.cost;
        if state.station == self.ctx.goal() {
            return Step::Terminal(reward + self.config.goal_reward, true);
        }
        if self.valid_actions(state).is_empty() {
            return Step::Terminal(reward - self.config.failure_penalty, false);
        }
        Step::Continue(reward)
    }

    fn choose<R: Rng>(&self, state: &VehicleState, valid: &[usize], rng: &mut R) -> Option<usize> {
        if valid.is_empty() {
            return None;
        }
        if rng.random_bool(self.epsilon) {
            return Some(valid[rng.random_range(0..valid.len())]);
        }
        self.table
            .best_action(state.station, self.bucket(state.soc_kwh), valid)
    }

    /// One epsilon-greedy episode with TD updates. Returns the undiscounted
    /// return and whether the goal was reached.
    fn run_episode<R: Rng>(&mut self, rng: &mut R) -> (f64, bool) {
        let model = self.ctx.model();
        let mut state = model.initial_state(self.ctx.start());
        let mut total = 0.0;

        for _ in 0..self.max_steps() {
            let valid = self.valid_actions(&state);
            let Some(action) = self.choose(&state, &valid, rng) else {
                return (total - self.config.failure_penalty, false);
            };
            let (station, bucket) = (state.station, self.bucket(state.soc_kwh));

            let (reward, target, done) = match self.step(&mut state, action) {
                Step::Terminal(reward, reached) => (reward, reward, Some(reached)),
                Step::Continue(reward) => {
                    let next_valid = self.valid_actions(&state);
                    let next_bucket = self.bucket(state.soc_kwh);
                    let future = self.table.max_value(state.station, next_bucket, &next_valid);
                    (reward, reward + self.config.discount * future, None)
                }
            };

            let q = self.table.get(station, bucket, action);
            self.table.set(
                station,
                bucket,
                action,
                q + self.config.learning_rate * (target - q),
            );
            total += reward;

            if let Some(reached) = done {
                return (total, reached);
            }
        }
        (total - self.config.failure_penalty, false)
    }
}
