//! Q-learning agent configuration.

use crate::error::{Error, Result};

/// Configuration for the tabular routing agent.
///
/// Rewards are in units of the scalar route cost: each hop earns minus its
/// edge cost, each recharge minus its charge cost.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RlConfig {
    /// Training episodes.
    pub episodes: usize,

    /// TD step size in (0, 1].
    pub learning_rate: f64,

    /// Discount factor in [0, 1].
    pub discount: f64,

    /// Initial exploration rate.
    pub epsilon: f64,

    /// Multiplier applied to epsilon after each episode.
    pub epsilon_decay: f64,

    pub min_epsilon: f64,

    /// Charge-level buckets per station.
    pub soc_buckets: usize,

    /// Reward on reaching the goal.
    pub goal_reward: f64,

    /// Penalty for breaking the charge floor or running out of actions.
    pub failure_penalty: f64,

    /// Step cap per episode and for route derivation.
    /// `None` uses twice the station count.
    pub max_steps: Option<usize>,

    /// Optional wall-clock time limit in milliseconds for training.
    pub time_limit_ms: Option<u64>,
}

impl Default for RlConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            learning_rate: 0.1,
            discount: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.99,
            min_epsilon: 0.05,
            soc_buckets: 10,
            goal_reward: 10.0,
            failure_penalty: 10.0,
            max_steps: None,
            time_limit_ms: None,
        }
    }
}

impl RlConfig {
    pub fn with_episodes(mut self, n: usize) -> Self {
        self.episodes = n;
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Sets the initial rate, the per-episode decay and the floor.
    pub fn with_epsilon(mut self, start: f64, decay: f64, min: f64) -> Self {
        self.epsilon = start;
        self.epsilon_decay = decay;
        self.min_epsilon = min;
        self
    }

    pub fn with_soc_buckets(mut self, n: usize) -> Self {
        self.soc_buckets = n;
        self
    }

    pub fn with_rewards(mut self, goal_reward: f64, failure_penalty: f64) -> Self {
        self.goal_reward = goal_reward;
        self.failure_penalty = failure_penalty;
        self
    }

    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = Some(n);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::invalid_configuration(msg));

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return invalid(format!("discount must be in [0, 1], got {}", self.discount));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return invalid(format!("epsilon must be in [0, 1], got {}", self.epsilon));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return invalid(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            ));
        }
        if !(0.0..=self.epsilon).contains(&self.min_epsilon) {
            return invalid(format!(
                "min_epsilon must be in [0, epsilon], got {}",
                self.min_epsilon
            ));
        }
        if self.soc_buckets == 0 {
            return invalid("soc_buckets must be at least 1".into());
        }
        if !(self.goal_reward.is_finite() && self.goal_reward >= 0.0) {
            return invalid("goal_reward must be finite and non-negative".into());
        }
        if !(self.failure_penalty.is_finite() && self.failure_penalty >= 0.0) {
            return invalid("failure_penalty must be finite and non-negative".into());
        }
        if self.max_steps == Some(0) {
            return invalid("max_steps must be positive or None".into());
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}
