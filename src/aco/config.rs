//! ACO configuration.

use crate::error::{Error, Result};

/// Configuration for the Ant-Colony route optimizer.
///
/// # Examples
///
/// ```
/// use u_ecoroute::aco::AcoConfig;
///
/// let config = AcoConfig::default()
///     .with_ant_count(30)
///     .with_iterations(50)
///     .with_evaporation_rate(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcoConfig {
    /// Ants constructing a route per iteration.
    pub ant_count: usize,

    /// Iteration budget. 0 runs no ant at all.
    pub iterations: usize,

    /// Pheromone exponent.
    pub alpha: f64,

    /// Heuristic (inverse step cost) exponent.
    pub beta: f64,

    /// Fraction of pheromone lost per iteration, in (0, 1].
    pub evaporation_rate: f64,

    /// Pheromone laid on the iteration-best route is `deposit / cost`.
    pub deposit: f64,

    /// Multiplier for the extra deposit on the best route so far.
    /// 0 disables the elitist reinforcement.
    pub elitist_weight: f64,

    pub initial_pheromone: f64,
    pub min_pheromone: f64,
    pub max_pheromone: f64,

    /// Build the ants of one iteration in parallel (requires `parallel` feature).
    pub parallel: bool,

    /// Optional wall-clock time limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            ant_count: 20,
            iterations: 100,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.1,
            deposit: 1.0,
            elitist_weight: 1.0,
            initial_pheromone: 1.0,
            min_pheromone: 0.01,
            max_pheromone: 10.0,
            parallel: true,
            time_limit_ms: None,
        }
    }
}

impl AcoConfig {
    pub fn with_ant_count(mut self, n: usize) -> Self {
        self.ant_count = n;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_evaporation_rate(mut self, rate: f64) -> Self {
        self.evaporation_rate = rate;
        self
    }

    pub fn with_deposit(mut self, deposit: f64) -> Self {
        self.deposit = deposit;
        self
    }

    pub fn with_elitist_weight(mut self, weight: f64) -> Self {
        self.elitist_weight = weight;
        self
    }

    /// Sets the initial level and the clamping bounds together.
    pub fn with_pheromone_bounds(mut self, initial: f64, min: f64, max: f64) -> Self {
        self.initial_pheromone = initial;
        self.min_pheromone = min;
        self.max_pheromone = max;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::invalid_configuration(msg));

        if self.ant_count == 0 {
            return invalid("ant_count must be at least 1".into());
        }
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return invalid(format!("alpha must be non-negative, got {}", self.alpha));
        }
        if !(self.beta >= 0.0 && self.beta.is_finite()) {
            return invalid(format!("beta must be non-negative, got {}", self.beta));
        }
        if !(self.evaporation_rate > 0.0 && self.evaporation_rate <= 1.0) {
            return invalid(format!(
                "evaporation_rate must be in (0, 1], got {}",
                self.evaporation_rate
            ));
        }
        if !(self.deposit > 0.0 && self.deposit.is_finite()) {
            return invalid(format!("deposit must be positive, got {}", self.deposit));
        }
        if !(self.elitist_weight >= 0.0 && self.elitist_weight.is_finite()) {
            return invalid(format!(
                "elitist_weight must be non-negative, got {}",
                self.elitist_weight
            ));
        }
        if !(self.min_pheromone > 0.0) {
            return invalid("min_pheromone must be positive".into());
        }
        if !(self.max_pheromone.is_finite() && self.max_pheromone >= self.min_pheromone) {
            return invalid("max_pheromone must be finite and >= min_pheromone".into());
        }
        if !(self.min_pheromone..=self.max_pheromone).contains(&self.initial_pheromone) {
            return invalid(format!(
                "initial_pheromone {} outside [{}, {}]",
                self.initial_pheromone, self.min_pheromone, self.max_pheromone
            ));
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AcoConfig::default();
        assert_eq!(config.ant_count, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_is_valid() {
        assert!(AcoConfig::default().with_iterations(0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AcoConfig::default().with_ant_count(0).validate().is_err());
        assert!(AcoConfig::default()
            .with_evaporation_rate(0.0)
            .validate()
            .is_err());
        assert!(AcoConfig::default()
            .with_evaporation_rate(1.5)
            .validate()
            .is_err());
        assert!(AcoConfig::default().with_beta(-1.0).validate().is_err());
        assert!(AcoConfig::default().with_deposit(0.0).validate().is_err());
    }

    #[test]
    fn test_validate_pheromone_bounds() {
        assert!(AcoConfig::default()
            .with_pheromone_bounds(1.0, 2.0, 5.0)
            .validate()
            .is_err());
        assert!(AcoConfig::default()
            .with_pheromone_bounds(1.0, 0.0, 5.0)
            .validate()
            .is_err());
        assert!(AcoConfig::default()
            .with_pheromone_bounds(0.5, 0.1, 0.5)
            .validate()
            .is_ok());
    }
}
