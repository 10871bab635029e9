//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.

use super::selection::Selection;
use crate::error::{Error, Result};

/// Configuration for the route Genetic Algorithm.
///
/// # Defaults
///
/// ```
/// use u_ecoroute::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 60);
/// assert_eq!(config.max_generations, 200);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_ecoroute::ga::{GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(120)
///     .with_selection(Selection::Tournament(5))
///     .with_elite_ratio(0.1)
///     .with_mutation_rate(0.3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    /// Number of routes in the population.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Fraction of the population copied unchanged into the next
    /// generation (0.0–1.0).
    pub elite_ratio: f64,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    ///
    /// When crossover is not applied, a clone of the first parent is used.
    pub crossover_rate: f64,

    /// Probability of applying mutation to an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Generations without significant improvement before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// Minimum relative improvement `|old - new| / |old|` that resets the
    /// stagnation counter. 0.0 counts any improvement.
    pub convergence_threshold: f64,

    /// Whether to evaluate offspring in parallel.
    ///
    /// Has no effect without the `parallel` feature.
    pub parallel: bool,

    /// Greediness of the walks that seed the population and drive detour
    /// mutations: 0.0 always takes the best-scored hop, 1.0 picks any
    /// safe hop uniformly.
    pub rcl_alpha: f64,

    /// Walk attempts per initial individual before giving up on it.
    pub init_attempts: usize,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked at the start of each generation, so the run may overshoot
    /// by one generation's worth of work.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 60,
            max_generations: 200,
            selection: Selection::default(),
            elite_ratio: 0.1,
            crossover_rate: 0.9,
            mutation_rate: 0.2,
            stagnation_limit: 40,
            convergence_threshold: 0.0,
            parallel: true,
            rcl_alpha: 0.3,
            init_attempts: 10,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Convenience for `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_rcl_alpha(mut self, alpha: f64) -> Self {
        self.rcl_alpha = alpha;
        self
    }

    pub fn with_init_attempts(mut self, attempts: usize) -> Self {
        self.init_attempts = attempts;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Small population and few generations, for interactive queries.
    ///
    /// - Population: 30, Generations: 60, Time limit: 2s
    /// - Stagnation limit: 15, Convergence threshold: 0.001
    pub fn fast() -> Self {
        Self {
            population_size: 30,
            max_generations: 60,
            stagnation_limit: 15,
            convergence_threshold: 0.001,
            time_limit_ms: Some(2_000),
            ..Self::default()
        }
    }

    /// - Population: 60, Generations: 200, Time limit: 10s
    /// - Stagnation limit: 40, Convergence threshold: 0.001
    pub fn balanced() -> Self {
        Self {
            population_size: 60,
            max_generations: 200,
            stagnation_limit: 40,
            convergence_threshold: 0.001,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Large population and many generations for offline planning.
    ///
    /// - Population: 150, Generations: 500, Time limit: 60s
    /// - Stagnation limit: 80, Convergence threshold: 0.0005
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            max_generations: 500,
            stagnation_limit: 80,
            convergence_threshold: 0.0005,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Picks a preset from the network size.
    ///
    /// - `station_count < 200` → [`fast()`](Self::fast)
    /// - `200 ≤ station_count < 2000` → [`balanced()`](Self::balanced)
    /// - `station_count ≥ 2000` → [`quality()`](Self::quality)
    pub fn auto_select(station_count: usize) -> Self {
        if station_count < 200 {
            Self::fast()
        } else if station_count < 2_000 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::invalid_configuration(msg));

        if self.population_size < 2 {
            return invalid("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return invalid("max_generations must be at least 1".into());
        }
        for (name, value) in [
            ("elite_ratio", self.elite_ratio),
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
            ("rcl_alpha", self.rcl_alpha),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        let elite_count = (self.population_size as f64 * self.elite_ratio) as usize;
        if elite_count >= self.population_size {
            return invalid("elite_ratio too high: elites fill entire population".into());
        }
        if let Selection::Tournament(0) = self.selection {
            return invalid("tournament size must be at least 1".into());
        }
        if !(self.convergence_threshold >= 0.0) {
            return invalid("convergence_threshold must be non-negative".into());
        }
        if self.init_attempts == 0 {
            return invalid("init_attempts must be at least 1".into());
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
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.selection, Selection::Tournament(3));
        assert!((config.elite_ratio - 0.1).abs() < 1e-10);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert_eq!(config.stagnation_limit, 40);
        assert!(config.parallel);
        assert!(config.time_limit_ms.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_selection(Selection::Rank)
            .with_elite_ratio(0.2)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.05)
            .with_stagnation_limit(100)
            .with_rcl_alpha(0.5)
            .with_parallel(false);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.selection, Selection::Rank);
        assert!((config.elite_ratio - 0.2).abs() < 1e-10);
        assert!((config.mutation_rate - 0.05).abs() < 1e-10);
        assert!((config.rcl_alpha - 0.5).abs() < 1e-10);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [GaConfig::fast(), GaConfig::balanced(), GaConfig::quality()] {
            assert!(config.validate().is_ok(), "{config:?}");
            assert!(config.time_limit_ms.is_some());
        }
        assert!(GaConfig::fast().population_size < GaConfig::quality().population_size);
    }

    #[test]
    fn test_auto_select() {
        assert_eq!(GaConfig::auto_select(50), GaConfig::fast());
        assert_eq!(GaConfig::auto_select(500), GaConfig::balanced());
        assert_eq!(GaConfig::auto_select(5_000), GaConfig::quality());
    }

    #[test]
    fn test_validation_errors() {
        assert!(GaConfig::default().with_population_size(1).validate().is_err());
        assert!(GaConfig::default().with_max_generations(0).validate().is_err());
        assert!(GaConfig::default().with_elite_ratio(1.0).validate().is_err());
        assert!(GaConfig::default().with_mutation_rate(1.5).validate().is_err());
        assert!(GaConfig::default().with_tournament_size(0).validate().is_err());
        assert!(GaConfig::default().with_init_attempts(0).validate().is_err());
        assert!(GaConfig::default().with_time_limit_ms(0).validate().is_err());
    }
}
