//! Run requests and reports.

use std::fmt;
use std::time::Duration;

use crate::aco::AcoConfig;
use crate::cost::RouteOutcome;
use crate::csp::CspConfig;
use crate::error::Result;
use crate::ga::GaConfig;
use crate::rl::RlConfig;
use crate::sa::SaConfig;

/// The routing strategies the planner can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Exact label-setting constrained shortest path.
    Csp,
    /// Genetic Algorithm.
    Ga,
    /// Ant-Colony Optimization.
    Aco,
    /// Simulated Annealing.
    Sa,
    /// Tabular Q-learning agent.
    Rl,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Csp,
        Algorithm::Ga,
        Algorithm::Aco,
        Algorithm::Sa,
        Algorithm::Rl,
    ];

    /// Whether the strategy is guaranteed to return the cheapest route.
    pub fn is_exact(self) -> bool {
        matches!(self, Algorithm::Csp)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Csp => "csp",
            Algorithm::Ga => "ga",
            Algorithm::Aco => "aco",
            Algorithm::Sa => "sa",
            Algorithm::Rl => "rl",
        };
        f.write_str(name)
    }
}

/// A strategy together with its parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmConfig {
    Csp(CspConfig),
    Ga(GaConfig),
    Aco(AcoConfig),
    Sa(SaConfig),
    Rl(RlConfig),
}

impl AlgorithmConfig {
    /// Default parameters for `algorithm`.
    pub fn defaults(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Csp => AlgorithmConfig::Csp(CspConfig::default()),
            Algorithm::Ga => AlgorithmConfig::Ga(GaConfig::default()),
            Algorithm::Aco => AlgorithmConfig::Aco(AcoConfig::default()),
            Algorithm::Sa => AlgorithmConfig::Sa(SaConfig::default()),
            Algorithm::Rl => AlgorithmConfig::Rl(RlConfig::default()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            AlgorithmConfig::Csp(_) => Algorithm::Csp,
            AlgorithmConfig::Ga(_) => Algorithm::Ga,
            AlgorithmConfig::Aco(_) => Algorithm::Aco,
            AlgorithmConfig::Sa(_) => Algorithm::Sa,
            AlgorithmConfig::Rl(_) => Algorithm::Rl,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            AlgorithmConfig::Csp(c) => c.validate(),
            AlgorithmConfig::Ga(c) => c.validate(),
            AlgorithmConfig::Aco(c) => c.validate(),
            AlgorithmConfig::Sa(c) => c.validate(),
            AlgorithmConfig::Rl(c) => c.validate(),
        }
    }
}

impl From<CspConfig> for AlgorithmConfig {
    fn from(config: CspConfig) -> Self {
        AlgorithmConfig::Csp(config)
    }
}

impl From<GaConfig> for AlgorithmConfig {
    fn from(config: GaConfig) -> Self {
        AlgorithmConfig::Ga(config)
    }
}

impl From<AcoConfig> for AlgorithmConfig {
    fn from(config: AcoConfig) -> Self {
        AlgorithmConfig::Aco(config)
    }
}

impl From<SaConfig> for AlgorithmConfig {
    fn from(config: SaConfig) -> Self {
        AlgorithmConfig::Sa(config)
    }
}

impl From<RlConfig> for AlgorithmConfig {
    fn from(config: RlConfig) -> Self {
        AlgorithmConfig::Rl(config)
    }
}

/// One routing query: endpoints by station id, strategy and seed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunRequest {
    pub start: String,
    pub goal: String,
    pub algorithm: AlgorithmConfig,
    /// Seed of the run's random source. Ignored by the exact solver.
    pub seed: u64,
}

impl RunRequest {
    /// A request with seed 0.
    pub fn new(
        start: impl Into<String>,
        goal: impl Into<String>,
        algorithm: impl Into<AlgorithmConfig>,
    ) -> Self {
        Self {
            start: start.into(),
            goal: goal.into(),
            algorithm: algorithm.into(),
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// What one run produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    pub algorithm: Algorithm,
    pub outcome: RouteOutcome,
    /// Label expansions, generations, iterations, moves or training
    /// episodes, depending on the strategy.
    pub iterations: usize,
    pub elapsed: Duration,
}
