//! SA configuration and cooling schedules.

use crate::error::{Error, Result};

/// Cooling schedule for temperature reduction.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    ///
    /// Typical `alpha`: 0.9–0.99.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Linear cooling from the initial to the minimum temperature over
    /// `max_iterations / iterations_per_temperature` steps.
    Linear,

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// One iteration per temperature step. Cools fast at high T,
    /// slow at low T.
    LundyMees {
        /// Cooling parameter, typically `(T_0 - T_min) / (max_iter * T_0 * T_min)`.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.95 }
    }
}

/// Configuration for route Simulated Annealing.
///
/// Temperatures are in units of the scalar route cost. A feasible route
/// usually costs a few units (each segment contributes at most the sum of
/// the edge weights), so the default starting temperature of 1.0 accepts
/// most small detours early on.
///
/// # Examples
///
/// ```
/// use u_ecoroute::sa::{SaConfig, CoolingSchedule};
///
/// let config = SaConfig::default()
///     .with_initial_temperature(2.0)
///     .with_min_temperature(0.001)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.98 })
///     .with_iterations_per_temperature(80);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaConfig {
    /// Initial temperature. Higher values allow more exploration.
    pub initial_temperature: f64,

    /// The run stops once the temperature drops to this value.
    pub min_temperature: f64,

    pub cooling: CoolingSchedule,

    /// Moves tried at each temperature level.
    ///
    /// Ignored by `LundyMees` (one move per level).
    pub iterations_per_temperature: usize,

    /// Hard budget on moves tried. 0 = no limit.
    pub max_iterations: usize,

    /// Greediness of the initial walk and of detour moves (0.0–1.0).
    pub rcl_alpha: f64,

    /// Walk attempts for the initial route.
    pub init_attempts: usize,

    /// Optional wall-clock time limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1.0,
            min_temperature: 1e-3,
            cooling: CoolingSchedule::default(),
            iterations_per_temperature: 50,
            max_iterations: 20_000,
            rcl_alpha: 0.5,
            init_attempts: 20,
            time_limit_ms: None,
        }
    }
}

impl SaConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
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

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::invalid_configuration(msg));

        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return invalid("initial_temperature must be positive".into());
        }
        if !(self.min_temperature > 0.0) {
            return invalid("min_temperature must be positive".into());
        }
        if self.min_temperature >= self.initial_temperature {
            return invalid("min_temperature must be less than initial_temperature".into());
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return invalid(format!("geometric alpha must be in (0, 1), got {alpha}"));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !(beta > 0.0) {
                    return invalid(format!("lundy-mees beta must be positive, got {beta}"));
                }
            }
            CoolingSchedule::Linear => {}
        }
        if self.iterations_per_temperature == 0 {
            return invalid("iterations_per_temperature must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.rcl_alpha) {
            return invalid(format!("rcl_alpha must be in [0, 1], got {}", self.rcl_alpha));
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
