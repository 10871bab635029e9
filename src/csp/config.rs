//! CSP solver configuration.

use crate::error::{Error, Result};

/// Configuration for the [`CspSolver`](super::CspSolver).
///
/// # Examples
///
/// ```
/// use u_ecoroute::csp::CspConfig;
///
/// let config = CspConfig::default()
///     .with_bucket_kwh(0.5)
///     .with_max_expansions(50_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CspConfig {
    /// Width of one charge bucket in kWh.
    ///
    /// Two labels at the same station whose charge falls in the same bucket
    /// belong to the same search state and are compared for dominance on
    /// (cost, charge). Wider buckets compare more labels with each other;
    /// the optimum does not depend on the width.
    pub bucket_kwh: f64,

    /// Maximum number of labels settled before giving up.
    pub max_expansions: usize,

    /// Optional wall-clock time limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            bucket_kwh: 1.0,
            max_expansions: 1_000_000,
            time_limit_ms: None,
        }
    }
}

impl CspConfig {
    pub fn with_bucket_kwh(mut self, kwh: f64) -> Self {
        self.bucket_kwh = kwh;
        self
    }

    pub fn with_max_expansions(mut self, n: usize) -> Self {
        self.max_expansions = n;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bucket_kwh.is_finite() && self.bucket_kwh > 0.0) {
            return Err(Error::invalid_configuration(format!(
                "bucket_kwh must be positive, got {}",
                self.bucket_kwh
            )));
        }
        if self.max_expansions == 0 {
            return Err(Error::invalid_configuration(
                "max_expansions must be at least 1",
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err(Error::invalid_configuration(
                "time_limit_ms must be positive or None",
            ));
        }
        Ok(())
    }
}
