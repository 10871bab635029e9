//! Vehicle profile, scalarization weights and charge policy.
//!
//! All three are run inputs. They are validated once when the
//! [`CostModel`](super::CostModel) is built and never clamped.

use crate::error::{Error, Result};

/// Tolerance for the weights summing to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Static description of the vehicle.
///
/// # Examples
///
/// ```
/// use u_ecoroute::cost::VehicleProfile;
///
/// let profile = VehicleProfile::new(60.0, 0.18)
///     .with_charging_efficiency(0.92)
///     .with_reserve_fraction(0.1);
/// assert!(profile.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleProfile {
    /// Usable battery capacity.
    pub capacity_kwh: f64,

    /// Consumption used for segments without a forecast.
    pub consumption_kwh_per_km: f64,

    /// Fraction of charger energy that reaches the battery, in (0, 1].
    pub charging_efficiency: f64,

    /// Minimum safe charge as a fraction of capacity, in [0, 1).
    pub reserve_fraction: f64,

    /// Charge at departure as a fraction of capacity, in (0, 1].
    pub initial_charge_fraction: f64,
}

impl VehicleProfile {
    /// A profile with lossless charging, no reserve and a full battery at
    /// departure.
    pub fn new(capacity_kwh: f64, consumption_kwh_per_km: f64) -> Self {
        Self {
            capacity_kwh,
            consumption_kwh_per_km,
            charging_efficiency: 1.0,
            reserve_fraction: 0.0,
            initial_charge_fraction: 1.0,
        }
    }

    pub fn with_charging_efficiency(mut self, efficiency: f64) -> Self {
        self.charging_efficiency = efficiency;
        self
    }

    pub fn with_reserve_fraction(mut self, fraction: f64) -> Self {
        self.reserve_fraction = fraction;
        self
    }

    pub fn with_initial_charge_fraction(mut self, fraction: f64) -> Self {
        self.initial_charge_fraction = fraction;
        self
    }

    pub fn reserve_kwh(&self) -> f64 {
        self.capacity_kwh * self.reserve_fraction
    }

    pub fn initial_charge_kwh(&self) -> f64 {
        self.capacity_kwh * self.initial_charge_fraction
    }

    /// Validates the profile.
    pub fn validate(&self) -> Result<()> {
        if !self.capacity_kwh.is_finite() || self.capacity_kwh <= 0.0 {
            return Err(Error::invalid_configuration(format!(
                "capacity_kwh must be positive, got {}",
                self.capacity_kwh
            )));
        }
        if !self.consumption_kwh_per_km.is_finite() || self.consumption_kwh_per_km < 0.0 {
            return Err(Error::invalid_configuration(format!(
                "consumption_kwh_per_km must be non-negative, got {}",
                self.consumption_kwh_per_km
            )));
        }
        if !(self.charging_efficiency > 0.0 && self.charging_efficiency <= 1.0) {
            return Err(Error::invalid_configuration(format!(
                "charging_efficiency must be in (0, 1], got {}",
                self.charging_efficiency
            )));
        }
        if !(self.reserve_fraction >= 0.0 && self.reserve_fraction < 1.0) {
            return Err(Error::invalid_configuration(format!(
                "reserve_fraction must be in [0, 1), got {}",
                self.reserve_fraction
            )));
        }
        if !(self.initial_charge_fraction > 0.0 && self.initial_charge_fraction <= 1.0) {
            return Err(Error::invalid_configuration(format!(
                "initial_charge_fraction must be in (0, 1], got {}",
                self.initial_charge_fraction
            )));
        }
        if self.initial_charge_fraction < self.reserve_fraction {
            return Err(Error::invalid_configuration(
                "initial_charge_fraction must not be below reserve_fraction",
            ));
        }
        Ok(())
    }
}

/// Scalarization weights over the four objectives.
///
/// Weights must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostWeights {
    pub energy: f64,
    pub time: f64,
    pub charging_stops: f64,
    pub monetary: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self::balanced()
    }
}

impl CostWeights {
    /// Builds and validates a weight vector.
    pub fn new(energy: f64, time: f64, charging_stops: f64, monetary: f64) -> Result<Self> {
        let weights = Self {
            energy,
            time,
            charging_stops,
            monetary,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Equal weight on every objective.
    pub fn balanced() -> Self {
        Self {
            energy: 0.25,
            time: 0.25,
            charging_stops: 0.25,
            monetary: 0.25,
        }
    }

    /// Validates the weights.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("energy", self.energy),
            ("time", self.time),
            ("charging_stops", self.charging_stops),
            ("monetary", self.monetary),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::invalid_configuration(format!(
                    "weight `{name}` must be non-negative, got {w}"
                )));
            }
        }
        let sum: f64 = all.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::invalid_configuration(format!(
                "weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }
}

/// How much to recharge at a charging stop.
///
/// Shared by every optimizer through the cost model so their routes are
/// scored identically. The default charges to full with no dwell limit;
/// each stop adds one unit to the charging-stop objective regardless of
/// the amount recharged.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargePolicy {
    /// Charge level to reach, as a fraction of capacity, in (0, 1].
    pub target_fraction: f64,

    /// Longest allowed stop at a charger. `None` means unlimited.
    pub max_dwell_min: Option<f64>,
}

impl Default for ChargePolicy {
    fn default() -> Self {
        Self::full()
    }
}

impl ChargePolicy {
    /// Always charge to a full battery.
    pub fn full() -> Self {
        Self {
            target_fraction: 1.0,
            max_dwell_min: None,
        }
    }

    /// Top up to `fraction` of capacity.
    pub fn top_up(fraction: f64) -> Self {
        Self {
            target_fraction: fraction,
            max_dwell_min: None,
        }
    }

    pub fn with_max_dwell_min(mut self, minutes: f64) -> Self {
        self.max_dwell_min = Some(minutes);
        self
    }

    /// Validates the policy.
    pub fn validate(&self) -> Result<()> {
        if !(self.target_fraction > 0.0 && self.target_fraction <= 1.0) {
            return Err(Error::invalid_configuration(format!(
                "target_fraction must be in (0, 1], got {}",
                self.target_fraction
            )));
        }
        if let Some(dwell) = self.max_dwell_min {
            if !dwell.is_finite() || dwell <= 0.0 {
                return Err(Error::invalid_configuration(format!(
                    "max_dwell_min must be positive, got {dwell}"
                )));
            }
        }
        Ok(())
    }
}
