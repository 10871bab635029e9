//! Station and segment types.
//!
//! Input rows ([`StationRecord`], [`SegmentRecord`]) reference stations by
//! their external string id. After [`Graph::build`](super::Graph::build)
//! the graph stores [`Station`] and [`Segment`] values keyed by dense
//! indices.

/// Dense index of a station inside a [`Graph`](super::Graph).
pub type StationIdx = usize;

/// Dense index of a segment inside a [`Graph`](super::Graph).
pub type SegmentIdx = usize;

/// One row of the station table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationRecord {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Charger rating in kW. Zero for stations without a charger.
    pub charging_power_kw: f64,
    pub price_per_kwh: f64,
    pub available: bool,
}

impl StationRecord {
    /// Creates a station without charging capability at the given position.
    pub fn waypoint(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            charging_power_kw: 0.0,
            price_per_kwh: 0.0,
            available: false,
        }
    }

    /// Creates an available charging station.
    pub fn charger(
        id: impl Into<String>,
        lat: f64,
        lon: f64,
        charging_power_kw: f64,
        price_per_kwh: f64,
    ) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            charging_power_kw,
            price_per_kwh,
            available: true,
        }
    }
}

/// One row of the segment table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentRecord {
    pub from_id: String,
    pub to_id: String,
    pub distance_km: f64,
    /// Forecast consumption for this segment.
    ///
    /// `None` falls back to the vehicle's baseline consumption per km.
    pub predicted_energy_kwh: Option<f64>,
    pub travel_time_min: f64,
    pub monetary_cost: f64,
}

impl SegmentRecord {
    /// Creates a segment with no forecast energy, travel time or toll.
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, distance_km: f64) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            distance_km,
            predicted_energy_kwh: None,
            travel_time_min: 0.0,
            monetary_cost: 0.0,
        }
    }

    pub fn with_energy(mut self, kwh: f64) -> Self {
        self.predicted_energy_kwh = Some(kwh);
        self
    }

    pub fn with_travel_time(mut self, minutes: f64) -> Self {
        self.travel_time_min = minutes;
        self
    }

    pub fn with_monetary_cost(mut self, cost: f64) -> Self {
        self.monetary_cost = cost;
        self
    }
}

/// A validated station.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Station {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub charging_power_kw: f64,
    pub price_per_kwh: f64,
    pub available: bool,
}

impl Station {
    /// Whether a vehicle can recharge here.
    pub fn supports_charging(&self) -> bool {
        self.available && self.charging_power_kw > 0.0
    }
}

/// A validated directed segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub from: StationIdx,
    pub to: StationIdx,
    pub distance_km: f64,
    pub predicted_energy_kwh: Option<f64>,
    pub travel_time_min: f64,
    pub monetary_cost: f64,
}
