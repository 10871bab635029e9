//! Immutable station/segment graph.

use std::collections::{HashMap, HashSet};

use super::types::{Segment, SegmentIdx, SegmentRecord, Station, StationIdx, StationRecord};
use crate::error::{Error, Result};

/// Station/segment graph indexed for O(1) neighbor lookup.
///
/// Built once by [`Graph::build`] and never mutated afterwards, so a single
/// instance can be shared by any number of concurrent searches.
#[derive(Debug, Clone)]
pub struct Graph {
    stations: Vec<Station>,
    segments: Vec<Segment>,
    ids: HashMap<String, StationIdx>,
    outgoing: Vec<Vec<SegmentIdx>>,
    incoming: Vec<Vec<SegmentIdx>>,
}

impl Graph {
    /// Validates the input tables and builds the adjacency index in O(S+E).
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidGraph`](crate::error::ErrorKind::InvalidGraph) on
    /// a duplicate or empty station id, a segment referencing an unknown
    /// station, a self loop, a second segment between the same ordered pair
    /// of stations, or a negative / non-finite attribute.
    pub fn build(stations: &[StationRecord], segments: &[SegmentRecord]) -> Result<Self> {
        let mut ids = HashMap::with_capacity(stations.len());
        let mut validated = Vec::with_capacity(stations.len());

        for (idx, record) in stations.iter().enumerate() {
            validate_station(record)?;
            if ids.insert(record.id.clone(), idx).is_some() {
                return Err(Error::invalid_graph(format!(
                    "duplicate station id `{}`",
                    record.id
                )));
            }
            validated.push(Station {
                id: record.id.clone(),
                lat: record.lat,
                lon: record.lon,
                charging_power_kw: record.charging_power_kw,
                price_per_kwh: record.price_per_kwh,
                available: record.available,
            });
        }

        let mut outgoing = vec![Vec::new(); validated.len()];
        let mut incoming = vec![Vec::new(); validated.len()];
        let mut edges = Vec::with_capacity(segments.len());
        let mut pairs = HashSet::with_capacity(segments.len());

        for record in segments {
            let from = lookup(&ids, &record.from_id, record)?;
            let to = lookup(&ids, &record.to_id, record)?;
            if from == to {
                return Err(Error::invalid_graph(format!(
                    "segment {} -> {} is a self loop",
                    record.from_id, record.to_id
                )));
            }
            validate_segment(record)?;
            // Routes are station sequences, so a hop must name one segment.
            if !pairs.insert((from, to)) {
                return Err(Error::invalid_graph(format!(
                    "parallel segment {} -> {}",
                    record.from_id, record.to_id
                )));
            }

            let idx = edges.len();
            outgoing[from].push(idx);
            incoming[to].push(idx);
            edges.push(Segment {
                from,
                to,
                distance_km: record.distance_km,
                predicted_energy_kwh: record.predicted_energy_kwh,
                travel_time_min: record.travel_time_min,
                monetary_cost: record.monetary_cost,
            });
        }

        tracing::debug!(
            stations = validated.len(),
            segments = edges.len(),
            "built station graph"
        );

        Ok(Self {
            stations: validated,
            segments: edges,
            ids,
            outgoing,
            incoming,
        })
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn station(&self, idx: StationIdx) -> &Station {
        &self.stations[idx]
    }

    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn segment(&self, idx: SegmentIdx) -> &Segment {
        &self.segments[idx]
    }

    /// Resolves an external station id.
    pub fn index_of(&self, id: &str) -> Option<StationIdx> {
        self.ids.get(id).copied()
    }

    /// Resolves an external station id or fails with `UnknownStation`.
    pub fn require(&self, id: &str) -> Result<StationIdx> {
        self.index_of(id)
            .ok_or_else(|| Error::unknown_station(format!("no station with id `{id}`")))
    }

    /// Outgoing `(segment, destination)` pairs of `station`, in input order.
    pub fn neighbors(
        &self,
        station: StationIdx,
    ) -> impl Iterator<Item = (SegmentIdx, StationIdx)> + '_ {
        self.outgoing[station]
            .iter()
            .map(move |&seg| (seg, self.segments[seg].to))
    }

    /// Outgoing segment indices of `station`.
    pub fn outgoing(&self, station: StationIdx) -> &[SegmentIdx] {
        &self.outgoing[station]
    }

    /// Incoming segment indices of `station`.
    pub fn reverse_adjacency(&self, station: StationIdx) -> &[SegmentIdx] {
        &self.incoming[station]
    }

    /// Incoming `(segment, origin)` pairs of `station`.
    pub fn predecessors(
        &self,
        station: StationIdx,
    ) -> impl Iterator<Item = (SegmentIdx, StationIdx)> + '_ {
        self.reverse_adjacency(station)
            .iter()
            .map(move |&seg| (seg, self.segments[seg].from))
    }

    /// The segment from `from` to `to`, if any.
    pub fn segment_between(&self, from: StationIdx, to: StationIdx) -> Option<SegmentIdx> {
        self.outgoing[from]
            .iter()
            .copied()
            .find(|&seg| self.segments[seg].to == to)
    }
}

fn lookup(ids: &HashMap<String, StationIdx>, id: &str, record: &SegmentRecord) -> Result<StationIdx> {
    ids.get(id).copied().ok_or_else(|| {
        Error::invalid_graph(format!(
            "segment {} -> {} references unknown station `{id}`",
            record.from_id, record.to_id
        ))
    })
}

fn validate_station(record: &StationRecord) -> Result<()> {
    if record.id.is_empty() {
        return Err(Error::invalid_graph("station id must not be empty"));
    }
    if !record.lat.is_finite() || !record.lon.is_finite() {
        return Err(Error::invalid_graph(format!(
            "station `{}` has a non-finite position",
            record.id
        )));
    }
    for (name, value) in [
        ("charging_power_kw", record.charging_power_kw),
        ("price_per_kwh", record.price_per_kwh),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::invalid_graph(format!(
                "station `{}` has invalid {name} {value}",
                record.id
            )));
        }
    }
    Ok(())
}

fn validate_segment(record: &SegmentRecord) -> Result<()> {
    let energy = record.predicted_energy_kwh.unwrap_or(0.0);
    for (name, value) in [
        ("distance_km", record.distance_km),
        ("predicted_energy_kwh", energy),
        ("travel_time_min", record.travel_time_min),
        ("monetary_cost", record.monetary_cost),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::invalid_graph(format!(
                "segment {} -> {} has invalid {name} {value}",
                record.from_id, record.to_id
            )));
        }
    }
    Ok(())
}
