//! Station/segment graph model.
//!
//! The graph is the shared, read-only substrate of every optimizer. It is
//! built once from the station and segment tables and never mutated during
//! search.

mod network;
mod types;

pub use network::Graph;
pub use types::{Segment, SegmentIdx, SegmentRecord, Station, StationIdx, StationRecord};
