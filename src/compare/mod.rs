//! Cross-optimizer comparison.
//!
//! [`aggregate`] turns a batch of [`RunReport`](crate::engine::RunReport)s
//! into a [`ComparisonTable`]: one [`RunMetrics`] row per run in input
//! order, the cheapest run, and each run's cost gap to it. Aggregation is
//! pure, so the same reports always give the same table.

mod metrics;
mod table;

pub use metrics::RunMetrics;
pub use table::{aggregate, ComparisonRow, ComparisonTable};
