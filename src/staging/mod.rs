//! Upload block staging.
//!
//! - [`BufferAggregator`] - One fixed-capacity block with a drain cursor
//! - [`BufferStagingArea`] - Repartitions input buffers into blocks

mod aggregator;
mod area;

pub use aggregator::BufferAggregator;
pub use area::BufferStagingArea;
