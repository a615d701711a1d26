//! Statistics for the signaling layer

pub mod metrics;

pub use metrics::SignalingStats;
