//! A thin data carrier mirroring the statistics surface (§6); populated
//! straight from [`alloy_sat::reports::Statistics`] after a solve. No
//! rendering lives here -- that's a host-application concern.

pub use alloy_sat::reports::Statistics;
