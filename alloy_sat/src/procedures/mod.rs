//! The CDCL algorithm, factored into the procedures that compose [solve](solve::solve).

pub mod backjump;
pub mod bcp;
pub mod conflict;
pub mod decision;
pub mod solve;
