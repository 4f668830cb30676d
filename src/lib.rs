//! VRT: Verity Reliability Toolkit
//!
//! Sample accounting and confidence/reliability analysis for design
//! verification test data: attribute (pass/fail) reliability bounds,
//! variable-data normal tolerance intervals, and acceptance-criteria
//! evaluation.

pub mod cli;
pub mod core;
pub mod entities;
pub mod stats;
