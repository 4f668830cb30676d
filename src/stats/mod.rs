//! Statistical core - pure, deterministic numerical computations
//!
//! Nothing in this module touches the filesystem or terminal; every
//! function is a pure mapping from validated inputs to results, so
//! criteria can be evaluated independently and in parallel.

pub mod attribute;
pub mod descriptive;
pub mod special;
pub mod tolerance;

pub use attribute::AttributeResult;
pub use descriptive::FiveNumberSummary;
pub use tolerance::{DegeneracyPolicy, Sidedness, SpecLimits, VariableResult};
