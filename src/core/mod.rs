//! Core module - fundamental types and utilities

pub mod entity;
pub mod error;
pub mod identity;

pub use entity::Entity;
pub use error::AnalysisError;
pub use identity::{EntityId, EntityPrefix, IdParseError};
