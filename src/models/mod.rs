//! Data models for the sounding pipeline
//!
//! - Location: named geographic coordinates
//! - Sounding: vertical profile at one location and valid time
//! - Model: the numerical weather prediction model a sounding comes from

pub mod location;
pub mod sounding;

// Re-export all public types for convenient access
pub use location::Location;
pub use sounding::{Level, Model, Sounding};
