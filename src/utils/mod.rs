//! Shared numeric utilities
//!
//! - Interpolation: chart resolver (exact match or linear interpolation)
//! - Stats: mean / variance / CV / Z-score for sample screening
//! - Geo: haversine distance and local projection

pub mod interpolation;
pub mod stats;
pub mod geo;

// Re-export commonly used types
pub use interpolation::{InterpolationResolver, round_to};
pub use stats::{Summary, summarize, z_score};
pub use geo::{GeoPoint, LocalProjection, haversine_m};
