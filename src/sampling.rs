//! Spatial Sampler
//!
//! Generates random sample points inside a field by rejection sampling:
//! uniform candidates are drawn from the bounding box and accepted only if
//! they lie inside the boundary shrunk by the edge buffer and keep the minimum
//! spacing from every accepted point. The attempt budget is fixed up front,
//! so generation always terminates; running out is an `InsufficientPoints`
//! error, never a short plan.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::SamplingDefaults;
use crate::error::{EngineError, EngineResult};
use crate::geometry::{FieldBoundary, GeometryService};
use crate::utils::{haversine_m, round_to, GeoPoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPoint {
    pub sample_number: u32,
    pub lat: f64,
    pub lng: f64,
    pub distance_from_edge_meters: f64,
    pub sampling_notes: String,
}

impl SamplingPoint {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Rejection sampler over a [`GeometryService`]
pub struct SpatialSampler<'a, R: Rng = StdRng> {
    geometry: &'a dyn GeometryService,
    rng: R,
}

impl<'a> SpatialSampler<'a, StdRng> {
    pub fn from_entropy(geometry: &'a dyn GeometryService) -> Self {
        Self::new(geometry, StdRng::from_entropy())
    }

    /// Reproducible plans for a given seed
    pub fn seeded(geometry: &'a dyn GeometryService, seed: u64) -> Self {
        Self::new(geometry, StdRng::seed_from_u64(seed))
    }
}

impl<'a, R: Rng> SpatialSampler<'a, R> {
    pub fn new(geometry: &'a dyn GeometryService, rng: R) -> Self {
        Self { geometry, rng }
    }

    /// Generate exactly `min_samples` points or fail
    ///
    /// Candidates are rounded to 7 decimals (~1 cm) before the constraint
    /// checks, so returned coordinates satisfy them as stored.
    pub fn generate(
        &mut self,
        boundary: &FieldBoundary,
        min_samples: usize,
        edge_buffer_m: f64,
        min_distance_m: f64,
        max_attempts: usize,
    ) -> EngineResult<Vec<SamplingPoint>> {
        self.geometry.is_valid(boundary).map_err(EngineError::InvalidBoundary)?;
        let (sw, ne) = boundary
            .bounds()
            .ok_or_else(|| EngineError::InvalidBoundary("boundary has no vertices".to_string()))?;

        let mut points: Vec<SamplingPoint> = Vec::with_capacity(min_samples.min(max_attempts));
        let mut attempts = 0;

        while points.len() < min_samples && attempts < max_attempts {
            attempts += 1;

            let candidate = GeoPoint::new(
                round_to(self.rng.gen_range(sw.lat..=ne.lat), 7),
                round_to(self.rng.gen_range(sw.lng..=ne.lng), 7),
            );

            if !self.geometry.contains_shrunk(boundary, edge_buffer_m, candidate) {
                continue;
            }
            if points.iter().any(|p| haversine_m(p.location(), candidate) < min_distance_m) {
                continue;
            }

            let edge_distance = self.geometry.distance_to_boundary(boundary, candidate);
            let sample_number = points.len() as u32 + 1;
            points.push(SamplingPoint {
                sample_number,
                lat: candidate.lat,
                lng: candidate.lng,
                distance_from_edge_meters: round_to(edge_distance, 1),
                sampling_notes: format!("Random point {} of {}", sample_number, min_samples),
            });
        }

        if points.len() < min_samples {
            tracing::warn!(
                "Sampling exhausted {} attempts with {} of {} points",
                attempts, points.len(), min_samples
            );
            return Err(EngineError::InsufficientPoints {
                generated: points.len(),
                required: min_samples,
                attempts,
            });
        }

        tracing::debug!("Generated {} sampling points in {} attempts", points.len(), attempts);
        Ok(points)
    }
}

/// Placement attempts allowed for a plan; saturates for huge sample counts
pub fn attempt_budget(min_samples: usize, attempts_per_sample: usize) -> usize {
    min_samples.saturating_mul(attempts_per_sample)
}

/// Generate a sampling plan with the standard attempt budget
///
/// Budget: `min_samples × 100` attempts.
pub fn generate_sampling_plan(
    geometry: &dyn GeometryService,
    boundary: &FieldBoundary,
    min_samples: usize,
    edge_buffer_m: f64,
    min_distance_m: f64,
) -> EngineResult<Vec<SamplingPoint>> {
    let max_attempts = attempt_budget(min_samples, SamplingDefaults::default().attempts_per_sample);
    SpatialSampler::from_entropy(geometry).generate(
        boundary,
        min_samples,
        edge_buffer_m,
        min_distance_m,
        max_attempts,
    )
}
