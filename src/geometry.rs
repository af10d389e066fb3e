//! Field Geometry
//!
//! Polygon operations the sampler and validators depend on, behind the
//! [`GeometryService`] trait. [`PlanarGeometry`] is the bundled implementation:
//! it projects a field onto a local equirectangular plane (metres) and works
//! there. Fields are small enough that the projection error is negligible.
//!
//! Boundaries are rings of WGS84 vertices; a closing vertex equal to the first
//! is accepted and ignored.

use serde::{Deserialize, Serialize};

use crate::config::SamplingDefaults;
use crate::error::{EngineError, EngineResult};
use crate::utils::{GeoPoint, LocalProjection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoundary {
    pub vertices: Vec<GeoPoint>,
}

impl FieldBoundary {
    pub fn new(vertices: Vec<GeoPoint>) -> Self {
        Self { vertices }
    }

    /// From GeoJSON-ordered `[lng, lat]` pairs
    pub fn from_lng_lat(coordinates: &[[f64; 2]]) -> Self {
        Self {
            vertices: coordinates.iter().map(|[lng, lat]| GeoPoint::new(*lat, *lng)).collect(),
        }
    }

    /// Vertices without the closing duplicate
    pub fn ring(&self) -> &[GeoPoint] {
        match self.vertices.as_slice() {
            [first, .., last] if first == last => &self.vertices[..self.vertices.len() - 1],
            all => all,
        }
    }

    /// (south-west, north-east) corners
    pub fn bounds(&self) -> Option<(GeoPoint, GeoPoint)> {
        let ring = self.ring();
        if ring.is_empty() {
            return None;
        }
        let mut min = ring[0];
        let mut max = ring[0];
        for p in &ring[1..] {
            min.lat = min.lat.min(p.lat);
            min.lng = min.lng.min(p.lng);
            max.lat = max.lat.max(p.lat);
            max.lng = max.lng.max(p.lng);
        }
        Some((min, max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldMetrics {
    pub area_ha: f64,
    pub center_lat: f64,
    pub center_lng: f64,
}

/// Polygon capability consumed by the sampler and validators
pub trait GeometryService: Send + Sync {
    fn area_and_centroid(&self, boundary: &FieldBoundary) -> EngineResult<FieldMetrics>;

    /// `Err(reason)` for a degenerate or self-intersecting ring
    fn is_valid(&self, boundary: &FieldBoundary) -> Result<(), String>;

    /// Inside the boundary shrunk inward by `buffer_m`
    fn contains_shrunk(&self, boundary: &FieldBoundary, buffer_m: f64, point: GeoPoint) -> bool;

    /// Metres from `point` to the nearest boundary edge
    fn distance_to_boundary(&self, boundary: &FieldBoundary, point: GeoPoint) -> f64;
}

/// Local-plane polygon geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarGeometry;

type Xy = (f64, f64);

impl PlanarGeometry {
    fn project(boundary: &FieldBoundary) -> Option<(LocalProjection, Vec<Xy>)> {
        let (min, max) = boundary.bounds()?;
        let origin = GeoPoint::new((min.lat + max.lat) / 2.0, (min.lng + max.lng) / 2.0);
        let projection = LocalProjection::new(origin);
        let ring = boundary.ring().iter().map(|p| projection.to_xy(*p)).collect();
        Some((projection, ring))
    }

    fn edges(ring: &[Xy]) -> impl Iterator<Item = (Xy, Xy)> + '_ {
        (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
    }

    /// Signed shoelace area (m²), positive for counter-clockwise rings
    fn signed_area(ring: &[Xy]) -> f64 {
        Self::edges(ring).map(|((x1, y1), (x2, y2))| x1 * y2 - x2 * y1).sum::<f64>() / 2.0
    }

    /// Even-odd ray casting
    fn point_in_ring(ring: &[Xy], (px, py): Xy) -> bool {
        let mut inside = false;
        for ((x1, y1), (x2, y2)) in Self::edges(ring) {
            if (y1 > py) != (y2 > py) {
                let x_cross = x1 + (py - y1) * (x2 - x1) / (y2 - y1);
                if px < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn segment_distance((px, py): Xy, (x1, y1): Xy, (x2, y2): Xy) -> f64 {
        let (dx, dy) = (x2 - x1, y2 - y1);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((px - x1) * dx + (py - y1) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (cx, cy) = (x1 + t * dx, y1 + t * dy);
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }

    fn ring_distance(ring: &[Xy], point: Xy) -> f64 {
        Self::edges(ring)
            .map(|(a, b)| Self::segment_distance(point, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    fn orientation(a: Xy, b: Xy, c: Xy) -> f64 {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    }

    fn segments_cross(a1: Xy, a2: Xy, b1: Xy, b2: Xy) -> bool {
        let d1 = Self::orientation(b1, b2, a1);
        let d2 = Self::orientation(b1, b2, a2);
        let d3 = Self::orientation(a1, a2, b1);
        let d4 = Self::orientation(a1, a2, b2);
        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }

    fn self_intersects(ring: &[Xy]) -> bool {
        let n = ring.len();
        for i in 0..n {
            for j in (i + 2)..n {
                // First and last edges share a vertex
                if i == 0 && j == n - 1 {
                    continue;
                }
                if Self::segments_cross(ring[i], ring[(i + 1) % n], ring[j], ring[(j + 1) % n]) {
                    return true;
                }
            }
        }
        false
    }
}

impl GeometryService for PlanarGeometry {
    fn area_and_centroid(&self, boundary: &FieldBoundary) -> EngineResult<FieldMetrics> {
        let (projection, ring) = Self::project(boundary)
            .ok_or_else(|| EngineError::InvalidBoundary("boundary has no vertices".to_string()))?;

        let signed = Self::signed_area(&ring);
        let (cx, cy) = if signed.abs() > f64::EPSILON {
            let (sx, sy) = Self::edges(&ring).fold((0.0, 0.0), |(sx, sy), ((x1, y1), (x2, y2))| {
                let cross = x1 * y2 - x2 * y1;
                (sx + (x1 + x2) * cross, sy + (y1 + y2) * cross)
            });
            (sx / (6.0 * signed), sy / (6.0 * signed))
        } else {
            let n = ring.len() as f64;
            (
                ring.iter().map(|p| p.0).sum::<f64>() / n,
                ring.iter().map(|p| p.1).sum::<f64>() / n,
            )
        };

        let center = projection.to_geo(cx, cy);
        Ok(FieldMetrics {
            area_ha: signed.abs() / 10_000.0,
            center_lat: center.lat,
            center_lng: center.lng,
        })
    }

    fn is_valid(&self, boundary: &FieldBoundary) -> Result<(), String> {
        let ring = boundary.ring();
        if ring.len() < 3 {
            return Err(format!("boundary needs at least 3 vertices, got {}", ring.len()));
        }
        if let Some(bad) = ring.iter().find(|p| !p.is_valid()) {
            return Err(format!("coordinate out of range: ({}, {})", bad.lat, bad.lng));
        }

        let mut distinct: Vec<GeoPoint> = Vec::with_capacity(ring.len());
        for p in ring {
            if !distinct.contains(p) {
                distinct.push(*p);
            }
        }
        if distinct.len() < 3 {
            return Err("boundary needs at least 3 distinct vertices".to_string());
        }

        let (_, xy) = Self::project(boundary).ok_or_else(|| "boundary has no vertices".to_string())?;
        if Self::self_intersects(&xy) {
            return Err("boundary edges self-intersect".to_string());
        }
        if Self::signed_area(&xy).abs() <= f64::EPSILON {
            return Err("boundary has zero area (collinear vertices)".to_string());
        }
        Ok(())
    }

    fn contains_shrunk(&self, boundary: &FieldBoundary, buffer_m: f64, point: GeoPoint) -> bool {
        let Some((projection, ring)) = Self::project(boundary) else {
            return false;
        };
        let xy = projection.to_xy(point);
        Self::point_in_ring(&ring, xy) && Self::ring_distance(&ring, xy) >= buffer_m.max(0.0)
    }

    fn distance_to_boundary(&self, boundary: &FieldBoundary, point: GeoPoint) -> f64 {
        match Self::project(boundary) {
            Some((projection, ring)) => Self::ring_distance(&ring, projection.to_xy(point)),
            None => 0.0,
        }
    }
}

/// Area and centre of a valid boundary
pub fn field_metrics(geometry: &dyn GeometryService, boundary: &FieldBoundary) -> EngineResult<FieldMetrics> {
    geometry.is_valid(boundary).map_err(EngineError::InvalidBoundary)?;
    geometry.area_and_centroid(boundary)
}

/// Validate a field boundary for sampling
///
/// Checks:
/// 1. Geometric validity (vertex count, coordinate ranges, no self-intersection)
/// 2. Area within the configured field size limits
pub fn validate_field_boundary(
    geometry: &dyn GeometryService,
    boundary: &FieldBoundary,
    limits: &SamplingDefaults,
) -> EngineResult<FieldMetrics> {
    let metrics = field_metrics(geometry, boundary)?;

    if metrics.area_ha < limits.min_field_area_ha {
        return Err(EngineError::InvalidBoundary(format!(
            "field area {:.4} ha is below the minimum of {} ha",
            metrics.area_ha, limits.min_field_area_ha
        )));
    }
    if metrics.area_ha > limits.max_field_area_ha {
        return Err(EngineError::InvalidBoundary(format!(
            "field area {:.1} ha exceeds the maximum of {} ha",
            metrics.area_ha, limits.max_field_area_ha
        )));
    }

    Ok(metrics)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Square of `side_m` metres anchored at a Zimbabwean latitude
    pub(crate) fn square_field(side_m: f64) -> FieldBoundary {
        let projection = LocalProjection::new(GeoPoint::new(-17.83, 31.05));
        let corners = [(0.0, 0.0), (side_m, 0.0), (side_m, side_m), (0.0, side_m), (0.0, 0.0)];
        FieldBoundary::new(corners.iter().map(|(x, y)| projection.to_geo(*x, *y)).collect())
    }

    #[test]
    fn test_square_area_and_centroid() {
        let field = square_field(100.0);
        let metrics = PlanarGeometry.area_and_centroid(&field).unwrap();
        assert_relative_eq!(metrics.area_ha, 1.0, epsilon = 1e-3);

        let corner = field.vertices[0];
        let centre = GeoPoint::new(metrics.center_lat, metrics.center_lng);
        assert_relative_eq!(crate::utils::haversine_m(corner, centre), 70.71, epsilon = 0.1);
    }

    #[test]
    fn test_contains_and_edge_distance() {
        let field = square_field(100.0);
        let metrics = PlanarGeometry.area_and_centroid(&field).unwrap();
        let centre = GeoPoint::new(metrics.center_lat, metrics.center_lng);

        assert_relative_eq!(PlanarGeometry.distance_to_boundary(&field, centre), 50.0, epsilon = 0.01);
        assert!(PlanarGeometry.contains_shrunk(&field, 5.0, centre));
        assert!(!PlanarGeometry.contains_shrunk(&field, 60.0, centre));

        // Just inside the south edge, but within the buffer
        let projection = LocalProjection::new(GeoPoint::new(-17.83, 31.05));
        let near_edge = projection.to_geo(50.0, 2.0);
        assert!(PlanarGeometry.contains_shrunk(&field, 0.0, near_edge));
        assert!(!PlanarGeometry.contains_shrunk(&field, 5.0, near_edge));

        let outside = projection.to_geo(150.0, 50.0);
        assert!(!PlanarGeometry.contains_shrunk(&field, 0.0, outside));
    }

    #[test]
    fn test_invalid_boundaries() {
        let two = FieldBoundary::from_lng_lat(&[[31.0, -17.8], [31.001, -17.8]]);
        assert!(PlanarGeometry.is_valid(&two).is_err());

        let collinear = FieldBoundary::from_lng_lat(&[[31.0, -17.8], [31.001, -17.8], [31.002, -17.8]]);
        assert!(PlanarGeometry.is_valid(&collinear).unwrap_err().contains("zero area"));

        // Bow-tie
        let bowtie = FieldBoundary::from_lng_lat(&[
            [31.0, -17.8],
            [31.001, -17.801],
            [31.001, -17.8],
            [31.0, -17.801],
        ]);
        assert!(PlanarGeometry.is_valid(&bowtie).unwrap_err().contains("self-intersect"));

        let out_of_range = FieldBoundary::from_lng_lat(&[[31.0, -95.0], [31.001, -17.8], [31.0, -17.801]]);
        assert!(PlanarGeometry.is_valid(&out_of_range).is_err());
    }

    #[test]
    fn test_validate_field_boundary_area_limits() {
        let limits = SamplingDefaults::default();
        assert!(validate_field_boundary(&PlanarGeometry, &square_field(100.0), &limits).is_ok());

        // 5 m × 5 m = 0.0025 ha
        let tiny = validate_field_boundary(&PlanarGeometry, &square_field(5.0), &limits);
        assert!(matches!(tiny, Err(EngineError::InvalidBoundary(_))));
    }
}
