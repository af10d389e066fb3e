//! Validation Engine
//!
//! Advisory screening of assessment data. Flags never alter a numeric result;
//! callers decide whether a FAIL blocks their workflow.
//!
//! Checks:
//!   - statistical: coefficient of variation and per-sample Z-scores
//!   - sufficiency: absolute minimum sample count, then sampling density
//!   - biological: yields above regional maxima
//!   - GPS: duplicate sample locations, points outside the field

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ValidationThresholds;
use crate::geometry::{FieldBoundary, GeometryService};
use crate::methods::MethodResult;
use crate::utils::{haversine_m, round_to, summarize, z_score, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Statistical,
    Outlier,
    Sufficiency,
    Biological,
    Gps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagStatus {
    Pass,
    Warning,
    Fail,
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlagStatus::Pass => "PASS",
            FlagStatus::Warning => "WARNING",
            FlagStatus::Fail => "FAIL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFlag {
    pub check_type: CheckType,
    pub status: FlagStatus,
    pub message: String,
    /// 0-1
    pub confidence_score: f64,
}

impl ValidationFlag {
    fn new(check_type: CheckType, status: FlagStatus, message: String, confidence_score: f64) -> Self {
        Self {
            check_type,
            status,
            message,
            confidence_score,
        }
    }
}

/// Stateless checks parameterised by [`ValidationThresholds`]
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    thresholds: ValidationThresholds,
}

impl ValidationEngine {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ValidationThresholds {
        &self.thresholds
    }

    /// Statistical, sufficiency and biological checks for one method result
    pub fn validate(&self, result: &MethodResult, sample_count: usize, field_area_ha: f64) -> Vec<ValidationFlag> {
        let mut flags = self.validate_statistical_consistency(&result.breakdown_values());
        flags.extend(self.validate_sample_sufficiency(field_area_ha, sample_count));
        flags.extend(self.validate_biological_plausibility(result));
        flags
    }

    /// CV and Z-score screening over `(sample_number, value)` pairs
    ///
    /// Skipped below the minimum sample count or when the mean is zero.
    pub fn validate_statistical_consistency(&self, values: &[(u32, f64)]) -> Vec<ValidationFlag> {
        let t = &self.thresholds;
        let mut flags = Vec::new();
        if values.len() < t.min_samples {
            return flags;
        }

        let raw: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        let Some(summary) = summarize(&raw) else {
            return flags;
        };
        let Some(cv) = summary.cv else {
            return flags;
        };

        if cv < t.uniform_cv && values.len() > t.uniform_min_samples {
            flags.push(ValidationFlag::new(
                CheckType::Statistical,
                FlagStatus::Warning,
                format!(
                    "Data is suspiciously uniform (CV < {:.0}%). Potential manufactured data.",
                    t.uniform_cv * 100.0
                ),
                0.75,
            ));
        }

        if cv > t.high_cv {
            flags.push(ValidationFlag::new(
                CheckType::Statistical,
                FlagStatus::Warning,
                format!("High variance detected (CV {:.0}%). Verify sampling technique and damaged patches.", cv * 100.0),
                0.60,
            ));
        }

        for (sample_number, value) in values {
            if let Some(z) = z_score(*value, &summary) {
                if z > t.outlier_z {
                    flags.push(ValidationFlag::new(
                        CheckType::Outlier,
                        FlagStatus::Fail,
                        format!(
                            "Sample #{} is a statistical outlier (Z={}). Value: {}",
                            sample_number,
                            round_to(z, 1),
                            value
                        ),
                        0.90,
                    ));
                }
            }
        }

        flags
    }

    /// Absolute minimum, then density against field area
    pub fn validate_sample_sufficiency(&self, field_area_ha: f64, num_samples: usize) -> Vec<ValidationFlag> {
        let t = &self.thresholds;

        if num_samples < t.min_samples {
            return vec![ValidationFlag::new(
                CheckType::Sufficiency,
                FlagStatus::Fail,
                format!("Insufficient samples ({}). Minimum required is {}.", num_samples, t.min_samples),
                1.0,
            )];
        }

        let mut flags = Vec::new();
        if field_area_ha > 0.0 {
            let density = num_samples as f64 / field_area_ha;
            if density < t.min_samples_per_ha {
                let recommended = (field_area_ha * t.min_samples_per_ha).ceil() as usize;
                flags.push(ValidationFlag::new(
                    CheckType::Sufficiency,
                    FlagStatus::Warning,
                    format!(
                        "Sampling density low ({} for {} ha). Recommended: {} points.",
                        num_samples, field_area_ha, recommended
                    ),
                    0.90,
                ));
            }
        }
        flags
    }

    /// Yields above regional maxima
    pub fn validate_biological_plausibility(&self, result: &MethodResult) -> Vec<ValidationFlag> {
        let t = &self.thresholds;
        let mut flags = Vec::new();

        let (value, limit, unit) = match result {
            MethodResult::WeightMethod(r) => (r.avg_yield_kg_ha, t.max_grain_yield_kg_ha, "kg/ha"),
            MethodResult::MaturityLine(r) => (r.projected_yield_kg_ha, t.max_grain_yield_kg_ha, "kg/ha"),
            MethodResult::Tonnage(r) => (r.tonnes_per_ha, t.max_silage_t_ha, "t/ha"),
            _ => return flags,
        };

        if value > limit {
            flags.push(ValidationFlag::new(
                CheckType::Biological,
                FlagStatus::Warning,
                format!(
                    "Calculated yield ({} {}) exceeds regional biological maximum ({} {}).",
                    value, unit, limit, unit
                ),
                0.95,
            ));
        }
        flags
    }

    /// Duplicate sample locations and points outside the field
    pub fn validate_gps_consistency(
        &self,
        geometry: &dyn GeometryService,
        locations: &[(u32, GeoPoint)],
        boundary: Option<&FieldBoundary>,
    ) -> Vec<ValidationFlag> {
        let mut flags = Vec::new();

        for (i, (a_number, a)) in locations.iter().enumerate() {
            for (b_number, b) in &locations[i + 1..] {
                let distance = haversine_m(*a, *b);
                if distance < self.thresholds.gps_duplicate_m {
                    flags.push(ValidationFlag::new(
                        CheckType::Gps,
                        FlagStatus::Warning,
                        format!(
                            "Samples #{} and #{} are {:.2} m apart. Possible duplicate location.",
                            a_number, b_number, distance
                        ),
                        0.80,
                    ));
                }
            }
        }

        if let Some(boundary) = boundary {
            for (number, point) in locations {
                if !geometry.contains_shrunk(boundary, 0.0, *point) {
                    flags.push(ValidationFlag::new(
                        CheckType::Gps,
                        FlagStatus::Fail,
                        format!("Sample #{} lies outside the field boundary.", number),
                        0.95,
                    ));
                }
            }
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::square_field;
    use crate::geometry::PlanarGeometry;
    use crate::methods::{TonnageResult, WeightResult, QualityGrade};
    use crate::utils::LocalProjection;

    fn numbered(values: &[f64]) -> Vec<(u32, f64)> {
        values.iter().enumerate().map(|(i, v)| (i as u32 + 1, *v)).collect()
    }

    #[test]
    fn test_uniform_data_warns() {
        let engine = ValidationEngine::default();
        let flags = engine.validate_statistical_consistency(&numbered(&[80.0; 6]));
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].status, FlagStatus::Warning);
        assert!(flags[0].message.contains("suspiciously uniform"));
        assert_eq!(flags[0].confidence_score, 0.75);

        // Five samples is not enough to call uniformity
        assert!(engine.validate_statistical_consistency(&numbered(&[80.0; 5])).is_empty());
    }

    #[test]
    fn test_outlier_names_the_sample() {
        let engine = ValidationEngine::default();
        let mut values = vec![100.0; 10];
        values[6] = 300.0;
        let flags = engine.validate_statistical_consistency(&numbered(&values));

        let outliers: Vec<_> = flags.iter().filter(|f| f.check_type == CheckType::Outlier).collect();
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].status, FlagStatus::Fail);
        assert!(outliers[0].message.starts_with("Sample #7 "), "{}", outliers[0].message);
        // CV 0.5 also trips the high-variance warning
        assert!(flags.iter().any(|f| f.message.contains("High variance")));
    }

    #[test]
    fn test_too_few_samples_skip_statistics() {
        let engine = ValidationEngine::default();
        assert!(engine.validate_statistical_consistency(&numbered(&[1.0, 100.0])).is_empty());
        assert!(engine.validate_statistical_consistency(&numbered(&[0.0, 0.0, 0.0])).is_empty());
    }

    #[test]
    fn test_sufficiency() {
        let engine = ValidationEngine::default();

        let fail = engine.validate_sample_sufficiency(10.0, 2);
        assert_eq!(fail.len(), 1);
        assert_eq!(fail[0].status, FlagStatus::Fail);
        assert_eq!(fail[0].confidence_score, 1.0);

        // 4 samples over 20 ha = 0.2/ha
        let sparse = engine.validate_sample_sufficiency(20.0, 4);
        assert_eq!(sparse[0].status, FlagStatus::Warning);
        assert!(sparse[0].message.contains("Recommended: 10 points"));

        assert!(engine.validate_sample_sufficiency(10.0, 5).is_empty());
    }

    #[test]
    fn test_biological_limits() {
        let engine = ValidationEngine::default();
        let grain = MethodResult::WeightMethod(WeightResult {
            avg_yield_kg_ha: 19_500.0,
            shelling_factor: 0.8,
            moisture_factor: 1.0,
            test_weight_factor: 1.0,
            sample_details: vec![],
        });
        let flags = engine.validate_biological_plausibility(&grain);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].check_type, CheckType::Biological);

        let silage = MethodResult::Tonnage(TonnageResult {
            tonnes_per_ha: 45.0,
            moisture_adjusted_tonnes: 45.0,
            moisture_factor: 1.0,
            quality_grade: QualityGrade::Excellent,
            quality_multiplier: 1.0,
            recommended_for_silage: true,
            tonnage_confidence: 0.85,
            sample_details: vec![],
        });
        assert!(engine.validate_biological_plausibility(&silage).is_empty());
    }

    #[test]
    fn test_gps_duplicates_and_outside_points() {
        let engine = ValidationEngine::default();
        let field = square_field(100.0);
        let projection = LocalProjection::new(GeoPoint::new(-17.83, 31.05));

        let locations = vec![
            (1, projection.to_geo(20.0, 20.0)),
            (2, projection.to_geo(20.3, 20.0)),
            (3, projection.to_geo(70.0, 60.0)),
            (4, projection.to_geo(140.0, 60.0)),
        ];
        let flags = engine.validate_gps_consistency(&PlanarGeometry, &locations, Some(&field));

        let duplicates: Vec<_> = flags.iter().filter(|f| f.status == FlagStatus::Warning).collect();
        assert_eq!(duplicates.len(), 1);
        assert!(duplicates[0].message.starts_with("Samples #1 and #2"));

        let outside: Vec<_> = flags.iter().filter(|f| f.status == FlagStatus::Fail).collect();
        assert_eq!(outside.len(), 1);
        assert!(outside[0].message.starts_with("Sample #4 "));
    }
}
