//! Calculation methods for loss assessment
//!
//! Each method lives in its own module and is a pure function of its typed
//! samples, its parameters and chart lookups. Chart lookups that fall outside
//! the tabulated domain are absorbed at the call site with the fallback the
//! module documents; a calculator always returns a best-effort result.

pub mod stand_reduction;
pub mod hail_damage;
pub mod weight;
pub mod maturity_line;
pub mod tonnage;
pub mod replanting;
pub mod stage_modification;

// Re-export calculator functions
pub use stand_reduction::{calculate_stand_reduction, StandReductionParams, StandReductionResult};
pub use hail_damage::{calculate_hail_damage, DamageBreakdown, HailDamageParams, HailDamageResult};
pub use weight::{calculate_weight_method, WeightParams, WeightResult};
pub use maturity_line::{calculate_maturity_line, development_factor, MaturityLineParams, MaturityLineResult};
pub use tonnage::{calculate_tonnage, QualityGrade, TonnageParams, TonnageResult};
pub use replanting::{calculate_replanting, ReplantDecision, ReplantingInput, ReplantingParams, ReplantingResult};
pub use stage_modification::{calculate_stage_modification, StageModificationResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sample-based assessment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentMethod {
    StandReduction,
    HailDamage,
    WeightMethod,
    MaturityLine,
    Tonnage,
}

impl AssessmentMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            AssessmentMethod::StandReduction => "STAND_REDUCTION",
            AssessmentMethod::HailDamage => "HAIL_DAMAGE",
            AssessmentMethod::WeightMethod => "WEIGHT_METHOD",
            AssessmentMethod::MaturityLine => "MATURITY_LINE",
            AssessmentMethod::Tonnage => "TONNAGE",
        }
    }

    pub fn all() -> [AssessmentMethod; 5] {
        [
            AssessmentMethod::StandReduction,
            AssessmentMethod::HailDamage,
            AssessmentMethod::WeightMethod,
            AssessmentMethod::MaturityLine,
            AssessmentMethod::Tonnage,
        ]
    }

    /// Methods whose result is a loss percentage (not a yield projection)
    pub fn reports_loss(&self) -> bool {
        matches!(self, AssessmentMethod::StandReduction | AssessmentMethod::HailDamage)
    }
}

impl fmt::Display for AssessmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of any sample-based method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodResult {
    StandReduction(StandReductionResult),
    HailDamage(HailDamageResult),
    WeightMethod(WeightResult),
    MaturityLine(MaturityLineResult),
    Tonnage(TonnageResult),
}

impl MethodResult {
    pub fn method(&self) -> AssessmentMethod {
        match self {
            MethodResult::StandReduction(_) => AssessmentMethod::StandReduction,
            MethodResult::HailDamage(_) => AssessmentMethod::HailDamage,
            MethodResult::WeightMethod(_) => AssessmentMethod::WeightMethod,
            MethodResult::MaturityLine(_) => AssessmentMethod::MaturityLine,
            MethodResult::Tonnage(_) => AssessmentMethod::Tonnage,
        }
    }

    /// Loss percentage; 0 for yield-projection methods
    pub fn loss_percentage(&self) -> f64 {
        match self {
            MethodResult::StandReduction(r) => r.loss_percentage,
            MethodResult::HailDamage(r) => r.loss_percentage,
            _ => 0.0,
        }
    }

    /// `100 − loss` for loss methods
    pub fn average_potential_yield_pct(&self) -> Option<f64> {
        match self {
            MethodResult::StandReduction(r) => Some(r.average_potential_yield_pct),
            MethodResult::HailDamage(r) => Some(r.average_potential_yield_pct),
            _ => None,
        }
    }

    /// kg/ha for grain methods, t/ha for tonnage
    pub fn yield_per_area(&self) -> Option<f64> {
        match self {
            MethodResult::WeightMethod(r) => Some(r.avg_yield_kg_ha),
            MethodResult::MaturityLine(r) => Some(r.projected_yield_kg_ha),
            MethodResult::Tonnage(r) => Some(r.tonnes_per_ha),
            _ => None,
        }
    }

    pub fn sample_count(&self) -> usize {
        match self {
            MethodResult::StandReduction(r) => r.sample_details.len(),
            MethodResult::HailDamage(r) => r.sample_details.len(),
            MethodResult::WeightMethod(r) => r.sample_details.len(),
            MethodResult::MaturityLine(r) => r.sample_details.len(),
            MethodResult::Tonnage(r) => r.sample_details.len(),
        }
    }

    /// `(sample_number, value)` of the field screened for consistency
    ///
    /// - stand reduction: potential yield %
    /// - hail: total sample loss
    /// - weight: adjusted yield
    /// - maturity line: projected yield
    /// - tonnage: adjusted tonnes
    pub fn breakdown_values(&self) -> Vec<(u32, f64)> {
        match self {
            MethodResult::StandReduction(r) => r
                .sample_details
                .iter()
                .map(|d| (d.sample_number, d.percent_potential_yield))
                .collect(),
            MethodResult::HailDamage(r) => r
                .sample_details
                .iter()
                .map(|d| (d.sample_number, d.total_sample_loss))
                .collect(),
            MethodResult::WeightMethod(r) => r
                .sample_details
                .iter()
                .map(|d| (d.sample_number, d.yield_kg_ha_adj))
                .collect(),
            MethodResult::MaturityLine(r) => r
                .sample_details
                .iter()
                .map(|d| (d.sample_number, d.projected_yield_kg_ha))
                .collect(),
            MethodResult::Tonnage(r) => r
                .sample_details
                .iter()
                .map(|d| (d.sample_number, d.tonnes_per_ha_adj))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ChartStore;
    use crate::samples::TonnageSample;
    use crate::utils::InterpolationResolver;

    #[test]
    fn test_method_result_accessors() {
        let store = ChartStore::with_reference_charts();
        let resolver = InterpolationResolver::new(&store);
        let samples = [
            TonnageSample { sample_number: 4, fresh_weight_kg: 30.0, sample_area_m2: 10.0 },
            TonnageSample { sample_number: 7, fresh_weight_kg: 20.0, sample_area_m2: 10.0 },
        ];
        let params = TonnageParams {
            quality_grade: Some(QualityGrade::Excellent),
            ..TonnageParams::new(65.0)
        };
        let result = MethodResult::Tonnage(calculate_tonnage(&resolver, &samples, &params));

        assert_eq!(result.method(), AssessmentMethod::Tonnage);
        assert_eq!(result.loss_percentage(), 0.0);
        assert_eq!(result.yield_per_area(), Some(25.0));
        assert!(result.average_potential_yield_pct().is_none());
        assert_eq!(result.breakdown_values(), vec![(4, 30.0), (7, 20.0)]);
    }

    #[test]
    fn test_method_result_serializes_with_tag() {
        let result = MethodResult::WeightMethod(WeightResult {
            avg_yield_kg_ha: 0.0,
            shelling_factor: 0.8,
            moisture_factor: 1.0,
            test_weight_factor: 1.0,
            sample_details: vec![],
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "WEIGHT_METHOD");
        assert_eq!(AssessmentMethod::WeightMethod.to_string(), "WEIGHT_METHOD");
    }
}
