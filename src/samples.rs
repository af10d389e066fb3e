//! Sample Records
//!
//! Field measurements arrive as a generic [`AssessmentSampleInput`] (named
//! counts, weights, damages and measurements). Each calculation method takes
//! its own typed record; [`MethodSamples`] is the tagged union the orchestrator
//! produces after choosing a method.
//!
//! Recognised generic keys are listed in [`keys`]. Unknown keys are ignored.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::utils::GeoPoint;

/// Sample defaults shared by the typed records and [`crate::config::CalculatorDefaults`]
pub mod defaults {
    pub const ROW_LENGTH_M: f64 = 10.0;
    pub const ROW_WIDTH_M: f64 = 0.9;
    pub const ORIGINAL_STAND_COUNT: u32 = 40;
    pub const SAMPLE_AREA_M2: f64 = 10.0;
}

/// Names read from the generic sample maps
pub mod keys {
    // counts
    pub const SURVIVING_PLANTS: &str = "surviving_plants";
    pub const ORIGINAL_STAND: &str = "original_stand";
    pub const DESTROYED: &str = "destroyed";

    // weights (kg)
    pub const EAR_WEIGHT: &str = "ear_weight";
    pub const FRESH_WEIGHT: &str = "fresh_weight";

    // damages (percent)
    pub const DEFOLIATION: &str = "defoliation";
    pub const GROWING_POINT: &str = "growing_point";
    pub const EAR_DAMAGE: &str = "ear";
    pub const OTHER_DIRECT: &str = "other";
    pub const FOREIGN_MATERIAL: &str = "foreign_material";
    pub const DAMAGED_KERNELS: &str = "damaged_kernels";
    pub const BROKEN_KERNELS: &str = "broken_kernels";
    pub const HEAT_DAMAGE: &str = "heat_damage";

    // measurements
    pub const ROW_LENGTH_M: &str = "row_length_m";
    pub const ROW_WIDTH_M: &str = "row_width_m";
    pub const SAMPLE_AREA_M2: &str = "sample_area_m2";
    pub const MATURITY_LINE: &str = "maturity_line_position";

    // observations
    pub const STALK_DAMAGE: &str = "stalk_damage";
}

/// Method-agnostic field sample as captured by an assessor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSampleInput {
    pub sample_number: u32,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub counts: FxHashMap<String, u32>,
    #[serde(default)]
    pub weights: FxHashMap<String, f64>,
    #[serde(default)]
    pub damages: FxHashMap<String, f64>,
    #[serde(default)]
    pub measurements: FxHashMap<String, f64>,
    #[serde(default)]
    pub observations: FxHashMap<String, String>,
}

impl AssessmentSampleInput {
    pub fn new(sample_number: u32) -> Self {
        Self {
            sample_number,
            ..Default::default()
        }
    }

    pub fn with_count(mut self, key: &str, value: u32) -> Self {
        self.counts.insert(key.to_string(), value);
        self
    }

    pub fn with_weight(mut self, key: &str, kg: f64) -> Self {
        self.weights.insert(key.to_string(), kg);
        self
    }

    pub fn with_damage(mut self, key: &str, pct: f64) -> Self {
        self.damages.insert(key.to_string(), pct);
        self
    }

    pub fn with_measurement(mut self, key: &str, value: f64) -> Self {
        self.measurements.insert(key.to_string(), value);
        self
    }

    pub fn with_observation(mut self, key: &str, value: &str) -> Self {
        self.observations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(GeoPoint::new(lat, lng));
        self
    }

    pub fn count(&self, key: &str) -> Option<u32> {
        self.counts.get(key).copied()
    }

    pub fn weight(&self, key: &str) -> Option<f64> {
        self.weights.get(key).copied()
    }

    pub fn damage(&self, key: &str) -> Option<f64> {
        self.damages.get(key).copied()
    }

    pub fn measurement(&self, key: &str) -> Option<f64> {
        self.measurements.get(key).copied()
    }

    pub fn observation(&self, key: &str) -> Option<&str> {
        self.observations.get(key).map(String::as_str)
    }
}

fn default_row_length() -> f64 {
    defaults::ROW_LENGTH_M
}

fn default_row_width() -> f64 {
    defaults::ROW_WIDTH_M
}

fn default_original_stand() -> u32 {
    defaults::ORIGINAL_STAND_COUNT
}

fn default_sample_area() -> f64 {
    defaults::SAMPLE_AREA_M2
}

/// Surviving plants along a measured row section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandReductionSample {
    pub sample_number: u32,
    pub surviving_plants: u32,
    #[serde(default = "default_row_length")]
    pub row_length_m: f64,
    #[serde(default = "default_row_width")]
    pub row_width_m: f64,
}

/// Stalk damage as observed in the field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalkDamage {
    #[default]
    None,
    Light,
    Moderate,
    Severe,
}

impl StalkDamage {
    /// Direct yield loss attributed to each severity bucket
    pub fn loss_pct(&self) -> f64 {
        match self {
            StalkDamage::None => 0.0,
            StalkDamage::Light => 10.0,
            StalkDamage::Moderate => 35.0,
            StalkDamage::Severe => 75.0,
        }
    }

    /// Lenient parse; anything unrecognised counts as no damage
    pub fn from_observation(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => StalkDamage::Light,
            "moderate" => StalkDamage::Moderate,
            "severe" => StalkDamage::Severe,
            _ => StalkDamage::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailDamageSample {
    pub sample_number: u32,
    #[serde(default = "default_original_stand")]
    pub original_stand_count: u32,
    #[serde(default)]
    pub destroyed_plants: u32,
    #[serde(default)]
    pub percent_defoliation: f64,
    #[serde(default)]
    pub stalk_damage: StalkDamage,
    #[serde(default)]
    pub growing_point_damage_pct: f64,
    #[serde(default)]
    pub ear_damage_pct: f64,
    /// Crippled plants and any other directly observed loss
    #[serde(default)]
    pub other_direct_damage_pct: f64,
}

/// Harvested ear corn from a sample area, with grading deductions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub sample_number: u32,
    pub ear_weight_kg: f64,
    #[serde(default = "default_sample_area")]
    pub sample_area_m2: f64,
    #[serde(default)]
    pub foreign_material_pct: f64,
    #[serde(default)]
    pub damaged_kernel_pct: f64,
    #[serde(default)]
    pub broken_kernel_pct: f64,
    #[serde(default)]
    pub heat_damage_pct: f64,
}

impl WeightSample {
    /// `1 - sum(deductions) / 100`, never negative
    pub fn quality_multiplier(&self) -> f64 {
        let deduction = self.foreign_material_pct
            + self.damaged_kernel_pct
            + self.broken_kernel_pct
            + self.heat_damage_pct;
        (1.0 - deduction / 100.0).max(0.0)
    }
}

/// Immature ear weight with the observed milk-line position (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaturityLineSample {
    pub sample_number: u32,
    pub current_weight_kg: f64,
    #[serde(default = "default_sample_area")]
    pub sample_area_m2: f64,
    #[serde(default)]
    pub maturity_line_position: Option<f64>,
}

/// Whole-plant fresh weight cut from a sample area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonnageSample {
    pub sample_number: u32,
    pub fresh_weight_kg: f64,
    #[serde(default = "default_sample_area")]
    pub sample_area_m2: f64,
}

/// Typed samples for one calculation method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "samples", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodSamples {
    StandReduction(Vec<StandReductionSample>),
    HailDamage(Vec<HailDamageSample>),
    WeightMethod(Vec<WeightSample>),
    MaturityLine(Vec<MaturityLineSample>),
    Tonnage(Vec<TonnageSample>),
}

impl MethodSamples {
    pub fn len(&self) -> usize {
        match self {
            MethodSamples::StandReduction(s) => s.len(),
            MethodSamples::HailDamage(s) => s.len(),
            MethodSamples::WeightMethod(s) => s.len(),
            MethodSamples::MaturityLine(s) => s.len(),
            MethodSamples::Tonnage(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_sample_defaults() {
        let sample: StandReductionSample =
            serde_json::from_str(r#"{"sample_number": 1, "surviving_plants": 36}"#).unwrap();
        assert_eq!(sample.row_length_m, 10.0);
        assert_eq!(sample.row_width_m, 0.9);

        let hail: HailDamageSample =
            serde_json::from_str(r#"{"sample_number": 2, "stalk_damage": "moderate"}"#).unwrap();
        assert_eq!(hail.original_stand_count, 40);
        assert_eq!(hail.stalk_damage, StalkDamage::Moderate);
        assert_eq!(hail.percent_defoliation, 0.0);
    }

    #[test]
    fn test_tagged_method_samples() {
        let json = r#"{"method": "TONNAGE", "samples": [{"sample_number": 1, "fresh_weight_kg": 30.0}]}"#;
        let samples: MethodSamples = serde_json::from_str(json).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(serde_json::from_str::<MethodSamples>(r#"{"method": "GUESS", "samples": []}"#).is_err());
    }

    #[test]
    fn test_quality_multiplier_floor() {
        let sample = WeightSample {
            sample_number: 1,
            ear_weight_kg: 5.0,
            sample_area_m2: 10.0,
            foreign_material_pct: 60.0,
            damaged_kernel_pct: 30.0,
            broken_kernel_pct: 20.0,
            heat_damage_pct: 0.0,
        };
        assert_eq!(sample.quality_multiplier(), 0.0);
    }

    #[test]
    fn test_stalk_observation_parse() {
        assert_eq!(StalkDamage::from_observation(" Severe "), StalkDamage::Severe);
        assert_eq!(StalkDamage::from_observation("unknown"), StalkDamage::None);
        assert_eq!(StalkDamage::Light.loss_pct(), 10.0);
    }

    #[test]
    fn test_generic_builder() {
        let input = AssessmentSampleInput::new(3)
            .with_count(keys::SURVIVING_PLANTS, 30)
            .with_damage(keys::DEFOLIATION, 25.0)
            .with_observation(keys::STALK_DAMAGE, "light");
        assert_eq!(input.count(keys::SURVIVING_PLANTS), Some(30));
        assert_eq!(input.damage(keys::DEFOLIATION), Some(25.0));
        assert_eq!(input.observation(keys::STALK_DAMAGE), Some("light"));
        assert!(input.weight(keys::EAR_WEIGHT).is_none());
    }
}
