//! METHOD: WEIGHT (GRAIN YIELD)
//!
//! Late-season appraisal from harvested ear corn.
//!
//! Pipeline per sample:
//!   ear weight × shelling factor        (exhibit 17 at field moisture, default 0.8)
//!   ÷ sample area → kg/ha
//!   × moisture factor                   (exhibit 23, default 1.0)
//!   × test weight factor                (exhibit 24, default 1.0)
//!   × (1 − grading deductions / 100)    (floored at 0)
//!
//! Chart factors depend only on field-level inputs and are resolved once.

use serde::{Deserialize, Serialize};

use crate::data::tables;
use crate::samples::WeightSample;
use crate::utils::stats::mean_or_zero;
use crate::utils::{round_to, InterpolationResolver};

pub const DEFAULT_SHELLING_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightParams {
    /// Field grain moisture (%)
    pub moisture_pct: Option<f64>,
    /// kg/hl
    pub test_weight_kg_hl: Option<f64>,
    pub default_shelling_factor: f64,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            moisture_pct: None,
            test_weight_kg_hl: None,
            default_shelling_factor: DEFAULT_SHELLING_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAdjustments {
    pub moisture_factor: f64,
    pub test_weight_factor: f64,
    pub foreign_material_deduction: f64,
    pub damaged_kernel_deduction: f64,
    pub broken_kernel_deduction: f64,
    pub heat_damage_deduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSampleDetail {
    pub sample_number: u32,
    pub ear_weight_kg: f64,
    pub shelled_weight_kg: f64,
    pub yield_kg_ha_raw: f64,
    pub quality_adjustments: QualityAdjustments,
    pub yield_kg_ha_adj: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightResult {
    pub avg_yield_kg_ha: f64,
    pub shelling_factor: f64,
    pub moisture_factor: f64,
    pub test_weight_factor: f64,
    pub sample_details: Vec<WeightSampleDetail>,
}

/// Shelling factor at the given kernel moisture
///
/// Shared with the maturity-line projection.
pub fn resolve_shelling_factor(
    resolver: &InterpolationResolver,
    moisture_pct: Option<f64>,
    default: f64,
) -> f64 {
    let Some(moisture) = moisture_pct else {
        return default;
    };
    match resolver.resolve(tables::SHELLING_FACTORS, moisture, Some("shelling_factor")) {
        Ok(factor) => factor,
        Err(e) => {
            tracing::debug!("Shelling factor fallback to {}: {}", default, e);
            default
        }
    }
}

/// kg harvested from `area_m2` → kg/ha; 0 for a degenerate area
pub(crate) fn per_hectare(kg: f64, area_m2: f64) -> f64 {
    if area_m2 > 0.0 {
        kg / area_m2 * 10_000.0
    } else {
        0.0
    }
}

/// Calculate grain yield by the weight method
pub fn calculate_weight_method(
    resolver: &InterpolationResolver,
    samples: &[WeightSample],
    params: &WeightParams,
) -> WeightResult {
    let shelling_factor =
        resolve_shelling_factor(resolver, params.moisture_pct, params.default_shelling_factor);

    let moisture_factor = match params.moisture_pct {
        None => 1.0,
        Some(moisture) => {
            match resolver.resolve(tables::GRAIN_MOISTURE, moisture, Some("moisture_factor")) {
                Ok(factor) => factor,
                Err(e) => {
                    tracing::debug!("Moisture factor fallback to 1.0: {}", e);
                    1.0
                }
            }
        }
    };

    let test_weight_factor = match params.test_weight_kg_hl {
        None => 1.0,
        Some(test_weight) => match resolver.resolve(tables::TEST_WEIGHT, test_weight, Some("factor")) {
            Ok(factor) => factor,
            Err(e) => {
                tracing::debug!("Test weight factor fallback to 1.0: {}", e);
                1.0
            }
        },
    };

    let mut yields = Vec::with_capacity(samples.len());
    let mut sample_details = Vec::with_capacity(samples.len());

    for sample in samples {
        let shelled = sample.ear_weight_kg * shelling_factor;
        let raw = per_hectare(shelled, sample.sample_area_m2);
        let adjusted = raw * moisture_factor * test_weight_factor * sample.quality_multiplier();

        yields.push(adjusted);
        sample_details.push(WeightSampleDetail {
            sample_number: sample.sample_number,
            ear_weight_kg: sample.ear_weight_kg,
            shelled_weight_kg: round_to(shelled, 2),
            yield_kg_ha_raw: round_to(raw, 1),
            quality_adjustments: QualityAdjustments {
                moisture_factor,
                test_weight_factor,
                foreign_material_deduction: round_to(sample.foreign_material_pct, 1),
                damaged_kernel_deduction: round_to(sample.damaged_kernel_pct, 1),
                broken_kernel_deduction: round_to(sample.broken_kernel_pct, 1),
                heat_damage_deduction: round_to(sample.heat_damage_pct, 1),
            },
            yield_kg_ha_adj: round_to(adjusted, 1),
        });
    }

    WeightResult {
        avg_yield_kg_ha: round_to(mean_or_zero(&yields), 1),
        shelling_factor,
        moisture_factor,
        test_weight_factor,
        sample_details,
    }
}
