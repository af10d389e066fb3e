//! METHOD: SILAGE TONNAGE
//!
//! Fresh whole-plant weight per sample area converted to tonnes/ha, scaled by
//! a silage moisture factor (exhibit 21, 65% standard) and a quality grade
//! multiplier. An explicit grade wins over the auto grade derived from
//! moisture and visual damage.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::weight::per_hectare;
use crate::data::tables;
use crate::samples::TonnageSample;
use crate::utils::stats::mean_or_zero;
use crate::utils::{round_to, InterpolationResolver};

pub const DEFAULT_RECOMMENDATION_T_HA: f64 = 11.0;

/// Silage quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn multiplier(&self) -> f64 {
        match self {
            QualityGrade::Excellent => 1.0,
            QualityGrade::Good => 0.95,
            QualityGrade::Fair => 0.85,
            QualityGrade::Poor => 0.70,
        }
    }

    /// Grade from moisture (%) and visual damage (%) thresholds
    pub fn auto_grade(moisture_pct: f64, visual_damage_pct: f64) -> Self {
        if moisture_pct <= 65.0 && visual_damage_pct <= 10.0 {
            QualityGrade::Excellent
        } else if moisture_pct <= 70.0 && visual_damage_pct <= 25.0 {
            QualityGrade::Good
        } else if moisture_pct <= 75.0 && visual_damage_pct <= 50.0 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            QualityGrade::Excellent => "excellent",
            QualityGrade::Good => "good",
            QualityGrade::Fair => "fair",
            QualityGrade::Poor => "poor",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonnageParams {
    pub moisture_pct: f64,
    pub visual_damage_pct: f64,
    pub quality_grade: Option<QualityGrade>,
    /// Average tonnage above which the crop is worth harvesting as silage
    pub recommendation_threshold_t_ha: f64,
}

impl TonnageParams {
    pub fn new(moisture_pct: f64) -> Self {
        Self {
            moisture_pct,
            visual_damage_pct: 0.0,
            quality_grade: None,
            recommendation_threshold_t_ha: DEFAULT_RECOMMENDATION_T_HA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonnageSampleDetail {
    pub sample_number: u32,
    pub fresh_weight_kg: f64,
    pub tonnes_per_ha_raw: f64,
    pub tonnes_per_ha_adj: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonnageResult {
    /// Mean adjusted tonnes/ha
    pub tonnes_per_ha: f64,
    /// Mean tonnes/ha with the moisture factor only
    pub moisture_adjusted_tonnes: f64,
    pub moisture_factor: f64,
    pub quality_grade: QualityGrade,
    pub quality_multiplier: f64,
    pub recommended_for_silage: bool,
    /// Lower when the grade was derived rather than observed
    pub tonnage_confidence: f64,
    pub sample_details: Vec<TonnageSampleDetail>,
}

/// Calculate silage tonnage
pub fn calculate_tonnage(
    resolver: &InterpolationResolver,
    samples: &[TonnageSample],
    params: &TonnageParams,
) -> TonnageResult {
    let quality_grade = params
        .quality_grade
        .unwrap_or_else(|| QualityGrade::auto_grade(params.moisture_pct, params.visual_damage_pct));
    let quality_multiplier = quality_grade.multiplier();

    let moisture_factor = match resolver.resolve(tables::SILAGE_MOISTURE, params.moisture_pct, Some("factor")) {
        Ok(factor) => factor,
        Err(e) => {
            tracing::debug!("Silage moisture factor fallback to 1.0: {}", e);
            1.0
        }
    };

    let mut adjusted = Vec::with_capacity(samples.len());
    let mut sample_details = Vec::with_capacity(samples.len());

    for sample in samples {
        let raw = per_hectare(sample.fresh_weight_kg, sample.sample_area_m2) / 1000.0;
        let tonnes = raw * moisture_factor * quality_multiplier;

        adjusted.push(tonnes);
        sample_details.push(TonnageSampleDetail {
            sample_number: sample.sample_number,
            fresh_weight_kg: sample.fresh_weight_kg,
            tonnes_per_ha_raw: round_to(raw, 1),
            tonnes_per_ha_adj: round_to(tonnes, 1),
        });
    }

    let average = mean_or_zero(&adjusted);

    TonnageResult {
        tonnes_per_ha: round_to(average, 1),
        moisture_adjusted_tonnes: round_to(average / quality_multiplier, 1),
        moisture_factor,
        quality_grade,
        quality_multiplier,
        recommended_for_silage: average > params.recommendation_threshold_t_ha,
        tonnage_confidence: if params.quality_grade.is_some() { 0.85 } else { 0.70 },
        sample_details,
    }
}
