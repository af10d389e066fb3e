//! METHOD: STAND REDUCTION
//!
//! Early-season loss from missing plants. Surviving plants per sampled row
//! section are converted to a population, expressed as percent of the normal
//! stand, and mapped to percent potential yield through a stage chart.
//!
//! Charts:
//!   - emergence to 10th leaf  -> exhibit 11
//!   - 11th leaf to tassel     -> exhibit 12
//!   - silked and later        -> 1:1 (lost plants are no longer compensated)
//!
//! Lookup fallback: percent stand itself.

use serde::{Deserialize, Serialize};

use crate::data::tables;
use crate::samples::StandReductionSample;
use crate::stages::CropStage;
use crate::utils::stats::mean_or_zero;
use crate::utils::{round_to, InterpolationResolver};

/// `table_used` value for the 1:1 path
pub const DIRECT_MATURITY: &str = "direct_maturity";

pub const DEFAULT_NORMAL_POPULATION_PER_HA: f64 = 40_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandReductionParams {
    pub stage: CropStage,
    pub normal_population_per_ha: f64,
}

impl StandReductionParams {
    pub fn new(stage: CropStage) -> Self {
        Self {
            stage,
            normal_population_per_ha: DEFAULT_NORMAL_POPULATION_PER_HA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandSampleDetail {
    pub sample_number: u32,
    pub surviving_plants: u32,
    /// Plants per hectare, rounded to a whole plant
    pub population_per_ha: f64,
    pub percent_stand: f64,
    pub percent_potential_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandReductionResult {
    pub stage: CropStage,
    pub table_used: String,
    pub normal_population_per_ha: f64,
    pub average_potential_yield_pct: f64,
    pub loss_percentage: f64,
    pub sample_details: Vec<StandSampleDetail>,
}

/// Chart for a stage, `None` when the 1:1 relationship applies
pub fn stand_chart_for(stage: CropStage) -> Option<&'static str> {
    if stage.is_reproductive() {
        None
    } else if stage.is_late_vegetative() {
        Some(tables::STAND_REDUCTION_LATE)
    } else {
        Some(tables::STAND_REDUCTION_EARLY)
    }
}

/// Calculate stand-reduction loss
///
/// Algorithm (per sample):
/// 1. population = surviving / (row_length × row_width) × 10000
/// 2. percent stand = population / normal × 100, clamped to [0, 100]
/// 3. potential yield = chart(percent stand) or percent stand (1:1 / fallback)
///
/// Loss = 100 − mean(potential yield).
pub fn calculate_stand_reduction(
    resolver: &InterpolationResolver,
    samples: &[StandReductionSample],
    params: &StandReductionParams,
) -> StandReductionResult {
    let chart = stand_chart_for(params.stage);
    let stage_key = params.stage.chart_key();

    let mut potentials = Vec::with_capacity(samples.len());
    let mut sample_details = Vec::with_capacity(samples.len());

    for sample in samples {
        let area_m2 = sample.row_length_m * sample.row_width_m;
        let population = if area_m2 > 0.0 {
            sample.surviving_plants as f64 / area_m2 * 10_000.0
        } else {
            0.0
        };

        let percent_stand = if params.normal_population_per_ha > 0.0 {
            (population / params.normal_population_per_ha * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        let potential = match chart {
            None => percent_stand,
            Some(table) => match resolver.resolve(table, percent_stand, Some(&stage_key)) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("Stand chart fallback for sample {}: {}", sample.sample_number, e);
                    percent_stand
                }
            },
        };

        potentials.push(potential);
        sample_details.push(StandSampleDetail {
            sample_number: sample.sample_number,
            surviving_plants: sample.surviving_plants,
            population_per_ha: population.round(),
            percent_stand: round_to(percent_stand, 1),
            percent_potential_yield: round_to(potential, 1),
        });
    }

    let average_potential = mean_or_zero(&potentials);

    StandReductionResult {
        stage: params.stage,
        table_used: chart.unwrap_or(DIRECT_MATURITY).to_string(),
        normal_population_per_ha: params.normal_population_per_ha,
        average_potential_yield_pct: round_to(average_potential, 2),
        loss_percentage: round_to(100.0 - average_potential, 2),
        sample_details,
    }
}
