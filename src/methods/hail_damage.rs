//! METHOD: HAIL DAMAGE
//!
//! Per-sample loss is the sum of three components:
//!   1. Stand damage: percent of the original stand destroyed, mapped through
//!      the early (exhibit 13, 7th-10th leaf) or late (exhibit 14, 11th leaf to
//!      tassel) hail chart. Other stages use the raw percentage.
//!   2. Defoliation: percent leaf loss mapped through exhibit 15, read at the
//!      nearest charted stage (7th leaf to dent).
//!   3. Direct damage: stalk severity bucket + growing point + ear + other.
//!
//! Stand and direct damage are capped at 100 before defoliation is added, and
//! the sample total is capped at 100 again. The composition is additive.
//!
//! Lookup fallbacks: raw stand reduction (stand chart), 0 (leaf loss chart).

use serde::{Deserialize, Serialize};

use crate::data::tables;
use crate::samples::HailDamageSample;
use crate::stages::CropStage;
use crate::utils::stats::mean_or_zero;
use crate::utils::{round_to, InterpolationResolver};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailDamageParams {
    pub stage: CropStage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailSampleDetail {
    pub sample_number: u32,
    pub percent_stand_reduction: f64,
    pub stand_damage_pct: f64,
    pub defoliation_input_pct: f64,
    pub defoliation_damage_pct: f64,
    pub stalk_damage_pct: f64,
    pub growing_point_damage_pct: f64,
    pub ear_damage_pct: f64,
    pub other_direct_damage_pct: f64,
    pub total_direct_damage: f64,
    pub total_sample_loss: f64,
}

/// Component-wise damage averaged across samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    pub stand_reduction: f64,
    pub defoliation: f64,
    pub stalk_damage: f64,
    pub growing_point: f64,
    pub ear_damage: f64,
    pub other_direct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailDamageResult {
    pub stage: CropStage,
    /// Hail stand chart consulted, if the stage has one
    pub stand_table: Option<String>,
    pub loss_percentage: f64,
    pub average_potential_yield_pct: f64,
    pub damage_breakdown: DamageBreakdown,
    pub sample_details: Vec<HailSampleDetail>,
}

/// Exhibit 15 series read for a stage. Leaf loss is charted from the 7th
/// leaf through dent; stages outside that window use the nearest end.
pub fn leaf_loss_stage(stage: CropStage) -> CropStage {
    match stage {
        CropStage::Emergence => CropStage::Leaf(7),
        CropStage::Leaf(n) => CropStage::Leaf(n.clamp(7, 16)),
        CropStage::Mature => CropStage::Dent,
        other => other,
    }
}

pub fn hail_stand_chart_for(stage: CropStage) -> Option<&'static str> {
    if stage.is_early_hail_window() {
        Some(tables::HAIL_STAND_EARLY)
    } else if stage.is_late_vegetative() {
        Some(tables::HAIL_STAND_LATE)
    } else {
        None
    }
}

/// Calculate hail loss
pub fn calculate_hail_damage(
    resolver: &InterpolationResolver,
    samples: &[HailDamageSample],
    params: &HailDamageParams,
) -> HailDamageResult {
    let stand_table = hail_stand_chart_for(params.stage);
    let stage_key = params.stage.chart_key();
    let leaf_key = leaf_loss_stage(params.stage).chart_key();

    let mut totals = Vec::with_capacity(samples.len());
    let mut sums = DamageBreakdown::default();
    let mut sample_details = Vec::with_capacity(samples.len());

    for sample in samples {
        // 1. Stand
        let percent_reduction = if sample.original_stand_count > 0 {
            (sample.destroyed_plants as f64 / sample.original_stand_count as f64 * 100.0)
                .clamp(0.0, 100.0)
        } else {
            0.0
        };

        let stand_damage = match stand_table {
            None => percent_reduction,
            Some(table) => match resolver.resolve(table, percent_reduction, Some(&stage_key)) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("Hail stand chart fallback for sample {}: {}", sample.sample_number, e);
                    percent_reduction
                }
            },
        };

        // 2. Defoliation
        let defoliation_damage = if sample.percent_defoliation > 0.0 {
            match resolver.resolve(tables::LEAF_LOSS, sample.percent_defoliation, Some(&leaf_key)) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("Leaf loss chart fallback for sample {}: {}", sample.sample_number, e);
                    0.0
                }
            }
        } else {
            0.0
        };

        // 3. Direct
        let stalk_damage = sample.stalk_damage.loss_pct();
        let total_direct = (stand_damage
            + stalk_damage
            + sample.growing_point_damage_pct
            + sample.ear_damage_pct
            + sample.other_direct_damage_pct)
            .min(100.0);

        let total_loss = (total_direct + defoliation_damage).min(100.0);

        totals.push(total_loss);
        sums.stand_reduction += stand_damage;
        sums.defoliation += defoliation_damage;
        sums.stalk_damage += stalk_damage;
        sums.growing_point += sample.growing_point_damage_pct;
        sums.ear_damage += sample.ear_damage_pct;
        sums.other_direct += sample.other_direct_damage_pct;

        sample_details.push(HailSampleDetail {
            sample_number: sample.sample_number,
            percent_stand_reduction: round_to(percent_reduction, 1),
            stand_damage_pct: round_to(stand_damage, 1),
            defoliation_input_pct: round_to(sample.percent_defoliation, 1),
            defoliation_damage_pct: round_to(defoliation_damage, 1),
            stalk_damage_pct: round_to(stalk_damage, 1),
            growing_point_damage_pct: round_to(sample.growing_point_damage_pct, 1),
            ear_damage_pct: round_to(sample.ear_damage_pct, 1),
            other_direct_damage_pct: round_to(sample.other_direct_damage_pct, 1),
            total_direct_damage: round_to(total_direct, 1),
            total_sample_loss: round_to(total_loss, 1),
        });
    }

    let n = samples.len().max(1) as f64;
    let damage_breakdown = DamageBreakdown {
        stand_reduction: round_to(sums.stand_reduction / n, 1),
        defoliation: round_to(sums.defoliation / n, 1),
        stalk_damage: round_to(sums.stalk_damage / n, 1),
        growing_point: round_to(sums.growing_point / n, 1),
        ear_damage: round_to(sums.ear_damage / n, 1),
        other_direct: round_to(sums.other_direct / n, 1),
    };

    let loss = round_to(mean_or_zero(&totals), 1);

    HailDamageResult {
        stage: params.stage,
        stand_table: stand_table.map(str::to_string),
        loss_percentage: loss,
        average_potential_yield_pct: round_to(100.0 - loss, 1),
        damage_breakdown,
        sample_details,
    }
}
