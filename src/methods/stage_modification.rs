//! METHOD: STAGE MODIFICATION
//!
//! Short- and long-season varieties develop at different speeds. Days from
//! planting are rescaled to a standard-maturity equivalent, then bucketed to
//! a growth stage and the chart column the other methods should use.

use serde::{Deserialize, Serialize};

use crate::stages::{CropStage, GrowthStage};
use crate::utils::round_to;

pub const STANDARD_MATURITY_DAYS: f64 = 120.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageModificationResult {
    /// Human-readable stage range, e.g. "R1-R2 (Silk/Blister)"
    pub adjusted_growth_stage: String,
    pub growth_stage: GrowthStage,
    pub chart_stage: CropStage,
    pub standard_equivalent_days: u32,
    pub modification_factor: f64,
}

/// Standard-equivalent day buckets: (upper bound, label, bucket, chart stage)
const DAY_BUCKETS: [(f64, &str, GrowthStage, CropStage); 7] = [
    (15.0, "VE-V2", GrowthStage::VeV2, CropStage::Emergence),
    (30.0, "V3-V5", GrowthStage::V3V5, CropStage::Leaf(7)),
    (45.0, "V6-V8", GrowthStage::V6V8, CropStage::Leaf(8)),
    (60.0, "V9-V12", GrowthStage::V9V12, CropStage::Leaf(10)),
    (75.0, "VT (Tassel)", GrowthStage::Vt, CropStage::Tasseled),
    (90.0, "R1-R2 (Silk/Blister)", GrowthStage::R1, CropStage::Silked),
    (105.0, "R3-R4 (Milk/Dough)", GrowthStage::R3, CropStage::Milk),
];

/// Map days from planting to a standard-season growth stage
///
/// `variety_maturity_days == 0` is treated as a standard-season variety.
pub fn calculate_stage_modification(
    days_from_planting: u32,
    variety_maturity_days: u32,
    standard_maturity_days: f64,
) -> StageModificationResult {
    let (factor, equivalent) = if variety_maturity_days > 0 {
        (
            standard_maturity_days / variety_maturity_days as f64,
            days_from_planting as f64 * standard_maturity_days / variety_maturity_days as f64,
        )
    } else {
        (1.0, days_from_planting as f64)
    };

    let (label, growth_stage, chart_stage) = DAY_BUCKETS
        .iter()
        .find(|(upper, ..)| equivalent < *upper)
        .map(|(_, label, stage, chart)| (*label, *stage, *chart))
        .unwrap_or(("R5+ (Dent/Mature)", GrowthStage::Mature, CropStage::Mature));

    StageModificationResult {
        adjusted_growth_stage: label.to_string(),
        growth_stage,
        chart_stage,
        standard_equivalent_days: equivalent as u32,
        modification_factor: round_to(factor, 3),
    }
}
