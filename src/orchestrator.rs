//! Assessment Orchestrator - main coordinator for a loss assessment
//!
//! Ties the engine together for one claim:
//! 1. Select a method from peril × growth stage (or honour an explicit override)
//! 2. Reshape the generic field samples into that method's typed records
//! 3. Run the calculator
//! 4. For grain appraisals with market data, estimate silage from the same
//!    samples and compare harvest strategies
//! 5. Screen the result with the validation engine
//!
//! Independent claims share nothing mutable; `assess_batch` scores them in
//! parallel with Rayon.

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::data::LookupStore;
use crate::economics::{compare_grain_vs_silage, HarvestRecommendation, MarketData};
use crate::error::{EngineError, EngineResult};
use crate::geometry::{FieldBoundary, GeometryService};
use crate::methods::{
    calculate_hail_damage, calculate_maturity_line, calculate_stand_reduction, calculate_tonnage,
    calculate_weight_method, AssessmentMethod, HailDamageParams, MaturityLineParams, MethodResult,
    QualityGrade, StandReductionParams, TonnageParams, TonnageResult, WeightParams,
};
use crate::samples::{
    keys, AssessmentSampleInput, HailDamageSample, MaturityLineSample, MethodSamples, StalkDamage,
    StandReductionSample, TonnageSample, WeightSample,
};
use crate::stages::{CropStage, GrowthStage, Peril, StagePhase};
use crate::utils::{round_to, InterpolationResolver};
use crate::validation::{ValidationEngine, ValidationFlag};

/// Claim-level parameters shared by every method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentParams {
    /// Chart column; defaults to the growth stage's representative stage
    pub chart_stage: Option<CropStage>,
    /// Skip peril/stage selection
    pub method_override: Option<AssessmentMethod>,
    /// Kernel moisture for grain methods, whole-plant moisture for tonnage
    pub moisture_pct: Option<f64>,
    pub test_weight_kg_hl: Option<f64>,
    pub normal_population_per_ha: Option<f64>,
    pub row_width_m: Option<f64>,
    pub visual_damage_pct: Option<f64>,
    pub quality_grade: Option<QualityGrade>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldContext {
    pub field_area_ha: Option<f64>,
    pub crop_variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub expected_yield_kg_ha: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub primary_peril: Peril,
    #[serde(default)]
    pub secondary_perils: Vec<Peril>,
    pub growth_stage: GrowthStage,
    pub measurement_date: NaiveDateTime,
    #[serde(default)]
    pub field_context: FieldContext,
    /// Enables the outside-boundary GPS check
    #[serde(default)]
    pub field_boundary: Option<FieldBoundary>,
    #[serde(default)]
    pub market_data: Option<MarketData>,
    pub samples: Vec<AssessmentSampleInput>,
    #[serde(flatten)]
    pub params: AssessmentParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub assessment_id: String,
    pub primary_method_used: AssessmentMethod,
    /// 0 for yield-projection methods
    pub calculated_loss_pct: f64,
    /// kg/ha for grain methods, t/ha for tonnage, 0 for loss methods
    pub calculated_yield_per_area: f64,
    /// Grain yield as a share of the expected yield, when one was supplied
    pub yield_vs_expected_pct: Option<f64>,
    pub validation_flags: Vec<ValidationFlag>,
    pub economic_recommendation: Option<HarvestRecommendation>,
    pub method_result: MethodResult,
    pub silage_estimate: Option<TonnageResult>,
}

/// Coordinates calculators, validation and economics for a claim
pub struct AssessmentOrchestrator<'a> {
    resolver: InterpolationResolver<'a>,
    geometry: &'a dyn GeometryService,
    validator: ValidationEngine,
    config: EngineConfig,
}

impl<'a> AssessmentOrchestrator<'a> {
    pub fn new(store: &'a dyn LookupStore, geometry: &'a dyn GeometryService, config: EngineConfig) -> Self {
        Self {
            resolver: InterpolationResolver::new(store),
            geometry,
            validator: ValidationEngine::new(config.validation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Method for a peril at a growth stage
    ///
    /// Rules, first match wins:
    /// 1. Early vegetative + hail → hail damage (early chart)
    /// 2. Early vegetative, other perils → stand reduction
    /// 3. Mid-season + hail → hail damage (late chart with defoliation)
    /// 4. Late season, any peril → weight method
    /// 5. Otherwise → stand reduction
    pub fn select_method(peril: Peril, stage: GrowthStage) -> AssessmentMethod {
        match (stage.phase(), peril) {
            (StagePhase::EarlyVegetative, Peril::Hail) => AssessmentMethod::HailDamage,
            (StagePhase::EarlyVegetative, _) => AssessmentMethod::StandReduction,
            (StagePhase::MidSeason, Peril::Hail) => AssessmentMethod::HailDamage,
            (StagePhase::LateSeason, _) => AssessmentMethod::WeightMethod,
            _ => AssessmentMethod::StandReduction,
        }
    }

    /// Reshape generic samples into the typed records `method` expects
    ///
    /// Missing keys take the configured defaults. Weight-based methods read
    /// `ear_weight` and fall back to `fresh_weight`.
    pub fn map_samples(
        &self,
        samples: &[AssessmentSampleInput],
        method: AssessmentMethod,
        params: &AssessmentParams,
    ) -> MethodSamples {
        let d = &self.config.calculators;
        let area = |s: &AssessmentSampleInput| s.measurement(keys::SAMPLE_AREA_M2).unwrap_or(d.sample_area_m2);
        let ear_weight = |s: &AssessmentSampleInput| {
            s.weight(keys::EAR_WEIGHT)
                .or_else(|| s.weight(keys::FRESH_WEIGHT))
                .unwrap_or(0.0)
        };

        match method {
            AssessmentMethod::StandReduction => MethodSamples::StandReduction(
                samples
                    .iter()
                    .map(|s| StandReductionSample {
                        sample_number: s.sample_number,
                        surviving_plants: s.count(keys::SURVIVING_PLANTS).unwrap_or(0),
                        row_length_m: s.measurement(keys::ROW_LENGTH_M).unwrap_or(d.row_length_m),
                        row_width_m: s
                            .measurement(keys::ROW_WIDTH_M)
                            .or(params.row_width_m)
                            .unwrap_or(d.row_width_m),
                    })
                    .collect(),
            ),
            AssessmentMethod::HailDamage => MethodSamples::HailDamage(
                samples
                    .iter()
                    .map(|s| HailDamageSample {
                        sample_number: s.sample_number,
                        original_stand_count: s.count(keys::ORIGINAL_STAND).unwrap_or(d.original_stand_count),
                        destroyed_plants: s.count(keys::DESTROYED).unwrap_or(0),
                        percent_defoliation: s.damage(keys::DEFOLIATION).unwrap_or(0.0),
                        stalk_damage: s
                            .observation(keys::STALK_DAMAGE)
                            .map(StalkDamage::from_observation)
                            .unwrap_or_default(),
                        growing_point_damage_pct: s.damage(keys::GROWING_POINT).unwrap_or(0.0),
                        ear_damage_pct: s.damage(keys::EAR_DAMAGE).unwrap_or(0.0),
                        other_direct_damage_pct: s.damage(keys::OTHER_DIRECT).unwrap_or(0.0),
                    })
                    .collect(),
            ),
            AssessmentMethod::WeightMethod => MethodSamples::WeightMethod(
                samples
                    .iter()
                    .map(|s| WeightSample {
                        sample_number: s.sample_number,
                        ear_weight_kg: ear_weight(s),
                        sample_area_m2: area(s),
                        foreign_material_pct: s.damage(keys::FOREIGN_MATERIAL).unwrap_or(0.0),
                        damaged_kernel_pct: s.damage(keys::DAMAGED_KERNELS).unwrap_or(0.0),
                        broken_kernel_pct: s.damage(keys::BROKEN_KERNELS).unwrap_or(0.0),
                        heat_damage_pct: s.damage(keys::HEAT_DAMAGE).unwrap_or(0.0),
                    })
                    .collect(),
            ),
            AssessmentMethod::MaturityLine => MethodSamples::MaturityLine(
                samples
                    .iter()
                    .map(|s| MaturityLineSample {
                        sample_number: s.sample_number,
                        current_weight_kg: ear_weight(s),
                        sample_area_m2: area(s),
                        maturity_line_position: s.measurement(keys::MATURITY_LINE),
                    })
                    .collect(),
            ),
            AssessmentMethod::Tonnage => MethodSamples::Tonnage(self.tonnage_samples(samples)),
        }
    }

    fn tonnage_samples(&self, samples: &[AssessmentSampleInput]) -> Vec<TonnageSample> {
        samples
            .iter()
            .map(|s| TonnageSample {
                sample_number: s.sample_number,
                fresh_weight_kg: s.weight(keys::FRESH_WEIGHT).unwrap_or(0.0),
                sample_area_m2: s
                    .measurement(keys::SAMPLE_AREA_M2)
                    .unwrap_or(self.config.calculators.sample_area_m2),
            })
            .collect()
    }

    /// Run the calculator matching the typed samples
    pub fn calculate(&self, samples: &MethodSamples, stage: CropStage, params: &AssessmentParams) -> MethodResult {
        let d = &self.config.calculators;
        match samples {
            MethodSamples::StandReduction(s) => {
                let method_params = StandReductionParams {
                    stage,
                    normal_population_per_ha: params
                        .normal_population_per_ha
                        .unwrap_or(d.normal_population_per_ha),
                };
                MethodResult::StandReduction(calculate_stand_reduction(&self.resolver, s, &method_params))
            }
            MethodSamples::HailDamage(s) => {
                MethodResult::HailDamage(calculate_hail_damage(&self.resolver, s, &HailDamageParams { stage }))
            }
            MethodSamples::WeightMethod(s) => {
                let method_params = WeightParams {
                    moisture_pct: params.moisture_pct,
                    test_weight_kg_hl: params.test_weight_kg_hl,
                    default_shelling_factor: d.shelling_factor,
                };
                MethodResult::WeightMethod(calculate_weight_method(&self.resolver, s, &method_params))
            }
            MethodSamples::MaturityLine(s) => {
                let method_params = MaturityLineParams {
                    stage,
                    moisture_pct: params.moisture_pct,
                    default_shelling_factor: d.shelling_factor,
                };
                MethodResult::MaturityLine(calculate_maturity_line(&self.resolver, s, &method_params))
            }
            MethodSamples::Tonnage(s) => {
                MethodResult::Tonnage(calculate_tonnage(&self.resolver, s, &self.tonnage_params(params)))
            }
        }
    }

    fn tonnage_params(&self, params: &AssessmentParams) -> TonnageParams {
        TonnageParams {
            moisture_pct: params
                .moisture_pct
                .unwrap_or(self.config.orchestrator.silage_moisture_pct),
            visual_damage_pct: params.visual_damage_pct.unwrap_or(0.0),
            quality_grade: params.quality_grade,
            recommendation_threshold_t_ha: self.config.calculators.silage_recommendation_t_ha,
        }
    }

    /// Select, map and calculate
    pub fn resolve_method(
        &self,
        peril: Peril,
        growth_stage: GrowthStage,
        samples: &[AssessmentSampleInput],
        params: &AssessmentParams,
    ) -> MethodResult {
        let method = params
            .method_override
            .unwrap_or_else(|| Self::select_method(peril, growth_stage));
        let stage = params.chart_stage.unwrap_or_else(|| growth_stage.representative_stage());

        tracing::debug!(
            "Resolving {} for {:?} at {} (chart stage {})",
            method, peril, growth_stage, stage
        );

        let typed = self.map_samples(samples, method, params);
        self.calculate(&typed, stage, params)
    }

    /// Full assessment of one claim
    pub fn assess(&self, request: &AssessmentRequest) -> EngineResult<AssessmentResult> {
        let field_area_ha = request
            .field_context
            .field_area_ha
            .unwrap_or(self.config.orchestrator.field_area_ha);
        if !field_area_ha.is_finite() || field_area_ha <= 0.0 {
            return Err(EngineError::MalformedInput(format!(
                "field area must be positive, got {}",
                field_area_ha
            )));
        }
        if let Some(moisture) = request.params.moisture_pct {
            if !(0.0..=100.0).contains(&moisture) {
                return Err(EngineError::MalformedInput(format!(
                    "moisture must be within 0-100 %, got {}",
                    moisture
                )));
            }
        }

        let method_result = self.resolve_method(
            request.primary_peril,
            request.growth_stage,
            &request.samples,
            &request.params,
        );
        let method = method_result.method();

        // Scenario: grain appraisal with prices → compare against silage
        let mut silage_estimate = None;
        let mut economic_recommendation = None;
        if let (Some(market), MethodResult::WeightMethod(grain)) = (&request.market_data, &method_result) {
            let samples = self.tonnage_samples(&request.samples);
            let silage = calculate_tonnage(&self.resolver, &samples, &self.tonnage_params(&request.params));
            economic_recommendation =
                compare_grain_vs_silage(grain.avg_yield_kg_ha, silage.tonnes_per_ha, market, &self.config.economics);
            silage_estimate = Some(silage);
        }

        let mut validation_flags = self.validator.validate(&method_result, request.samples.len(), field_area_ha);

        let locations: Vec<_> = request
            .samples
            .iter()
            .filter_map(|s| s.location.map(|p| (s.sample_number, p)))
            .collect();
        if !locations.is_empty() {
            validation_flags.extend(self.validator.validate_gps_consistency(
                self.geometry,
                &locations,
                request.field_boundary.as_ref(),
            ));
        }

        let calculated_yield_per_area = method_result.yield_per_area().unwrap_or(0.0);
        let yield_vs_expected_pct = match (method, request.field_context.expected_yield_kg_ha) {
            (AssessmentMethod::WeightMethod | AssessmentMethod::MaturityLine, Some(expected)) if expected > 0.0 => {
                Some(round_to(calculated_yield_per_area / expected * 100.0, 1))
            }
            _ => None,
        };

        let assessment_id = format!("ASM-{}", request.measurement_date.format("%Y%m%d%H%M"));

        tracing::info!(
            "{}: {} on {} samples ({} flags, secondary perils {:?}, variety {})",
            assessment_id,
            method,
            request.samples.len(),
            validation_flags.len(),
            request.secondary_perils,
            request.field_context.crop_variety.as_deref().unwrap_or("unspecified")
        );

        Ok(AssessmentResult {
            assessment_id,
            primary_method_used: method,
            calculated_loss_pct: method_result.loss_percentage(),
            calculated_yield_per_area,
            yield_vs_expected_pct,
            validation_flags,
            economic_recommendation,
            method_result,
            silage_estimate,
        })
    }

    /// Assess independent claims in parallel, preserving order
    pub fn assess_batch(&self, requests: &[AssessmentRequest]) -> Vec<EngineResult<AssessmentResult>> {
        requests.par_iter().map(|request| self.assess(request)).collect()
    }
}
