//! Engine Configuration
//!
//! Tunable defaults and thresholds, loadable from a JSON file. Every field has
//! a default, so a partial file only overrides what it names.
//!
//! Example:
//! ```json
//! { "validation": { "max_grain_yield_kg_ha": 16000 }, "sampling": { "edge_buffer_m": 10 } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::samples::defaults;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "ENGINE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub calculators: CalculatorDefaults,
    pub validation: ValidationThresholds,
    pub sampling: SamplingDefaults,
    pub economics: EconomicsConfig,
    pub orchestrator: OrchestratorDefaults,
}

/// Defaults applied when a sample or request omits a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorDefaults {
    pub normal_population_per_ha: f64,
    pub row_length_m: f64,
    pub row_width_m: f64,
    /// Hail: plants counted in the original stand when not observed
    pub original_stand_count: u32,
    /// Weight and tonnage methods
    pub sample_area_m2: f64,
    pub shelling_factor: f64,
    pub silage_recommendation_t_ha: f64,
    pub standard_maturity_days: f64,
    /// Replanting payment: lesser of this many yield units...
    pub replant_payment_cap_units: f64,
    /// ...or this share of normal yield
    pub replant_payment_guarantee_share: f64,
}

impl Default for CalculatorDefaults {
    fn default() -> Self {
        Self {
            normal_population_per_ha: 40_000.0,
            row_length_m: defaults::ROW_LENGTH_M,
            row_width_m: defaults::ROW_WIDTH_M,
            original_stand_count: defaults::ORIGINAL_STAND_COUNT,
            sample_area_m2: defaults::SAMPLE_AREA_M2,
            shelling_factor: 0.8,
            silage_recommendation_t_ha: 11.0,
            standard_maturity_days: 120.0,
            replant_payment_cap_units: 8.0,
            replant_payment_guarantee_share: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    pub min_samples: usize,
    pub min_samples_per_ha: f64,
    /// CV below this with more than `uniform_min_samples` samples is suspicious
    pub uniform_cv: f64,
    pub uniform_min_samples: usize,
    pub high_cv: f64,
    pub outlier_z: f64,
    pub max_grain_yield_kg_ha: f64,
    pub max_silage_t_ha: f64,
    /// Sample points closer than this are treated as duplicates
    pub gps_duplicate_m: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_samples: 3,
            min_samples_per_ha: 0.5,
            uniform_cv: 0.05,
            uniform_min_samples: 5,
            high_cv: 0.40,
            outlier_z: 2.5,
            max_grain_yield_kg_ha: 18_000.0,
            max_silage_t_ha: 90.0,
            gps_duplicate_m: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingDefaults {
    pub min_samples: usize,
    pub edge_buffer_m: f64,
    pub min_distance_m: f64,
    /// Attempt budget is `min_samples * attempts_per_sample`
    pub attempts_per_sample: usize,
    pub min_field_area_ha: f64,
    pub max_field_area_ha: f64,
}

impl Default for SamplingDefaults {
    fn default() -> Self {
        Self {
            min_samples: 5,
            edge_buffer_m: 5.0,
            min_distance_m: 20.0,
            attempts_per_sample: 100,
            min_field_area_ha: 0.01,
            max_field_area_ha: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsConfig {
    /// Silage harvest cost relative to grain when no explicit cost is given
    pub silage_harvest_cost_multiplier: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            silage_harvest_cost_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorDefaults {
    /// Used for sufficiency checks when the claim has no mapped field area
    pub field_area_ha: f64,
    /// Silage moisture when the request carries none
    pub silage_moisture_pct: f64,
}

impl Default for OrchestratorDefaults {
    fn default() -> Self {
        Self {
            field_area_ha: 10.0,
            silage_moisture_pct: 65.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse engine config JSON: {:?}", path))
    }

    /// Load from `$ENGINE_CONFIG` when set, otherwise defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!("Loading engine config from {}", path);
                Self::load(Path::new(path.trim()))
            }
            _ => {
                tracing::info!("{} not set - using built-in defaults", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{
            "validation": { "max_grain_yield_kg_ha": 16000.0 },
            "sampling": { "edge_buffer_m": 10.0 }
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.validation.max_grain_yield_kg_ha, 16_000.0);
        assert_eq!(config.validation.min_samples, 3);
        assert_eq!(config.sampling.edge_buffer_m, 10.0);
        assert_eq!(config.sampling.min_distance_m, 20.0);
        assert_eq!(config.calculators, CalculatorDefaults::default());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read engine config"));
    }
}
