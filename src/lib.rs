//! Yield Assessor
//!
//! Crop-yield loss assessment engine for insurance claims: reference-chart
//! interpolation, per-method loss and yield calculators, peril/stage-aware
//! method selection, spatial sampling plans and statistical screening.
//!
//! Layout:
//! - `data/`: reference charts and the `LookupStore` they are read through
//! - `utils/`: chart interpolation, descriptive statistics, geodesy
//! - `methods/`: one calculator per assessment method
//! - `orchestrator`: selects a method and assembles a full assessment
//! - `sampling` / `geometry`: field boundaries and sample-point plans
//! - `validation`: advisory data-quality flags
//! - `economics`: grain versus silage harvest comparison

pub mod config;
pub mod data;
pub mod economics;
pub mod error;
pub mod geometry;
pub mod methods;
pub mod orchestrator;
pub mod samples;
pub mod sampling;
pub mod stages;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::EngineConfig;
pub use data::{ChartStore, LookupEntry, LookupStore};
pub use economics::{compare_grain_vs_silage, HarvestRecommendation, HarvestStrategy, MarketData};
pub use error::{EngineError, EngineResult};
pub use geometry::{field_metrics, validate_field_boundary, FieldBoundary, FieldMetrics, GeometryService, PlanarGeometry};
pub use methods::*;
pub use orchestrator::{AssessmentOrchestrator, AssessmentParams, AssessmentRequest, AssessmentResult, FieldContext};
pub use samples::{AssessmentSampleInput, MethodSamples};
pub use sampling::{attempt_budget, generate_sampling_plan, SamplingPoint, SpatialSampler};
pub use stages::{CropStage, GrowthStage, Peril};
pub use utils::{GeoPoint, InterpolationResolver};
pub use validation::{CheckType, FlagStatus, ValidationEngine, ValidationFlag};
