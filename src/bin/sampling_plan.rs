// Generate a random sampling plan for a field
//
// Usage: sampling_plan <boundary.json> [min_samples] [seed]
//   The boundary file is an array of [lng, lat] pairs (GeoJSON ring order).
//   ENGINE_CONFIG: engine config JSON (edge buffer, spacing, attempt budget)

use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yield_assessor::{attempt_budget, validate_field_boundary, EngineConfig, FieldBoundary, PlanarGeometry, SpatialSampler};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yield_assessor=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let boundary_path = args
        .next()
        .context("Usage: sampling_plan <boundary.json> [min_samples] [seed]")?;

    let config = EngineConfig::from_env()?;
    let min_samples: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("Invalid min_samples: {}", n))?,
        None => config.sampling.min_samples,
    };
    let seed: Option<u64> = args
        .next()
        .map(|s| s.parse().with_context(|| format!("Invalid seed: {}", s)))
        .transpose()?;

    let contents = fs::read_to_string(&boundary_path)
        .with_context(|| format!("Failed to read boundary: {}", boundary_path))?;
    let coordinates: Vec<[f64; 2]> = serde_json::from_str(&contents)
        .with_context(|| format!("Boundary must be an array of [lng, lat] pairs: {}", boundary_path))?;
    let boundary = FieldBoundary::from_lng_lat(&coordinates);

    let metrics = validate_field_boundary(&PlanarGeometry, &boundary, &config.sampling)?;
    tracing::info!("Field: {:.2} ha, centre ({:.6}, {:.6})", metrics.area_ha, metrics.center_lat, metrics.center_lng);

    let sampling = &config.sampling;
    let max_attempts = attempt_budget(min_samples, sampling.attempts_per_sample);
    let points = match seed {
        Some(seed) => SpatialSampler::seeded(&PlanarGeometry, seed).generate(
            &boundary,
            min_samples,
            sampling.edge_buffer_m,
            sampling.min_distance_m,
            max_attempts,
        )?,
        None => SpatialSampler::from_entropy(&PlanarGeometry).generate(
            &boundary,
            min_samples,
            sampling.edge_buffer_m,
            sampling.min_distance_m,
            max_attempts,
        )?,
    };

    let output = json!({
        "field": metrics,
        "sampling_points": points,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
