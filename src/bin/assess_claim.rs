// Assess one claim (or a batch) from a JSON request file
//
// Usage: assess_claim <request.json>
//   The file holds a single assessment request or an array of them.
//   LOOKUP_TABLES: chart file (.csv or .json); built-in reference charts otherwise
//   ENGINE_CONFIG: engine config JSON; built-in defaults otherwise

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yield_assessor::{AssessmentOrchestrator, AssessmentRequest, ChartStore, EngineConfig, PlanarGeometry};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yield_assessor=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let request_path = std::env::args()
        .nth(1)
        .context("Usage: assess_claim <request.json>")?;

    let store = match std::env::var("LOOKUP_TABLES") {
        Ok(path) if !path.trim().is_empty() => ChartStore::load(Path::new(path.trim()))?,
        _ => {
            tracing::info!("LOOKUP_TABLES not set - using built-in reference charts");
            ChartStore::with_reference_charts()
        }
    };
    let config = EngineConfig::from_env()?;
    let orchestrator = AssessmentOrchestrator::new(&store, &PlanarGeometry, config);

    let contents = fs::read_to_string(&request_path)
        .with_context(|| format!("Failed to read request: {}", request_path))?;
    let json: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse request JSON: {}", request_path))?;

    let output = if json.is_array() {
        let requests: Vec<AssessmentRequest> =
            serde_json::from_value(json).context("Invalid assessment request batch")?;
        tracing::info!("Assessing {} claims", requests.len());

        let results = orchestrator
            .assess_batch(&requests)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        serde_json::to_string_pretty(&results)?
    } else {
        let request: AssessmentRequest = serde_json::from_value(json).context("Invalid assessment request")?;
        let result = orchestrator.assess(&request)?;
        serde_json::to_string_pretty(&result)?
    };

    println!("{}", output);
    Ok(())
}
