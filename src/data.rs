//! Reference Chart Loading and Storage
//!
//! Holds the tabulated agronomic charts (stand reduction, hail, leaf loss,
//! shelling, moisture and test weight exhibits) the calculators interpolate
//! against. Charts are loaded once, explicitly, and are read-only afterwards.
//!
//! Sources:
//! - [`reference_charts`]: the built-in chart set
//! - [`ChartStore::load_csv`]: `table_name,input_value,condition,output_value` via Polars
//! - [`ChartStore::load_json`]: array of [`LookupEntry`] records

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// Chart names used by the calculators
pub mod tables {
    pub const STAND_REDUCTION_EARLY: &str = "exhibit11_standReduction";
    pub const STAND_REDUCTION_LATE: &str = "exhibit12_standReduction";
    pub const HAIL_STAND_EARLY: &str = "exhibit13_hailStandReduction";
    pub const HAIL_STAND_LATE: &str = "exhibit14_hailStandReduction";
    pub const LEAF_LOSS: &str = "exhibit15_leafLoss";
    pub const SHELLING_FACTORS: &str = "exhibit17_shellingFactors";
    pub const SILAGE_MOISTURE: &str = "exhibit21_silageMoisture";
    pub const GRAIN_MOISTURE: &str = "exhibit23_moistureAdjustment";
    pub const TEST_WEIGHT: &str = "exhibit24_testWeightPack";
}

/// One chart cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub table_name: String,
    pub input_value: f64,
    #[serde(default)]
    pub condition: Option<String>,
    pub output_value: f64,
}

impl LookupEntry {
    pub fn new(table_name: &str, input_value: f64, condition: Option<&str>, output_value: f64) -> Self {
        Self {
            table_name: table_name.to_string(),
            input_value,
            condition: condition.map(str::to_string),
            output_value,
        }
    }
}

/// Read-only chart access consumed by the interpolation resolver
///
/// `floor` / `ceil` are the two directions of a range query restricted to one
/// `(table_name, condition)` series.
pub trait LookupStore: Send + Sync {
    fn get(&self, table_name: &str, input_value: f64, condition: Option<&str>) -> Option<&LookupEntry>;

    /// Closest entry with `input_value <= x`
    fn floor(&self, table_name: &str, condition: Option<&str>, x: f64) -> Option<&LookupEntry>;

    /// Closest entry with `input_value >= x`
    fn ceil(&self, table_name: &str, condition: Option<&str>, x: f64) -> Option<&LookupEntry>;
}

type SeriesKey = (String, Option<String>);

/// In-memory chart store
///
/// Each `(table_name, condition)` series is kept sorted by `input_value`, so
/// range queries are binary searches.
#[derive(Debug, Clone, Default)]
pub struct ChartStore {
    series: FxHashMap<SeriesKey, Vec<LookupEntry>>,
}

impl ChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from entries; later duplicates of a cell replace earlier ones
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LookupEntry>,
    {
        let mut store = Self::new();
        for entry in entries {
            store.upsert(entry);
        }
        store
    }

    /// Store seeded with the built-in reference charts
    pub fn with_reference_charts() -> Self {
        Self::from_entries(reference_charts())
    }

    /// Administrative override keyed by `(table_name, input_value, condition)`
    ///
    /// Returns the replaced cell, if any.
    pub fn upsert(&mut self, mut entry: LookupEntry) -> Option<LookupEntry> {
        if !entry.input_value.is_finite() || !entry.output_value.is_finite() {
            tracing::warn!(
                "Skipping non-finite chart cell {}[{:?}] {} -> {}",
                entry.table_name, entry.condition, entry.input_value, entry.output_value
            );
            return None;
        }
        // -0.0 and 0.0 are one cell
        if entry.input_value == 0.0 {
            entry.input_value = 0.0;
        }

        let key = (entry.table_name.clone(), entry.condition.clone());
        let rows = self.series.entry(key).or_default();

        match rows.binary_search_by(|e| e.input_value.total_cmp(&entry.input_value)) {
            Ok(idx) => Some(std::mem::replace(&mut rows[idx], entry)),
            Err(idx) => {
                rows.insert(idx, entry);
                None
            }
        }
    }

    /// Load charts from a CSV file with columns
    /// `table_name,input_value,condition,output_value`
    ///
    /// An empty `condition` cell means the series has no condition.
    pub fn load_csv(path: &Path) -> Result<Self> {
        tracing::info!("Loading reference charts from CSV: {:?}", path);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load chart CSV: {:?}", path))?;

        let tables = df.column("table_name")
            .with_context(|| "Column 'table_name' not found")?
            .str()
            .with_context(|| "Column 'table_name' is not string type")?;

        let inputs = df.column("input_value")
            .with_context(|| "Column 'input_value' not found")?
            .cast(&DataType::Float64)
            .with_context(|| "Column 'input_value' is not numeric")?;
        let inputs = inputs.f64()?;

        let outputs = df.column("output_value")
            .with_context(|| "Column 'output_value' not found")?
            .cast(&DataType::Float64)
            .with_context(|| "Column 'output_value' is not numeric")?;
        let outputs = outputs.f64()?;

        // All-empty condition columns are inferred as non-string; cast keeps nulls
        let conditions = df.column("condition")
            .with_context(|| "Column 'condition' not found")?
            .cast(&DataType::String)
            .with_context(|| "Column 'condition' is not string-like")?;
        let conditions = conditions.str()?;

        let mut store = Self::new();
        let mut skipped = 0usize;

        for idx in 0..df.height() {
            match (tables.get(idx), inputs.get(idx), outputs.get(idx)) {
                (Some(table), Some(input), Some(output)) => {
                    let condition = conditions
                        .get(idx)
                        .map(str::trim)
                        .filter(|c| !c.is_empty());
                    store.upsert(LookupEntry::new(table, input, condition, output));
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} incomplete chart rows in {:?}", skipped, path);
        }
        tracing::info!("  Series: {}  Cells: {}", store.series.len(), store.len());

        Ok(store)
    }

    /// Load charts from a JSON array of entries
    pub fn load_json(path: &Path) -> Result<Self> {
        tracing::info!("Loading reference charts from JSON: {:?}", path);

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read chart file: {:?}", path))?;

        let entries: Vec<LookupEntry> = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse chart JSON")?;

        Ok(Self::from_entries(entries))
    }

    /// Load from `.csv` or `.json` by extension
    pub fn load(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::load_csv(path),
            Some("json") => Self::load_json(path),
            other => anyhow::bail!("Unsupported chart file extension: {:?}", other),
        }
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Sorted, distinct table names
    pub fn tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(|(t, _)| t.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// All cells, ordered by table, condition, then input (offline export)
    pub fn entries(&self) -> Vec<&LookupEntry> {
        let mut keys: Vec<&SeriesKey> = self.series.keys().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|k| self.series[k].iter())
            .collect()
    }

    fn rows(&self, table_name: &str, condition: Option<&str>) -> Option<&[LookupEntry]> {
        self.series
            .get(&(table_name.to_string(), condition.map(str::to_string)))
            .map(Vec::as_slice)
    }
}

impl LookupStore for ChartStore {
    fn get(&self, table_name: &str, input_value: f64, condition: Option<&str>) -> Option<&LookupEntry> {
        let rows = self.rows(table_name, condition)?;
        let input_value = if input_value == 0.0 { 0.0 } else { input_value };
        rows.binary_search_by(|e| e.input_value.total_cmp(&input_value))
            .ok()
            .map(|idx| &rows[idx])
    }

    fn floor(&self, table_name: &str, condition: Option<&str>, x: f64) -> Option<&LookupEntry> {
        let rows = self.rows(table_name, condition)?;
        let upper = rows.partition_point(|e| e.input_value.partial_cmp(&x) != Some(Ordering::Greater));
        upper.checked_sub(1).map(|idx| &rows[idx])
    }

    fn ceil(&self, table_name: &str, condition: Option<&str>, x: f64) -> Option<&LookupEntry> {
        let rows = self.rows(table_name, condition)?;
        let idx = rows.partition_point(|e| e.input_value < x);
        rows.get(idx)
    }
}

/// Built-in reference charts
///
/// Simplified maize loss-adjustment exhibits. Stage-keyed charts use
/// [`crate::CropStage::chart_key`] values as their condition.
pub fn reference_charts() -> Vec<LookupEntry> {
    let mut entries = Vec::new();

    // Exhibit 11: percent stand -> percent potential yield (emergence to 10th leaf)
    let early_stages = ["emergence", "2ndLeaf", "4thLeaf", "6thLeaf", "8thLeaf", "10thLeaf"];
    let exhibit11: [(f64, [f64; 6]); 6] = [
        (100.0, [100.0, 100.0, 100.0, 100.0, 100.0, 100.0]),
        (90.0, [90.0, 92.0, 94.0, 96.0, 97.0, 98.0]),
        (80.0, [80.0, 84.0, 88.0, 92.0, 94.0, 96.0]),
        (70.0, [70.0, 76.0, 82.0, 88.0, 91.0, 94.0]),
        (60.0, [60.0, 68.0, 76.0, 84.0, 88.0, 92.0]),
        (50.0, [50.0, 60.0, 70.0, 80.0, 85.0, 90.0]),
    ];
    for (stand, row) in exhibit11 {
        for (stage, potential) in early_stages.iter().zip(row) {
            entries.push(LookupEntry::new(tables::STAND_REDUCTION_EARLY, stand, Some(stage), potential));
        }
    }

    // Exhibit 12: percent stand -> percent potential yield (11th leaf to tassel)
    let late_stages = ["11thLeaf", "12thLeaf", "13thLeaf", "14thLeaf", "15thLeaf", "16thLeaf", "tasseled"];
    let exhibit12: [(f64, f64); 6] = [
        (100.0, 100.0), (90.0, 93.0), (80.0, 85.0), (70.0, 76.0), (60.0, 66.0), (50.0, 56.0),
    ];
    for stage in late_stages {
        for (stand, potential) in exhibit12 {
            entries.push(LookupEntry::new(tables::STAND_REDUCTION_LATE, stand, Some(stage), potential));
        }
    }

    // Exhibit 13: hail stand reduction -> damage (7th to 10th leaf); plants recover
    for stage in ["7thLeaf", "8thLeaf", "9thLeaf", "10thLeaf"] {
        for (reduction, damage) in [(0.0, 0.0), (10.0, 3.0), (50.0, 48.0), (100.0, 100.0)] {
            entries.push(LookupEntry::new(tables::HAIL_STAND_EARLY, reduction, Some(stage), damage));
        }
    }

    // Exhibit 14: hail stand reduction -> damage (11th leaf to tassel); nearly 1:1
    for stage in late_stages {
        for (reduction, damage) in [(0.0, 0.0), (10.0, 9.0), (50.0, 50.0), (100.0, 100.0)] {
            entries.push(LookupEntry::new(tables::HAIL_STAND_LATE, reduction, Some(stage), damage));
        }
    }

    // Exhibit 15: percent defoliation -> percent yield loss; tassel is most critical
    // (stage, loss at 50% defoliation, loss at 100% defoliation)
    let exhibit15 = [
        ("7thLeaf", 4.0, 9.0),
        ("8thLeaf", 5.0, 11.0),
        ("9thLeaf", 6.0, 13.0),
        ("10thLeaf", 7.0, 16.0),
        ("11thLeaf", 9.0, 22.0),
        ("12thLeaf", 11.0, 28.0),
        ("13thLeaf", 13.0, 34.0),
        ("14thLeaf", 15.0, 42.0),
        ("15thLeaf", 18.0, 51.0),
        ("16thLeaf", 21.0, 60.0),
        ("tasseled", 32.0, 100.0),
        ("silked", 31.0, 97.0),
        ("blister", 27.0, 90.0),
        ("milk", 20.0, 80.0),
        ("dough", 12.0, 63.0),
        ("dent", 5.0, 30.0),
    ];
    for (stage, half, full) in exhibit15 {
        for (defoliation, loss) in [(0.0, 0.0), (50.0, half), (100.0, full)] {
            entries.push(LookupEntry::new(tables::LEAF_LOSS, defoliation, Some(stage), loss));
        }
    }

    // Exhibit 17: kernel moisture -> shelling factor
    for (moisture, factor) in [(15.0, 0.80), (20.0, 0.78), (25.0, 0.76), (30.0, 0.73), (35.0, 0.70)] {
        entries.push(LookupEntry::new(tables::SHELLING_FACTORS, moisture, Some("shelling_factor"), factor));
    }

    // Exhibit 21: silage moisture -> tonnage factor (65% standard)
    for (moisture, factor) in [
        (50.0, 1.4), (55.0, 1.25), (60.0, 1.15), (65.0, 1.0), (70.0, 0.9), (75.0, 0.8), (80.0, 0.7),
    ] {
        entries.push(LookupEntry::new(tables::SILAGE_MOISTURE, moisture, Some("factor"), factor));
    }

    // Exhibit 23: grain moisture -> (100 - actual) / (100 - 15)
    for (moisture, factor) in [
        (10.0, 1.0588), (15.0, 1.0), (20.0, 0.9412), (25.0, 0.8824), (30.0, 0.8235), (35.0, 0.7647),
    ] {
        entries.push(LookupEntry::new(tables::GRAIN_MOISTURE, moisture, Some("moisture_factor"), factor));
    }

    // Exhibit 24: test weight (kg/hl) -> factor; 72 kg/hl standard
    for step in 0..=11 {
        let test_weight = 72.0 - 1.3 * step as f64;
        let factor = 1.0 - 0.01 * step as f64;
        entries.push(LookupEntry::new(
            tables::TEST_WEIGHT,
            (test_weight * 10.0).round() / 10.0,
            Some("factor"),
            (factor * 100.0).round() / 100.0,
        ));
    }

    entries
}
