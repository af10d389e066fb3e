//! Growth Stage and Peril Classification
//!
//! Two views of crop development are used throughout the engine:
//! - [`GrowthStage`]: the coarse bucket an assessor records on a claim, used for
//!   method selection.
//! - [`CropStage`]: the fine-grained column key of the reference charts
//!   (`8thLeaf`, `tasseled`, ...), used by the calculators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Insured cause of loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Peril {
    Hail,
    Drought,
    Wind,
    Disease,
    Frost,
    Flood,
}

/// Coarse development bucket recorded on a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthStage {
    #[serde(rename = "Emergence")]
    Emergence,
    #[serde(rename = "VE-V2")]
    VeV2,
    #[serde(rename = "V3-V5")]
    V3V5,
    #[serde(rename = "V6-V8")]
    V6V8,
    #[serde(rename = "V9-V12")]
    V9V12,
    /// Tassel
    #[serde(rename = "VT")]
    Vt,
    /// Silk
    #[serde(rename = "R1")]
    R1,
    /// Blister
    #[serde(rename = "R2")]
    R2,
    /// Milk
    #[serde(rename = "R3")]
    R3,
    /// Dough
    #[serde(rename = "R4")]
    R4,
    /// Dent
    #[serde(rename = "R5")]
    R5,
    #[serde(rename = "Mature")]
    Mature,
}

/// Which method-selection phase a stage belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    EarlyVegetative,
    MidSeason,
    LateSeason,
    /// R2/R3: handled by the fallback selection rule
    Transitional,
}

impl GrowthStage {
    pub fn phase(&self) -> StagePhase {
        match self {
            GrowthStage::Emergence | GrowthStage::VeV2 | GrowthStage::V3V5 | GrowthStage::V6V8 => {
                StagePhase::EarlyVegetative
            }
            GrowthStage::V9V12 | GrowthStage::Vt | GrowthStage::R1 => StagePhase::MidSeason,
            GrowthStage::R4 | GrowthStage::R5 | GrowthStage::Mature => StagePhase::LateSeason,
            GrowthStage::R2 | GrowthStage::R3 => StagePhase::Transitional,
        }
    }

    /// Chart column used when the claim does not name one explicitly
    pub fn representative_stage(&self) -> CropStage {
        match self {
            GrowthStage::Emergence => CropStage::Emergence,
            GrowthStage::VeV2 => CropStage::Leaf(2),
            GrowthStage::V3V5 => CropStage::Leaf(4),
            GrowthStage::V6V8 => CropStage::Leaf(8),
            GrowthStage::V9V12 => CropStage::Leaf(10),
            GrowthStage::Vt => CropStage::Tasseled,
            GrowthStage::R1 => CropStage::Silked,
            GrowthStage::R2 => CropStage::Blister,
            GrowthStage::R3 => CropStage::Milk,
            GrowthStage::R4 => CropStage::Dough,
            GrowthStage::R5 => CropStage::Dent,
            GrowthStage::Mature => CropStage::Mature,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GrowthStage::Emergence => "Emergence",
            GrowthStage::VeV2 => "VE-V2",
            GrowthStage::V3V5 => "V3-V5",
            GrowthStage::V6V8 => "V6-V8",
            GrowthStage::V9V12 => "V9-V12",
            GrowthStage::Vt => "VT",
            GrowthStage::R1 => "R1",
            GrowthStage::R2 => "R2",
            GrowthStage::R3 => "R3",
            GrowthStage::R4 => "R4",
            GrowthStage::R5 => "R5",
            GrowthStage::Mature => "Mature",
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Reference chart column key
///
/// Leaf stages are numbered by collared leaf (2..=16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CropStage {
    Emergence,
    Leaf(u8),
    Tasseled,
    Silked,
    Blister,
    Milk,
    Dough,
    Dent,
    Mature,
}

impl CropStage {
    /// Key used as the `condition` of stage-keyed chart entries
    pub fn chart_key(&self) -> String {
        match self {
            CropStage::Emergence => "emergence".to_string(),
            CropStage::Leaf(n) => format!("{}{}Leaf", n, ordinal_suffix(*n)),
            CropStage::Tasseled => "tasseled".to_string(),
            CropStage::Silked => "silked".to_string(),
            CropStage::Blister => "blister".to_string(),
            CropStage::Milk => "milk".to_string(),
            CropStage::Dough => "dough".to_string(),
            CropStage::Dent => "dent".to_string(),
            CropStage::Mature => "mature".to_string(),
        }
    }

    /// Silked and later: lost plants are no longer compensated by neighbours
    pub fn is_reproductive(&self) -> bool {
        matches!(
            self,
            CropStage::Silked
                | CropStage::Blister
                | CropStage::Milk
                | CropStage::Dough
                | CropStage::Dent
                | CropStage::Mature
        )
    }

    /// 11th leaf through tassel
    pub fn is_late_vegetative(&self) -> bool {
        match self {
            CropStage::Leaf(n) => *n >= 11,
            CropStage::Tasseled => true,
            _ => false,
        }
    }

    /// 7th through 10th leaf
    pub fn is_early_hail_window(&self) -> bool {
        matches!(self, CropStage::Leaf(n) if (7..=10).contains(n))
    }
}

fn ordinal_suffix(n: u8) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

impl fmt::Display for CropStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chart_key())
    }
}

impl FromStr for CropStage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        let lower = key.to_ascii_lowercase();
        let stage = match lower.as_str() {
            "emergence" | "ve" => CropStage::Emergence,
            "tasseled" | "tassel" | "vt" => CropStage::Tasseled,
            "silked" | "silk" | "r1" => CropStage::Silked,
            "blister" | "r2" => CropStage::Blister,
            "milk" | "r3" => CropStage::Milk,
            "dough" | "r4" => CropStage::Dough,
            "dent" | "r5" => CropStage::Dent,
            "mature" | "r6" => CropStage::Mature,
            other => {
                // "8thLeaf" / "v8"
                let digits = other
                    .strip_suffix("leaf")
                    .map(|d| d.trim_end_matches(|c: char| c.is_ascii_alphabetic()))
                    .or_else(|| other.strip_prefix('v'))
                    .unwrap_or("");
                match digits.parse::<u8>() {
                    Ok(n) if (1..=20).contains(&n) => CropStage::Leaf(n),
                    _ => {
                        return Err(EngineError::MalformedInput(format!(
                            "unknown crop stage '{}'",
                            key
                        )))
                    }
                }
            }
        };
        Ok(stage)
    }
}

impl TryFrom<String> for CropStage {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CropStage> for String {
    fn from(stage: CropStage) -> Self {
        stage.chart_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_keys() {
        assert_eq!(CropStage::Leaf(2).chart_key(), "2ndLeaf");
        assert_eq!(CropStage::Leaf(3).chart_key(), "3rdLeaf");
        assert_eq!(CropStage::Leaf(8).chart_key(), "8thLeaf");
        assert_eq!(CropStage::Leaf(11).chart_key(), "11thLeaf");
        assert_eq!(CropStage::Leaf(12).chart_key(), "12thLeaf");
        assert_eq!(CropStage::Tasseled.chart_key(), "tasseled");
    }

    #[test]
    fn test_parse_stage_keys() {
        assert_eq!("8thLeaf".parse::<CropStage>().unwrap(), CropStage::Leaf(8));
        assert_eq!("V12".parse::<CropStage>().unwrap(), CropStage::Leaf(12));
        assert_eq!("Silked".parse::<CropStage>().unwrap(), CropStage::Silked);
        assert_eq!("R5".parse::<CropStage>().unwrap(), CropStage::Dent);
        assert!("banana".parse::<CropStage>().is_err());
    }

    #[test]
    fn test_stage_windows() {
        assert!(CropStage::Leaf(8).is_early_hail_window());
        assert!(!CropStage::Leaf(6).is_early_hail_window());
        assert!(CropStage::Leaf(14).is_late_vegetative());
        assert!(CropStage::Tasseled.is_late_vegetative());
        assert!(CropStage::Dent.is_reproductive());
        assert!(!CropStage::Tasseled.is_reproductive());
    }

    #[test]
    fn test_phases() {
        assert_eq!(GrowthStage::V6V8.phase(), StagePhase::EarlyVegetative);
        assert_eq!(GrowthStage::R1.phase(), StagePhase::MidSeason);
        assert_eq!(GrowthStage::Mature.phase(), StagePhase::LateSeason);
        assert_eq!(GrowthStage::R3.phase(), StagePhase::Transitional);
    }

    #[test]
    fn test_growth_stage_serde_names() {
        let json = serde_json::to_string(&GrowthStage::V9V12).unwrap();
        assert_eq!(json, "\"V9-V12\"");
        let stage: CropStage = serde_json::from_str("\"10thLeaf\"").unwrap();
        assert_eq!(stage, CropStage::Leaf(10));
    }
}
