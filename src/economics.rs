//! Economic Comparator
//!
//! Grain-versus-silage harvest comparison for a damaged crop. Pure function of
//! the two yield estimates and the market inputs; nothing is cached.

use serde::{Deserialize, Serialize};

use crate::config::EconomicsConfig;
use crate::utils::round_to;

/// Prices per tonne, costs per hectare unless stated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub grain_price_per_tonne: f64,
    #[serde(default)]
    pub silage_price_per_tonne: Option<f64>,
    #[serde(default)]
    pub harvest_cost_per_ha: f64,
    /// Defaults to the configured multiple of the grain harvest cost
    #[serde(default)]
    pub silage_harvest_cost_per_ha: Option<f64>,
    #[serde(default)]
    pub transport_cost_per_tonne: f64,
    #[serde(default)]
    pub drying_cost_per_tonne: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarvestStrategy {
    HarvestGrain,
    HarvestSilage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecommendation {
    pub recommended_strategy: HarvestStrategy,
    /// Per-hectare advantage of the recommended strategy
    pub financial_gain_estimate: f64,
    pub rationale: String,
}

/// Compare net value per hectare of harvesting grain or silage
///
/// Returns `None` without a silage price.
pub fn compare_grain_vs_silage(
    grain_yield_kg_ha: f64,
    silage_tonnes_ha: f64,
    market: &MarketData,
    config: &EconomicsConfig,
) -> Option<HarvestRecommendation> {
    let silage_price = market.silage_price_per_tonne.filter(|p| *p > 0.0)?;

    let grain_tonnes = grain_yield_kg_ha / 1000.0;
    let grain_net = grain_tonnes * market.grain_price_per_tonne
        - market.harvest_cost_per_ha
        - (market.drying_cost_per_tonne + market.transport_cost_per_tonne) * grain_tonnes;

    let silage_harvest_cost = market
        .silage_harvest_cost_per_ha
        .unwrap_or(market.harvest_cost_per_ha * config.silage_harvest_cost_multiplier);
    let silage_net = silage_tonnes_ha * silage_price
        - silage_harvest_cost
        - market.transport_cost_per_tonne * silage_tonnes_ha;

    let difference = silage_net - grain_net;
    let gain = round_to(difference.abs(), 2);

    let recommendation = if difference > 0.0 {
        HarvestRecommendation {
            recommended_strategy: HarvestStrategy::HarvestSilage,
            financial_gain_estimate: gain,
            rationale: format!("Silage value exceeds grain by {:.2}/ha at current prices and costs.", gain),
        }
    } else {
        HarvestRecommendation {
            recommended_strategy: HarvestStrategy::HarvestGrain,
            financial_gain_estimate: gain,
            rationale: format!("Grain harvest retains {:.2}/ha higher value.", gain),
        }
    };

    tracing::debug!(
        "Harvest comparison: grain net {:.2}, silage net {:.2} -> {:?}",
        grain_net, silage_net, recommendation.recommended_strategy
    );

    Some(recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn market() -> MarketData {
        MarketData {
            grain_price_per_tonne: 300.0,
            silage_price_per_tonne: Some(50.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_silage_wins_on_price_spread() {
        // grain 4 t × 300 = 1200, silage 30 t × 50 = 1500
        let rec = compare_grain_vs_silage(4000.0, 30.0, &market(), &EconomicsConfig::default()).unwrap();
        assert_eq!(rec.recommended_strategy, HarvestStrategy::HarvestSilage);
        assert_relative_eq!(rec.financial_gain_estimate, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_silage_harvest_cost_defaults_to_multiple() {
        let with_cost = MarketData { harvest_cost_per_ha: 400.0, ..market() };
        // grain 1200 − 400 = 800; silage 1500 − 600 = 900
        let rec = compare_grain_vs_silage(4000.0, 30.0, &with_cost, &EconomicsConfig::default()).unwrap();
        assert_eq!(rec.recommended_strategy, HarvestStrategy::HarvestSilage);
        assert_relative_eq!(rec.financial_gain_estimate, 100.0, epsilon = 1e-9);

        let explicit = MarketData { silage_harvest_cost_per_ha: Some(800.0), ..with_cost };
        let rec = compare_grain_vs_silage(4000.0, 30.0, &explicit, &EconomicsConfig::default()).unwrap();
        assert_eq!(rec.recommended_strategy, HarvestStrategy::HarvestGrain);
        assert_relative_eq!(rec.financial_gain_estimate, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_silage_price_no_recommendation() {
        let grain_only = MarketData { silage_price_per_tonne: None, ..market() };
        assert!(compare_grain_vs_silage(4000.0, 30.0, &grain_only, &EconomicsConfig::default()).is_none());
    }

    #[test]
    fn test_tie_goes_to_grain() {
        // grain 1500 == silage 1500
        let rec = compare_grain_vs_silage(5000.0, 30.0, &market(), &EconomicsConfig::default()).unwrap();
        assert_eq!(rec.recommended_strategy, HarvestStrategy::HarvestGrain);
        assert_eq!(rec.financial_gain_estimate, 0.0);
    }
}
