//! METHOD: REPLANTING ECONOMICS
//!
//! Keep-or-replant comparison for a damaged early stand, plus the replanting
//! indemnity payment and the yield differential needed to break even.

use serde::{Deserialize, Serialize};

use crate::utils::round_to;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplantingInput {
    /// Expected yield per hectare (yield units)
    pub normal_yield: f64,
    /// Price per yield unit
    pub price: f64,
    /// Insured share (0-1)
    pub share: f64,
    /// Surviving stand as percent of normal
    pub stand_pct: f64,
    pub replant_cost: f64,
    /// Fraction of normal yield a late-planted crop achieves
    pub replant_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplantingParams {
    pub payment_cap_units: f64,
    pub payment_guarantee_share: f64,
}

impl Default for ReplantingParams {
    fn default() -> Self {
        Self {
            payment_cap_units: 8.0,
            payment_guarantee_share: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplantDecision {
    Replant,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplantingResult {
    pub recommendation: ReplantDecision,
    pub keep_projected_value: f64,
    /// Net of replanting cost
    pub replant_projected_value: f64,
    pub replanting_payment_amount: f64,
    /// Yield units needed to recover the replanting cost
    pub breakeven_yield_diff: f64,
}

/// Compare keeping the current stand against replanting
///
/// Algorithm:
/// 1. keep    = normal × stand% / 100 × price × share
/// 2. replant = normal × replant factor × price × share − cost
/// 3. REPLANT iff replant > keep
/// 4. payment = min(guarantee share × normal, cap units) × price × share
/// 5. breakeven = cost / price (0 when price ≤ 0)
pub fn calculate_replanting(input: &ReplantingInput, params: &ReplantingParams) -> ReplantingResult {
    let keep_value = input.normal_yield * (input.stand_pct / 100.0) * input.price * input.share;
    let replant_value =
        input.normal_yield * input.replant_factor * input.price * input.share - input.replant_cost;

    let recommendation = if replant_value > keep_value {
        ReplantDecision::Replant
    } else {
        ReplantDecision::Keep
    };

    let payment_units = (input.normal_yield * params.payment_guarantee_share).min(params.payment_cap_units);
    let payment = payment_units * input.price * input.share;

    let breakeven = if input.price > 0.0 {
        input.replant_cost / input.price
    } else {
        0.0
    };

    ReplantingResult {
        recommendation,
        keep_projected_value: round_to(keep_value, 2),
        replant_projected_value: round_to(replant_value, 2),
        replanting_payment_amount: round_to(payment, 2),
        breakeven_yield_diff: round_to(breakeven, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input() -> ReplantingInput {
        ReplantingInput {
            normal_yield: 150.0,
            price: 4.0,
            share: 1.0,
            stand_pct: 60.0,
            replant_cost: 50.0,
            replant_factor: 0.9,
        }
    }

    #[test]
    fn test_replant_when_net_value_is_higher() {
        let result = calculate_replanting(&input(), &ReplantingParams::default());
        assert_relative_eq!(result.keep_projected_value, 360.0, epsilon = 1e-9);
        assert_relative_eq!(result.replant_projected_value, 490.0, epsilon = 1e-9);
        assert_eq!(result.recommendation, ReplantDecision::Replant);
        // min(30, 8) units × 4.0
        assert_relative_eq!(result.replanting_payment_amount, 32.0, epsilon = 1e-9);
        assert_relative_eq!(result.breakeven_yield_diff, 12.5, epsilon = 1e-9);
    }

    #[test]
    fn test_keep_and_small_guarantee() {
        // 150 × 0.9 × 4 − 200 = 340 < 360
        let costly = ReplantingInput { replant_cost: 200.0, ..input() };
        assert_eq!(calculate_replanting(&costly, &ReplantingParams::default()).recommendation, ReplantDecision::Keep);

        // 20% of 20 units is below the 8 unit cap
        let small = ReplantingInput { normal_yield: 20.0, ..input() };
        let result = calculate_replanting(&small, &ReplantingParams::default());
        assert_relative_eq!(result.replanting_payment_amount, 16.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_price_breakeven() {
        let free = ReplantingInput { price: 0.0, ..input() };
        let result = calculate_replanting(&free, &ReplantingParams::default());
        assert_eq!(result.breakeven_yield_diff, 0.0);
        assert_eq!(result.recommendation, ReplantDecision::Keep);
    }
}
