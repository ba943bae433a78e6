//! Medicare levy surcharge calculation.
//!
//! The surcharge is a flat rate on the whole income, chosen by the tier the
//! income falls in. It applies only to residents without qualifying private
//! hospital insurance.

use rust_decimal::Decimal;

use crate::config::{RuleSet, SurchargeRules, SurchargeTier};
use crate::models::{AuditStep, CalculationInput, FamilyStatus};

/// The result of the surcharge calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct SurchargeResult {
    /// The surcharge payable.
    pub surcharge: Decimal,
    /// The rate of the tier the income fell in; zero when exempt.
    pub rate: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns the inclusive upper bound of `tier` for an input, or `None` for
/// the final tier.
fn tier_bound(
    tier: &SurchargeTier,
    input: &CalculationInput,
    rules: &SurchargeRules,
) -> Option<Decimal> {
    match input.family_status {
        FamilyStatus::Single => tier.single_up_to,
        FamilyStatus::Family => {
            let extra_dependants = Decimal::from(input.dependant_count.saturating_sub(1));
            tier.family_up_to
                .map(|bound| bound + rules.dependant_increment * extra_dependants)
        }
    }
}

/// Calculates the Medicare levy surcharge.
///
/// # Arguments
///
/// * `income` - Annual income for surcharge purposes
/// * `input` - The calculation input
/// * `rule_set` - Rules for the input's rule-year
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::calculate_surcharge;
/// use take_home_engine::config::RuleBook;
/// use take_home_engine::models::{CalculationInput, RuleYear};
/// use rust_decimal::Decimal;
///
/// let rules = RuleBook::builtin().unwrap().get(RuleYear::Fy2025_26).unwrap();
/// let result = calculate_surcharge(Decimal::from(110_000), &CalculationInput::default(), rules, 5);
/// assert_eq!(result.surcharge, Decimal::from(1_100));
/// ```
pub fn calculate_surcharge(
    income: Decimal,
    input: &CalculationInput,
    rule_set: &RuleSet,
    step_number: u32,
) -> SurchargeResult {
    let rules = rule_set.surcharge();
    let rule_ref = rule_set.table_ref("surcharge");

    let exemption = if input.is_non_resident() {
        Some("foreign resident")
    } else if input.has_qualifying_insurance {
        Some("qualifying private hospital insurance held")
    } else {
        None
    };

    if let Some(reason) = exemption {
        let audit_step = AuditStep {
            step_number,
            rule_id: "surcharge".to_string(),
            rule_name: "Medicare Levy Surcharge".to_string(),
            rule_ref,
            input: serde_json::json!({
                "income": income.normalize().to_string(),
                "residency": input.residency,
                "has_qualifying_insurance": input.has_qualifying_insurance
            }),
            output: serde_json::json!({
                "surcharge": "0",
                "surcharge_applied": false
            }),
            reasoning: format!("No surcharge: {}", reason),
        };

        return SurchargeResult {
            surcharge: Decimal::ZERO,
            rate: Decimal::ZERO,
            audit_step,
        };
    }

    let (tier_index, rate, bound) = rules
        .tiers()
        .iter()
        .enumerate()
        .map(|(index, tier)| (index, tier, tier_bound(tier, input, rules)))
        .find(|(_, _, bound)| bound.is_none_or(|bound| income <= bound))
        .map_or((0, Decimal::ZERO, None), |(index, tier, bound)| {
            (index, tier.rate, bound)
        });

    let surcharge = (income * rate).max(Decimal::ZERO);
    let bound_text = bound.map_or_else(
        || "no upper bound".to_string(),
        |bound| format!("up to ${}", bound.normalize()),
    );

    let audit_step = AuditStep {
        step_number,
        rule_id: "surcharge".to_string(),
        rule_name: "Medicare Levy Surcharge".to_string(),
        rule_ref,
        input: serde_json::json!({
            "income": income.normalize().to_string(),
            "family_status": input.family_status,
            "dependant_count": input.dependant_count
        }),
        output: serde_json::json!({
            "tier": tier_index,
            "rate": rate.normalize().to_string(),
            "surcharge": surcharge.normalize().to_string(),
            "surcharge_applied": !surcharge.is_zero()
        }),
        reasoning: format!(
            "Tier {} ({}): ${} x {} = ${}",
            tier_index,
            bound_text,
            income.normalize(),
            rate.normalize(),
            surcharge.normalize()
        ),
    };

    SurchargeResult {
        surcharge,
        rate,
        audit_step,
    }
}
