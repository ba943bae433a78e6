//! Medicare levy calculation.
//!
//! The levy is nil up to a lower threshold, shades in at the phase-in rate,
//! and is charged at the full rate on the whole income from the upper
//! threshold. Thresholds depend on family status, dependants and seniors
//! offset eligibility.

use rust_decimal::Decimal;

use crate::config::{MedicareLevyRules, RuleSet};
use crate::models::{AuditStep, CalculationInput, FamilyStatus, LevyReduction};

/// The lower and upper levy thresholds that apply to one taxpayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevyThresholds {
    /// At or below this income no levy is payable.
    pub lower: Decimal,
    /// At or above this income the full rate applies.
    pub upper: Decimal,
}

/// Selects the levy thresholds for an input.
///
/// Seniors offset eligibility selects the higher seniors thresholds. Family
/// thresholds rise by the dependant increment for each dependant beyond the
/// first; the upper threshold follows from the lower one.
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::levy_thresholds;
/// use take_home_engine::config::RuleBook;
/// use take_home_engine::models::{CalculationInput, RuleYear};
/// use rust_decimal::Decimal;
///
/// let rules = RuleBook::builtin().unwrap().get(RuleYear::Fy2025_26).unwrap();
/// let thresholds = levy_thresholds(&CalculationInput::default(), rules.medicare_levy());
/// assert_eq!(thresholds.lower, Decimal::from(27_222));
/// assert_eq!(thresholds.upper, Decimal::new(340_275, 1));
/// ```
pub fn levy_thresholds(input: &CalculationInput, rules: &MedicareLevyRules) -> LevyThresholds {
    let lower = match (input.family_status, input.sapto_eligible) {
        (FamilyStatus::Single, false) => rules.single_lower,
        (FamilyStatus::Single, true) => rules.sapto_single_lower,
        (FamilyStatus::Family, false) => rules.family_lower,
        (FamilyStatus::Family, true) => rules.sapto_family_lower,
    };

    let lower = match input.family_status {
        FamilyStatus::Family => {
            let extra_dependants = Decimal::from(input.dependant_count.saturating_sub(1));
            lower + rules.dependant_increment * extra_dependants
        }
        FamilyStatus::Single => lower,
    };

    LevyThresholds {
        lower,
        upper: rules.upper_for(lower),
    }
}

/// The result of the Medicare levy calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct MedicareLevyResult {
    /// The levy payable.
    pub levy: Decimal,
    /// The thresholds used, or `None` when the levy does not apply at all.
    pub thresholds: Option<LevyThresholds>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the Medicare levy on taxable income.
///
/// Foreign residents and taxpayers with a full exemption pay nothing. A
/// half exemption halves the levy across the whole range.
///
/// # Arguments
///
/// * `taxable_income` - Annual taxable income
/// * `input` - The calculation input
/// * `rule_set` - Rules for the input's rule-year
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::calculate_medicare_levy;
/// use take_home_engine::config::RuleBook;
/// use take_home_engine::models::{CalculationInput, RuleYear};
/// use rust_decimal::Decimal;
///
/// let rules = RuleBook::builtin().unwrap().get(RuleYear::Fy2025_26).unwrap();
/// let result = calculate_medicare_levy(Decimal::from(60_000), &CalculationInput::default(), rules, 4);
/// assert_eq!(result.levy, Decimal::from(1_200));
/// ```
pub fn calculate_medicare_levy(
    taxable_income: Decimal,
    input: &CalculationInput,
    rule_set: &RuleSet,
    step_number: u32,
) -> MedicareLevyResult {
    let rules = rule_set.medicare_levy();
    let rule_ref = rule_set.table_ref("medicare_levy");

    let exemption = if input.is_non_resident() {
        Some("foreign resident")
    } else if input.levy_reduction == LevyReduction::Full {
        Some("full exemption")
    } else {
        None
    };

    if let Some(reason) = exemption {
        let audit_step = AuditStep {
            step_number,
            rule_id: "medicare_levy".to_string(),
            rule_name: "Medicare Levy".to_string(),
            rule_ref,
            input: serde_json::json!({
                "taxable_income": taxable_income.normalize().to_string(),
                "residency": input.residency,
                "levy_reduction": input.levy_reduction
            }),
            output: serde_json::json!({
                "levy": "0",
                "levy_applied": false
            }),
            reasoning: format!("No Medicare levy: {}", reason),
        };

        return MedicareLevyResult {
            levy: Decimal::ZERO,
            thresholds: None,
            audit_step,
        };
    }

    let thresholds = levy_thresholds(input, rules);
    let factor = match input.levy_reduction {
        LevyReduction::Half => Decimal::new(5, 1),
        _ => Decimal::ONE,
    };

    let full_rate_amount = taxable_income * rules.rate;
    let (unreduced, band) = if taxable_income <= thresholds.lower {
        (Decimal::ZERO, "below lower threshold")
    } else if taxable_income >= thresholds.upper {
        (full_rate_amount, "full rate")
    } else {
        let shaded = rules.phase_in_rate * (taxable_income - thresholds.lower);
        (shaded.min(full_rate_amount), "shade-in")
    };
    let levy = unreduced * factor;

    let audit_step = AuditStep {
        step_number,
        rule_id: "medicare_levy".to_string(),
        rule_name: "Medicare Levy".to_string(),
        rule_ref,
        input: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string(),
            "family_status": input.family_status,
            "dependant_count": input.dependant_count,
            "sapto_eligible": input.sapto_eligible,
            "levy_reduction": input.levy_reduction
        }),
        output: serde_json::json!({
            "lower_threshold": thresholds.lower.normalize().to_string(),
            "upper_threshold": thresholds.upper.normalize().to_string(),
            "levy": levy.normalize().to_string(),
            "levy_applied": true
        }),
        reasoning: format!(
            "{} (thresholds ${} to ${}): levy ${} x {} = ${}",
            band,
            thresholds.lower.normalize(),
            thresholds.upper.normalize(),
            unreduced.normalize(),
            factor.normalize(),
            levy.normalize()
        ),
    };

    MedicareLevyResult {
        levy,
        thresholds: Some(thresholds),
        audit_step,
    }
}
