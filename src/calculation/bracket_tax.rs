//! Progressive income tax calculation.
//!
//! This module evaluates a [`BracketTable`] at an income and applies the
//! resident tax-free threshold rules on top of it.

use rust_decimal::Decimal;

use crate::config::{BracketTable, RuleSet};
use crate::models::{AuditStep, CalculationInput, TaxSchedule};

/// A bracket table evaluated at one amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketEvaluation {
    /// The tax computed by the table, never negative.
    pub tax: Decimal,
    /// The rate of the band the amount falls in.
    pub marginal_rate: Decimal,
    /// The index of the band the amount falls in.
    pub band_index: usize,
}

/// Evaluates a progressive table at `amount`.
///
/// The band is the highest one whose lower bound is at or below `amount`,
/// and the tax is that band's base tax plus the band rate on the excess.
/// Negative amounts owe nothing.
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::evaluate_brackets;
/// use take_home_engine::config::RuleBook;
/// use take_home_engine::models::{RuleYear, TaxSchedule};
/// use rust_decimal::Decimal;
///
/// let rules = RuleBook::builtin().unwrap().get(RuleYear::Fy2025_26).unwrap();
/// let table = rules.bracket_table(TaxSchedule::Resident);
///
/// let evaluation = evaluate_brackets(Decimal::from(60_000), table);
/// assert_eq!(evaluation.tax, Decimal::from(8_788));
/// assert_eq!(evaluation.marginal_rate, Decimal::new(30, 2));
/// ```
pub fn evaluate_brackets(amount: Decimal, table: &BracketTable) -> BracketEvaluation {
    let band_index = table.band_index_for(amount);
    let Some(band) = table.bands().get(band_index) else {
        return BracketEvaluation {
            tax: Decimal::ZERO,
            marginal_rate: Decimal::ZERO,
            band_index,
        };
    };

    let tax = if amount <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (band.cumulative_base_tax + (amount - band.lower_bound) * band.marginal_rate)
            .max(Decimal::ZERO)
    };

    BracketEvaluation {
        tax,
        marginal_rate: band.marginal_rate,
        band_index,
    }
}

/// The result of the income tax calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct IncomeTaxResult {
    /// Income tax including any threshold reinstatement.
    pub tax: Decimal,
    /// The rate of the band the taxable income falls in.
    pub marginal_rate: Decimal,
    /// Extra tax charged because the tax-free threshold was not claimed.
    pub threshold_reinstatement: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates income tax on taxable income.
///
/// The schedule is chosen by [`CalculationInput::tax_schedule`]. On the
/// resident schedule, a taxpayer who does not claim the tax-free threshold
/// (or who is on a second income source) pays the first taxed band's rate on
/// `min(taxable_income, width of that band)` on top of the table's tax.
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
/// use take_home_engine::calculation::calculate_income_tax;
/// use take_home_engine::config::RuleBook;
/// use take_home_engine::models::{CalculationInput, RuleYear};
/// use rust_decimal::Decimal;
///
/// let rules = RuleBook::builtin().unwrap().get(RuleYear::Fy2025_26).unwrap();
/// let input = CalculationInput {
///     claims_tax_free_threshold: false,
///     ..CalculationInput::default()
/// };
///
/// let result = calculate_income_tax(Decimal::from(60_000), &input, rules, 1);
/// // $8,788 from the table plus 0.16 x $26,800
/// assert_eq!(result.tax, Decimal::from(13_076));
/// ```
pub fn calculate_income_tax(
    taxable_income: Decimal,
    input: &CalculationInput,
    rule_set: &RuleSet,
    step_number: u32,
) -> IncomeTaxResult {
    let schedule = input.tax_schedule();
    let table = rule_set.bracket_table(schedule);
    let evaluation = evaluate_brackets(taxable_income, table);

    let reinstates_threshold = schedule == TaxSchedule::Resident && !input.claims_threshold();
    let threshold_reinstatement = match table.first_taxed_band() {
        Some((rate, width)) if reinstates_threshold && taxable_income > Decimal::ZERO => {
            rate * taxable_income.min(width)
        }
        _ => Decimal::ZERO,
    };

    let tax = evaluation.tax + threshold_reinstatement;

    let lower_bound = table
        .bands()
        .get(evaluation.band_index)
        .map_or(Decimal::ZERO, |band| band.lower_bound);
    let base_tax = table
        .bands()
        .get(evaluation.band_index)
        .map_or(Decimal::ZERO, |band| band.cumulative_base_tax);

    let mut reasoning = format!(
        "{} schedule: ${} + (${} - ${}) x {} = ${}",
        schedule.as_str(),
        base_tax.normalize(),
        taxable_income.normalize(),
        lower_bound.normalize(),
        evaluation.marginal_rate.normalize(),
        evaluation.tax.normalize()
    );
    if reinstates_threshold {
        reasoning.push_str(&format!(
            "; tax-free threshold not claimed, adds ${}",
            threshold_reinstatement.normalize()
        ));
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "income_tax".to_string(),
        rule_name: "Income Tax".to_string(),
        rule_ref: rule_set.table_ref(&format!("brackets/{}", schedule.as_str())),
        input: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string(),
            "schedule": schedule.as_str(),
            "claims_tax_free_threshold": input.claims_threshold()
        }),
        output: serde_json::json!({
            "band_index": evaluation.band_index,
            "table_tax": evaluation.tax.normalize().to_string(),
            "threshold_reinstatement": threshold_reinstatement.normalize().to_string(),
            "tax": tax.normalize().to_string(),
            "marginal_rate": evaluation.marginal_rate.normalize().to_string()
        }),
        reasoning,
    };

    IncomeTaxResult {
        tax,
        marginal_rate: evaluation.marginal_rate,
        threshold_reinstatement,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleBook;
    use crate::models::{Residency, RuleYear};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rules() -> &'static RuleSet {
        RuleBook::builtin()
            .unwrap()
            .get(RuleYear::Fy2025_26)
            .unwrap()
    }

    fn resident_tax(amount: &str) -> Decimal {
        evaluate_brackets(dec(amount), rules().bracket_table(TaxSchedule::Resident)).tax
    }

    /// BT-001: nothing is owed below the tax-free threshold
    #[test]
    fn test_income_below_threshold_owes_nothing() {
        assert_eq!(resident_tax("0"), Decimal::ZERO);
        assert_eq!(resident_tax("18200"), Decimal::ZERO);
    }

    /// BT-002: tax at each boundary equals the band's base tax
    #[test]
    fn test_tax_at_boundaries_equals_base_tax() {
        assert_eq!(resident_tax("45000"), dec("4288"));
        assert_eq!(resident_tax("135000"), dec("31288"));
        assert_eq!(resident_tax("190000"), dec("51638"));
    }

    /// BT-003: reference salary
    #[test]
    fn test_tax_on_60000() {
        assert_eq!(resident_tax("60000"), dec("8788"));
    }

    #[test]
    fn test_tax_in_top_band() {
        assert_eq!(resident_tax("200000"), dec("56138"));
    }

    #[test]
    fn test_lower_bound_is_inclusive_for_marginal_rate() {
        let table = rules().bracket_table(TaxSchedule::Resident);

        assert_eq!(evaluate_brackets(dec("45000"), table).marginal_rate, dec("0.30"));
        assert_eq!(evaluate_brackets(dec("44999.99"), table).marginal_rate, dec("0.16"));
    }

    #[test]
    fn test_negative_amount_owes_nothing() {
        let evaluation = evaluate_brackets(dec("-100"), rules().bracket_table(TaxSchedule::Resident));

        assert_eq!(evaluation.tax, Decimal::ZERO);
        assert_eq!(evaluation.band_index, 0);
    }

    #[test]
    fn test_non_resident_schedule() {
        let input = CalculationInput {
            residency: Residency::NonResident,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("60000"), &input, rules(), 1);

        assert_eq!(result.tax, dec("18000"));
        assert_eq!(result.marginal_rate, dec("0.30"));
        assert_eq!(result.audit_step.rule_ref, "2025-26/brackets/non_resident");
    }

    #[test]
    fn test_non_resident_top_band() {
        let input = CalculationInput {
            residency: Residency::NonResident,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("200000"), &input, rules(), 1);

        assert_eq!(result.tax, dec("65350"));
        assert_eq!(result.marginal_rate, dec("0.45"));
    }

    #[test]
    fn test_working_holiday_schedule() {
        let input = CalculationInput {
            on_working_holiday_visa: true,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("60000"), &input, rules(), 1);

        assert_eq!(result.tax, dec("11250"));
        assert_eq!(result.audit_step.input["schedule"].as_str().unwrap(), "working_holiday");
    }

    #[test]
    fn test_threshold_not_claimed_adds_reinstatement() {
        let input = CalculationInput {
            claims_tax_free_threshold: false,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("60000"), &input, rules(), 1);

        assert_eq!(result.threshold_reinstatement, dec("4288"));
        assert_eq!(result.tax, dec("13076"));
        assert_eq!(result.marginal_rate, dec("0.30"));
        assert!(result.audit_step.reasoning.contains("not claimed"));
    }

    #[test]
    fn test_reinstatement_is_capped_by_income() {
        let input = CalculationInput {
            claims_tax_free_threshold: false,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("10000"), &input, rules(), 1);

        assert_eq!(result.threshold_reinstatement, dec("1600"));
        assert_eq!(result.tax, dec("1600"));
    }

    #[test]
    fn test_second_income_source_reinstates_threshold() {
        let input = CalculationInput {
            is_second_income_source: true,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("60000"), &input, rules(), 1);

        assert_eq!(result.tax, dec("13076"));
    }

    #[test]
    fn test_non_resident_never_reinstates_threshold() {
        let input = CalculationInput {
            residency: Residency::NonResident,
            claims_tax_free_threshold: false,
            ..CalculationInput::default()
        };
        let result = calculate_income_tax(dec("60000"), &input, rules(), 1);

        assert_eq!(result.threshold_reinstatement, Decimal::ZERO);
        assert_eq!(result.tax, dec("18000"));
    }

    #[test]
    fn test_audit_step_records_calculation() {
        let result = calculate_income_tax(dec("60000"), &CalculationInput::default(), rules(), 3);

        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.rule_id, "income_tax");
        assert_eq!(result.audit_step.rule_ref, "2025-26/brackets/resident");
        assert_eq!(result.audit_step.output["tax"].as_str().unwrap(), "8788");
        assert_eq!(result.audit_step.output["band_index"].as_u64().unwrap(), 2);
        assert!(result.audit_step.reasoning.contains("$4288"));
        assert!(result.audit_step.reasoning.contains("$8788"));
    }
}
