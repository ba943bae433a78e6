//! Income-contingent loan repayment calculation.
//!
//! A rule-year's repayment schedule is either marginal (steps above a
//! repayment floor, optionally replaced by a whole-income rate for the
//! highest incomes) or a set of flat bands charging one rate on the whole
//! income.

use rust_decimal::Decimal;

use crate::config::{LoanSchedule, RuleSet};
use crate::models::{AuditStep, CalculationInput};

use super::evaluate_brackets;

/// Returns the compulsory repayment for `income` under `schedule`.
///
/// Negative incomes repay nothing.
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::repayment_for_income;
/// use take_home_engine::config::RuleBook;
/// use take_home_engine::models::RuleYear;
/// use rust_decimal::Decimal;
///
/// let rules = RuleBook::builtin().unwrap();
///
/// let marginal = rules.get(RuleYear::Fy2025_26).unwrap().loan_repayment();
/// assert_eq!(repayment_for_income(Decimal::from(80_000), marginal), Decimal::from(1_950));
///
/// let flat = rules.get(RuleYear::Fy2024_25).unwrap().loan_repayment();
/// assert_eq!(repayment_for_income(Decimal::from(60_000), flat), Decimal::from(600));
/// ```
pub fn repayment_for_income(income: Decimal, schedule: &LoanSchedule) -> Decimal {
    let income = income.max(Decimal::ZERO);

    match schedule {
        LoanSchedule::Marginal {
            table,
            whole_income,
        } => match whole_income {
            Some(rule) if income >= rule.from => income * rule.rate,
            _ => evaluate_brackets(income, table).tax,
        },
        LoanSchedule::FlatBands { bands } => bands
            .iter()
            .find(|band| band.contains(income))
            .or(bands.last())
            .map_or(Decimal::ZERO, |band| income * band.rate),
    }
}

/// The result of the loan repayment calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct LoanRepaymentResult {
    /// The compulsory repayment.
    pub repayment: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the compulsory loan repayment on base income.
///
/// Nothing is repaid unless the input carries an income-contingent loan.
///
/// # Arguments
///
/// * `income` - Annual base income
/// * `input` - The calculation input
/// * `rule_set` - Rules for the input's rule-year
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_loan_repayment(
    income: Decimal,
    input: &CalculationInput,
    rule_set: &RuleSet,
    step_number: u32,
) -> LoanRepaymentResult {
    let schedule = rule_set.loan_repayment();

    let repayment = if input.has_income_contingent_loan {
        repayment_for_income(income, schedule)
    } else {
        Decimal::ZERO
    };

    let reasoning = if input.has_income_contingent_loan {
        format!(
            "{} schedule at ${}: repayment ${}",
            schedule.kind(),
            income.normalize(),
            repayment.normalize()
        )
    } else {
        "No loan repayment - no income-contingent loan".to_string()
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "loan_repayment".to_string(),
        rule_name: "Income-Contingent Loan Repayment".to_string(),
        rule_ref: rule_set.table_ref("loan_repayment"),
        input: serde_json::json!({
            "income": income.normalize().to_string(),
            "has_income_contingent_loan": input.has_income_contingent_loan,
            "schedule": schedule.kind()
        }),
        output: serde_json::json!({
            "repayment": repayment.normalize().to_string()
        }),
        reasoning,
    };

    LoanRepaymentResult {
        repayment,
        audit_step,
    }
}
