//! The take-home pay pipeline.
//!
//! A calculation runs once through a fixed sequence of stages: annualise the
//! salary, split a package into base income and employer contribution, then
//! compute income tax, Medicare levy, surcharge and loan repayment, apply
//! offsets, and finally reconcile the total deductions against base income.
//! Every stage appends one step to the audit trace.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{RuleBook, RuleSet};
use crate::error::EngineResult;
use crate::models::{AuditStep, AuditTrace, CalculationInput, CalculationResult};

use super::{
    OffsetContext, TaxOffset, apply_offsets, calculate_income_tax, calculate_loan_repayment,
    calculate_medicare_levy, calculate_surcharge, default_offsets, to_annual,
};

/// An annual salary divided into base income and employer contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageSplit {
    /// Salary excluding the employer retirement contribution.
    pub base_income: Decimal,
    /// The employer retirement contribution on top of base income.
    pub employer_contribution: Decimal,
}

/// Splits an annual salary into base income and employer contribution.
///
/// When the salary is a package that already includes the contribution,
/// base income is `salary / (1 + rate / 100)`; otherwise the salary is the
/// base income. The contribution is always `base_income * rate / 100`.
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::split_package;
/// use rust_decimal::Decimal;
///
/// let split = split_package(Decimal::from(67_200), true, Decimal::from(12));
/// assert_eq!(split.base_income, Decimal::from(60_000));
/// assert_eq!(split.employer_contribution, Decimal::from(7_200));
/// ```
pub fn split_package(
    annual_salary: Decimal,
    includes_contribution: bool,
    rate_percent: Decimal,
) -> PackageSplit {
    let rate = rate_percent / Decimal::ONE_HUNDRED;
    let base_income = if includes_contribution {
        annual_salary / (Decimal::ONE + rate)
    } else {
        annual_salary
    };

    PackageSplit {
        base_income,
        employer_contribution: base_income * rate,
    }
}

/// Calculates take-home pay using the built-in rule book.
///
/// # Errors
///
/// Returns [`EngineError::RuleYearNotFound`](crate::error::EngineError::RuleYearNotFound)
/// if the built-in rule book has no rule set for the input's rule-year.
///
/// # Examples
///
/// ```
/// use take_home_engine::calculation::calculate_tax;
/// use take_home_engine::models::CalculationInput;
/// use rust_decimal::Decimal;
///
/// let result = calculate_tax(&CalculationInput::default()).unwrap();
/// assert_eq!(result.income_tax, Decimal::from(8_788));
/// assert_eq!(result.levy, Decimal::from(1_200));
/// assert_eq!(result.take_home_annual, Decimal::from(50_012));
/// ```
pub fn calculate_tax(input: &CalculationInput) -> EngineResult<CalculationResult> {
    calculate_tax_with_rules(input, RuleBook::builtin()?)
}

/// Calculates take-home pay against a caller-supplied rule book, applying
/// the default offsets.
pub fn calculate_tax_with_rules(
    input: &CalculationInput,
    rules: &RuleBook,
) -> EngineResult<CalculationResult> {
    calculate_tax_with_offsets(input, rules, &default_offsets())
}

/// Calculates take-home pay against a caller-supplied rule book and offset set.
///
/// # Arguments
///
/// * `input` - The calculation input
/// * `rules` - The rule book to look the input's rule-year up in
/// * `offsets` - Offsets to apply, in order
///
/// # Errors
///
/// Returns [`EngineError::RuleYearNotFound`](crate::error::EngineError::RuleYearNotFound)
/// if `rules` has no rule set for the input's rule-year. No other failure is
/// possible once the rule set is found.
pub fn calculate_tax_with_offsets(
    input: &CalculationInput,
    rules: &RuleBook,
    offsets: &[&dyn TaxOffset],
) -> EngineResult<CalculationResult> {
    let rule_set = rules.get(input.rule_year)?;
    Ok(run_pipeline(input, rule_set, offsets))
}

fn run_pipeline(
    input: &CalculationInput,
    rule_set: &RuleSet,
    offsets: &[&dyn TaxOffset],
) -> CalculationResult {
    let mut audit_steps: Vec<AuditStep> = Vec::new();
    let mut step_number: u32 = 1;

    // Annualise
    let salary = input.sanitized_salary();
    let annual_gross = to_annual(salary, input.pay_frequency);
    audit_steps.push(annualise_step(input, salary, annual_gross, step_number));
    step_number += 1;
    debug!(annual_gross = %annual_gross, "Annualised salary");

    // Split package
    let rate_percent = input.sanitized_contribution_rate();
    let split = split_package(
        annual_gross,
        input.package_includes_retirement_contribution,
        rate_percent,
    );
    audit_steps.push(split_step(input, annual_gross, rate_percent, &split, step_number));
    step_number += 1;
    debug!(
        base_income = %split.base_income,
        employer_contribution = %split.employer_contribution,
        "Split package"
    );

    let base_income = split.base_income;
    let taxable_income = base_income;

    // Income tax
    let tax_result = calculate_income_tax(taxable_income, input, rule_set, step_number);
    audit_steps.push(tax_result.audit_step);
    step_number += 1;
    debug!(income_tax = %tax_result.tax, marginal_rate = %tax_result.marginal_rate, "Computed income tax");

    // Medicare levy
    let levy_result = calculate_medicare_levy(taxable_income, input, rule_set, step_number);
    audit_steps.push(levy_result.audit_step);
    step_number += 1;
    debug!(levy = %levy_result.levy, "Computed Medicare levy");

    // Surcharge
    let surcharge_result = calculate_surcharge(base_income, input, rule_set, step_number);
    audit_steps.push(surcharge_result.audit_step);
    step_number += 1;
    debug!(surcharge = %surcharge_result.surcharge, "Computed surcharge");

    // Loan repayment
    let loan_result = calculate_loan_repayment(base_income, input, rule_set, step_number);
    audit_steps.push(loan_result.audit_step);
    step_number += 1;
    debug!(loan_repayment = %loan_result.repayment, "Computed loan repayment");

    // Offsets
    let context = OffsetContext {
        input,
        rule_set,
        taxable_income,
        income_tax: tax_result.tax,
    };
    let offsets_result = apply_offsets(&context, offsets, step_number);
    step_number += offsets_result.audit_steps.len() as u32;
    audit_steps.extend(offsets_result.audit_steps);
    debug!(offsets = %offsets_result.total, "Applied offsets");

    // Reconcile
    let gross_deductions = tax_result.tax
        + levy_result.levy
        + surcharge_result.surcharge
        + loan_result.repayment
        - offsets_result.total;
    let total_deductions = gross_deductions.max(Decimal::ZERO).min(base_income);
    let take_home_annual = base_income - total_deductions;
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "reconcile".to_string(),
        rule_name: "Reconcile Deductions".to_string(),
        rule_ref: rule_set.table_ref("reconcile"),
        input: serde_json::json!({
            "base_income": base_income.normalize().to_string(),
            "income_tax": tax_result.tax.normalize().to_string(),
            "levy": levy_result.levy.normalize().to_string(),
            "surcharge": surcharge_result.surcharge.normalize().to_string(),
            "loan_repayment": loan_result.repayment.normalize().to_string(),
            "offsets": offsets_result.total.normalize().to_string()
        }),
        output: serde_json::json!({
            "total_deductions": total_deductions.normalize().to_string(),
            "take_home_annual": take_home_annual.normalize().to_string()
        }),
        reasoning: format!(
            "${} - ${} deductions = ${} take-home",
            base_income.normalize(),
            total_deductions.normalize(),
            take_home_annual.normalize()
        ),
    });
    debug!(
        total_deductions = %total_deductions,
        take_home_annual = %take_home_annual,
        "Reconciled deductions"
    );

    CalculationResult {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        rule_year: rule_set.rule_year(),
        annual_gross,
        base_income,
        employer_contribution: split.employer_contribution,
        taxable_income,
        income_tax: tax_result.tax,
        levy: levy_result.levy,
        surcharge: surcharge_result.surcharge,
        loan_repayment: loan_result.repayment,
        other_offsets: offsets_result.total,
        total_deductions,
        take_home_annual,
        marginal_rate: tax_result.marginal_rate,
        audit_trace: AuditTrace { steps: audit_steps },
    }
}

fn annualise_step(
    input: &CalculationInput,
    salary: Decimal,
    annual_gross: Decimal,
    step_number: u32,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "annualise".to_string(),
        rule_name: "Annualise Salary".to_string(),
        rule_ref: format!("frequency/{}", input.pay_frequency.as_str()),
        input: serde_json::json!({
            "salary": input.salary.normalize().to_string(),
            "pay_frequency": input.pay_frequency
        }),
        output: serde_json::json!({
            "annual_gross": annual_gross.normalize().to_string()
        }),
        reasoning: format!(
            "${} x {} periods = ${}",
            salary.normalize(),
            input.pay_frequency.periods_per_year(),
            annual_gross.normalize()
        ),
    }
}

fn split_step(
    input: &CalculationInput,
    annual_gross: Decimal,
    rate_percent: Decimal,
    split: &PackageSplit,
    step_number: u32,
) -> AuditStep {
    let reasoning = if input.package_includes_retirement_contribution {
        format!(
            "Package ${} / (1 + {}%) = ${} base; contribution ${}",
            annual_gross.normalize(),
            rate_percent.normalize(),
            split.base_income.normalize(),
            split.employer_contribution.normalize()
        )
    } else {
        format!(
            "Salary ${} is base income; contribution {}% = ${}",
            annual_gross.normalize(),
            rate_percent.normalize(),
            split.employer_contribution.normalize()
        )
    };

    AuditStep {
        step_number,
        rule_id: "split_package".to_string(),
        rule_name: "Split Salary Package".to_string(),
        rule_ref: "package/retirement_contribution".to_string(),
        input: serde_json::json!({
            "annual_gross": annual_gross.normalize().to_string(),
            "includes_contribution": input.package_includes_retirement_contribution,
            "rate_percent": rate_percent.normalize().to_string()
        }),
        output: serde_json::json!({
            "base_income": split.base_income.normalize().to_string(),
            "employer_contribution": split.employer_contribution.normalize().to_string()
        }),
        reasoning,
    }
}
