//! Calculation result models for the take-home pay engine.
//!
//! This module contains the [`CalculationResult`] type and its associated
//! structures: the audit trace recording every rule applied, and the
//! [`PeriodBreakdown`] view that restates an annual result per pay period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::from_annual;

use super::{PayFrequency, RuleYear};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Reference to the rule table used (e.g. "2025-26/brackets/resident").
    pub rule_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The complete audit trace for a calculation.
///
/// The trace holds no timestamps or identifiers, so identical inputs always
/// produce identical traces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
}

impl AuditTrace {
    /// Returns the step recorded for `rule_id`, if any.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|step| step.rule_id == rule_id)
    }
}

/// The complete annual result of a take-home pay calculation.
///
/// # Invariants
///
/// - `take_home_annual == base_income - total_deductions`
/// - `total_deductions` is `income_tax + levy + surcharge + loan_repayment - other_offsets`
///   clamped into `[0, base_income]`
///
/// # Example
///
/// ```
/// use take_home_engine::calculation::calculate_tax;
/// use take_home_engine::models::CalculationInput;
/// use rust_decimal::Decimal;
///
/// let result = calculate_tax(&CalculationInput::default()).unwrap();
/// assert_eq!(result.take_home_annual, Decimal::from(50_012));
/// assert_eq!(
///     result.take_home_annual,
///     result.base_income - result.total_deductions
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The rule-year the calculation used.
    pub rule_year: RuleYear,
    /// The salary converted to an annual figure, before any package split.
    pub annual_gross: Decimal,
    /// Annual salary excluding the employer retirement contribution.
    pub base_income: Decimal,
    /// Annual employer retirement contribution.
    pub employer_contribution: Decimal,
    /// Annual taxable income (equal to base income; no deductions are modelled).
    pub taxable_income: Decimal,
    /// Annual income tax, including any tax-free threshold reinstatement.
    pub income_tax: Decimal,
    /// Annual Medicare levy.
    pub levy: Decimal,
    /// Annual Medicare levy surcharge.
    pub surcharge: Decimal,
    /// Annual income-contingent loan repayment.
    pub loan_repayment: Decimal,
    /// Total of all tax offsets applied.
    pub other_offsets: Decimal,
    /// Total annual deductions from base income.
    pub total_deductions: Decimal,
    /// Annual take-home pay.
    pub take_home_annual: Decimal,
    /// The marginal income tax rate of the band the taxable income falls in.
    pub marginal_rate: Decimal,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl CalculationResult {
    /// Returns take-home pay as a percentage of base income.
    ///
    /// Returns zero when base income is zero.
    pub fn take_home_percentage(&self) -> Decimal {
        if self.base_income.is_zero() {
            return Decimal::ZERO;
        }
        self.take_home_annual / self.base_income * Decimal::ONE_HUNDRED
    }

    /// Restates every monetary figure of this result per pay period.
    ///
    /// # Examples
    ///
    /// ```
    /// use take_home_engine::calculation::calculate_tax;
    /// use take_home_engine::models::{CalculationInput, PayFrequency};
    /// use rust_decimal::Decimal;
    ///
    /// let result = calculate_tax(&CalculationInput::default()).unwrap();
    /// let monthly = result.per_period(PayFrequency::Monthly);
    /// assert_eq!(monthly.base_income, Decimal::from(5_000));
    /// assert_eq!(monthly.levy, Decimal::from(100));
    /// ```
    pub fn per_period(&self, frequency: PayFrequency) -> PeriodBreakdown {
        let convert = |amount: Decimal| from_annual(amount, frequency);
        PeriodBreakdown {
            frequency,
            base_income: convert(self.base_income),
            employer_contribution: convert(self.employer_contribution),
            income_tax: convert(self.income_tax),
            levy: convert(self.levy),
            surcharge: convert(self.surcharge),
            loan_repayment: convert(self.loan_repayment),
            other_offsets: convert(self.other_offsets),
            total_deductions: convert(self.total_deductions),
            take_home: convert(self.take_home_annual),
        }
    }
}

/// A [`CalculationResult`] restated for one pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    /// The pay period the figures are expressed in.
    pub frequency: PayFrequency,
    /// Base income per period.
    pub base_income: Decimal,
    /// Employer retirement contribution per period.
    pub employer_contribution: Decimal,
    /// Income tax per period.
    pub income_tax: Decimal,
    /// Medicare levy per period.
    pub levy: Decimal,
    /// Medicare levy surcharge per period.
    pub surcharge: Decimal,
    /// Loan repayment per period.
    pub loan_repayment: Decimal,
    /// Tax offsets per period.
    pub other_offsets: Decimal,
    /// Total deductions per period.
    pub total_deductions: Decimal,
    /// Take-home pay per period.
    pub take_home: Decimal,
}
