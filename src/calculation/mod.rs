//! Calculation logic for the take-home pay engine.
//!
//! This module contains the calculators for each part of a pay calculation:
//! pay frequency conversion, progressive income tax with the tax-free
//! threshold rules, the Medicare levy and its surcharge, income-contingent
//! loan repayments, and tax offsets. The orchestrator runs them in order and
//! reconciles the result.

mod bracket_tax;
mod frequency;
mod loan_repayment;
mod medicare_levy;
mod offsets;
mod orchestrator;
mod surcharge;

pub use bracket_tax::{BracketEvaluation, IncomeTaxResult, calculate_income_tax, evaluate_brackets};
pub use frequency::{amount_from_f64, from_annual, to_annual};
pub use loan_repayment::{LoanRepaymentResult, calculate_loan_repayment, repayment_for_income};
pub use medicare_levy::{LevyThresholds, MedicareLevyResult, calculate_medicare_levy, levy_thresholds};
pub use offsets::{
    OffsetContext, OffsetsResult, SeniorsOffset, TaxOffset, apply_offsets, default_offsets,
};
pub use orchestrator::{
    PackageSplit, calculate_tax, calculate_tax_with_offsets, calculate_tax_with_rules,
    split_package,
};
pub use surcharge::{SurchargeResult, calculate_surcharge};
