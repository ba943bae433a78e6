//! Tax offsets.
//!
//! An offset reduces the total amount withheld. Offsets are pluggable via the
//! [`TaxOffset`] trait; the default set holds only the seniors and pensioners
//! offset hook, which currently contributes nothing.

use rust_decimal::Decimal;

use crate::config::RuleSet;
use crate::models::{AuditStep, CalculationInput};

/// Everything an offset may inspect when computing its amount.
#[derive(Debug, Clone, Copy)]
pub struct OffsetContext<'a> {
    /// The calculation input.
    pub input: &'a CalculationInput,
    /// Rules for the input's rule-year.
    pub rule_set: &'a RuleSet,
    /// Annual taxable income.
    pub taxable_income: Decimal,
    /// Annual income tax before offsets.
    pub income_tax: Decimal,
}

/// A named reduction of the total amount withheld.
///
/// # Example
///
/// ```
/// use take_home_engine::calculation::{OffsetContext, TaxOffset};
/// use rust_decimal::Decimal;
///
/// struct FlatOffset;
///
/// impl TaxOffset for FlatOffset {
///     fn id(&self) -> &str {
///         "flat_offset"
///     }
///
///     fn name(&self) -> &str {
///         "Flat Offset"
///     }
///
///     fn amount(&self, _context: &OffsetContext<'_>) -> Decimal {
///         Decimal::from(100)
///     }
/// }
/// ```
pub trait TaxOffset: Send + Sync {
    /// Stable identifier used as the audit rule id.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// The offset amount. Negative amounts are treated as zero.
    fn amount(&self, context: &OffsetContext<'_>) -> Decimal;
}

/// The seniors and pensioners tax offset.
///
/// Eligibility is recorded but no amount is granted yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeniorsOffset;

impl TaxOffset for SeniorsOffset {
    fn id(&self) -> &str {
        "seniors_offset"
    }

    fn name(&self) -> &str {
        "Seniors and Pensioners Tax Offset"
    }

    fn amount(&self, _context: &OffsetContext<'_>) -> Decimal {
        Decimal::ZERO
    }
}

/// Returns the offsets applied by [`calculate_tax`](super::calculate_tax).
pub fn default_offsets() -> [&'static dyn TaxOffset; 1] {
    [&SeniorsOffset]
}

/// The combined result of applying a set of offsets.
#[derive(Debug, Clone)]
pub struct OffsetsResult {
    /// Sum of all offset amounts.
    pub total: Decimal,
    /// One audit step per offset, in application order.
    pub audit_steps: Vec<AuditStep>,
}

/// Applies each offset in order, numbering audit steps from `first_step`.
pub fn apply_offsets(
    context: &OffsetContext<'_>,
    offsets: &[&dyn TaxOffset],
    first_step: u32,
) -> OffsetsResult {
    let mut total = Decimal::ZERO;
    let mut audit_steps = Vec::with_capacity(offsets.len());

    for (step_number, offset) in (first_step..).zip(offsets) {
        let claimed = offset.amount(context);
        let amount = claimed.max(Decimal::ZERO);
        total += amount;

        let reasoning = if claimed < Decimal::ZERO {
            format!(
                "{}: negative amount ${} treated as $0",
                offset.name(),
                claimed.normalize()
            )
        } else {
            format!("{}: ${}", offset.name(), amount.normalize())
        };

        audit_steps.push(AuditStep {
            step_number,
            rule_id: offset.id().to_string(),
            rule_name: offset.name().to_string(),
            rule_ref: context.rule_set.table_ref(&format!("offsets/{}", offset.id())),
            input: serde_json::json!({
                "taxable_income": context.taxable_income.normalize().to_string(),
                "income_tax": context.income_tax.normalize().to_string(),
                "sapto_eligible": context.input.sapto_eligible
            }),
            output: serde_json::json!({
                "amount": amount.normalize().to_string()
            }),
            reasoning,
        });
    }

    OffsetsResult { total, audit_steps }
}
