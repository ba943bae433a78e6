//! Calculation input model and its enumerated attributes.
//!
//! This module defines [`CalculationInput`] together with the enums that
//! classify a taxpayer: pay frequency, rule-year, residency, levy reduction
//! and family status. Every enum parses from its wire form via [`FromStr`]
//! and rejects anything else with [`EngineError::UnknownVariant`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// The highest retirement contribution rate (in percent) the engine accepts.
pub const MAX_CONTRIBUTION_RATE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// The default employer retirement contribution rate (in percent).
pub const DEFAULT_CONTRIBUTION_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

fn unknown(field: &str, value: &str) -> EngineError {
    EngineError::UnknownVariant {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// The cadence a salary figure is quoted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// 52 pay periods per year.
    Weekly,
    /// 12 pay periods per year.
    Monthly,
    /// The amount is already annual.
    #[serde(alias = "annually")]
    Annual,
}

impl PayFrequency {
    /// Returns the number of pay periods in a year for this frequency.
    ///
    /// # Examples
    ///
    /// ```
    /// use take_home_engine::models::PayFrequency;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(PayFrequency::Weekly.periods_per_year(), Decimal::from(52));
    /// assert_eq!(PayFrequency::Annual.periods_per_year(), Decimal::ONE);
    /// ```
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            PayFrequency::Weekly => Decimal::from(52),
            PayFrequency::Monthly => Decimal::from(12),
            PayFrequency::Annual => Decimal::ONE,
        }
    }

    /// Returns the wire form of this frequency.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Monthly => "monthly",
            PayFrequency::Annual => "annual",
        }
    }
}

impl FromStr for PayFrequency {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "weekly" => Ok(PayFrequency::Weekly),
            "monthly" => Ok(PayFrequency::Monthly),
            "annual" | "annually" => Ok(PayFrequency::Annual),
            other => Err(unknown("pay_frequency", other)),
        }
    }
}

/// The income year whose thresholds and rates apply.
///
/// Callers always name the rule-year explicitly; the engine never infers it
/// from the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleYear {
    /// 1 July 2024 to 30 June 2025.
    #[serde(rename = "2024-25")]
    Fy2024_25,
    /// 1 July 2025 to 30 June 2026.
    #[serde(rename = "2025-26")]
    Fy2025_26,
}

impl RuleYear {
    /// Every rule-year the engine knows about, oldest first.
    pub const ALL: [RuleYear; 2] = [RuleYear::Fy2024_25, RuleYear::Fy2025_26];

    /// Returns the calendar year in which this income year starts (on 1 July).
    pub fn start_year(&self) -> i32 {
        match self {
            RuleYear::Fy2024_25 => 2024,
            RuleYear::Fy2025_26 => 2025,
        }
    }

    /// Returns the wire form of this rule-year (e.g. "2025-26").
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleYear::Fy2024_25 => "2024-25",
            RuleYear::Fy2025_26 => "2025-26",
        }
    }
}

impl fmt::Display for RuleYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleYear {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        RuleYear::ALL
            .into_iter()
            .find(|year| year.as_str() == s)
            .ok_or_else(|| unknown("rule_year", s))
    }
}

/// Residency for tax purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Residency {
    /// Australian resident for tax purposes.
    Resident,
    /// Foreign resident for tax purposes.
    NonResident,
}

impl FromStr for Residency {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "resident" => Ok(Residency::Resident),
            "non_resident" => Ok(Residency::NonResident),
            other => Err(unknown("residency", other)),
        }
    }
}

/// Medicare levy exemption category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevyReduction {
    /// The full levy applies.
    #[default]
    None,
    /// Half-levy exemption.
    Half,
    /// Full exemption; no levy is payable.
    Full,
}

impl FromStr for LevyReduction {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "none" => Ok(LevyReduction::None),
            "half" => Ok(LevyReduction::Half),
            "full" => Ok(LevyReduction::Full),
            other => Err(unknown("levy_reduction", other)),
        }
    }
}

/// Whether the taxpayer is assessed on single or family thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyStatus {
    /// Single thresholds.
    #[default]
    Single,
    /// Family thresholds, raised per dependant beyond the first.
    Family,
}

impl FromStr for FamilyStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s {
            "single" => Ok(FamilyStatus::Single),
            "family" => Ok(FamilyStatus::Family),
            other => Err(unknown("family_status", other)),
        }
    }
}

/// The bracket table that applies to a calculation.
///
/// Exactly one schedule is selected per calculation, with precedence
/// working holiday > non-resident > resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxSchedule {
    /// Resident rates, including the tax-free threshold band.
    Resident,
    /// Foreign resident rates.
    NonResident,
    /// Working holiday maker rates.
    WorkingHoliday,
}

impl TaxSchedule {
    /// Returns the table key used in rule set configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxSchedule::Resident => "resident",
            TaxSchedule::NonResident => "non_resident",
            TaxSchedule::WorkingHoliday => "working_holiday",
        }
    }
}

/// Everything the engine needs to know about one taxpayer and salary.
///
/// Missing fields take the values from [`CalculationInput::default`]; unknown
/// fields and unknown enum values are rejected.
///
/// # Example
///
/// ```
/// use take_home_engine::models::{CalculationInput, PayFrequency, RuleYear};
/// use rust_decimal::Decimal;
///
/// let input: CalculationInput = serde_json::from_str(
///     r#"{ "salary": "1200", "pay_frequency": "weekly", "rule_year": "2025-26" }"#,
/// )
/// .unwrap();
///
/// assert_eq!(input.salary, Decimal::from(1200));
/// assert_eq!(input.pay_frequency, PayFrequency::Weekly);
/// assert_eq!(input.rule_year, RuleYear::Fy2025_26);
/// assert!(input.claims_tax_free_threshold);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculationInput {
    /// The salary as quoted, at `pay_frequency`.
    ///
    /// `Decimal` has no NaN or infinity, so non-finite text such as `"NaN"`
    /// fails deserialization. Floats from other sources go through
    /// [`amount_from_f64`](crate::calculation::amount_from_f64).
    pub salary: Decimal,
    /// The cadence `salary` is quoted at.
    pub pay_frequency: PayFrequency,
    /// Whether `salary` is a package that already includes the employer contribution.
    pub package_includes_retirement_contribution: bool,
    /// Employer retirement contribution rate in percent, within `[0, 50]`.
    pub retirement_contribution_rate: Decimal,
    /// The rule-year to calculate under.
    pub rule_year: RuleYear,
    /// Residency for tax purposes.
    pub residency: Residency,
    /// Whether the tax-free threshold is claimed with this payer.
    pub claims_tax_free_threshold: bool,
    /// Whether this is a second job; forces the threshold claim off.
    pub is_second_income_source: bool,
    /// Whether the taxpayer holds a working holiday visa.
    pub on_working_holiday_visa: bool,
    /// Whether the taxpayer has an income-contingent study or training loan.
    pub has_income_contingent_loan: bool,
    /// Whether the taxpayer holds qualifying private hospital cover.
    pub has_qualifying_insurance: bool,
    /// Medicare levy exemption category.
    pub levy_reduction: LevyReduction,
    /// Single or family thresholds.
    pub family_status: FamilyStatus,
    /// Number of dependants.
    pub dependant_count: u32,
    /// Whether the seniors and pensioners tax offset may apply.
    pub sapto_eligible: bool,
}

impl Default for CalculationInput {
    fn default() -> Self {
        Self {
            salary: Decimal::from(60_000),
            pay_frequency: PayFrequency::Annual,
            package_includes_retirement_contribution: false,
            retirement_contribution_rate: DEFAULT_CONTRIBUTION_RATE,
            rule_year: RuleYear::Fy2025_26,
            residency: Residency::Resident,
            claims_tax_free_threshold: true,
            is_second_income_source: false,
            on_working_holiday_visa: false,
            has_income_contingent_loan: false,
            has_qualifying_insurance: false,
            levy_reduction: LevyReduction::None,
            family_status: FamilyStatus::Single,
            dependant_count: 0,
            sapto_eligible: false,
        }
    }
}

impl CalculationInput {
    /// Returns the salary rounded half-up to cents, with negative values
    /// treated as zero.
    pub fn sanitized_salary(&self) -> Decimal {
        if self.salary < Decimal::ZERO {
            warn!(salary = %self.salary, "Negative salary treated as zero");
            return Decimal::ZERO;
        }
        let cents = self
            .salary
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if cents != self.salary {
            debug!(salary = %self.salary, rounded = %cents, "Salary rounded to cents");
        }
        cents
    }

    /// Returns the contribution rate clamped into `[0, 50]` percent.
    pub fn sanitized_contribution_rate(&self) -> Decimal {
        let rate = self.retirement_contribution_rate;
        if rate < Decimal::ZERO {
            warn!(rate = %rate, "Negative contribution rate treated as zero");
            Decimal::ZERO
        } else if rate > MAX_CONTRIBUTION_RATE {
            warn!(rate = %rate, "Contribution rate capped at 50%");
            MAX_CONTRIBUTION_RATE
        } else {
            rate
        }
    }

    /// Returns true if the tax-free threshold is effectively claimed.
    ///
    /// A second income source never claims the threshold, whatever
    /// `claims_tax_free_threshold` says.
    pub fn claims_threshold(&self) -> bool {
        self.claims_tax_free_threshold && !self.is_second_income_source
    }

    /// Returns the bracket schedule for this input.
    ///
    /// # Examples
    ///
    /// ```
    /// use take_home_engine::models::{CalculationInput, Residency, TaxSchedule};
    ///
    /// let input = CalculationInput {
    ///     residency: Residency::NonResident,
    ///     on_working_holiday_visa: true,
    ///     ..CalculationInput::default()
    /// };
    /// assert_eq!(input.tax_schedule(), TaxSchedule::WorkingHoliday);
    /// ```
    pub fn tax_schedule(&self) -> TaxSchedule {
        if self.on_working_holiday_visa {
            TaxSchedule::WorkingHoliday
        } else if self.residency == Residency::NonResident {
            TaxSchedule::NonResident
        } else {
            TaxSchedule::Resident
        }
    }

    /// Returns true if the taxpayer is a foreign resident.
    pub fn is_non_resident(&self) -> bool {
        self.residency == Residency::NonResident
    }
}
