//! Configuration types for rule sets.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML rule set files. Unknown keys are rejected.
//! They carry raw values only;
//! [`RuleSet::from_config`](super::RuleSet::from_config) validates them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::RuleYear;

/// One band of a progressive table as written in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandConfig {
    /// The income at which this band starts (inclusive).
    pub lower_bound: Decimal,
    /// The tax accumulated by all lower bands at `lower_bound`.
    pub base_tax: Decimal,
    /// The marginal rate applied above `lower_bound`.
    pub rate: Decimal,
}

/// The three income tax bracket tables of a rule-year.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BracketTablesConfig {
    /// Resident rates; the first band must be the tax-free threshold.
    pub resident: Vec<BandConfig>,
    /// Foreign resident rates.
    pub non_resident: Vec<BandConfig>,
    /// Working holiday maker rates.
    pub working_holiday: Vec<BandConfig>,
}

/// Medicare levy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevyConfig {
    /// The full levy rate (e.g. 0.02).
    pub rate: Decimal,
    /// The shade-in rate applied to income above the lower threshold.
    pub phase_in_rate: Decimal,
    /// Lower threshold for singles.
    pub single_lower: Decimal,
    /// Lower threshold for families.
    pub family_lower: Decimal,
    /// Lower threshold for singles eligible for the seniors offset.
    pub sapto_single_lower: Decimal,
    /// Lower threshold for families eligible for the seniors offset.
    pub sapto_family_lower: Decimal,
    /// Increase in the family lower threshold per dependant beyond the first.
    pub dependant_increment: Decimal,
}

/// A Medicare levy surcharge tier.
///
/// A tier without bounds is the final, unbounded tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurchargeTierConfig {
    /// Inclusive upper bound of the tier for singles.
    #[serde(default)]
    pub single_up_to: Option<Decimal>,
    /// Inclusive upper bound of the tier for families, before dependant increments.
    #[serde(default)]
    pub family_up_to: Option<Decimal>,
    /// The rate charged on the whole income when it falls in this tier.
    pub rate: Decimal,
}

/// Medicare levy surcharge parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurchargeConfig {
    /// Increase in family tier bounds per dependant beyond the first.
    pub dependant_increment: Decimal,
    /// Tiers, lowest first.
    pub tiers: Vec<SurchargeTierConfig>,
}

/// A flat-rate loan repayment band covering `[min, max)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlatBandConfig {
    /// Inclusive lower bound.
    pub min: Decimal,
    /// Exclusive upper bound; absent for the final band.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// The rate charged on the whole income.
    pub rate: Decimal,
}

/// A rate charged on the whole income once it reaches `from`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WholeIncomeConfig {
    /// The income at which the whole-income rate takes over (inclusive).
    pub from: Decimal,
    /// The rate charged on the whole income.
    pub rate: Decimal,
}

/// The loan repayment schedule of a rule-year.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum LoanScheduleConfig {
    /// Marginal steps above a floor, optionally replaced by a whole-income rate.
    Marginal {
        /// Marginal bands; the first band covers income below the floor.
        bands: Vec<BandConfig>,
        /// Optional whole-income rate for the highest incomes.
        #[serde(default)]
        whole_income: Option<WholeIncomeConfig>,
    },
    /// Contiguous bands each charging a flat rate on the whole income.
    FlatBands {
        /// Bands, lowest first.
        bands: Vec<FlatBandConfig>,
    },
}

/// A complete rule set file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    /// The rule-year this file describes.
    pub rule_year: RuleYear,
    /// First day of the income year.
    pub effective_from: NaiveDate,
    /// Last day of the income year.
    pub effective_to: NaiveDate,
    /// URL of the published rates.
    pub source_url: String,
    /// Income tax bracket tables.
    pub brackets: BracketTablesConfig,
    /// Medicare levy parameters.
    pub medicare_levy: LevyConfig,
    /// Medicare levy surcharge parameters.
    pub surcharge: SurchargeConfig,
    /// Loan repayment schedule.
    pub loan_repayment: LoanScheduleConfig,
}
