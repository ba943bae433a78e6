//! Validated rule tables.
//!
//! Every table in this module is checked once, when it is built from
//! configuration. Calculators rely on the invariants established here and
//! never re-validate at call time.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{RuleYear, TaxSchedule};

use super::loader::ConfigLoader;
use super::types::{
    BandConfig, FlatBandConfig, LevyConfig, LoanScheduleConfig, RuleSetConfig, SurchargeConfig,
};

static BUILTIN_RULES: LazyLock<EngineResult<RuleBook>> =
    LazyLock::new(|| ConfigLoader::builtin().map(ConfigLoader::into_rule_book));

fn invalid(table: &str, message: impl Into<String>) -> EngineError {
    EngineError::InvalidRuleTable {
        table: table.to_string(),
        message: message.into(),
    }
}

fn check_rate(table: &str, what: &str, rate: Decimal) -> EngineResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(invalid(
            table,
            format!("{} rate {} is outside [0, 1]", what, rate),
        ));
    }
    Ok(())
}

/// One band of a progressive table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    /// The income at which this band starts (inclusive).
    pub lower_bound: Decimal,
    /// The tax owed at exactly `lower_bound`.
    pub cumulative_base_tax: Decimal,
    /// The marginal rate applied above `lower_bound`.
    pub marginal_rate: Decimal,
}

impl From<BandConfig> for Band {
    fn from(config: BandConfig) -> Self {
        Band {
            lower_bound: config.lower_bound,
            cumulative_base_tax: config.base_tax,
            marginal_rate: config.rate,
        }
    }
}

/// A validated progressive marginal-rate table.
///
/// # Invariants
///
/// - there is at least one band and the first starts at zero with zero base tax
/// - lower bounds are strictly increasing; the last band is unbounded
/// - each band's base tax equals the tax the table computes at its lower bound
///
/// # Example
///
/// ```
/// use take_home_engine::config::{Band, BracketTable};
/// use rust_decimal::Decimal;
///
/// let bands = vec![
///     Band { lower_bound: Decimal::ZERO, cumulative_base_tax: Decimal::ZERO, marginal_rate: Decimal::ZERO },
///     Band { lower_bound: Decimal::from(1000), cumulative_base_tax: Decimal::ZERO, marginal_rate: Decimal::new(10, 2) },
/// ];
/// let table = BracketTable::new("example", bands).unwrap();
/// assert_eq!(table.bands().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    bands: Vec<Band>,
}

impl BracketTable {
    /// Builds a table, validating the band invariants.
    ///
    /// # Arguments
    ///
    /// * `table` - Name used in error messages (e.g. "2025-26/brackets/resident")
    /// * `bands` - Bands, lowest first
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRuleTable`] if any invariant does not hold.
    pub fn new(table: &str, bands: Vec<Band>) -> EngineResult<Self> {
        let Some(first) = bands.first() else {
            return Err(invalid(table, "table has no bands"));
        };
        if !first.lower_bound.is_zero() {
            return Err(invalid(
                table,
                format!("first band starts at {} instead of 0", first.lower_bound),
            ));
        }
        if !first.cumulative_base_tax.is_zero() {
            return Err(invalid(
                table,
                format!("first band has base tax {}", first.cumulative_base_tax),
            ));
        }

        for band in &bands {
            check_rate(table, "marginal", band.marginal_rate)?;
        }

        for (index, pair) in bands.windows(2).enumerate() {
            let (previous, band) = (&pair[0], &pair[1]);
            if band.lower_bound <= previous.lower_bound {
                return Err(invalid(
                    table,
                    format!(
                        "band {} lower bound {} does not exceed {}",
                        index + 1,
                        band.lower_bound,
                        previous.lower_bound
                    ),
                ));
            }

            let expected = previous.cumulative_base_tax
                + (band.lower_bound - previous.lower_bound) * previous.marginal_rate;
            if band.cumulative_base_tax != expected {
                return Err(invalid(
                    table,
                    format!(
                        "band {} base tax {} does not match computed {}",
                        index + 1,
                        band.cumulative_base_tax,
                        expected.normalize()
                    ),
                ));
            }
        }

        Ok(Self { bands })
    }

    /// Builds a table from configuration bands.
    pub fn from_config(table: &str, bands: Vec<BandConfig>) -> EngineResult<Self> {
        Self::new(table, bands.into_iter().map(Band::from).collect())
    }

    /// Returns the bands, lowest first.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Returns the index of the highest band whose lower bound is at or below `amount`.
    ///
    /// Negative amounts fall in the first band.
    pub fn band_index_for(&self, amount: Decimal) -> usize {
        self.bands
            .iter()
            .rposition(|band| band.lower_bound <= amount)
            .unwrap_or(0)
    }

    /// Returns the exclusive upper bound of band `index`, or `None` for the last band.
    pub fn upper_bound(&self, index: usize) -> Option<Decimal> {
        self.bands.get(index + 1).map(|band| band.lower_bound)
    }

    /// Returns the rate and width of the first bounded band with a non-zero rate.
    ///
    /// For a resident table this is the band immediately above the tax-free
    /// threshold.
    pub fn first_taxed_band(&self) -> Option<(Decimal, Decimal)> {
        self.bands
            .iter()
            .enumerate()
            .find(|(_, band)| !band.marginal_rate.is_zero())
            .and_then(|(index, band)| {
                self.upper_bound(index)
                    .map(|upper| (band.marginal_rate, upper - band.lower_bound))
            })
    }
}

/// Validated Medicare levy parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicareLevyRules {
    /// The full levy rate.
    pub rate: Decimal,
    /// The shade-in rate above the lower threshold.
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

impl MedicareLevyRules {
    /// Validates levy configuration.
    pub fn from_config(table: &str, config: LevyConfig) -> EngineResult<Self> {
        check_rate(table, "levy", config.rate)?;
        check_rate(table, "phase-in", config.phase_in_rate)?;
        if config.phase_in_rate <= config.rate {
            return Err(invalid(
                table,
                format!(
                    "phase-in rate {} must exceed levy rate {}",
                    config.phase_in_rate, config.rate
                ),
            ));
        }

        let thresholds = [
            ("single_lower", config.single_lower),
            ("family_lower", config.family_lower),
            ("sapto_single_lower", config.sapto_single_lower),
            ("sapto_family_lower", config.sapto_family_lower),
            ("dependant_increment", config.dependant_increment),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, value)| *value < Decimal::ZERO) {
            return Err(invalid(table, format!("{} is negative ({})", name, value)));
        }

        Ok(Self {
            rate: config.rate,
            phase_in_rate: config.phase_in_rate,
            single_lower: config.single_lower,
            family_lower: config.family_lower,
            sapto_single_lower: config.sapto_single_lower,
            sapto_family_lower: config.sapto_family_lower,
            dependant_increment: config.dependant_increment,
        })
    }

    /// Returns the upper threshold matching a lower threshold.
    ///
    /// The upper threshold is the income at which the shade-in amount reaches
    /// the full levy, so the levy is continuous there.
    pub fn upper_for(&self, lower: Decimal) -> Decimal {
        lower * self.phase_in_rate / (self.phase_in_rate - self.rate)
    }
}

/// A validated Medicare levy surcharge tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurchargeTier {
    /// Inclusive upper bound for singles; `None` on the final tier.
    pub single_up_to: Option<Decimal>,
    /// Inclusive upper bound for families before dependant increments; `None` on the final tier.
    pub family_up_to: Option<Decimal>,
    /// The rate charged on the whole income.
    pub rate: Decimal,
}

/// Validated Medicare levy surcharge parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurchargeRules {
    /// Increase in family tier bounds per dependant beyond the first.
    pub dependant_increment: Decimal,
    tiers: Vec<SurchargeTier>,
}

impl SurchargeRules {
    /// Validates surcharge configuration.
    ///
    /// Tiers must have strictly increasing bounds and exactly one final
    /// unbounded tier.
    pub fn from_config(table: &str, config: SurchargeConfig) -> EngineResult<Self> {
        if config.dependant_increment < Decimal::ZERO {
            return Err(invalid(table, "dependant increment is negative"));
        }
        let Some((last, bounded)) = config.tiers.split_last() else {
            return Err(invalid(table, "no surcharge tiers"));
        };
        if last.single_up_to.is_some() || last.family_up_to.is_some() {
            return Err(invalid(table, "final tier must be unbounded"));
        }

        let mut previous: Option<(Decimal, Decimal)> = None;
        for (index, tier) in bounded.iter().enumerate() {
            let (Some(single), Some(family)) = (tier.single_up_to, tier.family_up_to) else {
                return Err(invalid(
                    table,
                    format!("tier {} is missing a single or family bound", index),
                ));
            };
            if let Some((previous_single, previous_family)) = previous {
                if single <= previous_single || family <= previous_family {
                    return Err(invalid(
                        table,
                        format!("tier {} bounds are not strictly increasing", index),
                    ));
                }
            }
            previous = Some((single, family));
        }

        let mut tiers = Vec::with_capacity(config.tiers.len());
        for tier in config.tiers {
            check_rate(table, "surcharge", tier.rate)?;
            tiers.push(SurchargeTier {
                single_up_to: tier.single_up_to,
                family_up_to: tier.family_up_to,
                rate: tier.rate,
            });
        }

        Ok(Self {
            dependant_increment: config.dependant_increment,
            tiers,
        })
    }

    /// Returns the tiers, lowest first.
    pub fn tiers(&self) -> &[SurchargeTier] {
        &self.tiers
    }
}

/// A flat-rate loan repayment band covering `[min, max)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBand {
    /// Inclusive lower bound.
    pub min: Decimal,
    /// Exclusive upper bound; `None` for the final band.
    pub max: Option<Decimal>,
    /// The rate charged on the whole income.
    pub rate: Decimal,
}

impl FlatBand {
    /// Returns true if `amount` falls in `[min, max)`.
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && self.max.is_none_or(|max| amount < max)
    }
}

/// A rate charged on the whole income once it reaches `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WholeIncomeRule {
    /// The income at which this rule takes over (inclusive).
    pub from: Decimal,
    /// The rate charged on the whole income.
    pub rate: Decimal,
}

/// A validated loan repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanSchedule {
    /// Marginal steps above a floor, with an optional whole-income rate on top.
    Marginal {
        /// The marginal table; its first band is the zero-rate band below the floor.
        table: BracketTable,
        /// Whole-income rate for the highest incomes.
        whole_income: Option<WholeIncomeRule>,
    },
    /// Contiguous bands, each charging a flat rate on the whole income.
    FlatBands {
        /// Bands, lowest first.
        bands: Vec<FlatBand>,
    },
}

impl LoanSchedule {
    /// Validates loan schedule configuration.
    pub fn from_config(table: &str, config: LoanScheduleConfig) -> EngineResult<Self> {
        match config {
            LoanScheduleConfig::Marginal {
                bands,
                whole_income,
            } => {
                let bracket_table = BracketTable::from_config(table, bands)?;
                let whole_income = match whole_income {
                    Some(rule) => {
                        if rule.from <= Decimal::ZERO {
                            return Err(invalid(table, "whole-income threshold must be positive"));
                        }
                        check_rate(table, "whole-income", rule.rate)?;
                        Some(WholeIncomeRule {
                            from: rule.from,
                            rate: rule.rate,
                        })
                    }
                    None => None,
                };
                Ok(LoanSchedule::Marginal {
                    table: bracket_table,
                    whole_income,
                })
            }
            LoanScheduleConfig::FlatBands { bands } => Ok(LoanSchedule::FlatBands {
                bands: Self::validate_flat_bands(table, bands)?,
            }),
        }
    }

    fn validate_flat_bands(table: &str, bands: Vec<FlatBandConfig>) -> EngineResult<Vec<FlatBand>> {
        let Some(first) = bands.first() else {
            return Err(invalid(table, "no repayment bands"));
        };
        if !first.min.is_zero() {
            return Err(invalid(
                table,
                format!("first band starts at {} instead of 0", first.min),
            ));
        }

        let last_index = bands.len() - 1;
        for (index, band) in bands.iter().enumerate() {
            check_rate(table, "repayment", band.rate)?;
            match (band.max, bands.get(index + 1)) {
                (Some(max), Some(next)) => {
                    if max <= band.min {
                        return Err(invalid(
                            table,
                            format!("band {} is empty: [{}, {})", index, band.min, max),
                        ));
                    }
                    if next.min != max {
                        return Err(invalid(
                            table,
                            format!(
                                "band {} ends at {} but band {} starts at {}",
                                index,
                                max,
                                index + 1,
                                next.min
                            ),
                        ));
                    }
                }
                (None, None) => {}
                (Some(_), None) => {
                    return Err(invalid(table, format!("final band {} must be unbounded", last_index)));
                }
                (None, Some(_)) => {
                    return Err(invalid(
                        table,
                        format!("band {} is unbounded but is not the final band", index),
                    ));
                }
            }
        }

        Ok(bands
            .into_iter()
            .map(|band| FlatBand {
                min: band.min,
                max: band.max,
                rate: band.rate,
            })
            .collect())
    }

    /// Returns the configuration name of this schedule's shape.
    pub fn kind(&self) -> &'static str {
        match self {
            LoanSchedule::Marginal { .. } => "marginal",
            LoanSchedule::FlatBands { .. } => "flat_bands",
        }
    }
}

/// All validated rules for one rule-year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rule_year: RuleYear,
    effective_from: NaiveDate,
    effective_to: NaiveDate,
    source_url: String,
    resident: BracketTable,
    non_resident: BracketTable,
    working_holiday: BracketTable,
    medicare_levy: MedicareLevyRules,
    surcharge: SurchargeRules,
    loan_repayment: LoanSchedule,
}

impl RuleSet {
    /// Validates a rule set file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRuleTable`] naming the first table that
    /// fails validation.
    pub fn from_config(config: RuleSetConfig) -> EngineResult<Self> {
        let year = config.rule_year;
        let table = |name: &str| format!("{}/{}", year, name);

        let start = year.start_year();
        if NaiveDate::from_ymd_opt(start, 7, 1) != Some(config.effective_from)
            || NaiveDate::from_ymd_opt(start + 1, 6, 30) != Some(config.effective_to)
        {
            return Err(invalid(
                &table("metadata"),
                format!(
                    "effective dates {} to {} do not span the {} income year",
                    config.effective_from, config.effective_to, year
                ),
            ));
        }

        let resident_name = table("brackets/resident");
        let resident = BracketTable::from_config(&resident_name, config.brackets.resident)?;
        let starts_tax_free = resident
            .bands()
            .first()
            .is_some_and(|band| band.marginal_rate.is_zero());
        if !starts_tax_free || resident.first_taxed_band().is_none() {
            return Err(invalid(
                &resident_name,
                "resident table must open with a tax-free band followed by a bounded taxed band",
            ));
        }

        Ok(Self {
            rule_year: year,
            effective_from: config.effective_from,
            effective_to: config.effective_to,
            source_url: config.source_url,
            resident,
            non_resident: BracketTable::from_config(
                &table("brackets/non_resident"),
                config.brackets.non_resident,
            )?,
            working_holiday: BracketTable::from_config(
                &table("brackets/working_holiday"),
                config.brackets.working_holiday,
            )?,
            medicare_levy: MedicareLevyRules::from_config(
                &table("medicare_levy"),
                config.medicare_levy,
            )?,
            surcharge: SurchargeRules::from_config(&table("surcharge"), config.surcharge)?,
            loan_repayment: LoanSchedule::from_config(
                &table("loan_repayment"),
                config.loan_repayment,
            )?,
        })
    }

    /// Returns the rule-year these rules belong to.
    pub fn rule_year(&self) -> RuleYear {
        self.rule_year
    }

    /// Returns the first day of the income year.
    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }

    /// Returns the last day of the income year.
    pub fn effective_to(&self) -> NaiveDate {
        self.effective_to
    }

    /// Returns the URL of the published rates.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Returns the bracket table for a schedule.
    pub fn bracket_table(&self, schedule: TaxSchedule) -> &BracketTable {
        match schedule {
            TaxSchedule::Resident => &self.resident,
            TaxSchedule::NonResident => &self.non_resident,
            TaxSchedule::WorkingHoliday => &self.working_holiday,
        }
    }

    /// Returns the Medicare levy parameters.
    pub fn medicare_levy(&self) -> &MedicareLevyRules {
        &self.medicare_levy
    }

    /// Returns the Medicare levy surcharge parameters.
    pub fn surcharge(&self) -> &SurchargeRules {
        &self.surcharge
    }

    /// Returns the loan repayment schedule.
    pub fn loan_repayment(&self) -> &LoanSchedule {
        &self.loan_repayment
    }

    /// Returns an audit reference for a table of this rule set.
    pub fn table_ref(&self, name: &str) -> String {
        format!("{}/{}", self.rule_year, name)
    }
}

/// The rule sets available to the engine, one per rule-year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleBook {
    rule_sets: BTreeMap<RuleYear, RuleSet>,
}

impl RuleBook {
    /// Builds a rule book, rejecting two rule sets for the same year.
    pub fn new(rule_sets: Vec<RuleSet>) -> EngineResult<Self> {
        let mut by_year = BTreeMap::new();
        for rule_set in rule_sets {
            let year = rule_set.rule_year();
            if by_year.insert(year, rule_set).is_some() {
                return Err(EngineError::DuplicateRuleYear {
                    rule_year: year.to_string(),
                });
            }
        }
        Ok(Self { rule_sets: by_year })
    }

    /// Returns the rule book embedded in the crate.
    ///
    /// The embedded rule sets are parsed and validated on first use and shared
    /// for the life of the process.
    ///
    /// # Examples
    ///
    /// ```
    /// use take_home_engine::config::RuleBook;
    /// use take_home_engine::models::RuleYear;
    ///
    /// let rules = RuleBook::builtin().unwrap();
    /// assert!(rules.get(RuleYear::Fy2025_26).is_ok());
    /// ```
    pub fn builtin() -> EngineResult<&'static RuleBook> {
        BUILTIN_RULES.as_ref().map_err(Clone::clone)
    }

    /// Returns the rule set for a rule-year.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RuleYearNotFound`] if no rule set was loaded for it.
    pub fn get(&self, rule_year: RuleYear) -> EngineResult<&RuleSet> {
        self.rule_sets
            .get(&rule_year)
            .ok_or_else(|| EngineError::RuleYearNotFound {
                rule_year: rule_year.to_string(),
            })
    }

    /// Returns the loaded rule-years, oldest first.
    pub fn rule_years(&self) -> impl Iterator<Item = RuleYear> + '_ {
        self.rule_sets.keys().copied()
    }

    /// Returns the number of rule sets.
    pub fn len(&self) -> usize {
        self.rule_sets.len()
    }

    /// Returns true if no rule sets are loaded.
    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty()
    }
}
