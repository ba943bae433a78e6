//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading rule sets
//! from YAML files, either from a directory on disk or from the copies
//! embedded in the crate.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::RuleYear;

use super::rules::{RuleBook, RuleSet};
use super::types::RuleSetConfig;

/// Rule set files compiled into the crate, as `(source name, YAML)` pairs.
const BUILTIN_RULE_SETS: [(&str, &str); 2] = [
    (
        "builtin:2024-25.yaml",
        include_str!("../../config/rules/2024-25.yaml"),
    ),
    (
        "builtin:2025-26.yaml",
        include_str!("../../config/rules/2025-26.yaml"),
    ),
];

/// Loads and provides access to rule sets.
///
/// # Directory Structure
///
/// The configuration directory holds one YAML file per rule-year:
/// ```text
/// config/rules/
/// ├── 2024-25.yaml
/// └── 2025-26.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use take_home_engine::config::ConfigLoader;
/// use take_home_engine::models::RuleYear;
///
/// let loader = ConfigLoader::load("./config/rules").unwrap();
/// let rules = loader.get_rule_set(RuleYear::Fy2025_26).unwrap();
/// println!("Rules effective from {}", rules.effective_from());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    rules: RuleBook,
}

impl ConfigLoader {
    /// Loads every `*.yaml` rule set in the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The directory is missing or holds no rule set files
    /// - Any file contains invalid YAML or an unknown rule-year
    /// - Any table fails validation
    /// - Two files describe the same rule-year
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let dir = path.as_ref();
        let dir_str = dir.display().to_string();

        if !dir.is_dir() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rule set files found)", dir_str),
            });
        }

        let mut rule_sets = Vec::with_capacity(files.len());
        for file in &files {
            rule_sets.push(Self::load_rule_set(file)?);
        }

        let rules = RuleBook::new(rule_sets)?;
        info!(path = %dir_str, rule_sets = rules.len(), "Loaded rule sets");
        Ok(Self { rules })
    }

    /// Parses and validates the rule sets embedded in the crate.
    pub fn builtin() -> EngineResult<Self> {
        let rule_sets = BUILTIN_RULE_SETS
            .iter()
            .map(|(source, yaml)| Self::parse_rule_set(source, yaml))
            .collect::<EngineResult<Vec<_>>>()?;

        let rules = RuleBook::new(rule_sets)?;
        info!(rule_sets = rules.len(), "Loaded built-in rule sets");
        Ok(Self { rules })
    }

    /// Parses and validates one rule set from YAML text.
    ///
    /// # Arguments
    ///
    /// * `source` - Name used in error messages (usually the file path)
    /// * `yaml` - The rule set document
    pub fn parse_rule_set(source: &str, yaml: &str) -> EngineResult<RuleSet> {
        let config: RuleSetConfig =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::ConfigParseError {
                path: source.to_string(),
                message: e.to_string(),
            })?;

        let rule_set = RuleSet::from_config(config)?;
        debug!(source, rule_year = %rule_set.rule_year(), "Validated rule set");
        Ok(rule_set)
    }

    /// Loads and validates a single rule set file.
    fn load_rule_set(path: &Path) -> EngineResult<RuleSet> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse_rule_set(&path_str, &content)
    }

    /// Returns the loaded rule book.
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Consumes the loader, returning its rule book.
    pub fn into_rule_book(self) -> RuleBook {
        self.rules
    }

    /// Gets the rule set for a rule-year.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use take_home_engine::config::ConfigLoader;
    /// use take_home_engine::models::RuleYear;
    ///
    /// let loader = ConfigLoader::load("./config/rules")?;
    /// let rules = loader.get_rule_set(RuleYear::Fy2024_25)?;
    /// println!("Loan schedule: {}", rules.loan_repayment().kind());
    /// # Ok::<(), take_home_engine::error::EngineError>(())
    /// ```
    pub fn get_rule_set(&self, rule_year: RuleYear) -> EngineResult<&RuleSet> {
        self.rules.get(rule_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxSchedule;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/rules"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn builtin_yaml(rule_year: &str) -> &'static str {
        BUILTIN_RULE_SETS
            .iter()
            .find(|(source, _)| source.contains(rule_year))
            .map(|(_, yaml)| *yaml)
            .unwrap()
    }

    fn expect_invalid_table(result: EngineResult<RuleSet>, expected_table: &str) -> String {
        match result {
            Err(EngineError::InvalidRuleTable { table, message }) => {
                assert_eq!(table, expected_table);
                message
            }
            other => panic!("Expected InvalidRuleTable, got {:?}", other),
        }
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.rules().len(), 2);
    }

    #[test]
    fn test_loaded_directory_matches_builtin() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let builtin = ConfigLoader::builtin().unwrap();

        assert_eq!(loader.rules(), builtin.rules());
    }

    #[test]
    fn test_rule_set_metadata_loaded_correctly() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let rules = loader.get_rule_set(RuleYear::Fy2025_26).unwrap();

        assert_eq!(rules.rule_year(), RuleYear::Fy2025_26);
        assert_eq!(rules.effective_from().to_string(), "2025-07-01");
        assert_eq!(rules.effective_to().to_string(), "2026-06-30");
        assert!(rules.source_url().starts_with("https://www.ato.gov.au/"));
    }

    #[test]
    fn test_resident_brackets_loaded_correctly() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let rules = loader.get_rule_set(RuleYear::Fy2025_26).unwrap();
        let bands = rules.bracket_table(TaxSchedule::Resident).bands();

        assert_eq!(bands.len(), 5);
        assert_eq!(bands[2].lower_bound, dec("45000"));
        assert_eq!(bands[2].cumulative_base_tax, dec("4288"));
        assert_eq!(bands[2].marginal_rate, dec("0.30"));
    }

    #[test]
    fn test_surcharge_thresholds_differ_by_year() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let earlier = loader.get_rule_set(RuleYear::Fy2024_25).unwrap();
        let later = loader.get_rule_set(RuleYear::Fy2025_26).unwrap();

        assert_eq!(earlier.surcharge().tiers()[0].single_up_to, Some(dec("97000")));
        assert_eq!(later.surcharge().tiers()[0].single_up_to, Some(dec("101000")));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("/nonexistent/path"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml_returns_parse_error() {
        let result = ConfigLoader::parse_rule_set("inline.yaml", "rule_year: [unclosed");

        match result {
            Err(EngineError::ConfigParseError { path, .. }) => {
                assert_eq!(path, "inline.yaml");
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_rule_year_is_a_parse_error() {
        let yaml = builtin_yaml("2025-26").replace("rule_year: \"2025-26\"", "rule_year: \"2030-31\"");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }

    #[test]
    fn test_misspelt_loan_key_is_a_parse_error() {
        let yaml = builtin_yaml("2025-26").replace("whole_income:", "whole_incme:");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        match result {
            Err(EngineError::ConfigParseError { path, message }) => {
                assert_eq!(path, "inline.yaml");
                assert!(message.contains("whole_incme"), "message: {}", message);
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_top_level_key_is_a_parse_error() {
        let yaml = builtin_yaml("2024-25").replace("source_url:", "sauce_url:");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }

    #[test]
    fn test_unknown_levy_key_is_a_parse_error() {
        let yaml = builtin_yaml("2025-26").replace(
            "  single_lower: \"27222\"",
            "  single_lower: \"27222\"\n  singel_upper: \"34027.5\"",
        );
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }

    #[test]
    fn test_inconsistent_non_resident_table_is_rejected() {
        let yaml = builtin_yaml("2025-26").replace("60850", "61950");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        let message = expect_invalid_table(result, "2025-26/brackets/non_resident");
        assert!(message.contains("61950"));
        assert!(message.contains("60850"));
    }

    #[test]
    fn test_loan_band_gap_is_rejected() {
        let yaml = builtin_yaml("2024-25").replace("max: \"62851\"", "max: \"62800\"");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        let message = expect_invalid_table(result, "2024-25/loan_repayment");
        assert!(message.contains("ends at 62800"));
    }

    #[test]
    fn test_effective_dates_must_span_income_year() {
        let yaml = builtin_yaml("2025-26").replace(
            "effective_from: \"2025-07-01\"",
            "effective_from: \"2025-01-01\"",
        );
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        expect_invalid_table(result, "2025-26/metadata");
    }

    #[test]
    fn test_levy_phase_in_below_rate_is_rejected() {
        let yaml = builtin_yaml("2025-26").replace("phase_in_rate: \"0.10\"", "phase_in_rate: \"0.01\"");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        expect_invalid_table(result, "2025-26/medicare_levy");
    }

    #[test]
    fn test_surcharge_tiers_must_increase() {
        let yaml = builtin_yaml("2025-26").replace("single_up_to: \"118000\"", "single_up_to: \"90000\"");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        let message = expect_invalid_table(result, "2025-26/surcharge");
        assert!(message.contains("strictly increasing"));
    }

    #[test]
    fn test_marginal_loan_base_must_be_consistent() {
        let yaml = builtin_yaml("2025-26").replace("base_tax: \"8700\"", "base_tax: \"8000\"");
        let result = ConfigLoader::parse_rule_set("inline.yaml", &yaml);

        expect_invalid_table(result, "2025-26/loan_repayment");
    }
}
