//! Error types for the take-home pay engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading rule sets or
//! accepting calculation input.

use thiserror::Error;

/// The main error type for the take-home pay engine.
///
/// Numeric problems in the input never surface here: they are sanitised by the
/// calculators. Errors are reserved for configuration problems and for values
/// the engine cannot interpret.
///
/// # Example
///
/// ```
/// use take_home_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/2025-26.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/2025-26.yaml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A rule table failed validation when it was constructed.
    #[error("Invalid rule table '{table}': {message}")]
    InvalidRuleTable {
        /// The table that failed validation (e.g. "2025-26/brackets/resident").
        table: String,
        /// A description of the inconsistency.
        message: String,
    },

    /// An enumerated input field carried a value the engine does not recognise.
    #[error("Unknown value '{value}' for field '{field}'")]
    UnknownVariant {
        /// The input field being parsed.
        field: String,
        /// The unrecognised value.
        value: String,
    },

    /// The rule book holds no rule set for the requested rule-year.
    #[error("No rule set loaded for rule year {rule_year}")]
    RuleYearNotFound {
        /// The requested rule-year.
        rule_year: String,
    },

    /// Two rule sets were loaded for the same rule-year.
    #[error("Conflicting rule sets for rule year {rule_year}")]
    DuplicateRuleYear {
        /// The rule-year defined more than once.
        rule_year: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
