//! Rule set configuration for the take-home pay engine.
//!
//! This module loads each rule-year's thresholds and rates from YAML,
//! validates them once into immutable tables, and collects them into a
//! [`RuleBook`] keyed by rule-year.
//!
//! # Example
//!
//! ```no_run
//! use take_home_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/rules").unwrap();
//! println!("Loaded {} rule sets", loader.rules().len());
//! ```

mod loader;
mod rules;
mod types;

pub use loader::ConfigLoader;
pub use rules::{
    Band, BracketTable, FlatBand, LoanSchedule, MedicareLevyRules, RuleBook, RuleSet,
    SurchargeRules, SurchargeTier, WholeIncomeRule,
};
pub use types::{
    BandConfig, BracketTablesConfig, FlatBandConfig, LevyConfig, LoanScheduleConfig,
    RuleSetConfig, SurchargeConfig, SurchargeTierConfig, WholeIncomeConfig,
};
