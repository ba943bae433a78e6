//! Core data models for the take-home pay engine.
//!
//! This module contains the calculation input record with its enumerated
//! attributes, and the result record produced for every calculation.

mod calculation_result;
mod input;

pub use calculation_result::{AuditStep, AuditTrace, CalculationResult, PeriodBreakdown};
pub use input::{
    CalculationInput, DEFAULT_CONTRIBUTION_RATE, FamilyStatus, LevyReduction,
    MAX_CONTRIBUTION_RATE, PayFrequency, Residency, RuleYear, TaxSchedule,
};
