//! Take-home pay engine for Australian PAYG employees.
//!
//! This crate converts a salary quoted at any pay frequency into an annual
//! breakdown of income tax, Medicare levy, Medicare levy surcharge,
//! income-contingent loan repayments and offsets, and the resulting
//! take-home pay. Rates and thresholds for each income year are loaded from
//! validated YAML rule sets, and every calculation carries an audit trace of
//! the rules it applied.
//!
//! # Example
//!
//! ```
//! use take_home_engine::calculation::calculate_tax;
//! use take_home_engine::models::{CalculationInput, PayFrequency};
//! use rust_decimal::Decimal;
//!
//! let input = CalculationInput {
//!     salary: Decimal::from(1_200),
//!     pay_frequency: PayFrequency::Weekly,
//!     ..CalculationInput::default()
//! };
//!
//! let result = calculate_tax(&input).unwrap();
//! assert_eq!(result.annual_gross, Decimal::from(62_400));
//! assert_eq!(result.take_home_annual, result.base_income - result.total_deductions);
//! ```

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
