//! Calculation logic for the Payroll Engine.
//!
//! This module contains the compensation calculator (allowance resolution,
//! tax calculation, gross-to-net assembly) and the exception detector that
//! flags problems on each employee's computed pay.

mod allowance;
mod compensation;
mod exceptions;
mod tax;

pub use allowance::{AllowanceResolution, months_covered, resolve_allowance};
pub use compensation::{CompensationResult, compute_pay};
pub use exceptions::{ExceptionInput, ExceptionReport, detect_exceptions};
pub use tax::{TaxResult, calculate_tax, tax_for_amount};
