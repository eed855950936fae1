//! Payroll run generation and persistence.
//!
//! This module provides:
//! - [`EmployeeDirectory`]: the source of employee records and adjustments
//! - [`PayrollStore`]: atomic storage for runs, rows and payslips
//! - [`PayrollRunEngine`]: run creation, draft generation and corrections

mod directory;
mod run_engine;
mod store;

pub use directory::{EmployeeDirectory, InMemoryDirectory};
pub use run_engine::{
    DetailEdit, ExceptionEntry, GenerationReport, PayrollRunEngine, StatusGuard, build_detail,
    describe_statuses,
};
pub use store::{InMemoryPayrollStore, PayrollStore, RunRecord, RunUpdate};
