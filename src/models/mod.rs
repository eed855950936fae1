//! Core data models for the Payroll Engine.
//!
//! This module contains the configuration records (pay grades, allowances,
//! tax rules), employee compensation data, payroll runs with their employee
//! rows, and payslips.

mod allowance;
mod approval;
mod audit;
mod employee;
mod money;
mod pay_grade;
mod payroll_detail;
mod payroll_run;
mod payslip;
mod tax_rule;

pub use allowance::{Allowance, AllowanceFrequency, AllowanceKind};
pub use approval::{ApprovalRecord, ApprovalStatus, ConfigAudit};
pub use audit::AuditStep;
pub use employee::{Adjustments, EmployeeBase};
pub use money::{MONEY_SCALE, PayItem, round_money, sum_items};
pub use pay_grade::PayGrade;
pub use payroll_detail::{
    BankStatus, DetailPatch, EmployeePayrollDetail, PayBreakdown, PayrollException,
    summarize_exceptions,
};
pub use payroll_run::{PaymentStatus, PayrollRun, RunStatus, period_key, same_period};
pub use payslip::{DeductionsDetails, EarningsDetails, PaySlip};
pub use tax_rule::{TaxBracket, TaxCalculationType, TaxRule};
