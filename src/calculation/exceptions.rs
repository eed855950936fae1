//! Exception detection for payroll rows.
//!
//! Each rule is evaluated independently and every rule that fires adds a
//! flag; the flags are later joined into the row's free-text `exceptions`.

use crate::models::{
    BankStatus, EmployeeBase, PayBreakdown, PayGrade, PayrollException, TaxRule,
    summarize_exceptions,
};
use rust_decimal::Decimal;

/// Everything the detector looks at for one employee.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionInput<'a> {
    /// The employee's directory record.
    pub employee: &'a EmployeeBase,
    /// The computed breakdown.
    pub breakdown: &'a PayBreakdown,
    /// The employee's grade, if it is approved.
    pub grade: Option<&'a PayGrade>,
    /// The tax rule in effect, if any.
    pub tax_rule: Option<&'a TaxRule>,
}

/// What the detector found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionReport {
    /// Whether a bank account is on file.
    pub bank_status: BankStatus,
    /// Flags raised, in canonical order.
    pub flags: Vec<PayrollException>,
}

impl ExceptionReport {
    /// The flags joined as text, or `None` when the row is clean.
    pub fn summary(&self) -> Option<String> {
        summarize_exceptions(&self.flags)
    }
}

/// Runs every exception rule against one employee's computed pay.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{ExceptionInput, detect_exceptions};
/// use payroll_engine::models::{BankStatus, EmployeeBase, PayBreakdown};
/// use rust_decimal::Decimal;
///
/// let employee = EmployeeBase {
///     employee_id: "emp_001".to_string(),
///     name: String::new(),
///     entity: "cairo-hq".to_string(),
///     base_salary: Decimal::from(5000),
///     grade_id: "grade_x".to_string(),
///     bank_account_number: None,
/// };
/// let breakdown = PayBreakdown {
///     base_salary: Decimal::from(5000),
///     allowances: vec![],
///     bonuses: vec![],
///     refunds: vec![],
///     taxes: vec![],
///     insurances: vec![],
///     penalties: vec![],
///     gross_pay: Decimal::from(5000),
///     taxable_pay: Decimal::from(5000),
///     total_deductions: Decimal::ZERO,
///     net_pay: Decimal::from(5000),
/// };
///
/// let report = detect_exceptions(ExceptionInput {
///     employee: &employee,
///     breakdown: &breakdown,
///     grade: None,
///     tax_rule: None,
/// });
/// assert_eq!(report.bank_status, BankStatus::Missing);
/// assert_eq!(
///     report.summary().as_deref(),
///     Some("missing bank account; pay grade not approved; no applicable tax rule")
/// );
/// ```
pub fn detect_exceptions(input: ExceptionInput<'_>) -> ExceptionReport {
    let mut flags = Vec::new();

    let bank_status = if input.employee.has_bank_account() {
        BankStatus::Present
    } else {
        flags.push(PayrollException::MissingBankAccount);
        BankStatus::Missing
    };

    match input.grade {
        None => flags.push(PayrollException::PayGradeNotApproved),
        Some(grade) if !grade.contains(input.breakdown.base_salary) => {
            flags.push(PayrollException::SalaryOutsideGradeBand)
        }
        Some(_) => {}
    }

    if input.tax_rule.is_none() {
        flags.push(PayrollException::NoApplicableTaxRule);
    }

    if input.breakdown.net_pay < Decimal::ZERO {
        flags.push(PayrollException::NegativeNetPay);
    }

    ExceptionReport { bank_status, flags }
}
