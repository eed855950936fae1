//! Per-employee payroll rows.
//!
//! An [`EmployeePayrollDetail`] is produced for every employee in scope each
//! time a draft is generated, and may then be corrected by hand while the run
//! is still being reviewed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::AuditStep;
use super::money::{PayItem, round_money, sum_items};
use crate::error::{EngineError, EngineResult};

/// Whether a bank account is on file for the employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankStatus {
    /// An account number is on file.
    Present,
    /// No usable account number.
    Missing,
}

/// A data or business-rule problem on one employee's row.
///
/// Exceptions are advisory: they never block generation or submission but
/// are surfaced to reviewers and counted on the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollException {
    /// No bank account number on file.
    MissingBankAccount,
    /// The employee's pay grade is unknown or not approved.
    PayGradeNotApproved,
    /// Base salary lies outside the pay grade band.
    SalaryOutsideGradeBand,
    /// No approved tax rule is effective for the run period.
    NoApplicableTaxRule,
    /// Net pay came out below zero.
    NegativeNetPay,
    /// The employee's period adjustments could not be read; the row was
    /// computed without them.
    AdjustmentsUnavailable,
}

impl PayrollException {
    /// The reviewer-facing description.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollException::MissingBankAccount => "missing bank account",
            PayrollException::PayGradeNotApproved => "pay grade not approved",
            PayrollException::SalaryOutsideGradeBand => "salary outside grade band",
            PayrollException::NoApplicableTaxRule => "no applicable tax rule",
            PayrollException::NegativeNetPay => "negative net pay",
            PayrollException::AdjustmentsUnavailable => "adjustments unavailable",
        }
    }
}

impl std::fmt::Display for PayrollException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joins exception flags into the free-text form stored on a row.
pub fn summarize_exceptions(flags: &[PayrollException]) -> Option<String> {
    if flags.is_empty() {
        return None;
    }
    Some(
        flags
            .iter()
            .map(PayrollException::as_str)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// The itemised result of a pay computation.
///
/// Every line is already rounded to the currency minor unit, so
/// `net_pay + total_deductions == gross_pay` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayBreakdown {
    /// Base salary for the period.
    pub base_salary: Decimal,
    /// Resolved allowance amounts.
    pub allowances: Vec<PayItem>,
    /// Bonuses paid this period.
    pub bonuses: Vec<PayItem>,
    /// Refunds paid this period.
    pub refunds: Vec<PayItem>,
    /// Tax lines.
    pub taxes: Vec<PayItem>,
    /// Insurance premiums withheld.
    pub insurances: Vec<PayItem>,
    /// Penalties withheld.
    pub penalties: Vec<PayItem>,
    /// Base plus allowances, bonuses and refunds.
    pub gross_pay: Decimal,
    /// The part of gross pay subject to tax.
    pub taxable_pay: Decimal,
    /// Taxes plus insurance plus penalties.
    pub total_deductions: Decimal,
    /// Gross pay minus total deductions.
    pub net_pay: Decimal,
}

impl PayBreakdown {
    /// Sum of resolved allowances.
    pub fn allowance_total(&self) -> Decimal {
        sum_items(&self.allowances)
    }

    /// Sum of tax lines.
    pub fn tax_total(&self) -> Decimal {
        sum_items(&self.taxes)
    }
}

/// A manual correction to a single payroll row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPatch {
    /// New bank account number.
    #[serde(default)]
    pub bank_account_number: Option<String>,
    /// Net pay override.
    #[serde(default)]
    pub net_pay: Option<Decimal>,
}

/// One employee's row in a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePayrollDetail {
    /// Row identifier, stable across regenerations of the same run.
    pub id: Uuid,
    /// The run this row belongs to.
    pub run_id: Uuid,
    /// The employee.
    pub employee_id: String,
    /// Base salary.
    pub base_salary: Decimal,
    /// Sum of allowances.
    pub allowances: Decimal,
    /// Sum of taxes, insurance and penalties.
    pub deductions: Decimal,
    /// Sum of bonuses, if any were paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<Decimal>,
    /// Sum of refunds, if any were paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<Decimal>,
    /// Gross pay.
    pub gross_pay: Decimal,
    /// Tax withheld.
    pub tax: Decimal,
    /// Net pay; authoritative once overridden.
    pub net_pay: Decimal,
    /// Whether `net_pay` was set by hand.
    pub net_pay_overridden: bool,
    /// Bank account number on file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_number: Option<String>,
    /// Whether a bank account is on file.
    pub bank_status: BankStatus,
    /// Structured exception flags.
    pub exception_flags: Vec<PayrollException>,
    /// Exception flags joined as text, or null.
    pub exceptions: Option<String>,
    /// Itemised computation the payslip is built from.
    pub breakdown: PayBreakdown,
    /// How the row was computed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_steps: Vec<AuditStep>,
}

impl EmployeePayrollDetail {
    /// Derives the stable row id for an employee within a run.
    pub fn detail_id(run_id: Uuid, employee_id: &str) -> Uuid {
        Uuid::new_v5(&run_id, employee_id.as_bytes())
    }

    /// Builds a row from a computed breakdown and detected exceptions.
    pub fn new(
        run_id: Uuid,
        employee_id: &str,
        bank_account_number: Option<String>,
        breakdown: PayBreakdown,
        bank_status: BankStatus,
        mut exception_flags: Vec<PayrollException>,
    ) -> Self {
        exception_flags.sort();
        exception_flags.dedup();
        let bonus = (!breakdown.bonuses.is_empty()).then(|| sum_items(&breakdown.bonuses));
        let benefit = (!breakdown.refunds.is_empty()).then(|| sum_items(&breakdown.refunds));
        Self {
            id: Self::detail_id(run_id, employee_id),
            run_id,
            employee_id: employee_id.to_string(),
            base_salary: breakdown.base_salary,
            allowances: breakdown.allowance_total(),
            deductions: breakdown.total_deductions,
            bonus,
            benefit,
            gross_pay: breakdown.gross_pay,
            tax: breakdown.tax_total(),
            net_pay: breakdown.net_pay,
            net_pay_overridden: false,
            bank_account_number,
            bank_status,
            exceptions: summarize_exceptions(&exception_flags),
            exception_flags,
            breakdown,
            audit_steps: Vec::new(),
        }
    }

    /// Applies a manual correction.
    ///
    /// A bank account edit clears the missing-bank flag; a net pay edit marks
    /// the row as overridden and re-evaluates the negative-net flag. Nothing
    /// else is recalculated.
    pub fn apply_patch(&mut self, patch: &DetailPatch) -> EngineResult<()> {
        if patch.bank_account_number.is_none() && patch.net_pay.is_none() {
            return Err(EngineError::validation(
                "patch",
                "provide bank_account_number and/or net_pay",
            ));
        }
        if let Some(account) = &patch.bank_account_number {
            if account.trim().is_empty() {
                return Err(EngineError::validation(
                    "bank_account_number",
                    "must not be blank",
                ));
            }
        }

        if let Some(account) = &patch.bank_account_number {
            self.bank_account_number = Some(account.trim().to_string());
            self.bank_status = BankStatus::Present;
            self.set_flag(PayrollException::MissingBankAccount, false);
        }
        if let Some(net_pay) = patch.net_pay {
            self.net_pay = round_money(net_pay);
            self.net_pay_overridden = true;
            self.set_flag(PayrollException::NegativeNetPay, self.net_pay < Decimal::ZERO);
        }
        Ok(())
    }

    /// Raises an exception flag on the row.
    pub fn flag(&mut self, flag: PayrollException) {
        self.set_flag(flag, true);
    }

    fn set_flag(&mut self, flag: PayrollException, present: bool) {
        self.exception_flags.retain(|f| *f != flag);
        if present {
            self.exception_flags.push(flag);
            self.exception_flags.sort();
        }
        self.exceptions = summarize_exceptions(&self.exception_flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_breakdown(net: &str) -> PayBreakdown {
        PayBreakdown {
            base_salary: dec("10000"),
            allowances: vec![PayItem::new("Housing", dec("2000"))],
            bonuses: vec![],
            refunds: vec![],
            taxes: vec![PayItem::new("Income Tax", dec("1800"))],
            insurances: vec![],
            penalties: vec![],
            gross_pay: dec("12000"),
            taxable_pay: dec("12000"),
            total_deductions: dec("1800"),
            net_pay: dec(net),
        }
    }

    fn create_detail(flags: Vec<PayrollException>) -> EmployeePayrollDetail {
        EmployeePayrollDetail::new(
            Uuid::nil(),
            "emp_001",
            None,
            create_breakdown("10200"),
            BankStatus::Missing,
            flags,
        )
    }

    #[test]
    fn test_summary_joins_in_canonical_order() {
        let detail = create_detail(vec![
            PayrollException::NegativeNetPay,
            PayrollException::MissingBankAccount,
        ]);
        assert_eq!(
            detail.exceptions.as_deref(),
            Some("missing bank account; negative net pay")
        );
    }

    #[test]
    fn test_no_flags_means_null_exceptions() {
        let detail = create_detail(vec![]);
        assert!(detail.exceptions.is_none());
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json["exceptions"].is_null());
    }

    #[test]
    fn test_row_summary_fields_come_from_breakdown() {
        let detail = create_detail(vec![]);
        assert_eq!(detail.allowances, dec("2000"));
        assert_eq!(detail.tax, dec("1800"));
        assert_eq!(detail.deductions, dec("1800"));
        assert_eq!(detail.net_pay, dec("10200"));
        assert!(detail.bonus.is_none());
        assert!(detail.benefit.is_none());
    }

    #[test]
    fn test_detail_id_is_stable_per_run_and_employee() {
        let run_id = Uuid::new_v4();
        assert_eq!(
            EmployeePayrollDetail::detail_id(run_id, "emp_001"),
            EmployeePayrollDetail::detail_id(run_id, "emp_001")
        );
        assert_ne!(
            EmployeePayrollDetail::detail_id(run_id, "emp_001"),
            EmployeePayrollDetail::detail_id(run_id, "emp_002")
        );
    }

    #[test]
    fn test_bank_patch_clears_missing_flag() {
        let mut detail = create_detail(vec![PayrollException::MissingBankAccount]);
        detail
            .apply_patch(&DetailPatch {
                bank_account_number: Some(" EG12 ".to_string()),
                net_pay: None,
            })
            .unwrap();

        assert_eq!(detail.bank_status, BankStatus::Present);
        assert_eq!(detail.bank_account_number.as_deref(), Some("EG12"));
        assert!(detail.exceptions.is_none());
    }

    #[test]
    fn test_net_override_is_not_clamped() {
        let mut detail = create_detail(vec![]);
        detail
            .apply_patch(&DetailPatch {
                bank_account_number: None,
                net_pay: Some(dec("-50")),
            })
            .unwrap();

        assert!(detail.net_pay_overridden);
        assert_eq!(detail.net_pay, dec("-50"));
        assert_eq!(detail.exceptions.as_deref(), Some("negative net pay"));
        // breakdown keeps the computed figure
        assert_eq!(detail.breakdown.net_pay, dec("10200"));
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let mut detail = create_detail(vec![]);
        let before = detail.clone();
        assert!(matches!(
            detail.apply_patch(&DetailPatch::default()),
            Err(EngineError::Validation { .. })
        ));
        assert_eq!(detail, before);
    }

    #[test]
    fn test_blank_bank_account_patch_is_rejected() {
        let mut detail = create_detail(vec![]);
        let result = detail.apply_patch(&DetailPatch {
            bank_account_number: Some("  ".to_string()),
            net_pay: Some(dec("1")),
        });
        assert!(result.is_err());
        assert_eq!(detail.net_pay, dec("10200"));
    }
}
