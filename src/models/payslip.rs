//! Payslip model.
//!
//! Payslips are materialised once, when finance approves a run, and are never
//! modified afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{PayItem, sum_items};
use super::{EmployeePayrollDetail, PaymentStatus};

const MANUAL_ADJUSTMENT: &str = "Manual net pay adjustment";

/// Earnings side of a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsDetails {
    /// Base salary.
    pub base_salary: Decimal,
    /// Allowance lines.
    pub allowances: Vec<PayItem>,
    /// Bonus lines.
    pub bonuses: Vec<PayItem>,
    /// Refund lines.
    pub refunds: Vec<PayItem>,
    /// Manual net pay increase, when net pay was overridden upwards.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_adjustments: Vec<PayItem>,
}

/// Deductions side of a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionsDetails {
    /// Tax lines.
    pub taxes: Vec<PayItem>,
    /// Insurance lines.
    pub insurances: Vec<PayItem>,
    /// Penalty lines.
    pub penalties: Vec<PayItem>,
    /// Manual net pay reduction, when net pay was overridden downwards.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_adjustments: Vec<PayItem>,
}

/// An employee's payslip for one run.
///
/// Always reconciles: `net_pay == total_gross_salary - total_deductions`.
/// A manual net pay override shows up as a manual adjustment line on the
/// earnings or deductions side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaySlip {
    /// Unique identifier.
    pub id: Uuid,
    /// The run this payslip was issued from.
    pub run_id: Uuid,
    /// The employee paid.
    pub employee_id: String,
    /// The payroll period.
    pub payroll_period: NaiveDate,
    /// Earnings lines.
    pub earnings_details: EarningsDetails,
    /// Deduction lines.
    pub deductions_details: DeductionsDetails,
    /// Total gross salary.
    pub total_gross_salary: Decimal,
    /// Total deductions.
    pub total_deductions: Decimal,
    /// Net pay released; reflects a manual override when one was made.
    pub net_pay: Decimal,
    /// Payment status at issue.
    pub payment_status: PaymentStatus,
    /// When the payslip was issued.
    pub created_at: DateTime<Utc>,
}

impl PaySlip {
    /// Issues a paid payslip from a payroll row.
    pub fn from_detail(detail: &EmployeePayrollDetail, payroll_period: NaiveDate) -> Self {
        let breakdown = &detail.breakdown;
        let difference = detail.net_pay - breakdown.net_pay;
        let (earnings_adjustments, deduction_adjustments) = if difference > Decimal::ZERO {
            (vec![PayItem::new(MANUAL_ADJUSTMENT, difference)], Vec::new())
        } else if difference < Decimal::ZERO {
            (Vec::new(), vec![PayItem::new(MANUAL_ADJUSTMENT, -difference)])
        } else {
            (Vec::new(), Vec::new())
        };
        let total_gross_salary = breakdown.gross_pay + sum_items(&earnings_adjustments);
        let total_deductions = breakdown.total_deductions + sum_items(&deduction_adjustments);

        Self {
            id: Uuid::new_v4(),
            run_id: detail.run_id,
            employee_id: detail.employee_id.clone(),
            payroll_period,
            earnings_details: EarningsDetails {
                base_salary: breakdown.base_salary,
                allowances: breakdown.allowances.clone(),
                bonuses: breakdown.bonuses.clone(),
                refunds: breakdown.refunds.clone(),
                manual_adjustments: earnings_adjustments,
            },
            deductions_details: DeductionsDetails {
                taxes: breakdown.taxes.clone(),
                insurances: breakdown.insurances.clone(),
                penalties: breakdown.penalties.clone(),
                manual_adjustments: deduction_adjustments,
            },
            total_gross_salary,
            total_deductions,
            net_pay: detail.net_pay,
            payment_status: PaymentStatus::Paid,
            created_at: Utc::now(),
        }
    }
}
