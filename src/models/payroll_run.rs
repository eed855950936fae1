//! Payroll run model.
//!
//! A [`PayrollRun`] is one period's payroll batch for an entity. Its status is
//! governed by the approval workflow; its aggregates are owned by the run
//! engine and recomputed whenever the employee rows change.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EmployeePayrollDetail;

/// Workflow status of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Being prepared by the payroll specialist.
    #[serde(rename = "draft")]
    Draft,
    /// Submitted to the payroll manager.
    #[serde(rename = "under review")]
    UnderReview,
    /// Approved by the manager, awaiting finance.
    #[serde(rename = "pending finance approval")]
    PendingFinanceApproval,
    /// Approved by finance and paid.
    #[serde(rename = "approved")]
    Approved,
    /// Frozen after approval.
    #[serde(rename = "locked")]
    Locked,
    /// Sent back by the manager or finance.
    #[serde(rename = "rejected")]
    Rejected,
}

impl RunStatus {
    /// Every status, in workflow order.
    pub const ALL: [RunStatus; 6] = [
        RunStatus::Draft,
        RunStatus::UnderReview,
        RunStatus::PendingFinanceApproval,
        RunStatus::Approved,
        RunStatus::Locked,
        RunStatus::Rejected,
    ];

    /// The status label used in messages and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Draft => "draft",
            RunStatus::UnderReview => "under review",
            RunStatus::PendingFinanceApproval => "pending finance approval",
            RunStatus::Approved => "approved",
            RunStatus::Locked => "locked",
            RunStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the run's net pay has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet paid.
    Pending,
    /// Paid on finance approval.
    Paid,
}

/// Formats the month of a payroll period as `YYYY-MM`.
pub fn period_key(period: NaiveDate) -> String {
    format!("{:04}-{:02}", period.year(), period.month())
}

/// Returns true if two dates fall in the same payroll month.
pub fn same_period(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// One payroll batch for an entity and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier for the run.
    pub run_id: Uuid,
    /// Any date in the month being paid.
    pub payroll_period: NaiveDate,
    /// The legal entity being paid.
    pub entity: String,
    /// Workflow status.
    pub status: RunStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Number of employee rows.
    pub employees: usize,
    /// Sum of gross pay across rows.
    pub total_gross_pay: Decimal,
    /// Sum of net pay across rows.
    pub total_net_pay: Decimal,
    /// Number of rows carrying at least one exception.
    pub exception_count: usize,
    /// Why the run was last rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// When the specialist submitted the run for review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the manager approved the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_approval_date: Option<DateTime<Utc>>,
    /// Comments left by the manager on approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_comments: Option<String>,
    /// When finance approved (and paid) the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finance_approval_date: Option<DateTime<Utc>>,
    /// When the run was last locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    /// Why the run was last unlocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_reason: Option<String>,
    /// When the draft rows were last generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the run was last modified.
    pub updated_at: DateTime<Utc>,
}

impl PayrollRun {
    /// Creates an empty draft run.
    pub fn new(entity: impl Into<String>, payroll_period: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            payroll_period,
            entity: entity.into(),
            status: RunStatus::Draft,
            payment_status: PaymentStatus::Pending,
            employees: 0,
            total_gross_pay: Decimal::ZERO,
            total_net_pay: Decimal::ZERO,
            exception_count: 0,
            rejection_reason: None,
            submitted_at: None,
            manager_approval_date: None,
            manager_comments: None,
            finance_approval_date: None,
            locked_at: None,
            unlock_reason: None,
            generated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The `YYYY-MM` key used for the one-run-per-entity-and-period rule.
    pub fn period_key(&self) -> String {
        period_key(self.payroll_period)
    }

    /// Recomputes count and totals from the run's employee rows.
    pub fn recompute_aggregates(&mut self, details: &[EmployeePayrollDetail]) {
        self.employees = details.len();
        self.total_gross_pay = details.iter().map(|d| d.gross_pay).sum();
        self.total_net_pay = details.iter().map(|d| d.net_pay).sum();
        self.exception_count = details.iter().filter(|d| d.exceptions.is_some()).count();
    }
}
