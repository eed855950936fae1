//! Allowance model.
//!
//! An allowance is a configured extra-pay component, either a fixed amount or
//! a percentage of base salary, paid at a given frequency and optionally
//! taxable.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::approval::{ApprovalRecord, ApprovalStatus, ConfigAudit};
use crate::error::{EngineError, EngineResult};

/// How an allowance amount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowanceKind {
    /// `value` is a monetary amount.
    Fixed,
    /// `value` is a percentage of base salary.
    Percentage,
}

/// How often a fixed allowance amount is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowanceFrequency {
    /// Paid every month.
    Monthly,
    /// Amount covers a quarter.
    Quarterly,
    /// Amount covers a year.
    Annually,
    /// Paid once, in the month given by `payable_in`.
    OneTime,
}

/// A configured allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    /// Unique identifier.
    pub id: String,
    /// Display name, used as the payslip label.
    pub name: String,
    /// Fixed amount or percentage of base.
    pub kind: AllowanceKind,
    /// The amount or percentage.
    pub value: Decimal,
    /// How often the amount is granted.
    pub frequency: AllowanceFrequency,
    /// Whether the allowance counts towards taxable pay.
    #[serde(default = "default_true")]
    pub is_taxable: bool,
    /// Inactive allowances are never paid.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// For one-time allowances, any date in the month it is paid.
    #[serde(default)]
    pub payable_in: Option<NaiveDate>,
    /// Pay grades this allowance applies to; empty means every employee.
    #[serde(default)]
    pub grade_ids: Vec<String>,
    /// Approval status.
    #[serde(default = "default_status")]
    pub status: ApprovalStatus,
    /// Audit fields.
    #[serde(default)]
    pub audit: ConfigAudit,
}

fn default_true() -> bool {
    true
}

fn default_status() -> ApprovalStatus {
    ApprovalStatus::Draft
}

impl Allowance {
    /// Returns true if the allowance applies to an employee on `grade_id`.
    pub fn applies_to_grade(&self, grade_id: &str) -> bool {
        self.grade_ids.is_empty() || self.grade_ids.iter().any(|g| g == grade_id)
    }

    /// Returns true if a one-time allowance is designated for the month of `period`.
    pub fn is_payable_in(&self, period: NaiveDate) -> bool {
        self.payable_in
            .is_some_and(|d| d.year() == period.year() && d.month() == period.month())
    }
}

impl ApprovalRecord for Allowance {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ApprovalStatus {
        self.status
    }

    fn status_mut(&mut self) -> &mut ApprovalStatus {
        &mut self.status
    }

    fn audit_mut(&mut self) -> &mut ConfigAudit {
        &mut self.audit
    }

    fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::validation("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::validation("name", "must not be empty"));
        }
        if self.value < Decimal::ZERO {
            return Err(EngineError::validation("value", "must not be negative"));
        }
        if self.kind == AllowanceKind::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Err(EngineError::validation(
                "value",
                "percentage allowances must be between 0 and 100",
            ));
        }
        if self.frequency == AllowanceFrequency::OneTime && self.payable_in.is_none() {
            return Err(EngineError::validation(
                "payable_in",
                "one-time allowances need a designated month",
            ));
        }
        Ok(())
    }
}
