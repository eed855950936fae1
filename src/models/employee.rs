//! Employee compensation records as supplied by the employee directory.
//!
//! This module defines [`EmployeeBase`], the slice of an employee profile the
//! payroll engine needs, and [`Adjustments`], the one-off bonuses, refunds,
//! penalties and insurance premiums recorded for an employee in one period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{PayItem, sum_items};
use crate::error::{EngineError, EngineResult};

/// Compensation data for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeBase {
    /// Unique identifier for the employee.
    pub employee_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// The legal entity / company the employee is paid by.
    pub entity: String,
    /// Contracted monthly base salary.
    pub base_salary: Decimal,
    /// The assigned pay grade.
    pub grade_id: String,
    /// Bank account the net pay is transferred to.
    #[serde(default)]
    pub bank_account_number: Option<String>,
}

impl EmployeeBase {
    /// Checks the record before it is accepted into a directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::EmployeeBase;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = EmployeeBase {
    ///     employee_id: "emp_001".to_string(),
    ///     name: "Mona Adel".to_string(),
    ///     entity: "cairo-hq".to_string(),
    ///     base_salary: Decimal::from(-1),
    ///     grade_id: "grade_senior".to_string(),
    ///     bank_account_number: None,
    /// };
    /// assert!(employee.validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        if self.employee_id.trim().is_empty() {
            return Err(EngineError::validation("employee_id", "must not be empty"));
        }
        if self.entity.trim().is_empty() {
            return Err(EngineError::validation("entity", "must not be empty"));
        }
        if self.base_salary < Decimal::ZERO {
            return Err(EngineError::validation("base_salary", "must not be negative"));
        }
        Ok(())
    }

    /// Returns true if a non-blank bank account number is on file.
    pub fn has_bank_account(&self) -> bool {
        self.bank_account_number
            .as_deref()
            .is_some_and(|account| !account.trim().is_empty())
    }
}

/// Period-specific additions and deductions for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adjustments {
    /// Bonuses, paid and taxed with salary.
    #[serde(default)]
    pub bonuses: Vec<PayItem>,
    /// Expense refunds, paid but not taxed.
    #[serde(default)]
    pub refunds: Vec<PayItem>,
    /// Penalties, deducted from net pay.
    #[serde(default)]
    pub penalties: Vec<PayItem>,
    /// Insurance premiums, deducted from net pay.
    #[serde(default)]
    pub insurances: Vec<PayItem>,
}

impl Adjustments {
    /// Total of all bonuses.
    pub fn bonus_total(&self) -> Decimal {
        sum_items(&self.bonuses)
    }

    /// Total of all refunds.
    pub fn refund_total(&self) -> Decimal {
        sum_items(&self.refunds)
    }

    /// Rejects negative amounts; the list an item sits in determines its sign.
    pub fn validate(&self) -> EngineResult<()> {
        let lists = [
            ("bonuses", &self.bonuses),
            ("refunds", &self.refunds),
            ("penalties", &self.penalties),
            ("insurances", &self.insurances),
        ];
        for (field, items) in lists {
            if let Some(item) = items.iter().find(|item| item.amount < Decimal::ZERO) {
                return Err(EngineError::validation(
                    field,
                    format!("'{}' has a negative amount", item.name),
                ));
            }
        }
        Ok(())
    }
}
