//! Employee directory access.
//!
//! The engine reads employee base data and per-period adjustments through the
//! [`EmployeeDirectory`] trait; [`InMemoryDirectory`] backs the server binary
//! and the tests.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::config::AdjustmentEntry;
use crate::error::{EngineError, EngineResult};
use crate::models::{Adjustments, EmployeeBase, period_key};

/// Source of employee records and their per-period adjustments.
pub trait EmployeeDirectory: Send + Sync {
    /// Every employee assigned to `entity`, ordered by employee id.
    fn employees_in_entity(&self, entity: &str) -> EngineResult<Vec<EmployeeBase>>;

    /// A single employee record.
    fn get_employee_base(&self, employee_id: &str) -> EngineResult<EmployeeBase>;

    /// Bonuses, refunds, penalties and insurances for the period's month.
    /// Employees without adjustments get an empty set.
    fn adjustments(&self, employee_id: &str, period: NaiveDate) -> EngineResult<Adjustments>;
}

/// A directory held entirely in memory.
///
/// # Example
///
/// ```
/// use payroll_engine::engine::{EmployeeDirectory, InMemoryDirectory};
/// use payroll_engine::models::EmployeeBase;
/// use rust_decimal::Decimal;
///
/// let directory = InMemoryDirectory::new(
///     vec![EmployeeBase {
///         employee_id: "emp_001".to_string(),
///         name: "Mona Adel".to_string(),
///         entity: "cairo-hq".to_string(),
///         base_salary: Decimal::from(10000),
///         grade_id: "grade_senior".to_string(),
///         bank_account_number: Some("EG380019000500000000263180002".to_string()),
///     }],
///     vec![],
/// )?;
///
/// assert_eq!(directory.employees_in_entity("cairo-hq")?.len(), 1);
/// assert!(directory.employees_in_entity("alex-branch")?.is_empty());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    employees: BTreeMap<String, EmployeeBase>,
    adjustments: HashMap<(String, String), Adjustments>,
}

impl InMemoryDirectory {
    /// Builds a directory, validating every employee and adjustment set.
    ///
    /// Adjustment entries for the same employee and month are merged.
    pub fn new(
        employees: Vec<EmployeeBase>,
        adjustments: Vec<AdjustmentEntry>,
    ) -> EngineResult<Self> {
        let mut by_id = BTreeMap::new();
        for employee in employees {
            employee.validate()?;
            if by_id.contains_key(&employee.employee_id) {
                return Err(EngineError::validation(
                    "employee_id",
                    format!("duplicate employee '{}'", employee.employee_id),
                ));
            }
            by_id.insert(employee.employee_id.clone(), employee);
        }

        let mut by_period: HashMap<(String, String), Adjustments> = HashMap::new();
        for entry in adjustments {
            entry.adjustments.validate()?;
            if !by_id.contains_key(&entry.employee_id) {
                return Err(EngineError::not_found("employee", &entry.employee_id));
            }
            let slot = by_period
                .entry((entry.employee_id, period_key(entry.period)))
                .or_default();
            let Adjustments {
                bonuses,
                refunds,
                penalties,
                insurances,
            } = entry.adjustments;
            slot.bonuses.extend(bonuses);
            slot.refunds.extend(refunds);
            slot.penalties.extend(penalties);
            slot.insurances.extend(insurances);
        }

        Ok(Self {
            employees: by_id,
            adjustments: by_period,
        })
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn employees_in_entity(&self, entity: &str) -> EngineResult<Vec<EmployeeBase>> {
        Ok(self
            .employees
            .values()
            .filter(|e| e.entity == entity)
            .cloned()
            .collect())
    }

    fn get_employee_base(&self, employee_id: &str) -> EngineResult<EmployeeBase> {
        self.employees
            .get(employee_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("employee", employee_id))
    }

    fn adjustments(&self, employee_id: &str, period: NaiveDate) -> EngineResult<Adjustments> {
        Ok(self
            .adjustments
            .get(&(employee_id.to_string(), period_key(period)))
            .cloned()
            .unwrap_or_default())
    }
}
