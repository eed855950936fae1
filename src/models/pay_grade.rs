//! Pay grade model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::approval::{ApprovalRecord, ApprovalStatus, ConfigAudit};
use crate::error::{EngineError, EngineResult};

/// An approved salary band that an employee's base pay must fall within.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{ApprovalStatus, ConfigAudit, PayGrade};
/// use rust_decimal::Decimal;
///
/// let grade = PayGrade {
///     id: "g1".to_string(),
///     name: "Senior Engineer".to_string(),
///     min_salary: Decimal::from(8000),
///     max_salary: Decimal::from(15000),
///     currency: "EGP".to_string(),
///     status: ApprovalStatus::Approved,
///     audit: ConfigAudit::default(),
/// };
/// assert!(grade.contains(Decimal::from(10000)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayGrade {
    /// Unique identifier.
    pub id: String,
    /// Display name of the grade.
    pub name: String,
    /// Lower bound of the band (inclusive).
    pub min_salary: Decimal,
    /// Upper bound of the band (inclusive).
    pub max_salary: Decimal,
    /// ISO currency code of the band.
    pub currency: String,
    /// Approval status.
    #[serde(default = "default_status")]
    pub status: ApprovalStatus,
    /// Audit fields.
    #[serde(default)]
    pub audit: ConfigAudit,
}

fn default_status() -> ApprovalStatus {
    ApprovalStatus::Draft
}

impl PayGrade {
    /// Returns true if `salary` lies within the band.
    pub fn contains(&self, salary: Decimal) -> bool {
        salary >= self.min_salary && salary <= self.max_salary
    }
}

impl ApprovalRecord for PayGrade {
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
        if self.min_salary < Decimal::ZERO {
            return Err(EngineError::validation("min_salary", "must not be negative"));
        }
        if self.max_salary < self.min_salary {
            return Err(EngineError::validation(
                "max_salary",
                format!(
                    "must not be below min_salary ({} < {})",
                    self.max_salary, self.min_salary
                ),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(EngineError::validation("currency", "must not be empty"));
        }
        Ok(())
    }
}
