//! Approval lifecycle shared by every configuration record.
//!
//! Pay grades, allowances and tax rules all move through
//! `DRAFT -> PENDING_APPROVAL -> APPROVED | REJECTED`. Only approved records
//! are ever visible to the calculator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Approval status of a configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Being edited; not yet submitted.
    Draft,
    /// Submitted and awaiting a decision.
    PendingApproval,
    /// Approved and usable by the calculator.
    Approved,
    /// Rejected; may be edited and resubmitted.
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Draft => write!(f, "DRAFT"),
            ApprovalStatus::PendingApproval => write!(f, "PENDING_APPROVAL"),
            ApprovalStatus::Approved => write!(f, "APPROVED"),
            ApprovalStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Audit fields carried by every configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigAudit {
    /// When the record was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Who created the record.
    #[serde(default)]
    pub created_by: Option<String>,
    /// When the record was last submitted for approval.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the record was approved.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    /// Who approved the record.
    #[serde(default)]
    pub approved_by: Option<String>,
    /// When the record was rejected.
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    /// Why the record was rejected.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Lifecycle bookkeeping for a configuration record.
///
/// Implemented by [`PayGrade`](super::PayGrade), [`Allowance`](super::Allowance)
/// and [`TaxRule`](super::TaxRule) so the configuration store can drive all
/// three through one code path.
pub trait ApprovalRecord {
    /// The record's identifier.
    fn id(&self) -> &str;
    /// The current approval status.
    fn status(&self) -> ApprovalStatus;
    /// Mutable access to the status.
    fn status_mut(&mut self) -> &mut ApprovalStatus;
    /// Mutable access to the audit fields.
    fn audit_mut(&mut self) -> &mut ConfigAudit;
    /// Checks the record's field invariants.
    fn validate(&self) -> EngineResult<()>;

    /// Moves a draft (or rejected) record to pending approval.
    fn submit(&mut self) -> EngineResult<()> {
        match self.status() {
            ApprovalStatus::Draft | ApprovalStatus::Rejected => {
                *self.status_mut() = ApprovalStatus::PendingApproval;
                let audit = self.audit_mut();
                audit.submitted_at = Some(Utc::now());
                audit.rejection_reason = None;
                Ok(())
            }
            current => Err(lifecycle_conflict("submit for approval", current, "DRAFT or REJECTED")),
        }
    }

    /// Approves a pending record.
    fn approve(&mut self, approver: &str) -> EngineResult<()> {
        match self.status() {
            ApprovalStatus::PendingApproval => {
                *self.status_mut() = ApprovalStatus::Approved;
                let audit = self.audit_mut();
                audit.approved_at = Some(Utc::now());
                audit.approved_by = Some(approver.to_string());
                Ok(())
            }
            current => Err(lifecycle_conflict("approve", current, "PENDING_APPROVAL")),
        }
    }

    /// Rejects a pending record. The reason must not be blank.
    fn reject(&mut self, reason: &str) -> EngineResult<()> {
        if reason.trim().is_empty() {
            return Err(EngineError::validation("reason", "rejection requires a reason"));
        }
        match self.status() {
            ApprovalStatus::PendingApproval => {
                *self.status_mut() = ApprovalStatus::Rejected;
                let audit = self.audit_mut();
                audit.rejected_at = Some(Utc::now());
                audit.rejection_reason = Some(reason.trim().to_string());
                Ok(())
            }
            current => Err(lifecycle_conflict("reject", current, "PENDING_APPROVAL")),
        }
    }
}

fn lifecycle_conflict(action: &str, current: ApprovalStatus, required: &str) -> EngineError {
    EngineError::StateConflict {
        action: action.to_string(),
        current: current.to_string(),
        required: required.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ApprovalStatus::PendingApproval).unwrap(),
            "\"PENDING_APPROVAL\""
        );
        let status: ApprovalStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert_eq!(status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_approval_status_display_matches_serialized_form() {
        assert_eq!(ApprovalStatus::Draft.to_string(), "DRAFT");
        assert_eq!(ApprovalStatus::Rejected.to_string(), "REJECTED");
    }
}
