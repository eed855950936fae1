//! Role-based authorization for payroll run actions.
//!
//! Every action a role may take, and the run statuses it may take it in, is
//! listed once in [`AUTHORIZATION_TABLE`]. Anything not in the table is
//! refused.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::RunStatus::{
    self, Approved, Draft, Locked, PendingFinanceApproval, Rejected, UnderReview,
};

/// The role an actor holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Prepares runs and corrects rows.
    PayrollSpecialist,
    /// Reviews runs, approves or rejects them, locks and unlocks.
    PayrollManager,
    /// Gives final approval and releases payment.
    FinanceStaff,
    /// Administers the system; holds no payroll rights.
    SystemAdmin,
}

impl Role {
    /// Every role.
    pub const ALL: [Role; 4] = [
        Role::PayrollSpecialist,
        Role::PayrollManager,
        Role::FinanceStaff,
        Role::SystemAdmin,
    ];

    /// Label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PayrollSpecialist => "payroll specialist",
            Role::PayrollManager => "payroll manager",
            Role::FinanceStaff => "finance staff",
            Role::SystemAdmin => "system admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something an actor can do to a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Open a new run.
    CreateRun,
    /// (Re)generate the employee rows.
    GenerateDraft,
    /// Move the run to another period.
    EditPayrollPeriod,
    /// Correct a row's bank account or net pay.
    EditDetail,
    /// Send the draft for review.
    Submit,
    /// Forward to finance.
    ManagerApprove,
    /// Send back from review.
    ManagerReject,
    /// Final approval; issues payslips.
    FinanceApprove,
    /// Send back from finance.
    FinanceReject,
    /// Freeze an approved run.
    Lock,
    /// Unfreeze a locked run.
    Unlock,
    /// Return a rejected run to draft.
    Reopen,
}

impl WorkflowAction {
    /// Every action.
    pub const ALL: [WorkflowAction; 12] = [
        WorkflowAction::CreateRun,
        WorkflowAction::GenerateDraft,
        WorkflowAction::EditPayrollPeriod,
        WorkflowAction::EditDetail,
        WorkflowAction::Submit,
        WorkflowAction::ManagerApprove,
        WorkflowAction::ManagerReject,
        WorkflowAction::FinanceApprove,
        WorkflowAction::FinanceReject,
        WorkflowAction::Lock,
        WorkflowAction::Unlock,
        WorkflowAction::Reopen,
    ];

    /// Label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::CreateRun => "create payroll run",
            WorkflowAction::GenerateDraft => "generate draft",
            WorkflowAction::EditPayrollPeriod => "edit payroll period",
            WorkflowAction::EditDetail => "edit payroll detail",
            WorkflowAction::Submit => "submit for review",
            WorkflowAction::ManagerApprove => "approve by manager",
            WorkflowAction::ManagerReject => "reject by manager",
            WorkflowAction::FinanceApprove => "approve by finance",
            WorkflowAction::FinanceReject => "reject by finance",
            WorkflowAction::Lock => "lock run",
            WorkflowAction::Unlock => "unlock run",
            WorkflowAction::Reopen => "reopen run",
        }
    }

    /// Whether the action must carry a non-blank reason.
    pub fn requires_reason(&self) -> bool {
        matches!(
            self,
            WorkflowAction::ManagerReject | WorkflowAction::FinanceReject | WorkflowAction::Unlock
        )
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the authorization table.
#[derive(Debug, Clone, Copy)]
pub struct Permission {
    /// The action.
    pub action: WorkflowAction,
    /// The role allowed to take it.
    pub role: Role,
    /// The run statuses it may be taken in. Empty for actions that do not
    /// act on an existing run.
    pub statuses: &'static [RunStatus],
}

/// Who may do what, and when.
pub const AUTHORIZATION_TABLE: &[Permission] = &[
    Permission {
        action: WorkflowAction::CreateRun,
        role: Role::PayrollSpecialist,
        statuses: &[],
    },
    Permission {
        action: WorkflowAction::GenerateDraft,
        role: Role::PayrollSpecialist,
        statuses: &[Draft],
    },
    Permission {
        action: WorkflowAction::EditPayrollPeriod,
        role: Role::PayrollSpecialist,
        statuses: &[Draft],
    },
    Permission {
        action: WorkflowAction::EditDetail,
        role: Role::PayrollSpecialist,
        statuses: &[Draft, UnderReview],
    },
    Permission {
        action: WorkflowAction::EditDetail,
        role: Role::PayrollManager,
        statuses: &[UnderReview, Approved],
    },
    Permission {
        action: WorkflowAction::Submit,
        role: Role::PayrollSpecialist,
        statuses: &[Draft],
    },
    Permission {
        action: WorkflowAction::ManagerApprove,
        role: Role::PayrollManager,
        statuses: &[UnderReview],
    },
    Permission {
        action: WorkflowAction::ManagerReject,
        role: Role::PayrollManager,
        statuses: &[UnderReview],
    },
    Permission {
        action: WorkflowAction::FinanceApprove,
        role: Role::FinanceStaff,
        statuses: &[PendingFinanceApproval],
    },
    Permission {
        action: WorkflowAction::FinanceReject,
        role: Role::FinanceStaff,
        statuses: &[PendingFinanceApproval],
    },
    Permission {
        action: WorkflowAction::Lock,
        role: Role::PayrollManager,
        statuses: &[Approved],
    },
    Permission {
        action: WorkflowAction::Unlock,
        role: Role::PayrollManager,
        statuses: &[Locked],
    },
    Permission {
        action: WorkflowAction::Reopen,
        role: Role::PayrollSpecialist,
        statuses: &[Rejected],
    },
];

/// The statuses `role` may take `action` in, or `None` if it may not take it
/// at all.
pub fn allowed_statuses(action: WorkflowAction, role: Role) -> Option<&'static [RunStatus]> {
    AUTHORIZATION_TABLE
        .iter()
        .find(|p| p.action == action && p.role == role)
        .map(|p| p.statuses)
}

/// Like [`allowed_statuses`] but fails with `Unauthorized`.
///
/// # Example
///
/// ```
/// use payroll_engine::models::RunStatus;
/// use payroll_engine::workflow::{Role, WorkflowAction, authorize};
///
/// let statuses = authorize(WorkflowAction::Lock, Role::PayrollManager)?;
/// assert_eq!(statuses, &[RunStatus::Approved]);
/// assert!(authorize(WorkflowAction::Lock, Role::FinanceStaff).is_err());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub fn authorize(action: WorkflowAction, role: Role) -> EngineResult<&'static [RunStatus]> {
    allowed_statuses(action, role).ok_or_else(|| EngineError::Unauthorized {
        role: role.to_string(),
        action: action.to_string(),
    })
}

/// Something an actor can do to a configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigAction {
    /// Create a draft record.
    Create,
    /// Submit a draft or rejected record.
    Submit,
    /// Approve a pending record.
    Approve,
    /// Reject a pending record.
    Reject,
}

impl ConfigAction {
    /// Label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigAction::Create => "create configuration",
            ConfigAction::Submit => "submit configuration",
            ConfigAction::Approve => "approve configuration",
            ConfigAction::Reject => "reject configuration",
        }
    }

    fn roles(&self) -> &'static [Role] {
        match self {
            ConfigAction::Create | ConfigAction::Submit => {
                &[Role::PayrollSpecialist, Role::SystemAdmin]
            }
            ConfigAction::Approve | ConfigAction::Reject => &[Role::PayrollManager],
        }
    }
}

/// Fails with `Unauthorized` unless `role` may take the configuration action.
pub fn authorize_config(action: ConfigAction, role: Role) -> EngineResult<()> {
    if action.roles().contains(&role) {
        return Ok(());
    }
    Err(EngineError::Unauthorized {
        role: role.to_string(),
        action: action.as_str().to_string(),
    })
}
