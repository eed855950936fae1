//! The payroll run approval state machine.
//!
//! [`ApprovalWorkflow`] is the single entry point for acting on runs as a
//! user. Each call checks, in order: the actor's role, any required reason,
//! the run's status, then action-specific preconditions. Status and
//! preconditions are checked inside the store's atomic update, so a run is
//! never left half-transitioned.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::authorization::{Role, WorkflowAction, authorize};
use crate::engine::{DetailEdit, GenerationReport, PayrollRunEngine, RunRecord, StatusGuard};
use crate::error::{EngineError, EngineResult};
use crate::models::{DetailPatch, PaySlip, PaymentStatus, PayrollRun, RunStatus};

/// The user performing an action, as asserted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id, recorded in logs.
    pub id: String,
    /// The role the user acts in.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// A status transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Transition {
    /// draft → under review.
    Submit,
    /// under review → pending finance approval.
    ManagerApprove {
        /// Optional review comments.
        #[serde(default)]
        comments: Option<String>,
    },
    /// under review → rejected.
    ManagerReject {
        /// Why the run was sent back.
        reason: String,
    },
    /// pending finance approval → approved; issues payslips.
    FinanceApprove,
    /// pending finance approval → rejected.
    FinanceReject {
        /// Why the run was sent back.
        reason: String,
    },
    /// approved → locked.
    Lock,
    /// locked → approved.
    Unlock {
        /// Why the run is being unfrozen.
        reason: String,
    },
    /// rejected → draft.
    Reopen,
}

impl Transition {
    /// The authorization table entry this transition is checked against.
    pub fn action(&self) -> WorkflowAction {
        match self {
            Transition::Submit => WorkflowAction::Submit,
            Transition::ManagerApprove { .. } => WorkflowAction::ManagerApprove,
            Transition::ManagerReject { .. } => WorkflowAction::ManagerReject,
            Transition::FinanceApprove => WorkflowAction::FinanceApprove,
            Transition::FinanceReject { .. } => WorkflowAction::FinanceReject,
            Transition::Lock => WorkflowAction::Lock,
            Transition::Unlock { .. } => WorkflowAction::Unlock,
            Transition::Reopen => WorkflowAction::Reopen,
        }
    }

    fn reason(&self) -> Option<&str> {
        match self {
            Transition::ManagerReject { reason }
            | Transition::FinanceReject { reason }
            | Transition::Unlock { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Result of a transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    /// The updated run.
    pub run: PayrollRun,
    /// Payslips issued by this transition (finance approval only).
    pub payslips: Vec<PaySlip>,
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Applies a transition's effects to a record whose status has been checked.
fn apply_transition(
    record: &mut RunRecord,
    transition: &Transition,
    reason: Option<&str>,
) -> EngineResult<()> {
    let now = Utc::now();
    let run = &mut record.run;
    match transition {
        Transition::Submit => {
            if record.details.is_empty() {
                return Err(EngineError::validation(
                    "details",
                    "run has no payroll details; generate the draft first",
                ));
            }
            run.status = RunStatus::UnderReview;
            run.submitted_at = Some(now);
        }
        Transition::ManagerApprove { comments } => {
            run.status = RunStatus::PendingFinanceApproval;
            run.manager_approval_date = Some(now);
            run.manager_comments = non_blank(comments.as_deref());
        }
        Transition::ManagerReject { .. } | Transition::FinanceReject { .. } => {
            run.status = RunStatus::Rejected;
            run.rejection_reason = reason.map(str::to_string);
        }
        Transition::FinanceApprove => {
            run.status = RunStatus::Approved;
            run.payment_status = PaymentStatus::Paid;
            run.finance_approval_date = Some(now);
            record.payslips = record
                .details
                .iter()
                .map(|d| PaySlip::from_detail(d, run.payroll_period))
                .collect();
        }
        Transition::Lock => {
            run.status = RunStatus::Locked;
            run.locked_at = Some(now);
        }
        Transition::Unlock { .. } => {
            run.status = RunStatus::Approved;
            run.locked_at = None;
            run.unlock_reason = reason.map(str::to_string);
        }
        Transition::Reopen => {
            run.status = RunStatus::Draft;
            run.rejection_reason = None;
            run.submitted_at = None;
            run.manager_approval_date = None;
            run.manager_comments = None;
        }
    }
    run.updated_at = now;
    Ok(())
}

/// Role-gated operations on payroll runs.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use payroll_engine::config::{ConfigStore, GenerationSettings};
/// use payroll_engine::engine::{InMemoryDirectory, InMemoryPayrollStore, PayrollRunEngine};
/// use payroll_engine::error::EngineError;
/// use payroll_engine::workflow::{Actor, ApprovalWorkflow, Role};
/// use chrono::NaiveDate;
///
/// let engine = PayrollRunEngine::new(
///     Arc::new(ConfigStore::new()),
///     Arc::new(InMemoryDirectory::default()),
///     Arc::new(InMemoryPayrollStore::new()),
///     GenerationSettings::default(),
/// );
/// let workflow = ApprovalWorkflow::new(Arc::new(engine));
///
/// let finance = Actor::new("finance_01", Role::FinanceStaff);
/// let period = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// let result = workflow.create_run(&finance, "cairo-hq", period);
/// assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
/// ```
#[derive(Clone)]
pub struct ApprovalWorkflow {
    engine: Arc<PayrollRunEngine>,
}

impl ApprovalWorkflow {
    /// Creates a workflow over `engine`.
    pub fn new(engine: Arc<PayrollRunEngine>) -> Self {
        Self { engine }
    }

    /// The underlying engine, for queries.
    pub fn engine(&self) -> &PayrollRunEngine {
        &self.engine
    }

    /// Opens a new draft run.
    pub fn create_run(
        &self,
        actor: &Actor,
        entity: &str,
        period: NaiveDate,
    ) -> EngineResult<PayrollRun> {
        authorize(WorkflowAction::CreateRun, actor.role)?;
        self.engine.create_run(entity, period)
    }

    /// Generates (or regenerates) a draft's employee rows.
    pub fn generate_draft(&self, actor: &Actor, run_id: Uuid) -> EngineResult<GenerationReport> {
        let action = WorkflowAction::GenerateDraft;
        let statuses = authorize(action, actor.role)?;
        self.engine
            .generate_draft_guarded(run_id, StatusGuard::new(action.as_str(), statuses))
    }

    /// Moves a draft to another period.
    pub fn edit_payroll_period(
        &self,
        actor: &Actor,
        run_id: Uuid,
        period: NaiveDate,
    ) -> EngineResult<PayrollRun> {
        let action = WorkflowAction::EditPayrollPeriod;
        let statuses = authorize(action, actor.role)?;
        self.engine
            .edit_payroll_period_guarded(run_id, period, StatusGuard::new(action.as_str(), statuses))
    }

    /// Corrects one employee row.
    pub fn edit_employee_payroll_detail(
        &self,
        actor: &Actor,
        run_id: Uuid,
        detail_id: Uuid,
        patch: &DetailPatch,
    ) -> EngineResult<DetailEdit> {
        let action = WorkflowAction::EditDetail;
        let statuses = authorize(action, actor.role)?;
        self.engine.edit_employee_payroll_detail_guarded(
            run_id,
            detail_id,
            patch,
            StatusGuard::new(action.as_str(), statuses),
        )
    }

    /// Moves a run to its next status.
    pub fn transition(
        &self,
        actor: &Actor,
        run_id: Uuid,
        transition: Transition,
    ) -> EngineResult<TransitionOutcome> {
        let action = transition.action();
        let statuses = authorize(action, actor.role)?;
        let reason = non_blank(transition.reason());
        if action.requires_reason() && reason.is_none() {
            return Err(EngineError::validation("reason", "must not be empty"));
        }

        let guard = StatusGuard::new(action.as_str(), statuses);
        let mut from = None;
        let record = self.engine.store().update_run(run_id, &mut |record: &mut RunRecord| {
            guard.check(record.run.status)?;
            from = Some(record.run.status);
            apply_transition(record, &transition, reason.as_deref())
        })?;

        info!(
            run_id = %run_id,
            actor_id = %actor.id,
            role = %actor.role,
            action = %action,
            from = %from.map(|s| s.as_str()).unwrap_or_default(),
            to = %record.run.status,
            "Payroll run transitioned"
        );

        let payslips = if matches!(transition, Transition::FinanceApprove) {
            record.payslips
        } else {
            Vec::new()
        };
        Ok(TransitionOutcome {
            run: record.run,
            payslips,
        })
    }

    /// Submits a draft for review.
    pub fn submit(&self, actor: &Actor, run_id: Uuid) -> EngineResult<TransitionOutcome> {
        self.transition(actor, run_id, Transition::Submit)
    }

    /// Approves a run under review and forwards it to finance.
    pub fn manager_approve(
        &self,
        actor: &Actor,
        run_id: Uuid,
        comments: Option<String>,
    ) -> EngineResult<TransitionOutcome> {
        self.transition(actor, run_id, Transition::ManagerApprove { comments })
    }

    /// Rejects a run under review.
    pub fn manager_reject(
        &self,
        actor: &Actor,
        run_id: Uuid,
        reason: impl Into<String>,
    ) -> EngineResult<TransitionOutcome> {
        let reason = reason.into();
        self.transition(actor, run_id, Transition::ManagerReject { reason })
    }

    /// Gives final approval, marks the run paid and issues payslips.
    pub fn finance_approve(&self, actor: &Actor, run_id: Uuid) -> EngineResult<TransitionOutcome> {
        self.transition(actor, run_id, Transition::FinanceApprove)
    }

    /// Rejects a run pending finance approval.
    pub fn finance_reject(
        &self,
        actor: &Actor,
        run_id: Uuid,
        reason: impl Into<String>,
    ) -> EngineResult<TransitionOutcome> {
        let reason = reason.into();
        self.transition(actor, run_id, Transition::FinanceReject { reason })
    }

    /// Freezes an approved run.
    pub fn lock(&self, actor: &Actor, run_id: Uuid) -> EngineResult<TransitionOutcome> {
        self.transition(actor, run_id, Transition::Lock)
    }

    /// Unfreezes a locked run.
    pub fn unlock(
        &self,
        actor: &Actor,
        run_id: Uuid,
        reason: impl Into<String>,
    ) -> EngineResult<TransitionOutcome> {
        let reason = reason.into();
        self.transition(actor, run_id, Transition::Unlock { reason })
    }

    /// Returns a rejected run to draft.
    pub fn reopen(&self, actor: &Actor, run_id: Uuid) -> EngineResult<TransitionOutcome> {
        self.transition(actor, run_id, Transition::Reopen)
    }
}
