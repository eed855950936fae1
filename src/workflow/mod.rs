//! Role-gated payroll run workflow.
//!
//! [`authorization`] holds the single role × action table;
//! [`ApprovalWorkflow`] enforces it and drives runs through
//! draft → under review → pending finance approval → approved, with the
//! rejection, lock and unlock branches.

pub mod authorization;
mod approval;

pub use approval::{Actor, ApprovalWorkflow, Transition, TransitionOutcome};
pub use authorization::{
    AUTHORIZATION_TABLE, ConfigAction, Permission, Role, WorkflowAction, allowed_statuses, authorize,
    authorize_config,
};
