//! Request types for the Payroll Engine API.
//!
//! Every mutating request names the acting user and role in an `actor`
//! object; authentication happens upstream.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::DetailPatch;
use crate::workflow::{Actor, Transition};

/// Body of `POST /runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// Who is acting.
    pub actor: Actor,
    /// The entity the run pays.
    pub entity: String,
    /// Any date in the month being paid.
    pub payroll_period: NaiveDate,
}

/// Body of requests that carry nothing but the actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    /// Who is acting.
    pub actor: Actor,
}

/// Body of `PUT /runs/:run_id/period`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPeriodRequest {
    /// Who is acting.
    pub actor: Actor,
    /// The new period.
    pub payroll_period: NaiveDate,
}

/// Body of `PATCH /runs/:run_id/details/:detail_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditDetailRequest {
    /// Who is acting.
    pub actor: Actor,
    /// New bank account number.
    #[serde(default)]
    pub bank_account_number: Option<String>,
    /// Net pay override.
    #[serde(default)]
    pub net_pay: Option<Decimal>,
}

impl EditDetailRequest {
    /// The correction to apply.
    pub fn patch(&self) -> DetailPatch {
        DetailPatch {
            bank_account_number: self.bank_account_number.clone(),
            net_pay: self.net_pay,
        }
    }
}

/// Body of `POST /runs/:run_id/transitions`.
///
/// ```json
/// {
///   "actor": { "id": "manager_01", "role": "payroll_manager" },
///   "transition": { "action": "manager_reject", "reason": "Missing overtime" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// Who is acting.
    pub actor: Actor,
    /// The requested transition, tagged by `action`.
    pub transition: Transition,
}

/// Body of `POST /config/pay-grades`, `/config/allowances` and
/// `/config/tax-rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfigRequest<T> {
    /// Who is acting.
    pub actor: Actor,
    /// The record to create.
    pub record: T,
}

/// Body of `POST /config/:kind/:id/reject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectConfigRequest {
    /// Who is acting.
    pub actor: Actor,
    /// Why the record is rejected.
    pub reason: String,
}

/// Query of `GET /runs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRunsQuery {
    /// Only runs for this entity.
    #[serde(default)]
    pub entity: Option<String>,
}

/// Query of `GET /config/:kind/approved`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovedQuery {
    /// The date the records must be usable on.
    pub date: NaiveDate,
}
