//! HTTP API module for the Payroll Engine.
//!
//! This module exposes payroll runs, their workflow transitions and the
//! configuration approval lifecycle as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    ActorRequest, ApprovedQuery, CreateConfigRequest, CreateRunRequest, EditDetailRequest,
    EditPeriodRequest, ListRunsQuery, RejectConfigRequest, TransitionRequest,
};
pub use response::{ApiError, ApiErrorResponse, RunResponse};
pub use state::AppState;
