//! HTTP request handlers for the Payroll Engine API.
//!
//! This module contains the router and the handler functions for all API
//! endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ConfigKind, ConfigRecord};
use crate::error::{EngineError, EngineResult};
use crate::models::{Allowance, PayGrade, TaxRule};
use crate::workflow::{ConfigAction, authorize_config};

use super::request::{
    ActorRequest, ApprovedQuery, CreateConfigRequest, CreateRunRequest, EditDetailRequest,
    EditPeriodRequest, ListRunsQuery, RejectConfigRequest, TransitionRequest,
};
use super::response::{ApiError, ApiErrorResponse, RunResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(create_run_handler).get(list_runs_handler))
        .route("/runs/:run_id", get(get_run_handler))
        .route("/runs/:run_id/generate", post(generate_draft_handler))
        .route("/runs/:run_id/period", put(edit_period_handler))
        .route("/runs/:run_id/details/:detail_id", patch(edit_detail_handler))
        .route("/runs/:run_id/transitions", post(transition_handler))
        .route("/runs/:run_id/payslips", get(payslips_handler))
        .route("/config/pay-grades", post(create_pay_grade_handler))
        .route("/config/allowances", post(create_allowance_handler))
        .route("/config/tax-rules", post(create_tax_rule_handler))
        .route("/config/:kind/approved", get(list_approved_handler))
        .route("/config/:kind/:id/submit", post(submit_config_handler))
        .route("/config/:kind/:id/approve", post(approve_config_handler))
        .route("/config/:kind/:id/reject", post(reject_config_handler))
        .with_state(state)
}

/// Serializes a result, logging failures under the request's correlation id.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &str,
    success: StatusCode,
    result: EngineResult<T>,
) -> Response {
    match result {
        Ok(body) => (
            success,
            [(header::CONTENT_TYPE, "application/json")],
            Json(body),
        )
            .into_response(),
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Request failed"
            );
            let api_error: ApiErrorResponse = err.into();
            (
                api_error.status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(api_error.error),
            )
                .into_response()
        }
    }
}

/// Unwraps a JSON body or turns the rejection into a 400 response.
fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error).into_response())
}

fn parse_kind(kind: &str) -> EngineResult<ConfigKind> {
    kind.parse::<ConfigKind>()
        .map_err(|message| EngineError::validation("kind", message))
}

/// Handler for POST /runs.
async fn create_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        actor_id = %request.actor.id,
        entity = %request.entity,
        "Creating payroll run"
    );

    let result =
        state
            .workflow()
            .create_run(&request.actor, &request.entity, request.payroll_period);
    respond(correlation_id, "create run", StatusCode::CREATED, result)
}

/// Handler for GET /runs.
async fn list_runs_handler(
    State(state): State<AppState>,
    Query(query): Query<ListRunsQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state.workflow().engine().list_runs(query.entity.as_deref());
    respond(correlation_id, "list runs", StatusCode::OK, result)
}

/// Handler for GET /runs/:run_id.
async fn get_run_handler(State(state): State<AppState>, Path(run_id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    let engine = state.workflow().engine();
    let result = engine.get_run(run_id).and_then(|run| {
        Ok(RunResponse {
            details: engine.details(run_id)?,
            run,
        })
    });
    respond(correlation_id, "get run", StatusCode::OK, result)
}

/// Handler for POST /runs/:run_id/generate.
///
/// Generation is CPU-bound, so it runs on the blocking pool.
async fn generate_draft_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        actor_id = %request.actor.id,
        "Generating draft"
    );

    let workflow = state.workflow().clone();
    let result = tokio::task::spawn_blocking(move || workflow.generate_draft(&request.actor, run_id))
        .await
        .unwrap_or_else(|err| {
            Err(EngineError::CalculationError {
                message: format!("draft generation task failed: {}", err),
            })
        });
    respond(correlation_id, "generate draft", StatusCode::OK, result)
}

/// Handler for PUT /runs/:run_id/period.
async fn edit_period_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    payload: Result<Json<EditPeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result =
        state
            .workflow()
            .edit_payroll_period(&request.actor, run_id, request.payroll_period);
    respond(correlation_id, "edit payroll period", StatusCode::OK, result)
}

/// Handler for PATCH /runs/:run_id/details/:detail_id.
async fn edit_detail_handler(
    State(state): State<AppState>,
    Path((run_id, detail_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<EditDetailRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = state.workflow().edit_employee_payroll_detail(
        &request.actor,
        run_id,
        detail_id,
        &request.patch(),
    );
    respond(correlation_id, "edit payroll detail", StatusCode::OK, result)
}

/// Handler for POST /runs/:run_id/transitions.
async fn transition_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        actor_id = %request.actor.id,
        action = %request.transition.action(),
        "Processing transition"
    );
    let result = state
        .workflow()
        .transition(&request.actor, run_id, request.transition);
    respond(correlation_id, "transition", StatusCode::OK, result)
}

/// Handler for GET /runs/:run_id/payslips.
async fn payslips_handler(State(state): State<AppState>, Path(run_id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state.workflow().engine().payslips(run_id);
    respond(correlation_id, "list payslips", StatusCode::OK, result)
}

/// Shared body of the three configuration create handlers.
fn create_config<T: DeserializeOwned>(
    state: &AppState,
    payload: Result<Json<CreateConfigRequest<T>>, JsonRejection>,
    create: impl FnOnce(&AppState, T, &str) -> EngineResult<ConfigRecord>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = authorize_config(ConfigAction::Create, request.actor.role)
        .and_then(|()| create(state, request.record, &request.actor.id));
    respond(correlation_id, "create configuration", StatusCode::CREATED, result)
}

/// Handler for POST /config/pay-grades.
async fn create_pay_grade_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateConfigRequest<PayGrade>>, JsonRejection>,
) -> Response {
    create_config(&state, payload, |state, record, actor| {
        state
            .config()
            .create_pay_grade(record, actor)
            .map(ConfigRecord::PayGrade)
    })
}

/// Handler for POST /config/allowances.
async fn create_allowance_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateConfigRequest<Allowance>>, JsonRejection>,
) -> Response {
    create_config(&state, payload, |state, record, actor| {
        state
            .config()
            .create_allowance(record, actor)
            .map(ConfigRecord::Allowance)
    })
}

/// Handler for POST /config/tax-rules.
async fn create_tax_rule_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateConfigRequest<TaxRule>>, JsonRejection>,
) -> Response {
    create_config(&state, payload, |state, record, actor| {
        state
            .config()
            .create_tax_rule(record, actor)
            .map(ConfigRecord::TaxRule)
    })
}

/// Handler for POST /config/:kind/:id/submit.
async fn submit_config_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = authorize_config(ConfigAction::Submit, request.actor.role)
        .and_then(|()| parse_kind(&kind))
        .and_then(|kind| state.config().submit(kind, &id));
    respond(correlation_id, "submit configuration", StatusCode::OK, result)
}

/// Handler for POST /config/:kind/:id/approve.
async fn approve_config_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = authorize_config(ConfigAction::Approve, request.actor.role)
        .and_then(|()| parse_kind(&kind))
        .and_then(|kind| state.config().approve(kind, &id, &request.actor.id));
    respond(correlation_id, "approve configuration", StatusCode::OK, result)
}

/// Handler for POST /config/:kind/:id/reject.
async fn reject_config_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<RejectConfigRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let result = authorize_config(ConfigAction::Reject, request.actor.role)
        .and_then(|()| parse_kind(&kind))
        .and_then(|kind| state.config().reject(kind, &id, &request.reason));
    respond(correlation_id, "reject configuration", StatusCode::OK, result)
}

/// Handler for GET /config/:kind/approved.
async fn list_approved_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ApprovedQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result =
        parse_kind(&kind).and_then(|kind| state.config().list_approved(kind, query.date));
    respond(correlation_id, "list approved configuration", StatusCode::OK, result)
}
