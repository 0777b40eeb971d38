use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AdmissionStatus, ApplicationSubmission, FeeStatus, FormId};
use super::repository::{AdmissionRepository, AuditSink};
use super::service::{AdmissionService, AdmissionServiceError, ValidationError};

/// Staff identity forwarded by the auth layer; authentication itself is
/// out of scope for the workflow core.
#[derive(Debug, Clone)]
pub struct StaffActor(pub String);

pub const ACTOR_HEADER: &str = "x-actor";

#[axum::async_trait]
impl<S> FromRequestParts<S> for StaffActor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| StaffActor(value.to_string()))
            .ok_or_else(|| {
                let payload = json!({
                    "kind": "unauthenticated",
                    "message": format!("missing {ACTOR_HEADER} header"),
                });
                (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
            })
    }
}

/// Router builder exposing the admission workflow over HTTP.
pub fn admission_router<R, S>(service: Arc<AdmissionService<R, S>>) -> Router
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions",
            axum::routing::post(submit_handler::<R, S>).get(list_handler::<R, S>),
        )
        .route("/api/v1/admissions/:form_id", get(get_handler::<R, S>))
        .route(
            "/api/v1/admissions/:form_id/status",
            patch(transition_handler::<R, S>),
        )
        .route(
            "/api/v1/admissions/:form_id/marks",
            put(marks_handler::<R, S>),
        )
        .route(
            "/api/v1/admissions/:form_id/merit",
            put(merit_handler::<R, S>),
        )
        .route(
            "/api/v1/admissions/:form_id/final-percentage",
            put(final_percentage_handler::<R, S>),
        )
        .route("/api/v1/admissions/:form_id/fee", put(fee_handler::<R, S>))
        .route(
            "/api/v1/admissions/:form_id/audit",
            get(audit_handler::<R, S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) target_status: String,
    #[serde(default)]
    pub(crate) remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarksRequest {
    pub(crate) obtained: u32,
    pub(crate) total: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeritRequest {
    pub(crate) merit_list: String,
    pub(crate) department: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FinalPercentageRequest {
    pub(crate) percentage: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeeRequest {
    pub(crate) fee_status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    pub(crate) status: String,
}

/// Map a service error onto the wire contract: a `{kind, message}` body and
/// a status code per kind. Infrastructure failures stay opaque to the caller.
fn error_response(error: AdmissionServiceError) -> Response {
    let status = match &error {
        AdmissionServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        AdmissionServiceError::IllegalTransition { .. }
        | AdmissionServiceError::Conflict { .. } => StatusCode::CONFLICT,
        AdmissionServiceError::MissingPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AdmissionServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        AdmissionServiceError::Repository(_) | AdmissionServiceError::Audit(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "admission workflow infrastructure failure");
        "internal error".to_string()
    } else {
        error.to_string()
    };

    let body = Json(json!({ "kind": error.kind(), "message": message }));
    (status, body).into_response()
}

pub(crate) async fn submit_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    _actor: StaffActor,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::CREATED, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    match service.get(&FormId(form_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    let status = match AdmissionStatus::parse(&params.status) {
        Ok(status) => status,
        Err(unknown) => {
            return error_response(ValidationError::UnknownStatus(unknown).into());
        }
    };

    match service.list_by_status(status) {
        Ok(records) => {
            let views: Vec<_> = records
                .iter()
                .map(super::repository::AdmissionRecord::status_view)
                .collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
    actor: StaffActor,
    Json(request): Json<TransitionRequest>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    let target = match AdmissionStatus::parse(&request.target_status) {
        Ok(target) => target,
        Err(unknown) => {
            return error_response(ValidationError::UnknownStatus(unknown).into());
        }
    };

    let payload = super::domain::TransitionPayload {
        remarks: request.remarks,
    };

    match service.request_transition(&FormId(form_id), target, payload, &actor.0) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn marks_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
    _actor: StaffActor,
    Json(request): Json<MarksRequest>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    match service.record_entry_test_marks(&FormId(form_id), request.obtained, request.total) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn merit_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
    _actor: StaffActor,
    Json(request): Json<MeritRequest>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    match service.assign_merit_and_department(
        &FormId(form_id),
        &request.merit_list,
        &request.department,
    ) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn final_percentage_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
    _actor: StaffActor,
    Json(request): Json<FinalPercentageRequest>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    match service.record_final_percentage(&FormId(form_id), request.percentage) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fee_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
    _actor: StaffActor,
    Json(request): Json<FeeRequest>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    let fee_status = match FeeStatus::parse(&request.fee_status) {
        Ok(fee_status) => fee_status,
        Err(unknown) => {
            return error_response(ValidationError::UnknownStatus(unknown).into());
        }
    };

    match service.update_fee_status(&FormId(form_id), fee_status) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_handler<R, S>(
    State(service): State<Arc<AdmissionService<R, S>>>,
    Path(form_id): Path<String>,
) -> Response
where
    R: AdmissionRepository + 'static,
    S: AuditSink + 'static,
{
    match service.audit_trail(&FormId(form_id)) {
        Ok(trail) => (StatusCode::OK, Json(trail)).into_response(),
        Err(error) => error_response(error),
    }
}
