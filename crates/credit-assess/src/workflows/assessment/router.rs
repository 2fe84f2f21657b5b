use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AssessmentId, Field};
use super::extraction::StatementUpload;
use super::gateway::AssessmentGateway;
use super::service::{AssessmentService, AssessmentServiceError};
use super::sessions::{SessionStore, SessionStoreError};

/// Router builder exposing HTTP endpoints for the intake wizard.
pub fn assessment_router<S, G>(service: Arc<AssessmentService<S, G>>) -> Router
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    Router::new()
        .route("/api/v1/assessments", post(start_handler::<S, G>))
        .route(
            "/api/v1/assessments/:assessment_id",
            get(snapshot_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/fields",
            put(field_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/next",
            post(next_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/previous",
            post(previous_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/statement",
            post(statement_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/submit",
            post(submit_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/acknowledge",
            post(acknowledge_handler::<S, G>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/reset",
            post(reset_handler::<S, G>),
        )
        .route(
            "/api/v1/scoring/health",
            get(scoring_health_handler::<S, G>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldUpdateRequest {
    field: Field,
    value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementQuery {
    filename: String,
}

fn respond(result: Result<impl serde::Serialize, AssessmentServiceError>) -> Response {
    respond_with(StatusCode::OK, result)
}

fn respond_with(
    success: StatusCode,
    result: Result<impl serde::Serialize, AssessmentServiceError>,
) -> Response {
    match result {
        Ok(view) => (success, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AssessmentServiceError) -> Response {
    let status = match &error {
        AssessmentServiceError::Session(SessionStoreError::NotFound) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Session(SessionStoreError::Conflict) => StatusCode::CONFLICT,
        AssessmentServiceError::Session(SessionStoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AssessmentServiceError::Wizard(_) | AssessmentServiceError::NotFinalStep => {
            StatusCode::CONFLICT
        }
        AssessmentServiceError::UnsupportedStatement { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AssessmentServiceError::Gateway(_) => StatusCode::BAD_GATEWAY,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn start_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond_with(StatusCode::CREATED, service.start())
}

pub(crate) async fn snapshot_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond(service.get(&AssessmentId(assessment_id)))
}

pub(crate) async fn field_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
    axum::Json(request): axum::Json<FieldUpdateRequest>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond(service.update_field(&AssessmentId(assessment_id), request.field, &request.value))
}

pub(crate) async fn next_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond(service.advance(&AssessmentId(assessment_id)))
}

pub(crate) async fn previous_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond(service.retreat(&AssessmentId(assessment_id)))
}

/// Statement upload and submission block on collaborator calls, so both are
/// moved off the async workers onto the blocking pool.
pub(crate) async fn statement_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
    Query(query): Query<StatementQuery>,
    body: Bytes,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    let upload = StatementUpload {
        filename: query.filename,
        content: body.to_vec(),
    };
    let id = AssessmentId(assessment_id);

    run_blocking(move || service.upload_statement(&id, upload)).await
}

pub(crate) async fn submit_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    let id = AssessmentId(assessment_id);
    run_blocking(move || service.submit(&id)).await
}

pub(crate) async fn acknowledge_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond(service.acknowledge_failure(&AssessmentId(assessment_id)))
}

pub(crate) async fn reset_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    respond(service.reset(&AssessmentId(assessment_id)))
}

pub(crate) async fn scoring_health_handler<S, G>(
    State(service): State<Arc<AssessmentService<S, G>>>,
) -> Response
where
    S: SessionStore + 'static,
    G: AssessmentGateway + 'static,
{
    let result = run_blocking_raw(move || service.scoring_health()).await;
    match result {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "ok" }))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn run_blocking<T, F>(task: F) -> Response
where
    T: serde::Serialize + Send + 'static,
    F: FnOnce() -> Result<T, AssessmentServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => respond(result),
        Err(join_error) => {
            let payload = json!({ "error": format!("task failed: {join_error}") });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

async fn run_blocking_raw<F>(task: F) -> Result<(), AssessmentServiceError>
where
    F: FnOnce() -> Result<(), AssessmentServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(join_error) => Err(AssessmentServiceError::Session(
            SessionStoreError::Unavailable(format!("task failed: {join_error}")),
        )),
    }
}
