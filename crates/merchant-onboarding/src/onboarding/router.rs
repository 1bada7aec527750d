use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::{ApiKeyAuthorizer, Authorized};
use super::domain::{ApplicationId, ApplicationPatch, SubmissionReceipt, SubmissionRequest, UserId};
use super::repository::{ApplicationRepository, RepositoryError};
use super::screening::screen_identity;
use super::service::{ApplicationError, ApplicationStore};

/// Shared state for the application routes.
pub struct PortalState<R> {
    pub store: Arc<ApplicationStore<R>>,
    pub authorizer: Arc<ApiKeyAuthorizer>,
}

impl<R> Clone for PortalState<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            authorizer: Arc::clone(&self.authorizer),
        }
    }
}

impl<R> FromRef<PortalState<R>> for Arc<ApiKeyAuthorizer> {
    fn from_ref(state: &PortalState<R>) -> Self {
        Arc::clone(&state.authorizer)
    }
}

/// Router builder exposing the onboarding application lifecycle.
pub fn application_router<R>(
    store: Arc<ApplicationStore<R>>,
    authorizer: Arc<ApiKeyAuthorizer>,
) -> Router
where
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(create_handler::<R>).get(query_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(fetch_handler::<R>).put(update_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/submit",
            post(submit_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/screening",
            get(screening_handler::<R>),
        )
        .with_state(PortalState { store, authorizer })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateApplicationRequest {
    #[serde(default)]
    pub(crate) user_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationQuery {
    pub(crate) id: Option<String>,
    pub(crate) user_id: Option<String>,
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApplicationError::NotFound
            | ApplicationError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ApplicationError::NotDraft { .. }
            | ApplicationError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ApplicationError::TermsNotAccepted
            | ApplicationError::ApplicationIncomplete { .. }
            | ApplicationError::MissingUserId => StatusCode::BAD_REQUEST,
            ApplicationError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = match &self {
            ApplicationError::ApplicationIncomplete { missing } => json!({
                "error": self.to_string(),
                "missingSections": missing,
            }),
            ApplicationError::Repository(RepositoryError::NotFound) => json!({
                "error": ApplicationError::NotFound.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(payload)).into_response()
    }
}

pub(crate) async fn create_handler<R>(
    State(state): State<PortalState<R>>,
    _authorized: Authorized,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<Response, ApplicationError>
where
    R: ApplicationRepository + 'static,
{
    let application = state
        .store
        .create_or_get_draft(&UserId(request.user_id))?;
    Ok((StatusCode::OK, Json(application)).into_response())
}

pub(crate) async fn query_handler<R>(
    State(state): State<PortalState<R>>,
    Query(query): Query<ApplicationQuery>,
) -> Result<Response, ApplicationError>
where
    R: ApplicationRepository + 'static,
{
    if let Some(id) = query.id {
        let application = state.store.get(&ApplicationId(id))?;
        return Ok((StatusCode::OK, Json(application)).into_response());
    }

    if let Some(user_id) = query.user_id {
        let applications = state.store.list_by_user(&UserId(user_id))?;
        return Ok((StatusCode::OK, Json(applications)).into_response());
    }

    let payload = json!({ "error": "Missing applicationId or userId" });
    Ok((StatusCode::BAD_REQUEST, Json(payload)).into_response())
}

pub(crate) async fn fetch_handler<R>(
    State(state): State<PortalState<R>>,
    Path(application_id): Path<String>,
) -> Result<Response, ApplicationError>
where
    R: ApplicationRepository + 'static,
{
    let application = state.store.get(&ApplicationId(application_id))?;
    Ok((StatusCode::OK, Json(application)).into_response())
}

pub(crate) async fn update_handler<R>(
    State(state): State<PortalState<R>>,
    _authorized: Authorized,
    Path(application_id): Path<String>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Response, ApplicationError>
where
    R: ApplicationRepository + 'static,
{
    let application = state
        .store
        .update_sections(&ApplicationId(application_id), patch)?;
    Ok((StatusCode::OK, Json(application)).into_response())
}

pub(crate) async fn submit_handler<R>(
    State(state): State<PortalState<R>>,
    _authorized: Authorized,
    Path(application_id): Path<String>,
    Json(request): Json<SubmissionRequest>,
) -> Result<Response, ApplicationError>
where
    R: ApplicationRepository + 'static,
{
    let application = state
        .store
        .submit(&ApplicationId(application_id), request)?;

    match SubmissionReceipt::for_application(&application) {
        Some(receipt) => Ok((StatusCode::OK, Json(receipt)).into_response()),
        None => Ok((StatusCode::OK, Json(application)).into_response()),
    }
}

pub(crate) async fn screening_handler<R>(
    State(state): State<PortalState<R>>,
    Path(application_id): Path<String>,
) -> Result<Response, ApplicationError>
where
    R: ApplicationRepository + 'static,
{
    let application = state.store.get(&ApplicationId(application_id))?;
    let screening = screen_identity(&application);
    Ok((StatusCode::OK, Json(screening)).into_response())
}
