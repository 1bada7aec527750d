use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use merchant_onboarding::onboarding::{
    application_router, ApiKeyAuthorizer, ApplicationRepository, ApplicationStore,
};
use merchant_onboarding::validation::{verify_ein, verify_ssn, PhoneCheck, VerificationResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    pub(crate) value: String,
}

pub(crate) fn with_application_routes<R>(
    store: Arc<ApplicationStore<R>>,
    authorizer: Arc<ApiKeyAuthorizer>,
) -> axum::Router
where
    R: ApplicationRepository + 'static,
{
    application_router(store, authorizer)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/verify/ein", axum::routing::post(verify_ein_endpoint))
        .route("/api/v1/verify/ssn", axum::routing::post(verify_ssn_endpoint))
        .route(
            "/api/v1/verify/phone",
            axum::routing::post(verify_phone_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn verify_ein_endpoint(
    Json(payload): Json<VerifyRequest>,
) -> Json<VerificationResult> {
    Json(verify_ein(&payload.value))
}

pub(crate) async fn verify_ssn_endpoint(
    Json(payload): Json<VerifyRequest>,
) -> Json<VerificationResult> {
    Json(verify_ssn(&payload.value))
}

/// Local NANP check, confirmed with the carrier lookup when one is configured.
pub(crate) async fn verify_phone_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Json<PhoneCheck> {
    let check = state
        .phone_verifier
        .verify(&payload.value, &state.shutdown)
        .await;
    Json(check)
}
