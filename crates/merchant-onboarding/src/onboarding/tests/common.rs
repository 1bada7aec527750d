use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::onboarding::domain::{
    Application, ApplicationId, ApplicationPatch, Section, SectionKind, UserId,
};
use crate::onboarding::repository::{
    ApplicationRepository, InMemoryApplicationRepository, RepositoryError,
};
use crate::onboarding::{application_router, ApiKeyAuthorizer, ApplicationStore};

pub(super) const API_KEY: &str = "portal-test-key";

pub(super) fn section(value: Value) -> Section {
    Section::from(value.as_object().cloned().unwrap_or_default())
}

pub(super) fn business_info() -> Section {
    section(json!({
        "businessName": "Corner Deli LLC",
        "dba": "Corner Deli",
        "industry": "Restaurants",
        "ein": "12-3456789",
        "phone": "(212) 555-0199",
        "monthlyRevenue": 42000,
        "email": "owner@cornerdeli.example"
    }))
}

pub(super) fn owner_info() -> Section {
    section(json!({
        "fullName": "Dana Ruiz",
        "title": "Owner",
        "cellPhone": "1-646-555-0142",
        "ssn": "123-45-6789"
    }))
}

pub(super) fn business_address() -> Section {
    section(json!({
        "physicalAddress": "18 Orchard St",
        "cityStateZip": "New York, NY 10002"
    }))
}

pub(super) fn bank_account() -> Section {
    section(json!({
        "routingNumber": "021000021",
        "accountNumber": "000123456789"
    }))
}

pub(super) fn processing_details() -> Section {
    section(json!({
        "averageTicketSize": 18,
        "cardPresentPercentage": 85
    }))
}

/// Patch covering only the first three sections.
pub(super) fn partial_patch() -> ApplicationPatch {
    ApplicationPatch::default()
        .with_section(SectionKind::BusinessInfo, Some(business_info()))
        .with_section(SectionKind::OwnerInfo, Some(owner_info()))
        .with_section(SectionKind::BusinessAddress, Some(business_address()))
}

pub(super) fn complete_patch() -> ApplicationPatch {
    partial_patch()
        .with_section(SectionKind::BankAccount, Some(bank_account()))
        .with_section(SectionKind::ProcessingDetails, Some(processing_details()))
}

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn build_store() -> (
    Arc<ApplicationStore<InMemoryApplicationRepository>>,
    Arc<InMemoryApplicationRepository>,
) {
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let store = Arc::new(ApplicationStore::new(repository.clone()));
    (store, repository)
}

pub(super) fn build_router() -> (
    axum::Router,
    Arc<ApplicationStore<InMemoryApplicationRepository>>,
) {
    let (store, _) = build_store();
    let authorizer = Arc::new(ApiKeyAuthorizer::new(Some(API_KEY.to_string())));
    (application_router(store.clone(), authorizer), store)
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_user(&self, _user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    body: Value,
    api_key: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = api_key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
