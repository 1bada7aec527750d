//! HTTP carrier lookup against a local mock server.
//!
//! Each scenario goes through `RemotePhoneVerifier::verify` so the wire contract and the
//! fallback rules are exercised together.

use std::time::Duration;

use merchant_onboarding::validation::{
    CancellationSignal, CarrierLookup, HttpCarrierLookup, LookupError, RemotePhoneVerifier,
    VerificationFailure,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOOKUP_KEY: &str = "lookup-key";

struct CarrierMock {
    server: MockServer,
}

impl CarrierMock {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    async fn respond(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v1/phone"))
            .and(query_param("phoneNumber", "+12125550199"))
            .and(header("authorization", format!("Bearer {LOOKUP_KEY}").as_str()))
            .respond_with(response)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    fn lookup(&self, timeout: Duration) -> HttpCarrierLookup {
        HttpCarrierLookup::new(
            format!("{}/v1/phone", self.server.uri()),
            LOOKUP_KEY,
            timeout,
        )
        .expect("client builds")
    }

    fn verifier(&self) -> RemotePhoneVerifier<HttpCarrierLookup> {
        RemotePhoneVerifier::new(Some(self.lookup(Duration::from_secs(2))))
    }
}

#[tokio::test]
async fn confirmed_number_is_marked_remote_checked() {
    let mock = CarrierMock::start().await;
    mock.respond(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
        .await;

    let check = mock
        .verifier()
        .verify("(212) 555-0199", &CancellationSignal::never())
        .await;

    assert!(check.verification.is_valid);
    assert_eq!(check.verification.normalized, "2125550199");
    assert!(check.remote_checked);
    assert!(check.notice.is_none());
}

#[tokio::test]
async fn rejection_via_is_valid_alias_invalidates_the_number() {
    let mock = CarrierMock::start().await;
    mock.respond(ResponseTemplate::new(200).set_body_json(json!({ "isValid": false })))
        .await;

    let check = mock
        .verifier()
        .verify("1-212-555-0199", &CancellationSignal::never())
        .await;

    assert!(!check.verification.is_valid);
    assert!(check.remote_checked);
    assert_eq!(
        check.verification.failure,
        Some(VerificationFailure::Unconfirmed)
    );
    assert_eq!(check.verification.formatted, "(212) 555-0199");
}

#[tokio::test]
async fn server_error_keeps_the_local_result() {
    let mock = CarrierMock::start().await;
    mock.respond(ResponseTemplate::new(500)).await;

    let check = mock
        .verifier()
        .verify("212.555.0199", &CancellationSignal::never())
        .await;

    assert!(check.verification.is_valid);
    assert!(check.verification.reason.is_none());
    assert!(!check.remote_checked);
    assert!(check.notice.is_some());
}

#[tokio::test]
async fn server_error_maps_to_status_error() {
    let mock = CarrierMock::start().await;
    mock.respond(ResponseTemplate::new(503)).await;

    let outcome = mock.lookup(Duration::from_secs(2)).lookup("2125550199").await;

    assert!(matches!(outcome, Err(LookupError::Status(503))));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error_and_falls_back() {
    let mock = CarrierMock::start().await;
    mock.respond(ResponseTemplate::new(200).set_body_string("carrier says maybe"))
        .await;

    let lookup = mock.lookup(Duration::from_secs(2));
    let outcome = lookup.lookup("2125550199").await;
    assert!(matches!(outcome, Err(LookupError::Decode(_))));

    let second = CarrierMock::start().await;
    second
        .respond(ResponseTemplate::new(200).set_body_json(json!({ "carrier": "unknown" })))
        .await;
    let check = second
        .verifier()
        .verify("212-555-0199", &CancellationSignal::never())
        .await;
    assert!(check.verification.is_valid);
    assert!(!check.remote_checked);
}

#[tokio::test]
async fn slow_carrier_times_out_to_the_local_result() {
    let mock = CarrierMock::start().await;
    mock.respond(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "valid": false }))
            .set_delay(Duration::from_millis(500)),
    )
    .await;

    let verifier = RemotePhoneVerifier::new(Some(mock.lookup(Duration::from_millis(50))));
    let check = verifier
        .verify("212-555-0199", &CancellationSignal::never())
        .await;

    assert!(check.verification.is_valid);
    assert!(!check.remote_checked);
    assert!(check.notice.is_some());
}
