//! Optional carrier confirmation layered on top of [`verify_phone_number`].
//!
//! The remote answer is advisory: it can only downgrade a locally valid number to invalid, and a
//! lookup that fails or is cancelled falls back to the local result.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::phone::verify_phone_number;
use super::{VerificationFailure, VerificationResult};
use crate::config::PhoneLookupConfig;

const UNCONFIRMED_REASON: &str = "We could not confirm this phone number.";
const UNAVAILABLE_NOTICE: &str =
    "Carrier verification is unavailable; the number passed the local format check only.";
const CANCELLED_NOTICE: &str = "Carrier verification was cancelled before the carrier responded.";

/// Receiving half of a cancellation pair. Clones observe the same trigger.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    receiver: watch::Receiver<bool>,
}

/// Triggering half of a cancellation pair.
#[derive(Debug)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

pub fn cancellation_pair() -> (CancellationHandle, CancellationSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancellationHandle { sender }, CancellationSignal { receiver })
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl CancellationSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = cancellation_pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the handle is dropped unfired.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Carrier answer for a normalized ten-digit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierVerdict {
    Confirmed,
    Rejected,
}

/// Failure talking to the carrier lookup service.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("remote verification unavailable: {0}")]
    Unavailable(String),
    #[error("carrier lookup responded with HTTP {0}")]
    Status(u16),
    #[error("carrier lookup response could not be decoded: {0}")]
    Decode(String),
}

/// Outbound carrier lookup so the verifier can be exercised without a network.
#[async_trait]
pub trait CarrierLookup: Send + Sync {
    async fn lookup(&self, normalized: &str) -> Result<CarrierVerdict, LookupError>;
}

#[derive(Debug, Deserialize)]
struct CarrierLookupResponse {
    #[serde(alias = "isValid", alias = "is_valid")]
    valid: bool,
}

/// HTTP carrier lookup: `GET {endpoint}?phoneNumber=+1XXXXXXXXXX` with a bearer key, expecting
/// `{ "valid": bool }` back.
#[derive(Debug, Clone)]
pub struct HttpCarrierLookup {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpCarrierLookup {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a lookup when both the endpoint and key are configured.
    pub fn from_config(config: &PhoneLookupConfig) -> Result<Option<Self>, LookupError> {
        match (&config.endpoint, &config.api_key) {
            (Some(endpoint), Some(api_key)) => {
                Self::new(endpoint.clone(), api_key.clone(), config.timeout).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CarrierLookup for HttpCarrierLookup {
    async fn lookup(&self, normalized: &str) -> Result<CarrierVerdict, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.api_key)
            .query(&[("phoneNumber", format!("+1{normalized}"))])
            .send()
            .await
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: CarrierLookupResponse = response
            .json()
            .await
            .map_err(|err| LookupError::Decode(err.to_string()))?;

        Ok(if body.valid {
            CarrierVerdict::Confirmed
        } else {
            CarrierVerdict::Rejected
        })
    }
}

/// Phone verification annotated with whether a carrier confirmed the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneCheck {
    #[serde(flatten)]
    pub verification: VerificationResult,
    pub remote_checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl PhoneCheck {
    fn local(verification: VerificationResult) -> Self {
        Self {
            verification,
            remote_checked: false,
            notice: None,
        }
    }

    fn unchecked(verification: VerificationResult, notice: &str) -> Self {
        Self {
            notice: Some(notice.to_string()),
            ..Self::local(verification)
        }
    }

    fn confirmed(verification: VerificationResult) -> Self {
        Self {
            verification,
            remote_checked: true,
            notice: None,
        }
    }

    fn rejected(verification: VerificationResult) -> Self {
        let formatted = verification.formatted;
        Self::confirmed(VerificationResult::invalid(
            VerificationFailure::Unconfirmed,
            formatted,
            UNCONFIRMED_REASON,
        ))
    }
}

/// Wraps the local phone validator with an optional carrier lookup.
pub struct RemotePhoneVerifier<L> {
    lookup: Option<L>,
}

impl<L> RemotePhoneVerifier<L>
where
    L: CarrierLookup,
{
    pub fn new(lookup: Option<L>) -> Self {
        Self { lookup }
    }

    pub fn is_configured(&self) -> bool {
        self.lookup.is_some()
    }

    pub async fn verify(&self, raw: &str, cancel: &CancellationSignal) -> PhoneCheck {
        let local = verify_phone_number(raw);
        if !local.is_valid {
            return PhoneCheck::local(local);
        }

        let Some(lookup) = &self.lookup else {
            return PhoneCheck::local(local);
        };

        if cancel.is_cancelled() {
            return PhoneCheck::unchecked(local, CANCELLED_NOTICE);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = lookup.lookup(&local.normalized) => Some(result),
        };

        match outcome {
            None => {
                debug!("carrier lookup cancelled");
                PhoneCheck::unchecked(local, CANCELLED_NOTICE)
            }
            Some(Ok(CarrierVerdict::Confirmed)) => PhoneCheck::confirmed(local),
            Some(Ok(CarrierVerdict::Rejected)) => {
                debug!("carrier rejected phone number");
                PhoneCheck::rejected(local)
            }
            Some(Err(err)) => {
                warn!(error = %err, "carrier lookup failed; keeping local phone verification");
                PhoneCheck::unchecked(local, UNAVAILABLE_NOTICE)
            }
        }
    }
}
