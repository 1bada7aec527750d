use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for onboarding applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(format!("app_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owning user reference. Lookup only; no cascade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    PendingReview,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::PendingReview => "pending_review",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller supplied section payload, stored as an opaque JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(pub Map<String, Value>);

impl Section {
    /// String field lookup used by identity screening.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

impl From<Map<String, Value>> for Section {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// The five sections required before submission, in their fixed declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    BusinessInfo,
    OwnerInfo,
    BusinessAddress,
    BankAccount,
    ProcessingDetails,
}

impl SectionKind {
    pub const REQUIRED: [SectionKind; 5] = [
        SectionKind::BusinessInfo,
        SectionKind::OwnerInfo,
        SectionKind::BusinessAddress,
        SectionKind::BankAccount,
        SectionKind::ProcessingDetails,
    ];

    /// Wire name of the section.
    pub const fn field_name(self) -> &'static str {
        match self {
            SectionKind::BusinessInfo => "businessInfo",
            SectionKind::OwnerInfo => "ownerInfo",
            SectionKind::BusinessAddress => "businessAddress",
            SectionKind::BankAccount => "bankAccount",
            SectionKind::ProcessingDetails => "processingDetails",
        }
    }
}

/// Stored onboarding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub business_info: Option<Section>,
    pub owner_info: Option<Section>,
    pub business_address: Option<Section>,
    pub bank_account: Option<Section>,
    pub processing_details: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electronic_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn draft(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            user_id,
            status: ApplicationStatus::Draft,
            created_at: now,
            updated_at: now,
            business_info: None,
            owner_info: None,
            business_address: None,
            bank_account: None,
            processing_details: None,
            electronic_signature: None,
            terms_accepted: None,
            submitted_at: None,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == ApplicationStatus::Draft
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        match kind {
            SectionKind::BusinessInfo => self.business_info.as_ref(),
            SectionKind::OwnerInfo => self.owner_info.as_ref(),
            SectionKind::BusinessAddress => self.business_address.as_ref(),
            SectionKind::BankAccount => self.bank_account.as_ref(),
            SectionKind::ProcessingDetails => self.processing_details.as_ref(),
        }
    }

    fn section_slot(&mut self, kind: SectionKind) -> &mut Option<Section> {
        match kind {
            SectionKind::BusinessInfo => &mut self.business_info,
            SectionKind::OwnerInfo => &mut self.owner_info,
            SectionKind::BusinessAddress => &mut self.business_address,
            SectionKind::BankAccount => &mut self.bank_account,
            SectionKind::ProcessingDetails => &mut self.processing_details,
        }
    }

    /// Replace every section named by the patch wholesale.
    pub fn apply_patch(&mut self, patch: ApplicationPatch) {
        for (kind, update) in patch.into_updates() {
            *self.section_slot(kind) = update;
        }
    }

    /// Refresh `updated_at` without ever moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = self.updated_at.max(now);
    }
}

/// Partial section update. Absent keys are left alone, `null` clears a section, and an object
/// replaces it. Lifecycle fields in the body are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    #[serde(default, deserialize_with = "present")]
    pub business_info: Option<Option<Section>>,
    #[serde(default, deserialize_with = "present")]
    pub owner_info: Option<Option<Section>>,
    #[serde(default, deserialize_with = "present")]
    pub business_address: Option<Option<Section>>,
    #[serde(default, deserialize_with = "present")]
    pub bank_account: Option<Option<Section>>,
    #[serde(default, deserialize_with = "present")]
    pub processing_details: Option<Option<Section>>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        self.touched().is_empty()
    }

    /// Names of the sections this patch writes, in declaration order.
    pub fn touched(&self) -> Vec<&'static str> {
        SectionKind::REQUIRED
            .into_iter()
            .filter(|kind| self.slot(*kind).is_some())
            .map(SectionKind::field_name)
            .collect()
    }

    /// Builder used by the demo and tests.
    pub fn with_section(mut self, kind: SectionKind, section: Option<Section>) -> Self {
        *self.slot_mut(kind) = Some(section);
        self
    }

    fn slot(&self, kind: SectionKind) -> &Option<Option<Section>> {
        match kind {
            SectionKind::BusinessInfo => &self.business_info,
            SectionKind::OwnerInfo => &self.owner_info,
            SectionKind::BusinessAddress => &self.business_address,
            SectionKind::BankAccount => &self.bank_account,
            SectionKind::ProcessingDetails => &self.processing_details,
        }
    }

    fn slot_mut(&mut self, kind: SectionKind) -> &mut Option<Option<Section>> {
        match kind {
            SectionKind::BusinessInfo => &mut self.business_info,
            SectionKind::OwnerInfo => &mut self.owner_info,
            SectionKind::BusinessAddress => &mut self.business_address,
            SectionKind::BankAccount => &mut self.bank_account,
            SectionKind::ProcessingDetails => &mut self.processing_details,
        }
    }

    fn into_updates(mut self) -> Vec<(SectionKind, Option<Section>)> {
        SectionKind::REQUIRED
            .into_iter()
            .filter_map(|kind| self.slot_mut(kind).take().map(|update| (kind, update)))
            .collect()
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<Section>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Section>::deserialize(deserializer).map(Some)
}

/// Body of the final submit call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default)]
    pub electronic_signature: Option<String>,
    #[serde(default)]
    pub terms_accepted: bool,
}

/// Acknowledgement returned after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub message: &'static str,
}

impl SubmissionReceipt {
    pub fn for_application(application: &Application) -> Option<Self> {
        application.submitted_at.map(|submitted_at| Self {
            id: application.id.clone(),
            status: application.status,
            submitted_at,
            message: "Application submitted successfully",
        })
    }
}
