//! Merchant onboarding application lifecycle: drafts, section merges, gated submission.

pub mod auth;
pub mod domain;
pub mod gate;
pub mod repository;
pub mod router;
pub mod screening;
pub mod service;

#[cfg(test)]
mod tests;

pub use auth::{ApiKeyAuthorizer, Authorized};
pub use domain::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, Section, SectionKind,
    SubmissionReceipt, SubmissionRequest, UserId,
};
pub use gate::{check_complete, Completeness};
pub use repository::{ApplicationRepository, InMemoryApplicationRepository, RepositoryError};
pub use router::{application_router, PortalState};
pub use screening::{screen_identity, IdentityScreening};
pub use service::{ApplicationError, ApplicationStore};
