use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, SubmissionRequest, UserId,
};
use super::gate::check_complete;
use super::repository::{ApplicationRepository, RepositoryError};

/// Application lifecycle manager: find-or-create drafts, merge sections, submit.
///
/// Mutations go through a single write gate so concurrent section updates and draft creation
/// cannot interleave; reads go straight to the repository.
pub struct ApplicationStore<R> {
    repository: Arc<R>,
    write_gate: Mutex<()>,
}

impl<R> ApplicationStore<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            write_gate: Mutex::new(()),
        }
    }

    fn exclusive(&self) -> MutexGuard<'_, ()> {
        // The gate guards no data, so a panic elsewhere leaves nothing to repair.
        self.write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the user's current draft, creating one if none exists.
    pub fn create_or_get_draft(&self, user_id: &UserId) -> Result<Application, ApplicationError> {
        if user_id.0.trim().is_empty() {
            return Err(ApplicationError::MissingUserId);
        }

        let _gate = self.exclusive();

        let existing = self
            .repository
            .by_user(user_id)?
            .into_iter()
            .find(Application::is_draft);
        if let Some(draft) = existing {
            debug!(application_id = %draft.id, user_id = %user_id, "returning existing draft");
            return Ok(draft);
        }

        let draft = Application::draft(user_id.clone(), Utc::now());
        let stored = self.repository.insert(draft)?;
        info!(application_id = %stored.id, user_id = %user_id, "created application draft");
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, ApplicationError> {
        self.repository
            .fetch(id)?
            .ok_or(ApplicationError::NotFound)
    }

    /// Every application owned by the user, drafts and submitted alike. Order is unspecified.
    pub fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Application>, ApplicationError> {
        Ok(self.repository.by_user(user_id)?)
    }

    /// Shallow-merge the patch into a draft. Section contents are not validated here.
    pub fn update_sections(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, ApplicationError> {
        let _gate = self.exclusive();

        let mut record = self.get(id)?;
        ensure_draft(&record)?;

        let touched = patch.touched();
        record.apply_patch(patch);
        record.touch(Utc::now());
        self.repository.update(record.clone())?;

        debug!(application_id = %id, sections = ?touched, "merged application sections");
        Ok(record)
    }

    /// Move a complete draft to `pending_review`.
    pub fn submit(
        &self,
        id: &ApplicationId,
        request: SubmissionRequest,
    ) -> Result<Application, ApplicationError> {
        let _gate = self.exclusive();

        let mut record = self.get(id)?;
        ensure_draft(&record)?;

        if !request.terms_accepted {
            return Err(ApplicationError::TermsNotAccepted);
        }

        let completeness = check_complete(&record);
        if !completeness.complete {
            return Err(ApplicationError::ApplicationIncomplete {
                missing: completeness.missing,
            });
        }

        let now = Utc::now();
        record.status = ApplicationStatus::PendingReview;
        record.electronic_signature = request.electronic_signature;
        record.terms_accepted = Some(true);
        record.submitted_at = Some(now);
        record.touch(now);
        self.repository.update(record.clone())?;

        info!(application_id = %id, user_id = %record.user_id, "application submitted for review");
        Ok(record)
    }
}

fn ensure_draft(record: &Application) -> Result<(), ApplicationError> {
    if record.is_draft() {
        Ok(())
    } else {
        Err(ApplicationError::NotDraft {
            status: record.status,
        })
    }
}

/// Error raised by the application store.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Application not found")]
    NotFound,
    #[error("Application is {status} and can no longer be modified")]
    NotDraft { status: ApplicationStatus },
    #[error("Terms must be accepted")]
    TermsNotAccepted,
    #[error("Application incomplete")]
    ApplicationIncomplete { missing: Vec<&'static str> },
    #[error("userId is required")]
    MissingUserId,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
