use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tracing::{debug, info, warn};

use crate::{
    api::BookingApi,
    cache::{Invalidation, PageCache},
    edit_session::EditSession,
    error::{MutationError, ValidationError},
    lock,
    pagination::PageIndex,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    /// Another submission is still running; nothing was sent.
    InProgress,
    NoDraft,
    Invalid(ValidationError),
    Failed(MutationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Submitting,
}

/// Releases the in-flight flag when the submission ends, including when its
/// future is dropped.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the edit-appointment mutation, one submission at a time.
///
/// It is the only writer of the appointments cache: on success the whole
/// cache is invalidated and the displayed page refetched.
pub struct MutationCoordinator {
    api: Arc<dyn BookingApi>,
    cache: Arc<dyn PageCache>,
    submitting: AtomicBool,
    last_error: Mutex<Option<MutationError>>,
}

impl MutationCoordinator {
    pub fn new(api: Arc<dyn BookingApi>, cache: Arc<dyn PageCache>) -> Self {
        Self {
            api,
            cache,
            submitting: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    fn begin(&self) -> Option<SubmittingGuard<'_>> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmittingGuard(&self.submitting))
    }

    pub async fn submit(&self, session: &EditSession, displayed_page: PageIndex) -> SubmitOutcome {
        let Some(guard) = self.begin() else {
            debug!("mutation: submission already in progress");
            return SubmitOutcome::InProgress;
        };
        let Some((ticket, draft)) = session.current() else {
            return SubmitOutcome::NoDraft;
        };
        let request = match draft.validate() {
            Ok(request) => request,
            Err(error) => {
                debug!(%error, "mutation: draft failed validation");
                return SubmitOutcome::Invalid(error);
            }
        };

        *lock(&self.last_error) = None;
        let appointment_id = request.appointment_id.0;
        info!(appointment_id, "mutation: submitting appointment edit");

        if let Err(error) = self.api.edit_booking(request).await {
            let error = MutationError::Backend(format!("{error:#}"));
            warn!(appointment_id, %error, "mutation: edit rejected; draft kept for retry");
            *lock(&self.last_error) = Some(error.clone());
            return SubmitOutcome::Failed(error);
        }

        info!(appointment_id, "mutation: edit accepted");
        session.close_if_current(ticket);
        self.cache.invalidate(Invalidation::All);
        drop(guard);

        if let Err(error) = self.cache.refetch(displayed_page).await {
            warn!(
                page = displayed_page.get(),
                %error,
                "mutation: refetch after edit failed"
            );
        }
        SubmitOutcome::Succeeded
    }

    pub fn state(&self) -> MutationState {
        if self.submitting.load(Ordering::Acquire) {
            MutationState::Submitting
        } else {
            MutationState::Idle
        }
    }

    pub fn last_error(&self) -> Option<MutationError> {
        lock(&self.last_error).clone()
    }

    /// Forgets the previous rejection; called whenever the edited draft
    /// changes identity.
    pub fn clear_error(&self) {
        lock(&self.last_error).take();
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
