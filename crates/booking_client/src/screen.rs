//! View model of the "my upcoming appointments" page.
//!
//! Wires pagination, the page cache, the service catalog, the edit session
//! and the mutation coordinator together and exposes the result as plain data
//! through [`AppointmentsScreen::view`]. The host renders it.

use std::sync::{Arc, Mutex};

use shared::domain::{Appointment, AppointmentId, Service};
use tracing::debug;

use crate::{
    api::BookingApi,
    cache::{AppointmentsCache, PageCache},
    catalog::{ServiceCatalog, ServiceChoice},
    edit_session::{DraftField, EditDraft, EditSession},
    error::{EditSessionError, FetchError, MutationError, PaginationError},
    lock,
    mutation::{MutationCoordinator, MutationState, SubmitOutcome},
    ordering::order,
    pagination::{PageIndex, PageResult, Pagination},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditView {
    pub draft: EditDraft,
    pub choices: Vec<ServiceChoice>,
    pub is_submitting: bool,
    pub error: Option<MutationError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentsView {
    pub page: PageIndex,
    pub total_pages: u32,
    pub page_numbers: Vec<u32>,
    /// Displayed appointments in chronological order.
    pub rows: Vec<Appointment>,
    /// Nothing to show yet and a fetch is running.
    pub is_loading: bool,
    pub is_fetching: bool,
    /// `rows` belong to a previously viewed page while the current one loads.
    pub is_previous_data: bool,
    pub error: Option<FetchError>,
    pub is_empty: bool,
    pub edit: Option<EditView>,
    pub details: Option<Appointment>,
}

#[derive(Default)]
struct ViewState {
    displayed: Option<Arc<PageResult>>,
    generation: u64,
    is_fetching: bool,
    error: Option<FetchError>,
    details: Option<AppointmentId>,
}

pub struct AppointmentsScreen {
    pagination: Mutex<Pagination>,
    cache: Arc<dyn PageCache>,
    catalog: Arc<ServiceCatalog>,
    edit: EditSession,
    mutations: MutationCoordinator,
    view_state: Mutex<ViewState>,
}

impl AppointmentsScreen {
    pub fn new(booking: Arc<dyn BookingApi>, catalog: Arc<ServiceCatalog>) -> Self {
        let cache: Arc<dyn PageCache> = Arc::new(AppointmentsCache::new(Arc::clone(&booking)));
        Self::with_cache(booking, cache, catalog)
    }

    pub fn with_cache(
        booking: Arc<dyn BookingApi>,
        cache: Arc<dyn PageCache>,
        catalog: Arc<ServiceCatalog>,
    ) -> Self {
        Self {
            pagination: Mutex::new(Pagination::default()),
            mutations: MutationCoordinator::new(booking, Arc::clone(&cache)),
            cache,
            catalog,
            edit: EditSession::new(),
            view_state: Mutex::new(ViewState::default()),
        }
    }

    /// Loads the service catalog and the current page concurrently.
    pub async fn start(&self) {
        let page = self.current_page();
        tokio::join!(self.load_catalog(), self.load(page, false));
    }

    pub async fn load_catalog(&self) -> Vec<Service> {
        self.catalog.load().await
    }

    pub fn current_page(&self) -> PageIndex {
        lock(&self.pagination).current()
    }

    /// Switches to page `page` and reads it through the cache. Fetch failures
    /// end up in [`AppointmentsView::error`], never in the return value.
    pub async fn show_page(&self, page: i64) -> Result<PageIndex, PaginationError> {
        let page = lock(&self.pagination).set_page(page)?;
        self.load(page, false).await;
        Ok(page)
    }

    /// Refetches the displayed page regardless of freshness.
    pub async fn reload(&self) {
        let page = self.current_page();
        self.load(page, true).await;
    }

    async fn load(&self, page: PageIndex, force: bool) {
        let generation = {
            let mut view = lock(&self.view_state);
            view.generation += 1;
            view.is_fetching = true;
            view.generation
        };

        let result = if force {
            self.cache.refetch(page).await
        } else {
            self.cache.get(page).await
        };

        let mut view = lock(&self.view_state);
        if view.generation != generation {
            debug!(
                page = page.get(),
                generation,
                latest_generation = view.generation,
                "screen: ignoring result for a page no longer requested"
            );
            return;
        }
        view.is_fetching = false;
        match result {
            Ok(data) => {
                view.displayed = Some(data);
                view.error = None;
            }
            Err(error) => view.error = Some(error),
        }
    }

    fn displayed_appointment(&self, appointment_id: AppointmentId) -> Option<Appointment> {
        let view = lock(&self.view_state);
        view.displayed.as_ref().and_then(|page| {
            page.appointments
                .iter()
                .find(|appointment| appointment.appointment_id == appointment_id)
                .cloned()
        })
    }

    pub fn open_edit(&self, appointment_id: AppointmentId) -> Result<EditDraft, EditSessionError> {
        let appointment = self
            .displayed_appointment(appointment_id)
            .ok_or(EditSessionError::UnknownAppointment(appointment_id.0))?;
        self.mutations.clear_error();
        Ok(self.edit.open(&appointment))
    }

    pub fn update_draft(&self, field: DraftField) -> Result<EditDraft, EditSessionError> {
        self.edit.update(field)
    }

    pub fn close_edit(&self) {
        self.edit.close();
        self.mutations.clear_error();
    }

    pub async fn submit_edit(&self) -> SubmitOutcome {
        let page = self.current_page();
        let outcome = self.mutations.submit(&self.edit, page).await;
        if outcome == SubmitOutcome::Succeeded {
            self.sync_from_cache(page);
        }
        outcome
    }

    /// Pulls the refetched page into the view unless the user has moved on.
    fn sync_from_cache(&self, page: PageIndex) {
        if self.current_page() != page {
            return;
        }
        let snapshot = self.cache.snapshot(page);
        let mut view = lock(&self.view_state);
        if let Some(data) = snapshot.data {
            view.displayed = Some(data);
        }
        view.error = snapshot.error;
    }

    pub fn show_details(&self, appointment_id: AppointmentId) -> Option<Appointment> {
        let appointment = self.displayed_appointment(appointment_id)?;
        lock(&self.view_state).details = Some(appointment_id);
        Some(appointment)
    }

    pub fn close_details(&self) {
        lock(&self.view_state).details = None;
    }

    pub fn view(&self) -> AppointmentsView {
        let pagination = lock(&self.pagination).clone();
        let page = pagination.current();
        let edit = self.edit.draft().map(|draft| EditView {
            draft,
            choices: self.catalog.choices(),
            is_submitting: self.mutations.state() == MutationState::Submitting,
            error: self.mutations.last_error(),
        });

        let view = lock(&self.view_state);
        let total = view.displayed.as_ref().map_or(0, |displayed| displayed.total);
        let rows = view
            .displayed
            .as_ref()
            .map(|displayed| order(&displayed.appointments))
            .unwrap_or_default();
        let details = view.details.and_then(|id| {
            rows.iter()
                .find(|appointment| appointment.appointment_id == id)
                .cloned()
        });

        AppointmentsView {
            page,
            total_pages: pagination.total_pages(total),
            page_numbers: pagination.page_numbers(total).collect(),
            is_loading: view.is_fetching && view.displayed.is_none(),
            is_fetching: view.is_fetching,
            is_previous_data: view
                .displayed
                .as_ref()
                .is_some_and(|displayed| displayed.page != page),
            error: view.error.clone(),
            is_empty: !view.is_fetching
                && (view.displayed.is_some() || view.error.is_some())
                && rows.is_empty(),
            edit,
            details,
            rows,
        }
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
