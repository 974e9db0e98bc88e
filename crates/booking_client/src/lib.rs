//! Client-side synchronization for a client's upcoming appointments.
//!
//! The crate keeps a paginated, coalescing cache of appointment pages, orders
//! them chronologically, loads the bookable service catalog once per session
//! and runs the edit-appointment mutation with cache invalidation. Rendering is
//! left to the host; [`screen::AppointmentsScreen`] hands it plain data.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod edit_session;
pub mod error;
pub mod http;
pub mod mutation;
pub mod ordering;
pub mod pagination;
pub mod screen;

pub use api::{BookingApi, ServiceCatalogApi};
pub use cache::{AppointmentsCache, Invalidation, PageCache, QuerySnapshot};
pub use catalog::{CatalogState, RetryPolicy, ServiceCatalog, ServiceChoice};
pub use config::{load_settings, ClientSettings};
pub use edit_session::{DraftField, EditDraft, EditSession, SessionTicket};
pub use error::{EditSessionError, FetchError, MutationError, PaginationError, ValidationError};
pub use http::HttpBackend;
pub use mutation::{MutationCoordinator, MutationState, SubmitOutcome};
pub use ordering::order;
pub use pagination::{total_pages, PageIndex, PageResult, Pagination, PAGE_SIZE};
pub use screen::{AppointmentsScreen, AppointmentsView, EditView};

/// State guarded here is only touched in short synchronous sections, so a
/// poisoned lock still holds consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
