//! Keyed cache of appointment pages.
//!
//! Each page key holds at most one [`PageResult`]. Concurrent reads of a page
//! that is being fetched join the in-flight request instead of issuing another
//! one. Every fetch is stamped with a generation id taken from a counter that
//! only grows; when a response lands, it is written only if its generation is
//! still the latest started for that key, so a slow response can never
//! overwrite a newer one. Invalidation detaches any in-flight fetch, and a
//! response from a fetch started before the invalidation is stored as stale.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::{
    api::BookingApi,
    error::FetchError,
    lock,
    pagination::{PageIndex, PageResult},
};

type FetchResult = Result<Arc<PageResult>, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    Page(PageIndex),
    All,
}

/// What a reader currently knows about one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub data: Option<Arc<PageResult>>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub error: Option<FetchError>,
}

/// Cache service shared by the page reader and the edit mutation.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Cached page when fresh, otherwise the result of a (possibly shared)
    /// fetch.
    async fn get(&self, page: PageIndex) -> FetchResult;
    /// Fetches unconditionally, ignoring freshness.
    async fn refetch(&self, page: PageIndex) -> FetchResult;
    /// Marks entries stale so the next `get` fetches again, detaching any
    /// fetch already in flight. Data is kept until a newer response replaces
    /// it.
    fn invalidate(&self, scope: Invalidation);
    fn snapshot(&self, page: PageIndex) -> QuerySnapshot;
}

#[derive(Default)]
struct CacheEntry {
    data: Option<Arc<PageResult>>,
    stale: bool,
    error: Option<FetchError>,
    latest_generation: u64,
    /// Fetches with a generation at or below this one began before the last
    /// invalidation.
    invalidated_through: u64,
    in_flight: Option<SharedFetch>,
}

enum Lookup {
    Fresh(Arc<PageResult>),
    Pending(SharedFetch),
    Miss,
}

impl CacheEntry {
    fn invalidate(&mut self, through: u64) {
        self.stale = true;
        self.invalidated_through = through;
        self.in_flight = None;
    }

    fn lookup(&self) -> Lookup {
        if let Some(in_flight) = &self.in_flight {
            return Lookup::Pending(in_flight.clone());
        }
        match &self.data {
            Some(data) if !self.stale => Lookup::Fresh(Arc::clone(data)),
            _ => Lookup::Miss,
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<PageIndex, CacheEntry>,
    next_generation: u64,
}

pub struct AppointmentsCache {
    api: Arc<dyn BookingApi>,
    state: Arc<Mutex<CacheState>>,
}

impl AppointmentsCache {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn start_fetch(&self, state: &mut CacheState, page: PageIndex) -> SharedFetch {
        state.next_generation += 1;
        let generation = state.next_generation;
        let api = Arc::clone(&self.api);
        let cache_state = Arc::downgrade(&self.state);

        let fetch = async move {
            debug!(page = page.get(), generation, "cache: fetching appointments page");
            let result = api
                .get_bookings(page)
                .await
                .map(|payload| Arc::new(PageResult::from_payload(page, payload)))
                .map_err(|error| FetchError::Backend {
                    page: page.get(),
                    message: format!("{error:#}"),
                });
            settle(&cache_state, page, generation, &result);
            result
        }
        .boxed()
        .shared();

        let entry = state.entries.entry(page).or_default();
        entry.latest_generation = generation;
        entry.in_flight = Some(fetch.clone());
        fetch
    }
}

fn settle(state: &Weak<Mutex<CacheState>>, page: PageIndex, generation: u64, result: &FetchResult) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock(&state);
    let Some(entry) = state.entries.get_mut(&page) else {
        return;
    };

    if entry.latest_generation != generation {
        debug!(
            page = page.get(),
            generation,
            latest_generation = entry.latest_generation,
            "cache: discarding superseded response"
        );
        return;
    }

    entry.in_flight = None;
    match result {
        Ok(data) => {
            info!(
                page = page.get(),
                generation,
                count = data.appointments.len(),
                total = data.total,
                "cache: page stored"
            );
            entry.data = Some(Arc::clone(data));
            entry.stale = generation <= entry.invalidated_through;
            entry.error = None;
        }
        Err(error) => {
            warn!(
                page = page.get(),
                generation,
                %error,
                kept_previous = entry.data.is_some(),
                "cache: page fetch failed"
            );
            entry.error = Some(error.clone());
        }
    }
}

#[async_trait]
impl PageCache for AppointmentsCache {
    async fn get(&self, page: PageIndex) -> FetchResult {
        let fetch = {
            let mut state = lock(&self.state);
            let lookup = state
                .entries
                .get(&page)
                .map_or(Lookup::Miss, CacheEntry::lookup);
            match lookup {
                Lookup::Fresh(data) => {
                    debug!(page = page.get(), "cache: hit");
                    return Ok(data);
                }
                Lookup::Pending(fetch) => {
                    debug!(page = page.get(), "cache: joining in-flight fetch");
                    fetch
                }
                Lookup::Miss => self.start_fetch(&mut state, page),
            }
        };
        fetch.await
    }

    async fn refetch(&self, page: PageIndex) -> FetchResult {
        let fetch = {
            let mut state = lock(&self.state);
            self.start_fetch(&mut state, page)
        };
        fetch.await
    }

    fn invalidate(&self, scope: Invalidation) {
        let mut state = lock(&self.state);
        let through = state.next_generation;
        match scope {
            Invalidation::Page(page) => {
                if let Some(entry) = state.entries.get_mut(&page) {
                    entry.invalidate(through);
                }
            }
            Invalidation::All => {
                for entry in state.entries.values_mut() {
                    entry.invalidate(through);
                }
            }
        }
        debug!(?scope, "cache: invalidated");
    }

    fn snapshot(&self, page: PageIndex) -> QuerySnapshot {
        let state = lock(&self.state);
        state
            .entries
            .get(&page)
            .map(|entry| QuerySnapshot {
                data: entry.data.clone(),
                is_fetching: entry.in_flight.is_some(),
                is_stale: entry.stale,
                error: entry.error.clone(),
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
