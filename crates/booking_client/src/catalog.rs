use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use shared::domain::{Service, ServiceId};
use tracing::{debug, info, warn};

use crate::{api::ServiceCatalogApi, lock};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// How many times the one-shot catalog load may try before giving up.
/// The default makes a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    NotLoaded,
    Loading,
    Loaded(Vec<Service>),
    Unavailable,
}

/// One option of the edit form's service selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceChoice {
    /// "Choose a service"; selecting it clears the draft's service.
    Placeholder,
    Service(Service),
    /// Shown alone, disabled, when the catalog is empty.
    NoneAvailable,
}

impl ServiceChoice {
    pub fn value(&self) -> Option<ServiceId> {
        match self {
            Self::Service(service) => Some(service.id),
            Self::Placeholder | Self::NoneAvailable => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::NoneAvailable)
    }
}

/// Read-only list of bookable services, fetched once per session and
/// independent of the appointments cache.
pub struct ServiceCatalog {
    api: Arc<dyn ServiceCatalogApi>,
    retry: RetryPolicy,
    state: Mutex<CatalogState>,
}

impl ServiceCatalog {
    pub fn new(api: Arc<dyn ServiceCatalogApi>) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            state: Mutex::new(CatalogState::NotLoaded),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches the catalog on the first call only. Failures are logged and
    /// leave the catalog empty; they never reach the caller.
    ///
    /// Later calls return the current state without waiting, so a call made
    /// while the first load is still running gets an empty list. Read
    /// [`ServiceCatalog::services`] or [`ServiceCatalog::choices`] once that
    /// load has finished.
    pub async fn load(&self) -> Vec<Service> {
        {
            let mut state = lock(&self.state);
            if *state != CatalogState::NotLoaded {
                debug!("catalog: load already requested this session; skipping");
                return services_of(&state);
            }
            *state = CatalogState::Loading;
        }

        let max_attempts = self.retry.attempts.max(1);
        let mut loaded = None;
        for attempt in 1..=max_attempts {
            match self.api.get_services().await {
                Ok(services) => {
                    loaded = Some(services);
                    break;
                }
                Err(error) => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %format!("{error:#}"),
                        "catalog: failed to load services"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        let mut state = lock(&self.state);
        match loaded {
            Some(services) => {
                info!(count = services.len(), "catalog: services loaded");
                *state = CatalogState::Loaded(services.clone());
                services
            }
            None => {
                warn!("catalog: no services available for this session");
                *state = CatalogState::Unavailable;
                Vec::new()
            }
        }
    }

    pub fn state(&self) -> CatalogState {
        lock(&self.state).clone()
    }

    pub fn services(&self) -> Vec<Service> {
        services_of(&lock(&self.state))
    }

    pub fn choices(&self) -> Vec<ServiceChoice> {
        let services = self.services();
        if services.is_empty() {
            return vec![ServiceChoice::Placeholder, ServiceChoice::NoneAvailable];
        }
        std::iter::once(ServiceChoice::Placeholder)
            .chain(services.into_iter().map(ServiceChoice::Service))
            .collect()
    }
}

fn services_of(state: &CatalogState) -> Vec<Service> {
    match state {
        CatalogState::Loaded(services) => services.clone(),
        CatalogState::NotLoaded | CatalogState::Loading | CatalogState::Unavailable => Vec::new(),
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
