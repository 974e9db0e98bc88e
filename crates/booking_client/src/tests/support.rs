//! In-memory backends shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Appointment, AppointmentId, AppointmentStatus, Service, ServiceId, ServiceRef},
    protocol::{BookingsPayload, EditBookingRequest},
};
use tokio::sync::Semaphore;

use crate::{
    api::{BookingApi, ServiceCatalogApi},
    cache::{Invalidation, PageCache, QuerySnapshot},
    error::FetchError,
    lock,
    pagination::{PageIndex, PageResult, PAGE_SIZE},
};

pub(crate) fn appointment(id: i64, date: &str, time: &str) -> Appointment {
    Appointment {
        appointment_id: AppointmentId(id),
        service: ServiceRef {
            id: ServiceId(1),
            name: "Haircut".into(),
        },
        appointment_date: date.into(),
        appointment_time: time.into(),
        status: AppointmentStatus::Confirmed,
    }
}

pub(crate) fn service(id: i64, name: &str) -> Service {
    Service {
        id: ServiceId(id),
        name: name.into(),
    }
}

pub(crate) fn page(n: i64) -> PageIndex {
    PageIndex::new(n).expect("valid page")
}

/// Pages through a stored list the way the backend does. Each call can be
/// held until the test releases a queued gate.
#[derive(Default)]
pub(crate) struct FakeBookingApi {
    appointments: Mutex<Vec<Appointment>>,
    fetch_error: Mutex<Option<String>>,
    edit_error: Mutex<Option<String>>,
    fetch_gates: Mutex<VecDeque<Arc<Semaphore>>>,
    edit_gates: Mutex<VecDeque<Arc<Semaphore>>>,
    fetched_pages: Mutex<Vec<u32>>,
    edits: Mutex<Vec<EditBookingRequest>>,
}

impl FakeBookingApi {
    pub(crate) fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
            ..Self::default()
        }
    }

    pub(crate) fn replace_appointments(&self, appointments: Vec<Appointment>) {
        *lock(&self.appointments) = appointments;
    }

    pub(crate) fn fail_fetches(&self, message: Option<&str>) {
        *lock(&self.fetch_error) = message.map(str::to_string);
    }

    pub(crate) fn fail_edits(&self, message: Option<&str>) {
        *lock(&self.edit_error) = message.map(str::to_string);
    }

    /// The next fetch that starts waits until a permit is added.
    pub(crate) fn hold_next_fetch(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        lock(&self.fetch_gates).push_back(Arc::clone(&gate));
        gate
    }

    pub(crate) fn hold_next_edit(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        lock(&self.edit_gates).push_back(Arc::clone(&gate));
        gate
    }

    pub(crate) fn fetched_pages(&self) -> Vec<u32> {
        lock(&self.fetched_pages).clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        lock(&self.fetched_pages).len()
    }

    pub(crate) fn edits(&self) -> Vec<EditBookingRequest> {
        lock(&self.edits).clone()
    }
}

#[async_trait]
impl BookingApi for FakeBookingApi {
    async fn get_bookings(&self, page: PageIndex) -> Result<BookingsPayload> {
        lock(&self.fetched_pages).push(page.get());
        let gate = lock(&self.fetch_gates).pop_front();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        let fetch_error = lock(&self.fetch_error).clone();
        if let Some(message) = fetch_error {
            return Err(anyhow!(message));
        }

        let appointments = lock(&self.appointments);
        let start = (page.get() as usize - 1) * PAGE_SIZE as usize;
        let slice = appointments
            .iter()
            .skip(start)
            .take(PAGE_SIZE as usize)
            .cloned()
            .collect();
        Ok(BookingsPayload {
            appointments: slice,
            total: appointments.len() as u64,
        })
    }

    async fn edit_booking(&self, request: EditBookingRequest) -> Result<()> {
        lock(&self.edits).push(request.clone());
        let gate = lock(&self.edit_gates).pop_front();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        let edit_error = lock(&self.edit_error).clone();
        if let Some(message) = edit_error {
            return Err(anyhow!(message));
        }

        let mut appointments = lock(&self.appointments);
        let stored = appointments
            .iter_mut()
            .find(|appointment| appointment.appointment_id == request.appointment_id)
            .ok_or_else(|| anyhow!("appointment {} not found", request.appointment_id.0))?;
        stored.service.id = request.service_id;
        stored.appointment_date = request.appointment_date;
        stored.appointment_time = request.appointment_time;
        Ok(())
    }
}

/// Answers each catalog call with the next scripted response.
pub(crate) struct FakeCatalogApi {
    script: Mutex<VecDeque<Result<Vec<Service>, String>>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    calls: AtomicUsize,
}

impl FakeCatalogApi {
    pub(crate) fn scripted(script: Vec<Result<Vec<Service>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn ok(services: Vec<Service>) -> Self {
        Self::scripted(vec![Ok(services)])
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::scripted(vec![Err(message.to_string())])
    }

    pub(crate) fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *lock(&self.gate) = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceCatalogApi for FakeCatalogApi {
    async fn get_services(&self) -> Result<Vec<Service>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.gate).take();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }
        let next = lock(&self.script).pop_front();
        next.unwrap_or_else(|| Err("no scripted response".to_string()))
            .map_err(|message| anyhow!(message))
    }
}

/// Records what the mutation asks of the cache.
#[derive(Default)]
pub(crate) struct RecordingCache {
    invalidations: Mutex<Vec<Invalidation>>,
    refetches: Mutex<Vec<PageIndex>>,
}

impl RecordingCache {
    pub(crate) fn invalidations(&self) -> Vec<Invalidation> {
        lock(&self.invalidations).clone()
    }

    pub(crate) fn refetches(&self) -> Vec<PageIndex> {
        lock(&self.refetches).clone()
    }
}

#[async_trait]
impl PageCache for RecordingCache {
    async fn get(&self, page: PageIndex) -> Result<Arc<PageResult>, FetchError> {
        Ok(Arc::new(PageResult {
            page,
            appointments: Vec::new(),
            total: 0,
        }))
    }

    async fn refetch(&self, page: PageIndex) -> Result<Arc<PageResult>, FetchError> {
        lock(&self.refetches).push(page);
        self.get(page).await
    }

    fn invalidate(&self, scope: Invalidation) {
        lock(&self.invalidations).push(scope);
    }

    fn snapshot(&self, _page: PageIndex) -> QuerySnapshot {
        QuerySnapshot::default()
    }
}
