use std::sync::Mutex;

use shared::{
    domain::{Appointment, AppointmentId, ServiceId},
    protocol::EditBookingRequest,
};
use tracing::debug;

use crate::{
    error::{EditSessionError, ValidationError},
    lock,
};

/// Working copy of one appointment's editable fields.
///
/// Owned and detached from the cached [`Appointment`]; nothing written here is
/// visible anywhere else until a mutation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    appointment_id: AppointmentId,
    pub service_id: Option<ServiceId>,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Service(Option<ServiceId>),
    Date(String),
    Time(String),
}

impl EditDraft {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.appointment_id,
            service_id: Some(appointment.service.id),
            date: appointment.appointment_date.clone(),
            time: appointment.appointment_time.clone(),
        }
    }

    pub fn appointment_id(&self) -> AppointmentId {
        self.appointment_id
    }

    pub fn apply(&mut self, field: DraftField) {
        match field {
            DraftField::Service(service_id) => self.service_id = service_id,
            DraftField::Date(date) => self.date = date,
            DraftField::Time(time) => self.time = time,
        }
    }

    /// Checks required fields and builds the backend request. The backend may
    /// still reject a request that passes here.
    pub fn validate(&self) -> Result<EditBookingRequest, ValidationError> {
        let service_id = self.service_id.ok_or(ValidationError::MissingService)?;
        let date = self.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let time = self.time.trim();
        if time.is_empty() {
            return Err(ValidationError::MissingTime);
        }

        Ok(EditBookingRequest {
            appointment_id: self.appointment_id,
            appointment_date: date.to_string(),
            appointment_time: time.to_string(),
            service_id,
        })
    }
}

/// Identifies one opening of the edit modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket(u64);

#[derive(Default)]
struct SessionState {
    draft: Option<EditDraft>,
    epoch: u64,
}

/// Visibility and draft of the edit modal, independent of any widget.
#[derive(Default)]
pub struct EditSession {
    state: Mutex<SessionState>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, appointment: &Appointment) -> EditDraft {
        let draft = EditDraft::from_appointment(appointment);
        let mut state = lock(&self.state);
        state.epoch += 1;
        state.draft = Some(draft.clone());
        debug!(
            appointment_id = appointment.appointment_id.0,
            epoch = state.epoch,
            "edit: session opened"
        );
        draft
    }

    pub fn update(&self, field: DraftField) -> Result<EditDraft, EditSessionError> {
        let mut state = lock(&self.state);
        let draft = state.draft.as_mut().ok_or(EditSessionError::NotOpen)?;
        draft.apply(field);
        Ok(draft.clone())
    }

    pub fn close(&self) {
        let mut state = lock(&self.state);
        if state.draft.take().is_some() {
            state.epoch += 1;
            debug!(epoch = state.epoch, "edit: session closed");
        }
    }

    /// Closes the session only if it is still the one `ticket` was taken
    /// from. A late completion must not touch a session the user already
    /// closed or reopened.
    pub fn close_if_current(&self, ticket: SessionTicket) -> bool {
        let mut state = lock(&self.state);
        if state.draft.is_none() || state.epoch != ticket.0 {
            debug!(
                epoch = state.epoch,
                ticket = ticket.0,
                "edit: completion for an older session ignored"
            );
            return false;
        }
        state.draft = None;
        state.epoch += 1;
        true
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).draft.is_some()
    }

    pub fn draft(&self) -> Option<EditDraft> {
        lock(&self.state).draft.clone()
    }

    pub fn current(&self) -> Option<(SessionTicket, EditDraft)> {
        let state = lock(&self.state);
        state
            .draft
            .clone()
            .map(|draft| (SessionTicket(state.epoch), draft))
    }
}

#[cfg(test)]
#[path = "tests/edit_session_tests.rs"]
mod tests;
