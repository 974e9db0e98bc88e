use serde::{Deserialize, Serialize};

use crate::{
    domain::{Appointment, AppointmentId, ServiceId},
    error::{ApiError, ErrorCode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    #[serde(other)]
    Error,
}

/// `{ "status": ..., "data": ..., "message": ... }` wrapper used by every
/// booking backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: EnvelopeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
            code: None,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: None,
            message: Some(message.into()),
            code: Some(code),
        }
    }

    pub fn into_data(self) -> Result<T, ApiError> {
        match (self.status, self.data) {
            (EnvelopeStatus::Success, Some(data)) => Ok(data),
            (EnvelopeStatus::Success, None) => Err(ApiError::new(
                ErrorCode::Internal,
                "success response without data",
            )),
            (EnvelopeStatus::Error, _) => Err(ApiError::new(
                self.code.unwrap_or(ErrorCode::Unknown),
                self.message
                    .unwrap_or_else(|| "request rejected by booking backend".to_string()),
            )),
        }
    }

    /// Like [`ApiEnvelope::into_data`] for endpoints whose success body carries
    /// nothing the client needs.
    pub fn into_unit(self) -> Result<(), ApiError> {
        match self.status {
            EnvelopeStatus::Success => Ok(()),
            EnvelopeStatus::Error => Err(ApiError::new(
                self.code.unwrap_or(ErrorCode::Unknown),
                self.message
                    .unwrap_or_else(|| "request rejected by booking backend".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingsPayload {
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBookingRequest {
    pub appointment_id: AppointmentId,
    pub appointment_date: String,
    pub appointment_time: String,
    pub service_id: ServiceId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingsQuery {
    pub page: u32,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
