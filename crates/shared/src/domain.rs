use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(AppointmentId);
id_newtype!(ServiceId);

/// Lifecycle of a booking as reported by the backend.
///
/// The backend may send values outside the known set; those land in
/// [`AppointmentStatus::Unspecified`] instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    #[default]
    Unspecified,
}

impl AppointmentStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unspecified => "unspecified",
        }
    }

    /// Badge colouring used by the presentation layer.
    pub fn tone(self) -> StatusTone {
        match self {
            Self::Pending => StatusTone::Warning,
            Self::Confirmed => StatusTone::Success,
            Self::Completed => StatusTone::Info,
            Self::Cancelled => StatusTone::Danger,
            Self::Unspecified => StatusTone::Neutral,
        }
    }
}

impl From<Option<String>> for AppointmentStatus {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map_or(Self::Unspecified, Self::from_raw)
    }
}

impl From<AppointmentStatus> for &'static str {
    fn from(value: AppointmentStatus) -> Self {
        value.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Warning,
    Success,
    Info,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    #[serde(rename = "service_id")]
    pub id: ServiceId,
    #[serde(rename = "service_name", default)]
    pub name: String,
}

/// One of the signed-in client's bookings.
///
/// `appointment_date` and `appointment_time` are kept exactly as the backend
/// sent them; parsing happens where ordering needs it so a malformed value
/// never rejects the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: AppointmentId,
    #[serde(flatten)]
    pub service: ServiceRef,
    pub appointment_date: String,
    pub appointment_time: String,
    #[serde(default)]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
