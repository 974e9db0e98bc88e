use thiserror::Error;

/// A page fetch that did not produce data. Cloneable because every caller
/// coalesced onto one request receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("failed to load appointments page {page}: {message}")]
    Backend { page: u32, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("booking backend rejected the edit: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a service must be selected")]
    MissingService,
    #[error("appointment date is required")]
    MissingDate,
    #[error("appointment time is required")]
    MissingTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page index must be at least 1, got {0}")]
    PageOutOfRange(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditSessionError {
    #[error("no edit session is open")]
    NotOpen,
    #[error("appointment {0} is not on the displayed page")]
    UnknownAppointment(i64),
}
