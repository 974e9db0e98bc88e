//! Types shared between the booking backend's wire format and the client.

pub mod domain;
pub mod error;
pub mod protocol;
