use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::Service,
    protocol::{BookingsPayload, EditBookingRequest},
};

use crate::pagination::PageIndex;

/// Booking backend operations used by the appointments page.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn get_bookings(&self, page: PageIndex) -> Result<BookingsPayload>;
    async fn edit_booking(&self, request: EditBookingRequest) -> Result<()>;
}

#[async_trait]
pub trait ServiceCatalogApi: Send + Sync {
    async fn get_services(&self) -> Result<Vec<Service>>;
}
