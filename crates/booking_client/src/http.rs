use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::Service,
    protocol::{ApiEnvelope, BookingsPayload, BookingsQuery, EditBookingRequest},
};
use tracing::debug;
use url::Url;

use crate::{
    api::{BookingApi, ServiceCatalogApi},
    config::ClientSettings,
    pagination::PageIndex,
};

/// Booking and service-catalog endpoints over HTTP + JSON.
pub struct HttpBackend {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: parse_base_url(base_url)?,
            auth_token: None,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: parse_base_url(&settings.api_base_url)?,
            auth_token: settings.auth_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path '{path}'"))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// `Url::join` drops the last path segment unless it ends with a slash.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).with_context(|| format!("invalid api base url '{raw}'"))
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<ApiEnvelope<T>> {
    let status = response.status();
    let url = response.url().clone();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read response body from {url}"))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or(body);
        return Err(anyhow!("{url} returned {status}: {message}"));
    }

    serde_json::from_str(&body).with_context(|| format!("invalid response body from {url}"))
}

#[async_trait]
impl BookingApi for HttpBackend {
    async fn get_bookings(&self, page: PageIndex) -> Result<BookingsPayload> {
        let url = self.endpoint("bookings")?;
        debug!(%url, page = page.get(), "http: GET bookings");
        let response = self
            .authorized(self.http.get(url))
            .query(&BookingsQuery { page: page.get() })
            .send()
            .await?;
        let envelope: ApiEnvelope<BookingsPayload> = read_envelope(response).await?;
        Ok(envelope.into_data()?)
    }

    async fn edit_booking(&self, request: EditBookingRequest) -> Result<()> {
        let url = self.endpoint("bookings/edit")?;
        debug!(%url, appointment_id = request.appointment_id.0, "http: POST edit booking");
        let response = self
            .authorized(self.http.post(url))
            .json(&request)
            .send()
            .await?;
        let envelope: ApiEnvelope<serde_json::Value> = read_envelope(response).await?;
        Ok(envelope.into_unit()?)
    }
}

#[async_trait]
impl ServiceCatalogApi for HttpBackend {
    async fn get_services(&self) -> Result<Vec<Service>> {
        let url = self.endpoint("services")?;
        debug!(%url, "http: GET services");
        let response = self.authorized(self.http.get(url)).send().await?;
        let envelope: ApiEnvelope<Vec<Service>> = read_envelope(response).await?;
        Ok(envelope.into_data()?)
    }
}
