use jiff::civil::Date;
use reqwest::StatusCode;
use serde::Serialize;

use crate::{ReservationId, SiteId, requests, responses};

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the backend.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/{path}", &self.address)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.inner_client
            .post(self.format_url(path))
            .json(body)
            .send()
            .await
    }

    async fn put(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.inner_client
            .put(self.format_url(path))
            .json(body)
            .send()
            .await
    }

    async fn delete(&self, path: &str) -> ReqwestResult {
        self.inner_client
            .delete(self.format_url(path))
            .send()
            .await
    }

    async fn get(&self, path: &str) -> ReqwestResult {
        self.inner_client.get(self.format_url(path)).send().await
    }
}

/// Methods on the backend API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.get("health_check").await?;
        ok_empty(response).await
    }

    pub async fn create_site(
        &self,
        details: &requests::CreateSite,
    ) -> Result<responses::Site, ClientError> {
        let response = self.post("admin/sites", details).await?;
        ok_body(response).await
    }

    pub async fn list_sites(
        &self,
    ) -> Result<Vec<responses::Site>, ClientError> {
        let response = self.get("admin/sites").await?;
        ok_body(response).await
    }

    pub async fn availability(
        &self,
        site_id: &SiteId,
        check_in: Date,
        check_out: Date,
    ) -> Result<responses::Availability, ClientError> {
        let response = self
            .get(&format!(
                "reservations/availability?siteId={site_id}&checkIn={check_in}&checkOut={check_out}"
            ))
            .await?;
        ok_body(response).await
    }

    pub async fn disabled_dates(
        &self,
        site_id: &SiteId,
        from: Date,
        to: Date,
    ) -> Result<responses::DisabledDates, ClientError> {
        let response = self
            .get(&format!(
                "reservations/disabled-dates?siteId={site_id}&from={from}&to={to}"
            ))
            .await?;
        ok_body(response).await
    }

    pub async fn get_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<responses::Reservation, ClientError> {
        let response =
            self.get(&format!("reservations/{reservation_id}")).await?;
        ok_body(response).await
    }

    pub async fn request_cancel(
        &self,
        reservation_id: &ReservationId,
        details: &requests::RequestCancel,
    ) -> Result<responses::Reservation, ClientError> {
        let response = self
            .post(
                &format!("reservations/{reservation_id}/cancel-request"),
                details,
            )
            .await?;
        ok_body(response).await
    }

    pub async fn payment_ready(
        &self,
        details: &requests::PaymentReady,
    ) -> Result<responses::PaymentReady, ClientError> {
        let response = self.post("payments/ready", details).await?;
        ok_body(response).await
    }

    pub async fn payment_confirm(
        &self,
        details: &requests::PaymentConfirm,
    ) -> Result<responses::PaymentConfirm, ClientError> {
        let response = self.post("payments/confirm", details).await?;
        ok_body(response).await
    }

    pub async fn create_internal_reservation(
        &self,
        details: &requests::CreateInternalReservation,
    ) -> Result<responses::Reservation, ClientError> {
        let response =
            self.post("admin/internal-reservations", details).await?;
        ok_body(response).await
    }

    pub async fn update_internal_reservation(
        &self,
        reservation_id: &ReservationId,
        details: &requests::UpdateInternalReservation,
    ) -> Result<responses::Reservation, ClientError> {
        let response = self
            .put(
                &format!("admin/internal-reservations/{reservation_id}"),
                details,
            )
            .await?;
        ok_body(response).await
    }

    pub async fn cancel_internal_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<responses::Deleted, ClientError> {
        let response = self
            .delete(&format!("admin/internal-reservations/{reservation_id}"))
            .await?;
        ok_body(response).await
    }

    pub async fn update_reservation_status(
        &self,
        details: &requests::UpdateReservationStatus,
    ) -> Result<responses::Reservation, ClientError> {
        let response =
            self.post("admin/reservations/update-status", details).await?;
        ok_body(response).await
    }

    pub async fn resolve_cancel_request(
        &self,
        details: &requests::ResolveCancelRequest,
    ) -> Result<responses::Reservation, ClientError> {
        let response =
            self.post("admin/reservations/resolve-cancel", details).await?;
        ok_body(response).await
    }

    pub async fn list_site_reservations(
        &self,
        site_id: &SiteId,
    ) -> Result<Vec<responses::Reservation>, ClientError> {
        let response = self
            .get(&format!("admin/reservations?siteId={site_id}"))
            .await?;
        ok_body(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
