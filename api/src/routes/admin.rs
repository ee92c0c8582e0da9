use actix_web::{HttpResponse, delete, get, post, put, web};
use payloads::{ReservationId, SiteId, requests};
use serde::Deserialize;

use super::{APIError, missing};
use crate::lifecycle;
use crate::store::ReservationStore;
use crate::time::TimeSource;

#[tracing::instrument(skip_all, fields(name = %details.name))]
#[post("/admin/sites")]
pub async fn create_site(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    details: web::Json<requests::CreateSite>,
) -> Result<HttpResponse, APIError> {
    if details.name.trim().is_empty() {
        return Err(missing("name"));
    }
    if details.name.chars().count() > requests::SITE_NAME_MAX_LEN {
        return Err(APIError::BadRequest {
            code: "FIELD_TOO_LONG",
            source: anyhow::anyhow!("name exceeds the maximum length"),
        });
    }
    // Legacy rate aliases collapse here, at the ingestion boundary.
    let rate_table = details.rates.normalize().ok_or_else(|| {
        APIError::BadRequest {
            code: "MISSING_FIELD",
            source: anyhow::anyhow!("rates must include a base amount"),
        }
    })?;
    let site = payloads::Site {
        name: details.name.clone(),
        zone: details.zone.clone(),
        kind: details.kind,
        rate_table,
        peak_season: details.peak_season,
        is_active: details.is_active.unwrap_or(true),
    };
    let created = store.create_site(&site, time_source.now()).await?;
    Ok(HttpResponse::Ok().json(created))
}

#[tracing::instrument(skip(store))]
#[get("/admin/sites")]
pub async fn list_sites(
    store: web::Data<dyn ReservationStore>,
) -> Result<HttpResponse, APIError> {
    let sites = store.sites().await?;
    Ok(HttpResponse::Ok().json(sites))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteQuery {
    site_id: Option<SiteId>,
}

#[tracing::instrument(skip(store))]
#[get("/admin/reservations")]
pub async fn list_reservations(
    store: web::Data<dyn ReservationStore>,
    query: web::Query<SiteQuery>,
) -> Result<HttpResponse, APIError> {
    let site_id = query.site_id.ok_or_else(|| missing("siteId"))?;
    // 404 for unknown sites rather than an empty list.
    store.site(&site_id).await?;
    let reservations = store.site_reservations(&site_id).await?;
    let reservations: Vec<_> = reservations
        .into_iter()
        .map(lifecycle::response_from)
        .collect();
    Ok(HttpResponse::Ok().json(reservations))
}

#[tracing::instrument(skip_all, fields(site = %details.site_id))]
#[post("/admin/internal-reservations")]
pub async fn create_internal_reservation(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    details: web::Json<requests::CreateInternalReservation>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::create_internal(
        store.get_ref(),
        &time_source,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(skip(store, time_source, details))]
#[put("/admin/internal-reservations/{reservation_id}")]
pub async fn update_internal_reservation(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    path: web::Path<ReservationId>,
    details: web::Json<requests::UpdateInternalReservation>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::update_internal(
        store.get_ref(),
        &time_source,
        &path,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(skip(store, time_source))]
#[delete("/admin/internal-reservations/{reservation_id}")]
pub async fn cancel_internal_reservation(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    path: web::Path<ReservationId>,
) -> Result<HttpResponse, APIError> {
    let response =
        lifecycle::cancel_internal(store.get_ref(), &time_source, &path)
            .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(skip_all, fields(reservation = %details.reservation_id))]
#[post("/admin/reservations/update-status")]
pub async fn update_reservation_status(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    details: web::Json<requests::UpdateReservationStatus>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::override_status(
        store.get_ref(),
        &time_source,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(skip_all, fields(reservation = %details.reservation_id))]
#[post("/admin/reservations/resolve-cancel")]
pub async fn resolve_cancel_request(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    details: web::Json<requests::ResolveCancelRequest>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::resolve_cancel_request(
        store.get_ref(),
        &time_source,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}
