use actix_web::{HttpResponse, get, post, web};
use payloads::{ReservationId, SiteId, requests, responses};
use serde::Deserialize;

use super::{APIError, missing, parse_date_param, reservation_json};
use crate::store::ReservationStore;
use crate::time::TimeSource;
use crate::availability as availability_mod;
use crate::lifecycle;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    site_id: Option<SiteId>,
    check_in: Option<String>,
    check_out: Option<String>,
}

#[tracing::instrument(skip(store))]
#[get("/reservations/availability")]
pub async fn availability(
    store: web::Data<dyn ReservationStore>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, APIError> {
    let site_id = query.site_id.ok_or_else(|| missing("siteId"))?;
    let check_in = query.check_in.as_deref().ok_or_else(|| missing("checkIn"))?;
    let check_out =
        query.check_out.as_deref().ok_or_else(|| missing("checkOut"))?;
    let check_in = parse_date_param(check_in, "checkIn")?;
    let check_out = parse_date_param(check_out, "checkOut")?;
    if check_out <= check_in {
        return Err(APIError::BadRequest {
            code: "INVALID_DATE_RANGE",
            source: anyhow::anyhow!("checkOut must be after checkIn"),
        });
    }
    let conflict =
        availability_mod::check(store.get_ref(), &site_id, check_in, check_out)
            .await?;
    Ok(HttpResponse::Ok().json(responses::Availability {
        available: !conflict,
        conflict,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledDatesQuery {
    site_id: Option<SiteId>,
    from: Option<String>,
    to: Option<String>,
}

#[tracing::instrument(skip(store))]
#[get("/reservations/disabled-dates")]
pub async fn disabled_dates(
    store: web::Data<dyn ReservationStore>,
    query: web::Query<DisabledDatesQuery>,
) -> Result<HttpResponse, APIError> {
    let site_id = query.site_id.ok_or_else(|| missing("siteId"))?;
    let from = query.from.as_deref().ok_or_else(|| missing("from"))?;
    let to = query.to.as_deref().ok_or_else(|| missing("to"))?;
    let from = parse_date_param(from, "from")?;
    let to = parse_date_param(to, "to")?;
    let dates =
        availability_mod::calendar(store.get_ref(), &site_id, from, to).await?;
    Ok(HttpResponse::Ok().json(responses::DisabledDates { dates }))
}

#[tracing::instrument(skip(store))]
#[get("/reservations/{reservation_id}")]
pub async fn get_reservation(
    store: web::Data<dyn ReservationStore>,
    path: web::Path<ReservationId>,
) -> Result<HttpResponse, APIError> {
    let reservation = store.reservation(&path).await?;
    Ok(reservation_json(reservation))
}

#[tracing::instrument(skip(store, time_source, details))]
#[post("/reservations/{reservation_id}/cancel-request")]
pub async fn request_cancel(
    store: web::Data<dyn ReservationStore>,
    time_source: web::Data<TimeSource>,
    path: web::Path<ReservationId>,
    details: web::Json<requests::RequestCancel>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::request_cancel(
        store.get_ref(),
        &time_source,
        &path,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}
