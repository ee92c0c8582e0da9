use actix_web::{HttpResponse, post, web};
use payloads::requests;

use super::APIError;
use crate::lifecycle;
use crate::payment::PaymentGateway;
use crate::store::ReservationStore;
use crate::time::TimeSource;

#[tracing::instrument(skip_all, fields(site = %details.site_id))]
#[post("/payments/ready")]
pub async fn payment_ready(
    store: web::Data<dyn ReservationStore>,
    gateway: web::Data<dyn PaymentGateway>,
    time_source: web::Data<TimeSource>,
    details: web::Json<requests::PaymentReady>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::create_pending(
        store.get_ref(),
        gateway.get_ref(),
        &time_source,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[tracing::instrument(skip_all, fields(order = %details.order_id))]
#[post("/payments/confirm")]
pub async fn payment_confirm(
    store: web::Data<dyn ReservationStore>,
    gateway: web::Data<dyn PaymentGateway>,
    time_source: web::Data<TimeSource>,
    details: web::Json<requests::PaymentConfirm>,
) -> Result<HttpResponse, APIError> {
    let response = lifecycle::confirm_payment(
        store.get_ref(),
        gateway.get_ref(),
        &time_source,
        &details,
    )
    .await?;
    Ok(HttpResponse::Ok().json(response))
}
