pub mod admin;
pub mod payments;
pub mod reservations;

use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, http::StatusCode, web,
};
use jiff::civil::Date;

use crate::lifecycle::LifecycleError;
use crate::payment::PaymentError;
use crate::store::StoreError;
use crate::{dates, lifecycle};

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("")
        .service(health_check)
        .service(reservations::availability)
        .service(reservations::disabled_dates)
        .service(reservations::get_reservation)
        .service(reservations::request_cancel)
        .service(payments::payment_ready)
        .service(payments::payment_confirm)
        .service(admin::create_site)
        .service(admin::list_sites)
        .service(admin::list_reservations)
        .service(admin::create_internal_reservation)
        .service(admin::update_internal_reservation)
        .service(admin::cancel_internal_reservation)
        .service(admin::update_reservation_status)
        .service(admin::resolve_cancel_request)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

/// Route-level error. Every variant renders as a JSON body with a stable
/// machine-readable `code` and a human-readable `message`.
#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("Bad request")]
    BadRequest {
        code: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("Not found")]
    NotFound(#[source] anyhow::Error),
    #[error("Dates are no longer available for this site")]
    AlreadyReserved,
    #[error("Payment declined")]
    PaymentDeclined { code: String, message: String },
    #[error("Payment gateway error")]
    Gateway(#[source] anyhow::Error),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for APIError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyReserved => StatusCode::CONFLICT,
            Self::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let (code, message) = match self {
            Self::BadRequest { code, source } => {
                (*code, format!("{source:#}"))
            }
            Self::NotFound(e) => ("NOT_FOUND", format!("{e:#}")),
            Self::AlreadyReserved => {
                ("ALREADY_RESERVED", self.to_string())
            }
            Self::PaymentDeclined { code, message } => {
                ("PAYMENT_DECLINED", format!("{code}: {message}"))
            }
            Self::Gateway(e) => ("GATEWAY_ERROR", format!("{e:#}")),
            // Internal detail stays out of the response body.
            Self::UnexpectedError(_) => {
                ("INTERNAL_ERROR", self.to_string())
            }
        };
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "code": code, "message": message }))
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SiteNotFound
            | StoreError::ReservationNotFound
            | StoreError::OrderNotFound => APIError::NotFound(e.into()),
            StoreError::AlreadyReserved => APIError::AlreadyReserved,
            StoreError::NotPending => APIError::BadRequest {
                code: "INVALID_STATUS",
                source: e.into(),
            },
            StoreError::NotUnique(_)
            | StoreError::Database(_)
            | StoreError::UnexpectedError(_) => {
                APIError::UnexpectedError(e.into())
            }
        }
    }
}

impl From<PaymentError> for APIError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::Declined { code, message } => {
                APIError::PaymentDeclined { code, message }
            }
            PaymentError::Gateway(source) => APIError::Gateway(source),
        }
    }
}

impl From<LifecycleError> for APIError {
    fn from(e: LifecycleError) -> Self {
        let code = match &e {
            LifecycleError::InvalidDateRange => "INVALID_DATE_RANGE",
            LifecycleError::InvalidPeople => "INVALID_PEOPLE",
            LifecycleError::MissingField(_) => "MISSING_FIELD",
            LifecycleError::FieldTooLong(_) => "FIELD_TOO_LONG",
            LifecycleError::SiteInactive => "SITE_INACTIVE",
            LifecycleError::ManualAmountRequired => {
                "MANUAL_AMOUNT_REQUIRED"
            }
            LifecycleError::AmountMismatch => "AMOUNT_MISMATCH",
            LifecycleError::InvalidStatus => "INVALID_STATUS",
            LifecycleError::Store(_) | LifecycleError::Payment(_) => {
                return match e {
                    LifecycleError::Store(inner) => inner.into(),
                    LifecycleError::Payment(inner) => inner.into(),
                    _ => unreachable!(),
                };
            }
        };
        APIError::BadRequest {
            code,
            source: e.into(),
        }
    }
}

pub(crate) fn missing(name: &'static str) -> APIError {
    APIError::BadRequest {
        code: "MISSING_FIELD",
        source: anyhow::anyhow!("{name} is required"),
    }
}

pub(crate) fn parse_date_param(
    value: &str,
    name: &'static str,
) -> Result<Date, APIError> {
    dates::parse_date(value).ok_or_else(|| APIError::BadRequest {
        code: "INVALID_DATE_RANGE",
        source: anyhow::anyhow!("{name} is not a YYYY-MM-DD date: {value}"),
    })
}

pub(crate) fn reservation_json(
    reservation: crate::store::Reservation,
) -> HttpResponse {
    HttpResponse::Ok().json(lifecycle::response_from(reservation))
}
