//! Reservation lifecycle: booking initiation, payment confirmation,
//! cancellation, and the staff-side operations.
//!
//! Guest bookings are born PENDING and only start blocking dates once
//! paid. The strict conflict check runs twice: a cheap pre-check before
//! the gateway is asked to capture the charge, and again atomically with
//! the PENDING -> PAID flip inside the store, so two racing confirms can
//! never both win the same nights.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use payloads::{
    AdminNote, AmountBreakdown, CancelRequest, CancelRequestStatus,
    InternalKind, ReservationId, ReservationSource, ReservationStatus,
    requests, responses,
};
use uuid::Uuid;

use crate::availability;
use crate::payment::{PaymentError, PaymentGateway};
use crate::pricing::{self, PricingError};
use crate::store::{
    ConfirmPayment, Reservation, ReservationStore, StoreError,
};
use crate::time::TimeSource;

/// Timezone in which "days before check-in" is counted.
const DISPLAY_TZ: &str = "Asia/Seoul";

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("check-out must be after check-in")]
    InvalidDateRange,
    #[error("people count is invalid")]
    InvalidPeople,
    #[error("required field missing or empty: {0}")]
    MissingField(&'static str),
    #[error("field too long: {0}")]
    FieldTooLong(&'static str),
    #[error("site is not accepting bookings")]
    SiteInactive,
    #[error("manual reservations require an explicit amount")]
    ManualAmountRequired,
    #[error("paid amount does not match the stored quote")]
    AmountMismatch,
    #[error("reservation is not in a state that allows this operation")]
    InvalidStatus,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl From<PricingError> for LifecycleError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::InvalidDateRange => LifecycleError::InvalidDateRange,
        }
    }
}

fn require(
    value: &str,
    name: &'static str,
    max_len: usize,
) -> Result<(), LifecycleError> {
    if value.trim().is_empty() {
        return Err(LifecycleError::MissingField(name));
    }
    if value.chars().count() > max_len {
        return Err(LifecycleError::FieldTooLong(name));
    }
    Ok(())
}

fn validate_range(check_in: Date, check_out: Date) -> Result<(), LifecycleError> {
    if check_out <= check_in {
        return Err(LifecycleError::InvalidDateRange);
    }
    Ok(())
}

fn validate_people(people: Option<i32>) -> Result<(), LifecycleError> {
    if matches!(people, Some(p) if p < 0) {
        return Err(LifecycleError::InvalidPeople);
    }
    Ok(())
}

/// Today's date where the campground operates.
fn local_today(time_source: &TimeSource) -> Date {
    let tz = TimeZone::get(DISPLAY_TZ).unwrap_or(TimeZone::UTC);
    time_source.now().to_zoned(tz).date()
}

/// Short uppercase code shown to guests and staff.
fn display_code(id: &ReservationId) -> String {
    id.0.simple().to_string()[..8].to_uppercase()
}

/// Derived, never-persisted flags a staff member sees before check-in.
pub fn precheck_flags(reservation: &Reservation) -> responses::PrecheckFlags {
    responses::PrecheckFlags {
        people_exceeds_initial: reservation.people
            > reservation.initial_people,
        extra_charge_present: reservation.amount.extra_charge > 0,
        incomplete_qa: reservation
            .qa
            .iter()
            .any(|qa| qa.answer.trim().is_empty()),
        unmet_agreement: reservation
            .agreements
            .iter()
            .any(|agreement| !agreement.agreed),
        refund_requested: matches!(
            reservation.cancel_request.status,
            CancelRequestStatus::Requested | CancelRequestStatus::OnHold
        ),
    }
}

pub fn response_from(reservation: Reservation) -> responses::Reservation {
    let flags = precheck_flags(&reservation);
    responses::Reservation {
        reservation_id: reservation.id,
        code: reservation.code,
        order_id: reservation.order_id,
        site_id: reservation.site_id,
        status: reservation.status,
        source: reservation.source,
        internal_type: reservation.internal_kind,
        check_in: reservation.check_in,
        check_out: reservation.check_out,
        people: reservation.people,
        initial_people: reservation.initial_people,
        guest: reservation.guest,
        qa: reservation.qa,
        agreements: reservation.agreements,
        amount_breakdown: reservation.amount,
        cancel_request: reservation.cancel_request,
        admin_notes: reservation.admin_notes,
        admin_name: reservation.admin_name,
        flags,
        created_at: reservation.created_at,
        updated_at: reservation.updated_at,
    }
}

/// Create a PENDING reservation and quote for a guest booking.
pub async fn create_pending(
    store: &dyn ReservationStore,
    gateway: &dyn PaymentGateway,
    time_source: &TimeSource,
    details: &requests::PaymentReady,
) -> Result<responses::PaymentReady, LifecycleError> {
    validate_range(details.check_in, details.check_out)?;
    validate_people(details.people)?;
    require(
        &details.guest.name,
        "guest.name",
        requests::GUEST_NAME_MAX_LEN,
    )?;
    require(
        &details.guest.phone,
        "guest.phone",
        requests::GUEST_PHONE_MAX_LEN,
    )?;

    let site = store.site(&details.site_id).await?;
    if !site.site_details.is_active {
        return Err(LifecycleError::SiteInactive);
    }
    let quote = pricing::quote(
        &site.site_details,
        details.check_in,
        details.check_out,
        details.people,
        details.manual_extra.unwrap_or(0),
    )?;
    if quote.people > site.site_details.rate_table.max_people {
        return Err(LifecycleError::InvalidPeople);
    }

    let now = time_source.now();
    let id = ReservationId(Uuid::new_v4());
    let order_id = format!("camp-{}", id.0.simple());
    let reservation = Reservation {
        id,
        code: display_code(&id),
        order_id: order_id.clone(),
        site_id: details.site_id,
        status: ReservationStatus::Pending,
        source: ReservationSource::User,
        internal_kind: None,
        check_in: details.check_in,
        check_out: details.check_out,
        people: quote.people,
        initial_people: quote.people,
        guest: Some(details.guest.clone()),
        qa: details.qa.clone(),
        agreements: details.agreements.clone(),
        amount: quote.breakdown(),
        cancel_request: CancelRequest::default(),
        admin_notes: vec![],
        admin_name: None,
        payment_key: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_pending(&reservation).await?;
    tracing::info!(
        reservation = %id,
        site = %details.site_id,
        total = quote.total,
        "created pending reservation"
    );

    Ok(responses::PaymentReady {
        checkout_url: gateway.checkout_url(&order_id, quote.total),
        order_id,
        reservation_id: id,
        code: reservation.code,
        total_amount: quote.total,
        nights: quote.nights,
    })
}

/// Capture the payment and flip the reservation to PAID.
///
/// The charged amount must match a freshly computed quote, and the dates
/// must still be free; the final overlap re-check happens inside the
/// store, atomically with the status flip.
pub async fn confirm_payment(
    store: &dyn ReservationStore,
    gateway: &dyn PaymentGateway,
    time_source: &TimeSource,
    details: &requests::PaymentConfirm,
) -> Result<responses::PaymentConfirm, LifecycleError> {
    let reservation = store.reservation_by_order(&details.order_id).await?;
    if reservation.status != ReservationStatus::Pending {
        return Err(LifecycleError::InvalidStatus);
    }
    let site = store.site(&reservation.site_id).await?;
    let quote = pricing::quote(
        &site.site_details,
        reservation.check_in,
        reservation.check_out,
        Some(reservation.people),
        reservation.amount.manual_extra,
    )?;
    if details.amount != quote.total {
        return Err(LifecycleError::AmountMismatch);
    }

    // Do not charge the guest for dates that are already gone. The store
    // re-checks under isolation; this check just runs before the money
    // moves.
    let existing = store.site_reservations(&reservation.site_id).await?;
    let others = existing.iter().filter(|r| r.id != reservation.id);
    if availability::has_conflict(
        others,
        reservation.check_in,
        reservation.check_out,
    ) {
        return Err(StoreError::AlreadyReserved.into());
    }

    let approval = gateway
        .confirm(&details.payment_key, &details.order_id, details.amount)
        .await?;
    let confirmed = store
        .confirm_paid(ConfirmPayment {
            reservation_id: reservation.id,
            payment_key: approval.payment_key,
            amount: quote.breakdown(),
            now: time_source.now(),
        })
        .await?;
    tracing::info!(
        reservation = %confirmed.id,
        total = confirmed.amount.total,
        "payment confirmed"
    );

    Ok(responses::PaymentConfirm {
        ok: true,
        total_amount: confirmed.amount.total,
    })
}

/// Guest-initiated cancellation request on a paid reservation.
pub async fn request_cancel(
    store: &dyn ReservationStore,
    time_source: &TimeSource,
    id: &ReservationId,
    details: &requests::RequestCancel,
) -> Result<responses::Reservation, LifecycleError> {
    require(&details.reason, "reason", requests::CANCEL_REASON_MAX_LEN)?;
    let reservation = store.reservation(id).await?;
    if reservation.status != ReservationStatus::Paid {
        return Err(LifecycleError::InvalidStatus);
    }
    let now = time_source.now();
    let cancel_request = CancelRequest {
        status: CancelRequestStatus::Requested,
        reason: Some(details.reason.clone()),
        requested_at: Some(now),
        days_before_check_in: Some(crate::dates::diff_days(
            local_today(time_source),
            reservation.check_in,
        )),
        admin_note: None,
    };
    let updated = store
        .set_cancel_request(id, cancel_request, None, None, now)
        .await?;
    Ok(response_from(updated))
}

/// Staff resolution of a pending cancellation request.
pub async fn resolve_cancel_request(
    store: &dyn ReservationStore,
    time_source: &TimeSource,
    details: &requests::ResolveCancelRequest,
) -> Result<responses::Reservation, LifecycleError> {
    if details.status == CancelRequestStatus::None {
        return Err(LifecycleError::InvalidStatus);
    }
    require(&details.operator, "operator", requests::OPERATOR_NAME_MAX_LEN)?;
    if let Some(note) = &details.admin_note {
        if note.chars().count() > requests::ADMIN_NOTE_MAX_LEN {
            return Err(LifecycleError::FieldTooLong("adminNote"));
        }
    }
    let reservation = store.reservation(&details.reservation_id).await?;
    if reservation.cancel_request.status == CancelRequestStatus::None {
        return Err(LifecycleError::InvalidStatus);
    }
    let now = time_source.now();
    let cancel_request = CancelRequest {
        status: details.status,
        admin_note: details.admin_note.clone(),
        ..reservation.cancel_request
    };
    let note_text = details.admin_note.clone().unwrap_or_else(|| {
        match details.status {
            CancelRequestStatus::Completed => "cancel request completed",
            CancelRequestStatus::OnHold => "cancel request put on hold",
            CancelRequestStatus::Requested => "cancel request reopened",
            CancelRequestStatus::None => unreachable!(),
        }
        .to_string()
    });
    let note = AdminNote {
        operator: details.operator.clone(),
        at: now,
        note: note_text,
    };
    let updated = store
        .set_cancel_request(
            &details.reservation_id,
            cancel_request,
            details.new_reservation_status,
            Some(note),
            now,
        )
        .await?;
    Ok(response_from(updated))
}

/// Unguarded staff status override. The only precondition is that the
/// reservation exists; staff are trusted to know what they are doing.
pub async fn override_status(
    store: &dyn ReservationStore,
    time_source: &TimeSource,
    details: &requests::UpdateReservationStatus,
) -> Result<responses::Reservation, LifecycleError> {
    let note = details.note.as_ref().map(|text| AdminNote {
        operator: details
            .operator
            .clone()
            .unwrap_or_else(|| "admin".to_string()),
        at: time_source.now(),
        note: text.clone(),
    });
    let updated = store
        .set_status(
            &details.reservation_id,
            details.status,
            note,
            time_source.now(),
        )
        .await?;
    tracing::info!(
        reservation = %updated.id,
        status = %updated.status,
        "status overridden"
    );
    Ok(response_from(updated))
}

fn internal_amount(
    kind: InternalKind,
    amount: Option<i64>,
    quoted: Option<&pricing::Quote>,
) -> Result<AmountBreakdown, LifecycleError> {
    match kind {
        InternalKind::Free => Ok(AmountBreakdown::default()),
        InternalKind::Manual => {
            let total =
                amount.ok_or(LifecycleError::ManualAmountRequired)?;
            Ok(AmountBreakdown {
                total,
                ..Default::default()
            })
        }
        InternalKind::Paid => match (amount, quoted) {
            (Some(total), _) => Ok(AmountBreakdown {
                total,
                ..Default::default()
            }),
            (None, Some(quote)) => Ok(quote.breakdown()),
            (None, None) => Err(LifecycleError::ManualAmountRequired),
        },
    }
}

/// Staff-created reservation. Born CONFIRMED, so it blocks its dates
/// from the start; the store applies the overlap guard atomically with
/// the insert.
pub async fn create_internal(
    store: &dyn ReservationStore,
    time_source: &TimeSource,
    details: &requests::CreateInternalReservation,
) -> Result<responses::Reservation, LifecycleError> {
    validate_range(details.check_in, details.check_out)?;
    validate_people(details.people)?;
    require(
        &details.admin_name,
        "adminName",
        requests::OPERATOR_NAME_MAX_LEN,
    )?;
    if let Some(note) = &details.note {
        if note.chars().count() > requests::ADMIN_NOTE_MAX_LEN {
            return Err(LifecycleError::FieldTooLong("note"));
        }
    }

    let site = store.site(&details.site_id).await?;
    let quote = pricing::quote(
        &site.site_details,
        details.check_in,
        details.check_out,
        details.people,
        0,
    )?;
    let amount =
        internal_amount(details.internal_type, details.amount, Some(&quote))?;

    let now = time_source.now();
    let id = ReservationId(Uuid::new_v4());
    let reservation = Reservation {
        id,
        code: display_code(&id),
        order_id: format!("internal-{}", id.0.simple()),
        site_id: details.site_id,
        status: ReservationStatus::Confirmed,
        source: ReservationSource::Admin,
        internal_kind: Some(details.internal_type),
        check_in: details.check_in,
        check_out: details.check_out,
        people: quote.people,
        initial_people: quote.people,
        guest: None,
        qa: vec![],
        agreements: vec![],
        amount,
        cancel_request: CancelRequest::default(),
        admin_notes: details
            .note
            .iter()
            .map(|text| AdminNote {
                operator: details.admin_name.clone(),
                at: now,
                note: text.clone(),
            })
            .collect(),
        admin_name: Some(details.admin_name.clone()),
        payment_key: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_blocking(&reservation).await?;
    tracing::info!(
        reservation = %id,
        site = %details.site_id,
        kind = ?details.internal_type,
        "created internal reservation"
    );
    Ok(response_from(reservation))
}

/// Amend a live internal reservation. Dates and amounts are re-validated
/// and the overlap guard re-applied (excluding the reservation itself).
pub async fn update_internal(
    store: &dyn ReservationStore,
    time_source: &TimeSource,
    id: &ReservationId,
    details: &requests::UpdateInternalReservation,
) -> Result<responses::Reservation, LifecycleError> {
    validate_people(details.people)?;
    let mut reservation = store.reservation(id).await?;
    if reservation.source != ReservationSource::Admin {
        return Err(LifecycleError::InvalidStatus);
    }
    if reservation.status == ReservationStatus::Canceled {
        return Err(LifecycleError::InvalidStatus);
    }

    let now = time_source.now();
    if let Some(check_in) = details.check_in {
        reservation.check_in = check_in;
    }
    if let Some(check_out) = details.check_out {
        reservation.check_out = check_out;
    }
    validate_range(reservation.check_in, reservation.check_out)?;
    if let Some(people) = details.people {
        if people >= 1 {
            reservation.people = people;
        }
    }
    if let Some(kind) = details.internal_type {
        reservation.internal_kind = Some(kind);
    }
    if let Some(admin_name) = &details.admin_name {
        require(admin_name, "adminName", requests::OPERATOR_NAME_MAX_LEN)?;
        reservation.admin_name = Some(admin_name.clone());
    }
    if let Some(note) = &details.note {
        if note.chars().count() > requests::ADMIN_NOTE_MAX_LEN {
            return Err(LifecycleError::FieldTooLong("note"));
        }
        reservation.admin_notes.push(AdminNote {
            operator: reservation
                .admin_name
                .clone()
                .unwrap_or_else(|| "admin".to_string()),
            at: now,
            note: note.clone(),
        });
    }

    let kind = reservation
        .internal_kind
        .ok_or(LifecycleError::InvalidStatus)?;
    let site = store.site(&reservation.site_id).await?;
    let quote = pricing::quote(
        &site.site_details,
        reservation.check_in,
        reservation.check_out,
        Some(reservation.people),
        0,
    )?;
    // An explicit amount in the patch wins. Otherwise manual bookings
    // keep their stored total; free and paid are re-derived. Switching
    // kind to manual still demands an explicit amount.
    let amount_override = if kind == InternalKind::Manual
        && details.amount.is_none()
        && details.internal_type.is_none()
    {
        Some(reservation.amount.total)
    } else {
        details.amount
    };
    reservation.amount =
        internal_amount(kind, amount_override, Some(&quote))?;
    reservation.updated_at = now;

    let updated = store.replace_checked(&reservation).await?;
    Ok(response_from(updated))
}

/// Soft-cancel an internal reservation, releasing its dates.
pub async fn cancel_internal(
    store: &dyn ReservationStore,
    time_source: &TimeSource,
    id: &ReservationId,
) -> Result<responses::Deleted, LifecycleError> {
    let reservation = store.reservation(id).await?;
    if reservation.source != ReservationSource::Admin {
        return Err(LifecycleError::InvalidStatus);
    }
    store
        .set_status(
            id,
            ReservationStatus::Canceled,
            None,
            time_source.now(),
        )
        .await?;
    tracing::info!(reservation = %id, "internal reservation canceled");
    Ok(responses::Deleted { success: true })
}
