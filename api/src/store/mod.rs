//! Storage seam for sites and reservations.
//!
//! Handlers talk to [`ReservationStore`] only; the Postgres and in-memory
//! implementations both guarantee that the conflict-sensitive operations
//! (`insert_blocking`, `confirm_paid`, `replace_checked`) run their
//! overlap re-check and write as one atomic step.

use async_trait::async_trait;
use jiff::Timestamp;
use jiff::civil::Date;
use payloads::{
    AdminNote, AgreementItem, AmountBreakdown, CancelRequest, GuestInfo,
    InternalKind, QaAnswer, ReservationId, ReservationSource,
    ReservationStatus, SiteId, responses,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored reservation row.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: ReservationId,
    /// Short uppercase display code shown to guests.
    pub code: String,
    /// Payment-gateway order identifier, unique per reservation.
    pub order_id: String,
    pub site_id: SiteId,
    pub status: ReservationStatus,
    pub source: ReservationSource,
    pub internal_kind: Option<InternalKind>,
    pub check_in: Date,
    pub check_out: Date,
    pub people: i32,
    /// Head count at booking time; `people` may be amended later.
    pub initial_people: i32,
    pub guest: Option<GuestInfo>,
    pub qa: Vec<QaAnswer>,
    pub agreements: Vec<AgreementItem>,
    pub amount: AmountBreakdown,
    pub cancel_request: CancelRequest,
    pub admin_notes: Vec<AdminNote>,
    /// Staff member who created an internal reservation.
    pub admin_name: Option<String>,
    pub payment_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Atomic PENDING -> PAID transition payload.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    pub reservation_id: ReservationId,
    pub payment_key: String,
    /// Re-derived price persisted as the settled amount.
    pub amount: AmountBreakdown,
    pub now: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Site not found")]
    SiteNotFound,
    #[error("Reservation not found")]
    ReservationNotFound,
    #[error("No reservation for that order")]
    OrderNotFound,
    #[error("Dates are no longer available for this site")]
    AlreadyReserved,
    #[error("Reservation is not awaiting payment")]
    NotPending,
    #[error("Database unique constraint violation")]
    NotUnique(#[source] sqlx::Error),
    #[error("Database error")]
    Database(#[source] sqlx::Error),
    #[error("Unexpected error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation())
        {
            StoreError::NotUnique(e)
        } else if matches!(
            &e,
            sqlx::Error::Database(db)
                if db.code().as_deref() == Some(SQLSTATE_SERIALIZATION_FAILURE)
        ) {
            // A SERIALIZABLE abort on the confirm path means another
            // writer committed the same dates first; surface it as the
            // retryable conflict instead of a server error.
            StoreError::AlreadyReserved
        } else {
            StoreError::Database(e)
        }
    }
}

const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn create_site(
        &self,
        details: &payloads::Site,
        now: Timestamp,
    ) -> Result<responses::Site, StoreError>;

    async fn site(&self, id: &SiteId) -> Result<responses::Site, StoreError>;

    async fn sites(&self) -> Result<Vec<responses::Site>, StoreError>;

    /// Insert a non-blocking (PENDING) reservation. No overlap guard.
    async fn insert_pending(
        &self,
        reservation: &Reservation,
    ) -> Result<(), StoreError>;

    /// Insert a reservation that blocks from birth (internal bookings).
    /// The overlap guard runs atomically with the insert.
    async fn insert_blocking(
        &self,
        reservation: &Reservation,
    ) -> Result<(), StoreError>;

    async fn reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Reservation, StoreError>;

    async fn reservation_by_order(
        &self,
        order_id: &str,
    ) -> Result<Reservation, StoreError>;

    async fn site_reservations(
        &self,
        site_id: &SiteId,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Atomically re-check the overlap guard against blocking rows and
    /// flip PENDING to PAID. Fails with [`StoreError::AlreadyReserved`]
    /// when another booking won the dates in the meantime, and
    /// [`StoreError::NotPending`] when the reservation already moved on.
    async fn confirm_paid(
        &self,
        event: ConfirmPayment,
    ) -> Result<Reservation, StoreError>;

    /// Replace a reservation wholesale. When the replacement is in a
    /// blocking status the overlap guard is re-applied, excluding the
    /// reservation itself.
    async fn replace_checked(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError>;

    /// Unguarded status write, with an optional audit note.
    async fn set_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
        note: Option<AdminNote>,
        now: Timestamp,
    ) -> Result<Reservation, StoreError>;

    /// Write the cancel-request block, optionally moving the reservation
    /// status and appending an audit note in the same step.
    async fn set_cancel_request(
        &self,
        id: &ReservationId,
        cancel_request: CancelRequest,
        new_status: Option<ReservationStatus>,
        note: Option<AdminNote>,
        now: Timestamp,
    ) -> Result<Reservation, StoreError>;
}
