//! Postgres [`ReservationStore`].
//!
//! Runtime sqlx queries in the same shape as the rest of the codebase.
//! Conflict-sensitive writes run inside a SERIALIZABLE transaction so the
//! overlap re-check and the row write commit together or not at all.

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::ToSqlx;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTs};
use payloads::{
    AdminNote, AgreementItem, AmountBreakdown, CancelRequest, GuestInfo,
    InternalKind, QaAnswer, ReservationId, ReservationSource,
    ReservationStatus, SiteId, responses,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::store::{
    ConfirmPayment, Reservation, ReservationStore, StoreError,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SiteRow {
    id: SiteId,
    name: String,
    zone: String,
    kind: payloads::SiteKind,
    rate_table: Json<payloads::RateTable>,
    peak_season: Json<Option<payloads::DateRange>>,
    is_active: bool,
    #[sqlx(try_from = "SqlxTs")]
    created_at: Timestamp,
    #[sqlx(try_from = "SqlxTs")]
    updated_at: Timestamp,
}

impl From<SiteRow> for responses::Site {
    fn from(row: SiteRow) -> Self {
        responses::Site {
            site_id: row.id,
            site_details: payloads::Site {
                name: row.name,
                zone: row.zone,
                kind: row.kind,
                rate_table: row.rate_table.0,
                peak_season: row.peak_season.0,
                is_active: row.is_active,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: ReservationId,
    code: String,
    order_id: String,
    site_id: SiteId,
    status: ReservationStatus,
    source: ReservationSource,
    internal_kind: Option<InternalKind>,
    #[sqlx(try_from = "SqlxDate")]
    check_in: jiff::civil::Date,
    #[sqlx(try_from = "SqlxDate")]
    check_out: jiff::civil::Date,
    people: i32,
    initial_people: i32,
    guest: Json<Option<GuestInfo>>,
    qa: Json<Vec<QaAnswer>>,
    agreements: Json<Vec<AgreementItem>>,
    amount: Json<AmountBreakdown>,
    cancel_request: Json<CancelRequest>,
    admin_notes: Json<Vec<AdminNote>>,
    admin_name: Option<String>,
    payment_key: Option<String>,
    #[sqlx(try_from = "SqlxTs")]
    created_at: Timestamp,
    #[sqlx(try_from = "SqlxTs")]
    updated_at: Timestamp,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            code: row.code,
            order_id: row.order_id,
            site_id: row.site_id,
            status: row.status,
            source: row.source,
            internal_kind: row.internal_kind,
            check_in: row.check_in,
            check_out: row.check_out,
            people: row.people,
            initial_people: row.initial_people,
            guest: row.guest.0,
            qa: row.qa.0,
            agreements: row.agreements.0,
            amount: row.amount.0,
            cancel_request: row.cancel_request.0,
            admin_notes: row.admin_notes.0,
            admin_name: row.admin_name,
            payment_key: row.payment_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn set_transaction_serializable(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), StoreError> {
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Any blocking row on the site overlapping `[check_in, check_out)`,
/// excluding `exclude` itself.
async fn blocking_conflict_exists(
    tx: &mut Transaction<'_, Postgres>,
    site_id: &SiteId,
    exclude: &ReservationId,
    check_in: jiff::civil::Date,
    check_out: jiff::civil::Date,
) -> Result<bool, StoreError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM reservations
         WHERE site_id = $1
           AND id <> $2
           AND status IN ('paid', 'confirmed')
           AND check_in < $4
           AND $3 < check_out
         LIMIT 1",
    )
    .bind(site_id)
    .bind(exclude)
    .bind(check_in.to_sqlx())
    .bind(check_out.to_sqlx())
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.is_some())
}

async fn insert_reservation(
    tx: &mut Transaction<'_, Postgres>,
    r: &Reservation,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO reservations (
            id,
            code,
            order_id,
            site_id,
            status,
            source,
            internal_kind,
            check_in,
            check_out,
            people,
            initial_people,
            guest,
            qa,
            agreements,
            amount,
            cancel_request,
            admin_notes,
            admin_name,
            payment_key,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                  $14, $15, $16, $17, $18, $19, $20, $21)",
    )
    .bind(r.id)
    .bind(&r.code)
    .bind(&r.order_id)
    .bind(r.site_id)
    .bind(r.status)
    .bind(r.source)
    .bind(r.internal_kind)
    .bind(r.check_in.to_sqlx())
    .bind(r.check_out.to_sqlx())
    .bind(r.people)
    .bind(r.initial_people)
    .bind(Json(&r.guest))
    .bind(Json(&r.qa))
    .bind(Json(&r.agreements))
    .bind(Json(&r.amount))
    .bind(Json(&r.cancel_request))
    .bind(Json(&r.admin_notes))
    .bind(&r.admin_name)
    .bind(&r.payment_key)
    .bind(r.created_at.to_sqlx())
    .bind(r.updated_at.to_sqlx())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn create_site(
        &self,
        details: &payloads::Site,
        now: Timestamp,
    ) -> Result<responses::Site, StoreError> {
        let row = sqlx::query_as::<_, SiteRow>(
            "INSERT INTO sites (
                id,
                name,
                zone,
                kind,
                rate_table,
                peak_season,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING *",
        )
        .bind(SiteId(Uuid::new_v4()))
        .bind(&details.name)
        .bind(&details.zone)
        .bind(details.kind)
        .bind(Json(&details.rate_table))
        .bind(Json(&details.peak_season))
        .bind(details.is_active)
        .bind(now.to_sqlx())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn site(&self, id: &SiteId) -> Result<responses::Site, StoreError> {
        let row = sqlx::query_as::<_, SiteRow>(
            "SELECT * FROM sites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::SiteNotFound)?;
        Ok(row.into())
    }

    async fn sites(&self) -> Result<Vec<responses::Site>, StoreError> {
        let rows = sqlx::query_as::<_, SiteRow>(
            "SELECT * FROM sites ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_pending(
        &self,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        insert_reservation(&mut tx, reservation).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_blocking(
        &self,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        set_transaction_serializable(&mut tx).await?;
        if blocking_conflict_exists(
            &mut tx,
            &reservation.site_id,
            &reservation.id,
            reservation.check_in,
            reservation.check_out,
        )
        .await?
        {
            return Err(StoreError::AlreadyReserved);
        }
        insert_reservation(&mut tx, reservation).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Reservation, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ReservationNotFound)?;
        Ok(row.into())
    }

    async fn reservation_by_order(
        &self,
        order_id: &str,
    ) -> Result<Reservation, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderNotFound)?;
        Ok(row.into())
    }

    async fn site_reservations(
        &self,
        site_id: &SiteId,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE site_id = $1
             ORDER BY created_at",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn confirm_paid(
        &self,
        event: ConfirmPayment,
    ) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await?;
        set_transaction_serializable(&mut tx).await?;
        let current: ReservationRow = sqlx::query_as(
            "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(event.reservation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::ReservationNotFound)?;
        if current.status != ReservationStatus::Pending {
            return Err(StoreError::NotPending);
        }
        if blocking_conflict_exists(
            &mut tx,
            &current.site_id,
            &current.id,
            current.check_in,
            current.check_out,
        )
        .await?
        {
            return Err(StoreError::AlreadyReserved);
        }
        let row = sqlx::query_as::<_, ReservationRow>(
            "UPDATE reservations
             SET status = 'paid',
                 payment_key = $2,
                 amount = $3,
                 updated_at = $4
             WHERE id = $1 RETURNING *",
        )
        .bind(event.reservation_id)
        .bind(&event.payment_key)
        .bind(Json(&event.amount))
        .bind(event.now.to_sqlx())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn replace_checked(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await?;
        set_transaction_serializable(&mut tx).await?;
        let exists: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation.id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(StoreError::ReservationNotFound);
        }
        if reservation.status.is_blocking()
            && blocking_conflict_exists(
                &mut tx,
                &reservation.site_id,
                &reservation.id,
                reservation.check_in,
                reservation.check_out,
            )
            .await?
        {
            return Err(StoreError::AlreadyReserved);
        }
        let row = sqlx::query_as::<_, ReservationRow>(
            "UPDATE reservations
             SET status = $2,
                 internal_kind = $3,
                 check_in = $4,
                 check_out = $5,
                 people = $6,
                 guest = $7,
                 qa = $8,
                 agreements = $9,
                 amount = $10,
                 cancel_request = $11,
                 admin_notes = $12,
                 admin_name = $13,
                 payment_key = $14,
                 updated_at = $15
             WHERE id = $1 RETURNING *",
        )
        .bind(reservation.id)
        .bind(reservation.status)
        .bind(reservation.internal_kind)
        .bind(reservation.check_in.to_sqlx())
        .bind(reservation.check_out.to_sqlx())
        .bind(reservation.people)
        .bind(Json(&reservation.guest))
        .bind(Json(&reservation.qa))
        .bind(Json(&reservation.agreements))
        .bind(Json(&reservation.amount))
        .bind(Json(&reservation.cancel_request))
        .bind(Json(&reservation.admin_notes))
        .bind(&reservation.admin_name)
        .bind(&reservation.payment_key)
        .bind(reservation.updated_at.to_sqlx())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn set_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
        note: Option<AdminNote>,
        now: Timestamp,
    ) -> Result<Reservation, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "UPDATE reservations
             SET status = $2,
                 admin_notes = CASE
                     WHEN $3::jsonb IS NULL THEN admin_notes
                     ELSE admin_notes || $3::jsonb
                 END,
                 updated_at = $4
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(note.map(Json))
        .bind(now.to_sqlx())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ReservationNotFound)?;
        Ok(row.into())
    }

    async fn set_cancel_request(
        &self,
        id: &ReservationId,
        cancel_request: CancelRequest,
        new_status: Option<ReservationStatus>,
        note: Option<AdminNote>,
        now: Timestamp,
    ) -> Result<Reservation, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "UPDATE reservations
             SET cancel_request = $2,
                 status = COALESCE($3, status),
                 admin_notes = CASE
                     WHEN $4::jsonb IS NULL THEN admin_notes
                     ELSE admin_notes || $4::jsonb
                 END,
                 updated_at = $5
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(&cancel_request))
        .bind(new_status)
        .bind(note.map(Json))
        .bind(now.to_sqlx())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ReservationNotFound)?;
        Ok(row.into())
    }
}
