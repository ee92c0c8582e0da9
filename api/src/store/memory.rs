//! In-memory [`ReservationStore`] backed by a mutex-guarded map.
//!
//! Used by the test harness and by the server when no database is
//! configured. Every mutating operation holds the lock for its whole
//! read-check-write, which makes the overlap guards atomic; the lock is
//! never held across an await.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use jiff::Timestamp;
use payloads::{
    AdminNote, CancelRequest, ReservationId, ReservationStatus, SiteId,
    responses,
};
use uuid::Uuid;

use crate::availability;
use crate::store::{
    ConfirmPayment, Reservation, ReservationStore, StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    sites: HashMap<SiteId, responses::Site>,
    reservations: HashMap<ReservationId, Reservation>,
    orders: HashMap<String, ReservationId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn blocking_conflict(
        &self,
        candidate: &Reservation,
    ) -> Result<(), StoreError> {
        let others = self.reservations.values().filter(|r| {
            r.site_id == candidate.site_id && r.id != candidate.id
        });
        if availability::has_conflict(
            others,
            candidate.check_in,
            candidate.check_out,
        ) {
            return Err(StoreError::AlreadyReserved);
        }
        Ok(())
    }

    fn reservation_mut(
        &mut self,
        id: &ReservationId,
    ) -> Result<&mut Reservation, StoreError> {
        self.reservations
            .get_mut(id)
            .ok_or(StoreError::ReservationNotFound)
    }
}

fn push_note(reservation: &mut Reservation, note: Option<AdminNote>) {
    if let Some(note) = note {
        reservation.admin_notes.push(note);
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn create_site(
        &self,
        details: &payloads::Site,
        now: Timestamp,
    ) -> Result<responses::Site, StoreError> {
        let site = responses::Site {
            site_id: SiteId(Uuid::new_v4()),
            site_details: details.clone(),
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.sites.insert(site.site_id, site.clone());
        Ok(site)
    }

    async fn site(&self, id: &SiteId) -> Result<responses::Site, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.sites.get(id).cloned().ok_or(StoreError::SiteNotFound)
    }

    async fn sites(&self) -> Result<Vec<responses::Site>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut sites: Vec<_> = inner.sites.values().cloned().collect();
        sites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sites)
    }

    async fn insert_pending(
        &self,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .orders
            .insert(reservation.order_id.clone(), reservation.id);
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn insert_blocking(
        &self,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.blocking_conflict(reservation)?;
        inner
            .orders
            .insert(reservation.order_id.clone(), reservation.id);
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Reservation, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .reservations
            .get(id)
            .cloned()
            .ok_or(StoreError::ReservationNotFound)
    }

    async fn reservation_by_order(
        &self,
        order_id: &str,
    ) -> Result<Reservation, StoreError> {
        let inner = self.inner.lock().unwrap();
        let id = inner.orders.get(order_id).ok_or(StoreError::OrderNotFound)?;
        inner
            .reservations
            .get(id)
            .cloned()
            .ok_or(StoreError::OrderNotFound)
    }

    async fn site_reservations(
        &self,
        site_id: &SiteId,
    ) -> Result<Vec<Reservation>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<_> = inner
            .reservations
            .values()
            .filter(|r| &r.site_id == site_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn confirm_paid(
        &self,
        event: ConfirmPayment,
    ) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let current = inner
            .reservations
            .get(&event.reservation_id)
            .ok_or(StoreError::ReservationNotFound)?
            .clone();
        if current.status != ReservationStatus::Pending {
            return Err(StoreError::NotPending);
        }
        inner.blocking_conflict(&current)?;
        let reservation = inner.reservation_mut(&event.reservation_id)?;
        reservation.status = ReservationStatus::Paid;
        reservation.payment_key = Some(event.payment_key);
        reservation.amount = event.amount;
        reservation.updated_at = event.now;
        Ok(reservation.clone())
    }

    async fn replace_checked(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.reservations.contains_key(&reservation.id) {
            return Err(StoreError::ReservationNotFound);
        }
        if reservation.status.is_blocking() {
            inner.blocking_conflict(reservation)?;
        }
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation.clone())
    }

    async fn set_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
        note: Option<AdminNote>,
        now: Timestamp,
    ) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let reservation = inner.reservation_mut(id)?;
        reservation.status = status;
        push_note(reservation, note);
        reservation.updated_at = now;
        Ok(reservation.clone())
    }

    async fn set_cancel_request(
        &self,
        id: &ReservationId,
        cancel_request: CancelRequest,
        new_status: Option<ReservationStatus>,
        note: Option<AdminNote>,
        now: Timestamp,
    ) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let reservation = inner.reservation_mut(id)?;
        reservation.cancel_request = cancel_request;
        if let Some(status) = new_status {
            reservation.status = status;
        }
        push_note(reservation, note);
        reservation.updated_at = now;
        Ok(reservation.clone())
    }
}
