//! Date-range conflict resolution over a per-site reservation snapshot.
//!
//! Two notions of "blocked" coexist on purpose. Strict checks
//! ([`has_conflict`]) count only statuses that actually hold the dates
//! (PAID, CONFIRMED). The calendar view ([`disabled_dates`]) additionally
//! greys out guest PENDING stays, so a slot is never shown as free while
//! someone else's payment is in flight, and every non-canceled staff
//! booking. Unifying the two would either manufacture false
//! unavailability or reopen the display race, so the asymmetry stays.

use std::collections::BTreeSet;

use jiff::civil::Date;
use payloads::{ReservationSource, ReservationStatus, SiteId};

use crate::dates;
use crate::store::{Reservation, ReservationStore, StoreError};

/// Whether `reservation` occupies its dates for strict conflict checks.
pub fn blocks_strict(reservation: &Reservation) -> bool {
    reservation.status.is_blocking()
}

/// Whether `reservation` greys out its dates on the calendar.
pub fn blocks_calendar(reservation: &Reservation) -> bool {
    match reservation.source {
        ReservationSource::User => {
            reservation.status.is_blocking()
                || reservation.status == ReservationStatus::Pending
        }
        ReservationSource::Admin => {
            reservation.status != ReservationStatus::Canceled
        }
    }
}

/// Strict overlap check against the blocking rows of a site snapshot.
pub fn has_conflict<'a>(
    existing: impl IntoIterator<Item = &'a Reservation>,
    check_in: Date,
    check_out: Date,
) -> bool {
    existing.into_iter().any(|r| {
        blocks_strict(r)
            && dates::overlaps(r.check_in, r.check_out, check_in, check_out)
    })
}

/// Sorted union of the calendar-blocked night-dates within `[from, to)`.
pub fn disabled_dates<'a>(
    existing: impl IntoIterator<Item = &'a Reservation>,
    from: Date,
    to: Date,
) -> BTreeSet<Date> {
    let mut blocked = BTreeSet::new();
    for r in existing.into_iter().filter(|r| blocks_calendar(r)) {
        let start = r.check_in.max(from);
        let end = r.check_out.min(to);
        blocked.extend(dates::nights(start, end));
    }
    blocked
}

/// Store-backed strict check for a prospective stay.
pub async fn check(
    store: &dyn ReservationStore,
    site_id: &SiteId,
    check_in: Date,
    check_out: Date,
) -> Result<bool, StoreError> {
    let existing = store.site_reservations(site_id).await?;
    Ok(has_conflict(&existing, check_in, check_out))
}

/// Store-backed calendar view for a site.
pub async fn calendar(
    store: &dyn ReservationStore,
    site_id: &SiteId,
    from: Date,
    to: Date,
) -> Result<Vec<Date>, StoreError> {
    let existing = store.site_reservations(site_id).await?;
    Ok(disabled_dates(&existing, from, to).into_iter().collect())
}
