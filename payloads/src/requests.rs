use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{
    AgreementItem, CancelRequestStatus, DateRange, GuestInfo, InternalKind,
    QaAnswer, RateTable, ReservationId, ReservationStatus, SiteId, SiteKind,
};

pub const SITE_NAME_MAX_LEN: usize = 64;
pub const GUEST_NAME_MAX_LEN: usize = 100;
pub const GUEST_PHONE_MAX_LEN: usize = 32;
pub const OPERATOR_NAME_MAX_LEN: usize = 100;
pub const CANCEL_REASON_MAX_LEN: usize = 1000;
pub const ADMIN_NOTE_MAX_LEN: usize = 2000;

/// Raw rate fields as supplied by the admin console, including the legacy
/// fallback aliases. Normalized exactly once at site ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateFields {
    /// Preferred single-rate field when no weekday/weekend split is given.
    pub base_amount: Option<i64>,
    /// Legacy alias for `base_amount`.
    pub price: Option<i64>,
    /// Legacy alias of last resort.
    pub rate: Option<i64>,
    pub offpeak_weekday: Option<i64>,
    pub offpeak_weekend: Option<i64>,
    pub peak_weekday: Option<i64>,
    pub peak_weekend: Option<i64>,
    pub extra_person: Option<i64>,
    pub base_people: Option<i32>,
    pub max_people: Option<i32>,
}

impl RateFields {
    /// Collapse the fallback chain into the canonical [`RateTable`].
    ///
    /// The base rate resolves `offpeakWeekday` → `baseAmount` → `price` →
    /// `rate`; weekend falls back to the weekday rate and peak rates fall
    /// back to their offpeak counterparts. Returns `None` when no usable
    /// base rate is present at all.
    pub fn normalize(&self) -> Option<RateTable> {
        let offpeak_weekday = self
            .offpeak_weekday
            .or(self.base_amount)
            .or(self.price)
            .or(self.rate)?;
        let offpeak_weekend = self.offpeak_weekend.unwrap_or(offpeak_weekday);
        let base_people = self.base_people.unwrap_or(1).max(1);
        Some(RateTable {
            offpeak_weekday,
            offpeak_weekend,
            peak_weekday: self.peak_weekday.unwrap_or(offpeak_weekday),
            peak_weekend: self.peak_weekend.unwrap_or(offpeak_weekend),
            extra_person: self.extra_person.unwrap_or(0),
            base_people,
            max_people: self.max_people.unwrap_or(base_people).max(base_people),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSite {
    pub name: String,
    pub zone: String,
    pub kind: SiteKind,
    pub rates: RateFields,
    pub peak_season: Option<DateRange>,
    /// Defaults to active.
    pub is_active: Option<bool>,
}

/// Booking initiation: creates a PENDING reservation and a payment quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReady {
    pub site_id: SiteId,
    pub check_in: Date,
    pub check_out: Date,
    /// Coerced to the site's included head count when absent or zero.
    pub people: Option<i32>,
    pub guest: GuestInfo,
    #[serde(default)]
    pub qa: Vec<QaAnswer>,
    #[serde(default)]
    pub agreements: Vec<AgreementItem>,
    #[serde(default)]
    pub manual_extra: Option<i64>,
}

/// Payment confirmation callback parameters from the checkout flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirm {
    pub payment_key: String,
    pub order_id: String,
    /// Amount the guest was charged; must equal the stored quote.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCancel {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternalReservation {
    pub site_id: SiteId,
    pub check_in: Date,
    pub check_out: Date,
    pub people: Option<i32>,
    pub internal_type: InternalKind,
    pub admin_name: String,
    /// Required for `manual`; ignored for `free` (always 0).
    pub amount: Option<i64>,
    pub note: Option<String>,
}

/// Partial amendment of an internal reservation. Absent fields keep their
/// current values; date ordering and amount rules are re-validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternalReservation {
    pub check_in: Option<Date>,
    pub check_out: Option<Date>,
    pub people: Option<i32>,
    pub internal_type: Option<InternalKind>,
    pub amount: Option<i64>,
    pub admin_name: Option<String>,
    pub note: Option<String>,
}

/// Unguarded staff override of a reservation status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationStatus {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
    pub operator: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCancelRequest {
    pub reservation_id: ReservationId,
    pub status: CancelRequestStatus,
    /// Optional simultaneous reservation status move, e.g. REFUNDED when
    /// the request is completed.
    pub new_reservation_status: Option<ReservationStatus>,
    pub admin_note: Option<String>,
    pub operator: String,
}
