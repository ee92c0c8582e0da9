use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{
    AdminNote, AgreementItem, AmountBreakdown, CancelRequest, GuestInfo,
    InternalKind, QaAnswer, ReservationId, ReservationSource,
    ReservationStatus, SiteId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub site_id: SiteId,
    #[serde(flatten)]
    pub site_details: crate::Site,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: bool,
    pub conflict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledDates {
    /// Sorted, deduplicated night-dates within the queried window.
    pub dates: Vec<Date>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReady {
    pub checkout_url: String,
    pub order_id: String,
    pub reservation_id: ReservationId,
    /// Short human-readable booking code shown to the guest.
    pub code: String,
    pub total_amount: i64,
    pub nights: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirm {
    pub ok: bool,
    pub total_amount: i64,
}

/// Diagnostic projections over a reservation snapshot for staff review.
/// Pure derivations, never persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct PrecheckFlags {
    pub people_exceeds_initial: bool,
    pub extra_charge_present: bool,
    pub incomplete_qa: bool,
    pub unmet_agreement: bool,
    pub refund_requested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub code: String,
    pub order_id: String,
    pub site_id: SiteId,
    pub status: ReservationStatus,
    pub source: ReservationSource,
    pub internal_type: Option<InternalKind>,
    pub check_in: Date,
    pub check_out: Date,
    pub people: i32,
    pub initial_people: i32,
    pub guest: Option<GuestInfo>,
    pub qa: Vec<QaAnswer>,
    pub agreements: Vec<AgreementItem>,
    pub amount_breakdown: AmountBreakdown,
    pub cancel_request: CancelRequest,
    pub admin_notes: Vec<AdminNote>,
    pub admin_name: Option<String>,
    pub flags: PrecheckFlags,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub success: bool,
}
