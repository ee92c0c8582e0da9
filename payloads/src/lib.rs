//! Shared types for the campground reservation API.
//!
//! Everything that crosses the HTTP boundary lives here: ID newtypes,
//! status enums, the canonical site rate table, and the request/response
//! shapes, plus a reqwest-based [`APIClient`] used by integration tests.
//!
//! Wire names are camelCase; amounts are integer won (no decimals); dates
//! are `YYYY-MM-DD` civil dates.

use derive_more::Display;
use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{APIClient, ClientError, ok_body, ok_empty};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct SiteId(pub Uuid);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct ReservationId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "site_kind", rename_all = "snake_case")
)]
pub enum SiteKind {
    SelfCaravan,
    CabanaDeck,
    Tent,
    Lodging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "reservation_status", rename_all = "snake_case")
)]
pub enum ReservationStatus {
    Pending,
    Paid,
    Confirmed,
    Canceled,
    Refunded,
    NoShow,
    Completed,
}

impl ReservationStatus {
    /// Whether a reservation in this status occupies its date range for
    /// strict (confirm-time) conflict checks.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Paid | Self::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "reservation_source", rename_all = "lowercase")
)]
pub enum ReservationSource {
    User,
    Admin,
}

/// Restricted booking type for staff-created reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "internal_kind", rename_all = "lowercase")
)]
pub enum InternalKind {
    Paid,
    Free,
    Manual,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "cancel_request_status", rename_all = "snake_case")
)]
pub enum CancelRequestStatus {
    #[default]
    None,
    Requested,
    OnHold,
    Completed,
}

/// Canonical nightly rate table for a site.
///
/// Legacy documents carried the rate under several field names
/// (`baseAmount`/`price`/`rate`) with weekend and peak variants often
/// absent; that fallback chain is collapsed once at ingestion by
/// [`requests::RateFields::normalize`] and never re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub offpeak_weekday: i64,
    pub offpeak_weekend: i64,
    pub peak_weekday: i64,
    pub peak_weekend: i64,
    /// Surcharge per extra person per night.
    pub extra_person: i64,
    /// People included in the nightly rate.
    pub base_people: i32,
    pub max_people: i32,
}

/// Half-open date range: `end` itself is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// A bookable unit. Created through the admin ingestion endpoint and
/// read-only to the booking core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub name: String,
    pub zone: String,
    pub kind: SiteKind,
    pub rate_table: RateTable,
    /// Admin-set peak season (concrete dates, half-open). No peak season
    /// means offpeak rates apply year round.
    pub peak_season: Option<DateRange>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementItem {
    pub name: String,
    pub agreed: bool,
}

/// Persisted price decomposition for a reservation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct AmountBreakdown {
    pub base_amount: i64,
    pub extra_person_amount: i64,
    /// Manual adjustment applied by staff at quote time.
    pub manual_extra: i64,
    /// On-site extra charge collected at check-in, outside the quote.
    pub extra_charge: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub status: CancelRequestStatus,
    pub reason: Option<String>,
    pub requested_at: Option<Timestamp>,
    /// Calendar days between the request and check-in, for refund policy
    /// display. May be negative if requested after check-in.
    pub days_before_check_in: Option<i64>,
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminNote {
    pub operator: String,
    pub at: Timestamp,
    pub note: String,
}
