//! Civil date helpers for the half-open `[check_in, check_out)` model.
//!
//! Every stay occupies the nights from check-in up to but excluding
//! check-out, so back-to-back bookings sharing a boundary date never
//! collide.

use jiff::ToSpan;
use jiff::civil::Date;

/// Strict `YYYY-MM-DD` parse. Rejects datetimes, unpadded components and
/// trailing text.
pub fn parse_date(s: &str) -> Option<Date> {
    // Fixed-width ISO form only; jiff would otherwise accept extensions.
    if s.len() != 10 {
        return None;
    }
    s.parse().ok()
}

/// Whole calendar days from `from` to `to`. Negative when `to` is earlier.
pub fn diff_days(from: Date, to: Date) -> i64 {
    i64::from((to - from).get_days())
}

/// Half-open range overlap: ranges that merely touch do not overlap.
pub fn overlaps(
    a_start: Date,
    a_end: Date,
    b_start: Date,
    b_end: Date,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// The occupied nights of a stay, as the dates `[check_in, check_out)`.
pub fn nights(
    check_in: Date,
    check_out: Date,
) -> impl Iterator<Item = Date> {
    check_in
        .series(1.day())
        .take_while(move |date| *date < check_out)
}
