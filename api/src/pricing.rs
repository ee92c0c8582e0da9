//! Stay pricing: nightly rate (weekday/weekend, offpeak/peak) summed
//! across the occupied nights, plus the per-night extra-person surcharge
//! and any staff manual adjustment.

use jiff::civil::{Date, Weekday};
use payloads::{AmountBreakdown, Site};

use crate::dates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("check-out must be after check-in")]
    InvalidDateRange,
}

/// A fully resolved price for a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub nights: i64,
    /// Head count after coercion, never below 1.
    pub people: i32,
    pub base_total: i64,
    pub extra_total: i64,
    pub manual_extra: i64,
    pub total: i64,
}

impl Quote {
    pub fn breakdown(&self) -> AmountBreakdown {
        AmountBreakdown {
            base_amount: self.base_total,
            extra_person_amount: self.extra_total,
            manual_extra: self.manual_extra,
            extra_charge: 0,
            total: self.total,
        }
    }
}

/// Price a stay at `site`. A missing or zero `people` falls back to the
/// head count included in the nightly rate.
pub fn quote(
    site: &Site,
    check_in: Date,
    check_out: Date,
    people: Option<i32>,
    manual_extra: i64,
) -> Result<Quote, PricingError> {
    if check_out <= check_in {
        return Err(PricingError::InvalidDateRange);
    }
    let rates = &site.rate_table;
    let included = rates.base_people.max(1);
    let people = match people {
        Some(p) if p >= 1 => p,
        _ => included,
    };

    let mut nights = 0i64;
    let mut base_total = 0i64;
    for night in dates::nights(check_in, check_out) {
        nights += 1;
        base_total += nightly_rate(site, night);
    }
    let extra_people = i64::from((people - included).max(0));
    let extra_total = extra_people * rates.extra_person * nights;
    // Manual adjustments only ever add; a negative adjustment is ignored.
    let manual_extra = manual_extra.max(0);
    let total = base_total + extra_total + manual_extra;

    Ok(Quote {
        nights,
        people,
        base_total,
        extra_total,
        manual_extra,
        total,
    })
}

fn nightly_rate(site: &Site, night: Date) -> i64 {
    let weekend = matches!(night.weekday(), Weekday::Saturday | Weekday::Sunday);
    let peak = site
        .peak_season
        .is_some_and(|season| season.start <= night && night < season.end);
    let rates = &site.rate_table;
    match (peak, weekend) {
        (false, false) => rates.offpeak_weekday,
        (false, true) => rates.offpeak_weekend,
        (true, false) => rates.peak_weekday,
        (true, true) => rates.peak_weekend,
    }
}
