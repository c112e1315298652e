//! Billing-date arithmetic.
//!
//! Installments fall on a preferred day of the month. Months that are too
//! short for that day bill on their last day instead; this is never an error.

use chrono::{Datelike, Months, NaiveDate};

/// snap `date` to `preferred_day` within the same month, clamping to the
/// month's last day
pub fn adjust_to_preferred_day(date: NaiveDate, preferred_day: u32) -> NaiveDate {
    let day = preferred_day.clamp(1, days_in_month(date));
    date.with_day(day).unwrap_or(date)
}

/// number of days in `date`'s month (28-31)
pub fn days_in_month(date: NaiveDate) -> u32 {
    month_length(date.year(), date.month())
}

/// add calendar months, clamping to the end of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// add calendar years, Feb 29 falls back to Feb 28
pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    add_months(date, years.saturating_mul(12))
}

/// nominal billing date of the `n`-th month after `start`, snapped
pub fn billing_date(start: NaiveDate, n: u32, preferred_day: u32) -> NaiveDate {
    adjust_to_preferred_day(add_months(start, n), preferred_day)
}

fn month_length(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
