use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::days_in_month;
use crate::decimal::{Money, Rate};
use crate::interest::Accrual;

/// fixed accrual period under the 30-day convention
pub const STANDARD_PERIOD_DAYS: u32 = 30;

/// divisor applied to elapsed days when prorating a monthly rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayCountBasis {
    /// elapsed days / 30
    #[default]
    Fixed30,
    /// elapsed days / days in the month of the previous charge
    ActualPriorMonth,
}

impl DayCountBasis {
    pub fn period_days(&self, anchor: NaiveDate) -> u32 {
        match self {
            DayCountBasis::Fixed30 => STANDARD_PERIOD_DAYS,
            DayCountBasis::ActualPriorMonth => days_in_month(anchor),
        }
    }
}

/// per-phase interest accrual between consecutive charges
///
/// The first charge of a phase opens the accrual window and carries no
/// interest. Every later charge accrues from the previous charge date, which
/// then moves to the current date. Calls must come in date order.
#[derive(Debug, Clone)]
pub struct AccrualTracker {
    last_charge_date: Option<NaiveDate>,
    nominal_rate: Rate,
    preferred_day: u32,
    basis: DayCountBasis,
}

impl AccrualTracker {
    pub fn new(nominal_rate: Rate, preferred_day: u32, basis: DayCountBasis) -> Self {
        Self {
            last_charge_date: None,
            nominal_rate,
            preferred_day,
            basis,
        }
    }

    /// tracker whose first charge already accrues from `anchor`
    pub fn anchored(
        nominal_rate: Rate,
        preferred_day: u32,
        basis: DayCountBasis,
        anchor: NaiveDate,
    ) -> Self {
        Self {
            last_charge_date: Some(anchor),
            ..Self::new(nominal_rate, preferred_day, basis)
        }
    }

    pub fn last_charge_date(&self) -> Option<NaiveDate> {
        self.last_charge_date
    }

    pub fn preferred_day(&self) -> u32 {
        self.preferred_day
    }

    /// accrue interest on `balance` up to `current_date`; `None` when the
    /// interest overflows
    pub fn accrue(&mut self, current_date: NaiveDate, balance: Money) -> Option<Accrual> {
        let Some(last) = self.last_charge_date.replace(current_date) else {
            return Some(Accrual::opening());
        };

        let elapsed_days = (current_date - last).num_days();
        debug_assert!(
            elapsed_days >= 0,
            "accrual dates out of order: {} after {}",
            current_date,
            last
        );

        let effective_rate = self
            .nominal_rate
            .prorate(elapsed_days, self.basis.period_days(last));

        Some(Accrual {
            interest: balance.checked_apply(effective_rate)?,
            elapsed_days,
            effective_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_charge_is_free() {
        let mut tracker = AccrualTracker::new(Rate::from_percentage(1), 10, DayCountBasis::Fixed30);
        let accrual = tracker.accrue(date(2025, 1, 10), Money::from_major(300_000)).unwrap();

        assert_eq!(accrual, Accrual::opening());
        assert_eq!(accrual.interest, Money::ZERO);
        assert_eq!(accrual.elapsed_days, 0);
        assert_eq!(accrual.effective_rate, Rate::ZERO);
        assert_eq!(tracker.last_charge_date(), Some(date(2025, 1, 10)));
    }

    #[test]
    fn test_fixed_30_day_accrual() {
        let rate = Rate::from_percentage(1);
        let mut tracker = AccrualTracker::new(rate, 10, DayCountBasis::Fixed30);
        tracker.accrue(date(2025, 1, 10), Money::from_major(300_000));

        let balance = Money::from_major(298_500);
        let accrual = tracker.accrue(date(2025, 2, 10), balance).unwrap();

        assert_eq!(accrual.elapsed_days, 31);
        assert_eq!(accrual.effective_rate.as_decimal(), dec!(0.01) * dec!(31) / dec!(30));
        assert_eq!(accrual.interest, balance * rate.prorate(31, 30));
        assert_eq!(tracker.last_charge_date(), Some(date(2025, 2, 10)));
    }

    #[test]
    fn test_actual_prior_month_accrual() {
        let rate = Rate::from_percentage(1);
        let mut tracker = AccrualTracker::new(rate, 10, DayCountBasis::ActualPriorMonth);
        tracker.accrue(date(2025, 2, 10), Money::from_major(100_000));

        // 28 days in February 2025, so a full month accrues the nominal rate
        let accrual = tracker.accrue(date(2025, 3, 10), Money::from_major(100_000)).unwrap();
        assert_eq!(accrual.elapsed_days, 28);
        assert_eq!(accrual.effective_rate, rate);
        assert_eq!(accrual.interest, Money::from_major(1_000));
    }

    #[test]
    fn test_anchor_keeps_raw_date() {
        let mut tracker = AccrualTracker::new(Rate::from_percentage(2), 31, DayCountBasis::Fixed30);
        tracker.accrue(date(2025, 1, 15), Money::from_major(1_000));
        tracker.accrue(date(2025, 1, 20), Money::from_major(1_000));

        // not re-snapped to the preferred day
        assert_eq!(tracker.last_charge_date(), Some(date(2025, 1, 20)));
    }

    #[test]
    fn test_same_day_charge_accrues_nothing() {
        let mut tracker = AccrualTracker::new(Rate::from_percentage(1), 10, DayCountBasis::Fixed30);
        tracker.accrue(date(2025, 1, 10), Money::from_major(1_000));
        let accrual = tracker.accrue(date(2025, 1, 10), Money::from_major(1_000)).unwrap();

        assert_eq!(accrual.elapsed_days, 0);
        assert_eq!(accrual.interest, Money::ZERO);
    }

    #[test]
    fn test_interest_overflow_is_reported() {
        let mut tracker = AccrualTracker::new(Rate::from_percentage(300), 10, DayCountBasis::Fixed30);
        let huge = Money::from_decimal(rust_decimal::Decimal::MAX);
        tracker.accrue(date(2025, 1, 10), huge);

        assert_eq!(tracker.accrue(date(2025, 2, 10), huge), None);
    }

    #[test]
    fn test_anchored_tracker_accrues_on_first_call() {
        let mut tracker = AccrualTracker::anchored(
            Rate::from_percentage(1),
            10,
            DayCountBasis::Fixed30,
            date(2026, 6, 1),
        );
        let accrual = tracker.accrue(date(2026, 7, 1), Money::from_major(60_000)).unwrap();

        assert_eq!(accrual.elapsed_days, 30);
        assert_eq!(accrual.interest, Money::from_major(600));
    }
}
