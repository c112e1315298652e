//! Payment events: the one-off and recurring cash flows of a contract,
//! expanded into dated events and split around key delivery.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{add_months, add_years, adjust_to_preferred_day};
use crate::config::{OneOffPayment, RecurringSeries};
use crate::decimal::Money;
use crate::types::PaymentCategory;

/// occurrences generated per recurring series
pub const SERIES_HORIZON: u32 = 100;

/// a single scheduled cash flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub date: NaiveDate,
    pub category: PaymentCategory,
    pub amount: Money,
    /// supplements the regular installment due on the same date
    pub associated: bool,
}

impl PaymentEvent {
    pub fn label(&self) -> &str {
        self.category.label()
    }
}

/// expand one-off and recurring payments into a flat event list
///
/// Associated payments are snapped to the preferred billing day so that they
/// land on an installment date.
pub fn build_events(
    one_offs: &[OneOffPayment],
    semi_annual: &[RecurringSeries],
    annual: &[RecurringSeries],
    preferred_day: u32,
) -> Vec<PaymentEvent> {
    let snap = |date: NaiveDate, associated: bool| {
        if associated {
            adjust_to_preferred_day(date, preferred_day)
        } else {
            date
        }
    };

    let mut events: Vec<PaymentEvent> = one_offs
        .iter()
        .map(|payment| PaymentEvent {
            date: snap(payment.date, payment.associated),
            category: PaymentCategory::OneOff {
                label: payment.label.clone(),
            },
            amount: payment.amount,
            associated: payment.associated,
        })
        .collect();

    for series in semi_annual {
        events.extend((0..SERIES_HORIZON).map(|n| PaymentEvent {
            date: snap(add_months(series.start_date, 6 * n), series.associated),
            category: PaymentCategory::SemiAnnual,
            amount: series.amount,
            associated: series.associated,
        }));
    }

    for series in annual {
        events.extend((0..SERIES_HORIZON).map(|n| PaymentEvent {
            date: snap(add_years(series.start_date, n), series.associated),
            category: PaymentCategory::Annual,
            amount: series.amount,
            associated: series.associated,
        }));
    }

    events
}

/// events split into the pre- and post-delivery subsets, each in date order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStream {
    pre_delivery: Vec<PaymentEvent>,
    post_delivery: Vec<PaymentEvent>,
}

impl EventStream {
    /// events strictly before `delivery_date` are pre-delivery, the rest post
    pub fn partition(events: Vec<PaymentEvent>, delivery_date: NaiveDate) -> Self {
        let (mut pre_delivery, mut post_delivery): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|e| e.date < delivery_date);

        // stable, so same-day events keep their input order
        pre_delivery.sort_by_key(|e| e.date);
        post_delivery.sort_by_key(|e| e.date);

        Self {
            pre_delivery,
            post_delivery,
        }
    }

    pub fn pre_delivery(&self) -> &[PaymentEvent] {
        &self.pre_delivery
    }

    pub fn post_delivery(&self) -> &[PaymentEvent] {
        &self.post_delivery
    }

    pub fn len(&self) -> usize {
        self.pre_delivery.len() + self.post_delivery.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// in-order consumer over one subset of an [`EventStream`]
#[derive(Debug)]
pub(crate) struct EventCursor<'a> {
    events: &'a [PaymentEvent],
    next: usize,
}

impl<'a> EventCursor<'a> {
    pub(crate) fn new(events: &'a [PaymentEvent]) -> Self {
        Self { events, next: 0 }
    }

    /// take the next event if it is dated on or before `date`
    pub(crate) fn next_until(&mut self, date: NaiveDate) -> Option<&'a PaymentEvent> {
        let event = self.events.get(self.next).filter(|e| e.date <= date)?;
        self.next += 1;
        Some(event)
    }

    /// take every remaining event
    pub(crate) fn drain(&mut self) -> &'a [PaymentEvent] {
        let rest = &self.events[self.next..];
        self.next = self.events.len();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(start: NaiveDate, amount: i64, associated: bool) -> RecurringSeries {
        RecurringSeries {
            start_date: start,
            amount: Money::from_major(amount),
            associated,
        }
    }

    #[test]
    fn test_semi_annual_expansion() {
        let events = build_events(&[], &[series(date(2025, 3, 15), 5_000, false)], &[], 10);

        assert_eq!(events.len(), SERIES_HORIZON as usize);
        assert_eq!(events[0].date, date(2025, 3, 15));
        assert_eq!(events[1].date, date(2025, 9, 15));
        assert_eq!(events[2].date, date(2026, 3, 15));
        assert_eq!(events[99].date, date(2074, 9, 15));
        assert!(events.iter().all(|e| e.category == PaymentCategory::SemiAnnual));
    }

    #[test]
    fn test_annual_expansion_snaps_associated() {
        let events = build_events(&[], &[], &[series(date(2025, 2, 3), 12_000, true)], 31);

        assert_eq!(events.len(), SERIES_HORIZON as usize);
        assert_eq!(events[0].date, date(2025, 2, 28));
        assert_eq!(events[1].date, date(2026, 2, 28));
        assert_eq!(events[3].date, date(2028, 2, 29));
        assert!(events.iter().all(|e| e.associated));
    }

    #[test]
    fn test_one_offs_keep_labels_and_dates() {
        let one_offs = vec![
            OneOffPayment {
                date: date(2025, 5, 20),
                amount: Money::from_major(8_000),
                label: "Bonus".to_string(),
                associated: false,
            },
            OneOffPayment {
                date: date(2025, 7, 3),
                amount: Money::from_major(4_000),
                label: "Thirteenth".to_string(),
                associated: true,
            },
        ];

        let events = build_events(&one_offs, &[], &[], 10);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, date(2025, 5, 20));
        assert_eq!(events[0].label(), "Bonus");
        assert_eq!(events[1].date, date(2025, 7, 10));
        assert!(events[1].associated);
    }

    #[test]
    fn test_partition_around_delivery() {
        let events = build_events(&[], &[series(date(2025, 1, 10), 1_000, false)], &[], 10);
        let stream = EventStream::partition(events, date(2026, 1, 10));

        let pre: Vec<_> = stream.pre_delivery().iter().map(|e| e.date).collect();
        assert_eq!(pre, vec![date(2025, 1, 10), date(2025, 7, 10)]);

        // delivery date itself belongs to the post-delivery subset
        assert_eq!(stream.post_delivery()[0].date, date(2026, 1, 10));
        assert_eq!(stream.len(), SERIES_HORIZON as usize);
        assert!(stream.post_delivery().windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_partition_sorts_merged_sources() {
        let one_offs = vec![OneOffPayment {
            date: date(2025, 4, 1),
            amount: Money::from_major(100),
            label: "Extra".to_string(),
            associated: false,
        }];
        let events = build_events(
            &one_offs,
            &[series(date(2025, 2, 1), 200, false)],
            &[series(date(2025, 3, 1), 300, false)],
            1,
        );
        let stream = EventStream::partition(events, date(2025, 6, 1));

        let pre: Vec<_> = stream.pre_delivery().iter().map(|e| e.amount).collect();
        assert_eq!(
            pre,
            vec![Money::from_major(200), Money::from_major(300), Money::from_major(100)]
        );
    }

    #[test]
    fn test_cursor_consumes_in_order() {
        let events = build_events(&[], &[series(date(2025, 1, 5), 1, false)], &[], 5);
        let mut cursor = EventCursor::new(&events[..3]);

        assert!(cursor.next_until(date(2025, 1, 4)).is_none());
        assert_eq!(cursor.next_until(date(2025, 1, 5)).map(|e| e.date), Some(date(2025, 1, 5)));
        assert!(cursor.next_until(date(2025, 7, 4)).is_none());
        assert_eq!(cursor.drain().len(), 2);
        assert!(cursor.drain().is_empty());
    }
}
