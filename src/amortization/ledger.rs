use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::interest::{Accrual, Charges};
use crate::types::{DeliveryCredit, DeliveryFeeKind, PaymentCategory, Phase};

/// what produced a ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    RegularInstallment { phase: Phase },
    OneOffCharge { phase: Phase, category: PaymentCategory },
    DeliveryCredit(DeliveryCredit),
    DeliveryFee(DeliveryFeeKind),
}

impl RowKind {
    pub fn label(&self) -> &str {
        match self {
            RowKind::RegularInstallment { phase } => phase.label(),
            RowKind::OneOffCharge { category, .. } => match category.label() {
                "" => "One-Off Payment",
                label => label,
            },
            RowKind::DeliveryCredit(credit) => credit.label(),
            RowKind::DeliveryFee(fee) => fee.label(),
        }
    }

    /// phase whose tracker accrued this row, `None` for delivery adjustments
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RowKind::RegularInstallment { phase } | RowKind::OneOffCharge { phase, .. } => Some(*phase),
            RowKind::DeliveryCredit(_) | RowKind::DeliveryFee(_) => None,
        }
    }

    pub fn is_installment(&self) -> bool {
        matches!(self, RowKind::RegularInstallment { .. })
    }
}

/// one finalized line of the amortization ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub installment: Option<u32>,
    pub kind: RowKind,
    /// nominal cash flow: payments positive, delivery fees negative
    pub amount: Money,
    pub elapsed_days: Option<i64>,
    pub effective_rate: Option<Rate>,
    pub charges: Charges,
    /// reduction of the outstanding balance, negative when it grows
    pub abatement: Money,
    /// outstanding balance after this row
    pub balance: Money,
}

impl LedgerRow {
    /// payment row charged against the running balance, `None` when the
    /// new balance overflows
    pub fn payment(
        date: NaiveDate,
        kind: RowKind,
        amount: Money,
        accrual: Accrual,
        charges: Charges,
        balance: Money,
    ) -> Option<Self> {
        let abatement = charges.abatement(amount)?;
        let balance = balance.checked_sub(abatement)?;
        Some(Self {
            date,
            installment: None,
            kind,
            amount,
            elapsed_days: Some(accrual.elapsed_days),
            effective_rate: Some(accrual.effective_rate),
            charges,
            abatement,
            balance,
        })
    }

    /// delivery adjustment, the full amount goes to the balance
    pub fn adjustment(
        date: NaiveDate,
        kind: RowKind,
        amount: Money,
        extra_fee_columns: usize,
        balance: Money,
    ) -> Option<Self> {
        Some(Self {
            date,
            installment: None,
            kind,
            amount,
            elapsed_days: None,
            effective_rate: None,
            charges: Charges {
                extra_fees: vec![Money::ZERO; extra_fee_columns],
                ..Charges::default()
            },
            abatement: amount,
            balance: balance.checked_sub(amount)?,
        })
    }

    pub fn with_installment(mut self, number: u32) -> Self {
        self.installment = Some(number);
        self
    }

    pub fn label(&self) -> &str {
        self.kind.label()
    }

    /// signed change this row applied to the balance
    pub fn balance_delta(&self) -> Money {
        -self.abatement
    }
}

/// append-only row store for one computation
#[derive(Debug, Default)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn push(&mut self, row: LedgerRow) {
        debug_assert!(
            self.rows.last().map_or(true, |last| last.date <= row.date),
            "ledger rows must be appended in date order"
        );
        self.rows.push(row);
    }

    pub fn last(&self) -> Option<&LedgerRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<LedgerRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_payment_row_reduces_balance() {
        let charges = Charges {
            interest: Money::from_major(100),
            construction_index: Money::from_major(1_500),
            price_index: Money::ZERO,
            extra_fees: vec![],
        };
        let row = LedgerRow::payment(
            date(2025, 2, 10),
            RowKind::RegularInstallment { phase: Phase::PreDelivery },
            Money::from_major(2_000),
            Accrual::opening(),
            charges,
            Money::from_major(300_000),
        )
        .unwrap()
        .with_installment(1);

        assert_eq!(row.abatement, Money::from_major(400));
        assert_eq!(row.balance, Money::from_major(299_600));
        assert_eq!(row.balance_delta(), Money::from_major(-400));
        assert_eq!(row.installment, Some(1));
        assert_eq!(row.label(), "Pre-Delivery");
        assert_eq!(row.elapsed_days, Some(0));
    }

    #[test]
    fn test_fee_adjustment_grows_balance() {
        let row = LedgerRow::adjustment(
            date(2026, 1, 10),
            RowKind::DeliveryFee(DeliveryFeeKind::Issuance),
            -Money::from_major(1_500),
            2,
            Money::from_major(100_000),
        )
        .unwrap();

        assert_eq!(row.balance, Money::from_major(101_500));
        assert_eq!(row.charges.extra_fees, vec![Money::ZERO, Money::ZERO]);
        assert_eq!(row.elapsed_days, None);
        assert_eq!(row.kind.phase(), None);
    }

    #[test]
    fn test_balance_overflow_yields_no_row() {
        let huge = Money::from_decimal(rust_decimal::Decimal::MAX);
        let charges = Charges {
            interest: huge,
            extra_fees: vec![],
            ..Charges::default()
        };
        let row = LedgerRow::payment(
            date(2030, 5, 10),
            RowKind::RegularInstallment { phase: Phase::PostDelivery },
            Money::from_major(1_000),
            Accrual::opening(),
            charges,
            huge,
        );
        assert!(row.is_none());

        let fee = LedgerRow::adjustment(
            date(2026, 1, 10),
            RowKind::DeliveryFee(DeliveryFeeKind::DeedRegistration),
            -Money::from_major(1_500),
            0,
            huge,
        );
        assert!(fee.is_none());
    }

    #[test]
    fn test_one_off_label_fallback() {
        let unnamed = RowKind::OneOffCharge {
            phase: Phase::PostDelivery,
            category: PaymentCategory::OneOff { label: String::new() },
        };
        let named = RowKind::OneOffCharge {
            phase: Phase::PostDelivery,
            category: PaymentCategory::OneOff { label: "Bonus".to_string() },
        };

        assert_eq!(unnamed.label(), "One-Off Payment");
        assert_eq!(named.label(), "Bonus");
        assert_eq!(named.phase(), Some(Phase::PostDelivery));
        assert!(!named.is_installment());
    }

    #[test]
    fn test_ledger_is_append_only() {
        let mut ledger = Ledger::new();
        assert!(ledger.is_empty());

        ledger.push(LedgerRow::adjustment(
            date(2026, 1, 10),
            RowKind::DeliveryCredit(DeliveryCredit::Fgts),
            Money::from_major(10_000),
            0,
            Money::from_major(50_000),
        )
        .unwrap());

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.last().map(|r| r.balance), Some(Money::from_major(40_000)));
        assert_eq!(ledger.into_rows().len(), 1);
    }
}
