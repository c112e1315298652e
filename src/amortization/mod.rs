pub mod engine;
pub mod ledger;

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use serde::{Deserialize, Serialize};

use crate::config::ContractTerms;
use crate::decimal::Money;
use crate::errors::{FinancingError, Result};
use crate::types::{ContractId, Verdict};

pub use engine::{EngineState, LedgerEngine, MAX_POST_DELIVERY_INSTALLMENTS, MAX_PRE_DELIVERY_MONTHS};
pub use ledger::{Ledger, LedgerRow, RowKind};

/// computed amortization schedule of one contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub contract_id: ContractId,
    pub client_name: String,
    pub opening_balance: Money,
    pub delivery_date: NaiveDate,
    pub extra_fee_count: usize,
    pub rows: Vec<LedgerRow>,
    pub final_balance: Money,
    pub verdict: Verdict,
    pub pre_delivery_installments: u32,
    pub post_delivery_installments: u32,
    pub generated_at: DateTime<Utc>,
}

/// column sums over all ledger rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub amount_paid: Money,
    pub interest: Money,
    pub construction_index: Money,
    pub price_index: Money,
    pub extra_fees: Vec<Money>,
    pub abatement: Money,
}

impl Schedule {
    pub fn is_feasible(&self) -> bool {
        self.verdict.is_feasible()
    }

    /// turn an infeasible verdict into an error
    pub fn ensure_feasible(&self) -> Result<()> {
        match &self.verdict {
            Verdict::FullyAmortized => Ok(()),
            Verdict::Infeasible(reason) => Err(FinancingError::InfeasibleFinancing {
                client: self.client_name.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// rows in ascending date order, same-day rows in processing order
    pub fn rows_by_date(&self) -> Vec<&LedgerRow> {
        let mut rows: Vec<&LedgerRow> = self.rows.iter().collect();
        rows.sort_by_key(|row| row.date);
        rows
    }

    /// fixed charges and abatements booked at key delivery
    pub fn delivery_rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter().filter(|row| row.kind.phase().is_none())
    }

    pub fn installments(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter().filter(|row| row.kind.is_installment())
    }

    pub fn totals(&self) -> ScheduleTotals {
        let mut totals = ScheduleTotals {
            amount_paid: Money::ZERO,
            interest: Money::ZERO,
            construction_index: Money::ZERO,
            price_index: Money::ZERO,
            extra_fees: vec![Money::ZERO; self.extra_fee_count],
            abatement: Money::ZERO,
        };

        for row in &self.rows {
            totals.amount_paid = totals.amount_paid.saturating_add(row.amount);
            totals.interest = totals.interest.saturating_add(row.charges.interest);
            totals.construction_index = totals
                .construction_index
                .saturating_add(row.charges.construction_index);
            totals.price_index = totals.price_index.saturating_add(row.charges.price_index);
            for (total, fee) in totals.extra_fees.iter_mut().zip(&row.charges.extra_fees) {
                *total = total.saturating_add(*fee);
            }
            totals.abatement = totals.abatement.saturating_add(row.abatement);
        }

        totals
    }

    /// opening balance plus every row's delta; equals `final_balance`
    pub fn reconciled_balance(&self) -> Money {
        self.opening_balance + self.rows.iter().map(LedgerRow::balance_delta).sum::<Money>()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// compute a schedule stamped with the system clock
pub fn generate_schedule(terms: &ContractTerms) -> Result<Schedule> {
    let time = SafeTimeProvider::new(TimeSource::System);
    LedgerEngine::new(terms).run(&time)
}
