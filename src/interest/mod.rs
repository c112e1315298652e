pub mod accrual;

use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

pub use accrual::{AccrualTracker, DayCountBasis, STANDARD_PERIOD_DAYS};

/// result of one accrual call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accrual {
    pub interest: Money,
    pub elapsed_days: i64,
    pub effective_rate: Rate,
}

impl Accrual {
    /// opening charge of a phase
    pub fn opening() -> Self {
        Self {
            interest: Money::ZERO,
            elapsed_days: 0,
            effective_rate: Rate::ZERO,
        }
    }
}

/// per-row charges levied against the balance before a payment is applied
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Charges {
    pub interest: Money,
    pub construction_index: Money,
    pub price_index: Money,
    pub extra_fees: Vec<Money>,
}

impl Charges {
    /// sum of all charges, `None` on overflow
    pub fn total(&self) -> Option<Money> {
        self.extra_fees.iter().try_fold(
            self.interest
                .checked_add(self.construction_index)?
                .checked_add(self.price_index)?,
            |total, fee| total.checked_add(*fee),
        )
    }

    /// balance reduction achieved by paying `amount` against these charges
    pub fn abatement(&self, amount: Money) -> Option<Money> {
        amount.checked_sub(self.total()?)
    }
}
