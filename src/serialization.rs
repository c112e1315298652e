/// serialization support for schedules
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::amortization::{LedgerRow, Schedule, ScheduleTotals};
use crate::decimal::{Money, Rate};
use crate::types::{ContractId, Verdict};

/// serializable view of a computed schedule
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub contract_id: ContractId,
    pub client_name: String,
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryView,
    pub totals: ScheduleTotals,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryView {
    pub opening_balance: Money,
    pub final_balance: Money,
    pub delivery_date: NaiveDate,
    pub feasible: bool,
    pub infeasibility: Option<String>,
    pub pre_delivery_installments: u32,
    pub post_delivery_installments: u32,
    pub row_count: usize,
}

/// flattened ledger row
#[derive(Debug, Serialize, Deserialize)]
pub struct RowView {
    pub date: NaiveDate,
    pub installment: Option<u32>,
    pub label: String,
    pub amount: Money,
    pub elapsed_days: Option<i64>,
    pub effective_rate: Option<Rate>,
    pub interest: Money,
    pub construction_index: Money,
    pub price_index: Money,
    pub extra_fees: Vec<Money>,
    pub abatement: Money,
    pub balance: Money,
}

impl RowView {
    pub fn from_row(row: &LedgerRow) -> Self {
        RowView {
            date: row.date,
            installment: row.installment,
            label: row.label().to_string(),
            amount: row.amount,
            elapsed_days: row.elapsed_days,
            effective_rate: row.effective_rate,
            interest: row.charges.interest,
            construction_index: row.charges.construction_index,
            price_index: row.charges.price_index,
            extra_fees: row.charges.extra_fees.clone(),
            abatement: row.abatement,
            balance: row.balance,
        }
    }
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        ScheduleView {
            contract_id: schedule.contract_id,
            client_name: schedule.client_name.clone(),
            generated_at: schedule.generated_at,
            summary: SummaryView {
                opening_balance: schedule.opening_balance,
                final_balance: schedule.final_balance,
                delivery_date: schedule.delivery_date,
                feasible: schedule.is_feasible(),
                infeasibility: match &schedule.verdict {
                    Verdict::FullyAmortized => None,
                    Verdict::Infeasible(reason) => Some(reason.to_string()),
                },
                pre_delivery_installments: schedule.pre_delivery_installments,
                post_delivery_installments: schedule.post_delivery_installments,
                row_count: schedule.rows.len(),
            },
            totals: schedule.totals(),
            rows: schedule.rows_by_date().into_iter().map(RowView::from_row).collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
