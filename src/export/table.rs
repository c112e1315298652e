use chrono::NaiveDate;

use crate::amortization::Schedule;
use crate::calendar::days_in_month;
use crate::decimal::{Money, Rate};

/// label of the totals row
pub const TOTAL_LABEL: &str = "TOTAL";

/// placeholder of the opening-balance row
pub const OPENING_PLACEHOLDER: &str = "-";

const LEADING_COLUMNS: [&str; 10] = [
    "Date",
    "Installment",
    "Type",
    "Days in Month",
    "Elapsed Days",
    "Effective Rate",
    "Amount Paid",
    "Interest",
    "INCC",
    "IPCA",
];

/// first summed column, "Amount Paid"
const FIRST_SUMMED_COLUMN: usize = 6;

/// typed value of one table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Date(NaiveDate),
    Integer(i64),
    Money(Money),
    Rate(Rate),
}

impl Cell {
    /// plain-text rendering used by the csv writer
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Date(date) => date.format("%Y-%m-%d").to_string(),
            Cell::Integer(n) => n.to_string(),
            Cell::Money(amount) => format!("{:.2}", amount.round_cents().as_decimal()),
            Cell::Rate(rate) => rate.as_decimal().round_dp(8).normalize().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// a schedule laid out as a spreadsheet: header, opening balance, one line
/// per ledger row in date order, a blank separator and the totals
#[derive(Debug, Clone)]
pub struct ScheduleTable {
    client_name: String,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ScheduleTable {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let header = header(schedule.extra_fee_count);
        let width = header.len();
        let mut rows = Vec::with_capacity(schedule.rows.len() + 3);

        let mut opening = vec![Cell::Text(OPENING_PLACEHOLDER.to_string()); width - 1];
        opening.push(Cell::Money(schedule.opening_balance));
        rows.push(opening);

        for row in schedule.rows_by_date() {
            let mut line = vec![
                Cell::Date(row.date),
                row.installment.map_or(Cell::Empty, |n| Cell::Integer(i64::from(n))),
                Cell::Text(row.label().to_string()),
                Cell::Integer(i64::from(days_in_month(row.date))),
                row.elapsed_days.map_or(Cell::Empty, Cell::Integer),
                row.effective_rate.map_or(Cell::Empty, Cell::Rate),
                Cell::Money(row.amount),
                Cell::Money(row.charges.interest),
                Cell::Money(row.charges.construction_index),
                Cell::Money(row.charges.price_index),
            ];
            line.extend(row.charges.extra_fees.iter().copied().map(Cell::Money));
            // delivery rows carry no fee columns when the schedule has none
            line.resize(width - 2, Cell::Money(Money::ZERO));
            line.push(Cell::Money(row.abatement));
            line.push(Cell::Money(row.balance));
            rows.push(line);
        }

        rows.push(vec![Cell::Empty; width]);

        let totals = schedule.totals();
        let mut total = vec![Cell::Text(TOTAL_LABEL.to_string())];
        total.resize(FIRST_SUMMED_COLUMN, Cell::Empty);
        total.extend([
            Cell::Money(totals.amount_paid),
            Cell::Money(totals.interest),
            Cell::Money(totals.construction_index),
            Cell::Money(totals.price_index),
        ]);
        total.extend(totals.extra_fees.into_iter().map(Cell::Money));
        total.push(Cell::Money(totals.abatement));
        total.push(Cell::Empty);
        rows.push(total);

        Self {
            client_name: schedule.client_name.clone(),
            header,
            rows,
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// every line below the header
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// number of lines including the header
    pub fn line_count(&self) -> usize {
        self.rows.len() + 1
    }
}

fn header(extra_fees: usize) -> Vec<String> {
    let mut header: Vec<String> = LEADING_COLUMNS.iter().map(|h| h.to_string()).collect();
    header.extend((1..=extra_fees).map(|n| format!("Extra Fee {}", n)));
    header.push("Abatement".to_string());
    header.push("Outstanding Balance".to_string());
    header
}
