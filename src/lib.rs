pub mod amortization;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod export;
pub mod interest;
pub mod serialization;
pub mod types;

// re-export key types
pub use amortization::{
    generate_schedule, EngineState, LedgerEngine, LedgerRow, RowKind, Schedule, ScheduleTotals,
    MAX_POST_DELIVERY_INSTALLMENTS, MAX_PRE_DELIVERY_MONTHS,
};
pub use config::{
    CalculationOptions, ContractTerms, ContractTermsBuilder, DeliveryFees, ExtraFee, IndexRates,
    OneOffPayment, RecurringSeries,
};
pub use decimal::{Money, Rate};
pub use errors::{FinancingError, Result};
pub use events::{build_events, EventStream, PaymentEvent, SERIES_HORIZON};
pub use export::{write_schedule, ExportFormat, ScheduleTable};
pub use interest::{Accrual, AccrualTracker, Charges, DayCountBasis};
pub use serialization::ScheduleView;
pub use types::{
    AccrualAnchor, AssociationPolicy, ContractId, DeliveryCredit, DeliveryFeeKind, FeePhase,
    Infeasibility, PaymentCategory, Phase, Verdict,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
