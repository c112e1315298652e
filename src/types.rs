use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a financing contract
pub type ContractId = Uuid;

/// financing phase relative to key delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    PreDelivery,
    PostDelivery,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::PreDelivery => "Pre-Delivery",
            Phase::PostDelivery => "Post-Delivery",
        }
    }
}

/// phase an extra fee applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeePhase {
    #[serde(alias = "pré", alias = "pre-delivery")]
    Pre,
    #[serde(alias = "pós", alias = "post-delivery")]
    Post,
    #[serde(alias = "ambos")]
    Both,
}

impl FeePhase {
    pub fn applies_to(&self, phase: Phase) -> bool {
        matches!(
            (self, phase),
            (FeePhase::Both, _)
                | (FeePhase::Pre, Phase::PreDelivery)
                | (FeePhase::Post, Phase::PostDelivery)
        )
    }
}

/// origin of a payment event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentCategory {
    OneOff { label: String },
    SemiAnnual,
    Annual,
}

impl PaymentCategory {
    pub fn label(&self) -> &str {
        match self {
            PaymentCategory::OneOff { label } => label,
            PaymentCategory::SemiAnnual => "Semi-Annual Payment",
            PaymentCategory::Annual => "Annual Payment",
        }
    }
}

/// balance reductions applied at key delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryCredit {
    Fgts,
    BankFinancing,
}

impl DeliveryCredit {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryCredit::Fgts => "FGTS Abatement",
            DeliveryCredit::BankFinancing => "Bank Financing Abatement",
        }
    }
}

/// one-time charges added to the balance at key delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryFeeKind {
    /// bank credit note (CCB) issuance
    Issuance,
    /// fiduciary lien (alienação fiduciária)
    LienRegistration,
    DeedRegistration,
    /// credit life insurance (seguro prestamista)
    InsurancePremium,
}

impl DeliveryFeeKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryFeeKind::Issuance => "CCB Issuance Fee",
            DeliveryFeeKind::LienRegistration => "Fiduciary Lien Fee",
            DeliveryFeeKind::DeedRegistration => "Registration Fee",
            DeliveryFeeKind::InsurancePremium => "Credit Insurance Premium",
        }
    }
}

/// how payments associated with an installment date are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssociationPolicy {
    /// fold the payment into the installment row
    Merge,
    /// own row on the installment date, after the installment
    #[default]
    Split,
}

/// anchor for the first post-delivery accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccrualAnchor {
    #[default]
    DeliveryDate,
    LastPreDeliveryCharge,
}

/// why a schedule could not amortize the balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Infeasibility {
    /// a pre-delivery installment did not cover its own charges
    NonPositiveAbatement { date: NaiveDate, abatement: Money },
    /// the post-delivery installment cap ran out with balance left
    InstallmentCapReached { cap: u32, balance: Money },
    /// charges grew the balance past the representable range
    BalanceOverflow { date: NaiveDate },
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::NonPositiveAbatement { date, abatement } => write!(
                f,
                "installment on {} does not cover interest and fees (abatement {})",
                date.format("%d/%m/%Y"),
                abatement.round_cents()
            ),
            Infeasibility::InstallmentCapReached { cap, balance } => write!(
                f,
                "installments exceed {} and the outstanding balance is still {}",
                cap,
                balance.round_cents()
            ),
            Infeasibility::BalanceOverflow { date } => write!(
                f,
                "outstanding balance grows without bound, computation stopped on {}",
                date.format("%d/%m/%Y")
            ),
        }
    }
}

/// feasibility verdict of a computed schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    FullyAmortized,
    Infeasible(Infeasibility),
}

impl Verdict {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Verdict::FullyAmortized)
    }
}
