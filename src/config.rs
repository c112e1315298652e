use std::path::Path;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::MAX_PRE_DELIVERY_MONTHS;
use crate::calendar::add_months;
use crate::decimal::{Money, Rate};
use crate::errors::{FinancingError, Result};
use crate::interest::DayCountBasis;
use crate::types::{AccrualAnchor, AssociationPolicy, ContractId, FeePhase};

/// maximum number of extra fee rules per contract
pub const MAX_EXTRA_FEES: usize = 7;

/// financing contract terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    #[serde(default = "Uuid::new_v4")]
    pub contract_id: ContractId,
    pub client_name: String,
    pub property_price: Money,
    pub preferred_day: u32,
    pub pre_delivery_rate: Rate,
    pub post_delivery_rate: Rate,
    pub pre_payment_start: NaiveDate,
    pub delivery_date: NaiveDate,
    pub pre_delivery_capacity: Money,
    pub post_delivery_capacity: Money,
    /// bank installment paid out of the post-delivery capacity
    #[serde(default)]
    pub bank_installment: Option<Money>,
    #[serde(default)]
    pub fgts_abatement: Money,
    #[serde(default)]
    pub bank_financing: Money,
    #[serde(default)]
    pub extra_fees: Vec<ExtraFee>,
    #[serde(default)]
    pub delivery_fees: DeliveryFees,
    #[serde(default)]
    pub index_rates: IndexRates,
    #[serde(default)]
    pub one_off_payments: Vec<OneOffPayment>,
    #[serde(default)]
    pub semi_annual_series: Vec<RecurringSeries>,
    #[serde(default)]
    pub annual_series: Vec<RecurringSeries>,
    #[serde(default)]
    pub options: CalculationOptions,
}

/// percentage charged on the outstanding balance at every row of a phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraFee {
    pub percentage: Rate,
    pub phase: FeePhase,
}

/// one-time charges added to the balance at key delivery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryFees {
    pub issuance: Money,
    pub lien_registration: Money,
    pub deed_registration: Money,
    pub insurance_premium: Rate,
}

impl Default for DeliveryFees {
    fn default() -> Self {
        Self {
            issuance: Money::from_major(1_500),
            lien_registration: Money::from_major(2_000),
            deed_registration: Money::from_major(1_500),
            insurance_premium: Rate::from_decimal(dec!(0.083)),
        }
    }
}

impl DeliveryFees {
    /// no delivery charges at all
    pub fn waived() -> Self {
        Self {
            issuance: Money::ZERO,
            lien_registration: Money::ZERO,
            deed_registration: Money::ZERO,
            insurance_premium: Rate::ZERO,
        }
    }
}

/// monthly price-index charges per phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRates {
    /// INCC, charged before delivery
    pub construction: Rate,
    /// IPCA, charged after delivery
    pub price: Rate,
}

impl Default for IndexRates {
    fn default() -> Self {
        Self {
            construction: Rate::from_decimal(dec!(0.005)),
            price: Rate::from_decimal(dec!(0.005)),
        }
    }
}

impl IndexRates {
    pub fn none() -> Self {
        Self {
            construction: Rate::ZERO,
            price: Rate::ZERO,
        }
    }
}

/// explicit single payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneOffPayment {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub label: String,
    /// reported together with the installment of the same month
    #[serde(default)]
    pub associated: bool,
}

/// payment recurring every six months or every year from `start_date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub start_date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub associated: bool,
}

/// calculation conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationOptions {
    pub day_count: DayCountBasis,
    pub post_delivery_anchor: AccrualAnchor,
    pub association: AssociationPolicy,
}

impl ContractTerms {
    pub fn builder<'a>() -> ContractTermsBuilder<'a> {
        ContractTermsBuilder::new()
    }

    /// parse terms from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let terms: ContractTerms = serde_json::from_str(json)?;
        terms.validate()?;
        Ok(terms)
    }

    /// load terms from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.preferred_day) {
            return Err(FinancingError::invalid(format!(
                "preferred day must be between 1 and 31, got {}",
                self.preferred_day
            )));
        }

        if self.delivery_date < self.pre_payment_start {
            return Err(FinancingError::invalid(format!(
                "delivery date {} precedes pre-payment start {}",
                self.delivery_date, self.pre_payment_start
            )));
        }

        if add_months(self.pre_payment_start, MAX_PRE_DELIVERY_MONTHS) < self.delivery_date {
            return Err(FinancingError::invalid(format!(
                "delivery date {} is more than {} months after pre-payment start",
                self.delivery_date, MAX_PRE_DELIVERY_MONTHS
            )));
        }

        if self.extra_fees.len() > MAX_EXTRA_FEES {
            return Err(FinancingError::invalid(format!(
                "at most {} extra fees are supported, got {}",
                MAX_EXTRA_FEES,
                self.extra_fees.len()
            )));
        }

        let amounts = [
            ("property_price", self.property_price),
            ("pre_delivery_capacity", self.pre_delivery_capacity),
            ("post_delivery_capacity", self.post_delivery_capacity),
            ("fgts_abatement", self.fgts_abatement),
            ("bank_financing", self.bank_financing),
            ("bank_installment", self.bank_installment.unwrap_or(Money::ZERO)),
            ("delivery_fees.issuance", self.delivery_fees.issuance),
            ("delivery_fees.lien_registration", self.delivery_fees.lien_registration),
            ("delivery_fees.deed_registration", self.delivery_fees.deed_registration),
        ];
        for (field, amount) in amounts {
            if amount.is_negative() {
                return Err(FinancingError::invalid(format!("{} is negative: {}", field, amount)));
            }
        }

        let payments = self
            .one_off_payments
            .iter()
            .map(|p| p.amount)
            .chain(self.semi_annual_series.iter().map(|s| s.amount))
            .chain(self.annual_series.iter().map(|s| s.amount));
        for amount in payments {
            if amount.is_negative() {
                return Err(FinancingError::invalid(format!("payment amount is negative: {}", amount)));
            }
        }

        let rates = [
            ("pre_delivery_rate", self.pre_delivery_rate),
            ("post_delivery_rate", self.post_delivery_rate),
            ("index_rates.construction", self.index_rates.construction),
            ("index_rates.price", self.index_rates.price),
            ("delivery_fees.insurance_premium", self.delivery_fees.insurance_premium),
        ];
        for (field, rate) in rates {
            if rate.is_negative() {
                return Err(FinancingError::invalid(format!("{} is negative: {}", field, rate)));
            }
        }

        if let Some(fee) = self.extra_fees.iter().find(|f| f.percentage.is_negative()) {
            return Err(FinancingError::invalid(format!(
                "extra fee percentage is negative: {}",
                fee.percentage
            )));
        }

        Ok(())
    }

    /// capacity applied to each post-delivery installment
    pub fn post_delivery_installment(&self) -> Money {
        self.post_delivery_capacity - self.bank_installment.unwrap_or(Money::ZERO)
    }
}

/// builder for contract terms
pub struct ContractTermsBuilder<'a> {
    contract_id: Option<ContractId>,
    client_name: Option<String>,
    property_price: Option<Money>,
    preferred_day: Option<u32>,
    pre_delivery_rate: Option<Rate>,
    post_delivery_rate: Option<Rate>,
    pre_payment_start: Option<NaiveDate>,
    delivery_date: Option<NaiveDate>,
    pre_delivery_capacity: Option<Money>,
    post_delivery_capacity: Option<Money>,
    bank_installment: Option<Money>,
    fgts_abatement: Money,
    bank_financing: Money,
    extra_fees: Vec<ExtraFee>,
    delivery_fees: DeliveryFees,
    index_rates: IndexRates,
    one_off_payments: Vec<OneOffPayment>,
    semi_annual_series: Vec<RecurringSeries>,
    annual_series: Vec<RecurringSeries>,
    options: CalculationOptions,
    time_provider: Option<&'a SafeTimeProvider>,
}

impl Default for ContractTermsBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ContractTermsBuilder<'a> {
    pub fn new() -> Self {
        Self {
            contract_id: None,
            client_name: None,
            property_price: None,
            preferred_day: None,
            pre_delivery_rate: None,
            post_delivery_rate: None,
            pre_payment_start: None,
            delivery_date: None,
            pre_delivery_capacity: None,
            post_delivery_capacity: None,
            bank_installment: None,
            fgts_abatement: Money::ZERO,
            bank_financing: Money::ZERO,
            extra_fees: Vec::new(),
            delivery_fees: DeliveryFees::default(),
            index_rates: IndexRates::default(),
            one_off_payments: Vec::new(),
            semi_annual_series: Vec::new(),
            annual_series: Vec::new(),
            options: CalculationOptions::default(),
            time_provider: None,
        }
    }

    /// time source for the default pre-payment start date
    pub fn set_time(mut self, time: &'a SafeTimeProvider) -> Self {
        self.time_provider = Some(time);
        self
    }

    pub fn contract_id(mut self, id: ContractId) -> Self {
        self.contract_id = Some(id);
        self
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn property_price(mut self, price: Money) -> Self {
        self.property_price = Some(price);
        self
    }

    pub fn preferred_day(mut self, day: u32) -> Self {
        self.preferred_day = Some(day);
        self
    }

    pub fn pre_delivery_rate(mut self, rate: Rate) -> Self {
        self.pre_delivery_rate = Some(rate);
        self
    }

    pub fn post_delivery_rate(mut self, rate: Rate) -> Self {
        self.post_delivery_rate = Some(rate);
        self
    }

    pub fn pre_payment_start(mut self, date: NaiveDate) -> Self {
        self.pre_payment_start = Some(date);
        self
    }

    pub fn delivery_date(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn pre_delivery_capacity(mut self, amount: Money) -> Self {
        self.pre_delivery_capacity = Some(amount);
        self
    }

    pub fn post_delivery_capacity(mut self, amount: Money) -> Self {
        self.post_delivery_capacity = Some(amount);
        self
    }

    pub fn bank_installment(mut self, amount: Money) -> Self {
        self.bank_installment = Some(amount);
        self
    }

    pub fn fgts_abatement(mut self, amount: Money) -> Self {
        self.fgts_abatement = amount;
        self
    }

    pub fn bank_financing(mut self, amount: Money) -> Self {
        self.bank_financing = amount;
        self
    }

    pub fn extra_fee(mut self, percentage: Rate, phase: FeePhase) -> Self {
        self.extra_fees.push(ExtraFee { percentage, phase });
        self
    }

    pub fn delivery_fees(mut self, fees: DeliveryFees) -> Self {
        self.delivery_fees = fees;
        self
    }

    pub fn index_rates(mut self, rates: IndexRates) -> Self {
        self.index_rates = rates;
        self
    }

    pub fn one_off(mut self, date: NaiveDate, amount: Money, label: impl Into<String>, associated: bool) -> Self {
        self.one_off_payments.push(OneOffPayment {
            date,
            amount,
            label: label.into(),
            associated,
        });
        self
    }

    pub fn semi_annual(mut self, start_date: NaiveDate, amount: Money, associated: bool) -> Self {
        self.semi_annual_series.push(RecurringSeries {
            start_date,
            amount,
            associated,
        });
        self
    }

    pub fn annual(mut self, start_date: NaiveDate, amount: Money, associated: bool) -> Self {
        self.annual_series.push(RecurringSeries {
            start_date,
            amount,
            associated,
        });
        self
    }

    pub fn day_count(mut self, basis: DayCountBasis) -> Self {
        self.options.day_count = basis;
        self
    }

    pub fn post_delivery_anchor(mut self, anchor: AccrualAnchor) -> Self {
        self.options.post_delivery_anchor = anchor;
        self
    }

    pub fn association(mut self, policy: AssociationPolicy) -> Self {
        self.options.association = policy;
        self
    }

    /// build and validate the terms
    pub fn build(self) -> Result<ContractTerms> {
        let pre_payment_start = match (self.pre_payment_start, self.time_provider) {
            (Some(date), _) => date,
            (None, Some(time)) => time.now().date_naive(),
            (None, None) => return Err(FinancingError::missing("pre_payment_start")),
        };

        let terms = ContractTerms {
            contract_id: self.contract_id.unwrap_or_else(Uuid::new_v4),
            client_name: self.client_name.unwrap_or_default(),
            property_price: self
                .property_price
                .ok_or_else(|| FinancingError::missing("property_price"))?,
            preferred_day: self
                .preferred_day
                .ok_or_else(|| FinancingError::missing("preferred_day"))?,
            pre_delivery_rate: self.pre_delivery_rate.unwrap_or(Rate::ZERO),
            post_delivery_rate: self.post_delivery_rate.unwrap_or(Rate::ZERO),
            pre_payment_start,
            delivery_date: self
                .delivery_date
                .ok_or_else(|| FinancingError::missing("delivery_date"))?,
            pre_delivery_capacity: self
                .pre_delivery_capacity
                .ok_or_else(|| FinancingError::missing("pre_delivery_capacity"))?,
            post_delivery_capacity: self
                .post_delivery_capacity
                .ok_or_else(|| FinancingError::missing("post_delivery_capacity"))?,
            bank_installment: self.bank_installment,
            fgts_abatement: self.fgts_abatement,
            bank_financing: self.bank_financing,
            extra_fees: self.extra_fees,
            delivery_fees: self.delivery_fees,
            index_rates: self.index_rates,
            one_off_payments: self.one_off_payments,
            semi_annual_series: self.semi_annual_series,
            annual_series: self.annual_series,
            options: self.options,
        };

        terms.validate()?;
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_builder() -> ContractTermsBuilder<'static> {
        ContractTerms::builder()
            .client_name("Maria")
            .property_price(Money::from_major(300_000))
            .preferred_day(10)
            .pre_delivery_rate(Rate::from_percentage(1))
            .post_delivery_rate(Rate::from_percentage(1))
            .pre_payment_start(date(2025, 1, 1))
            .delivery_date(date(2026, 1, 1))
            .pre_delivery_capacity(Money::from_major(2_000))
            .post_delivery_capacity(Money::from_major(3_000))
    }

    #[test]
    fn test_builder_defaults() {
        let terms = base_builder().build().unwrap();

        assert_eq!(terms.delivery_fees, DeliveryFees::default());
        assert_eq!(terms.delivery_fees.issuance, Money::from_major(1_500));
        assert_eq!(terms.delivery_fees.lien_registration, Money::from_major(2_000));
        assert_eq!(terms.delivery_fees.insurance_premium.as_decimal(), dec!(0.083));
        assert_eq!(terms.index_rates.construction.as_decimal(), dec!(0.005));
        assert_eq!(terms.options.day_count, DayCountBasis::Fixed30);
        assert_eq!(terms.options.post_delivery_anchor, AccrualAnchor::DeliveryDate);
        assert_eq!(terms.options.association, AssociationPolicy::Split);
        assert_eq!(terms.post_delivery_installment(), Money::from_major(3_000));
    }

    #[test]
    fn test_builder_missing_field() {
        let err = ContractTerms::builder()
            .property_price(Money::from_major(100_000))
            .preferred_day(5)
            .pre_payment_start(date(2025, 1, 1))
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            FinancingError::MissingConfiguration { ref field } if field == "delivery_date"
        ));
    }

    #[test]
    fn test_builder_uses_time_provider_for_start() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap(),
        ));

        let terms = ContractTerms::builder()
            .property_price(Money::from_major(100_000))
            .preferred_day(5)
            .delivery_date(date(2026, 1, 1))
            .pre_delivery_capacity(Money::from_major(1_000))
            .post_delivery_capacity(Money::from_major(1_000))
            .set_time(&time)
            .build()
            .unwrap();

        assert_eq!(terms.pre_payment_start, date(2025, 3, 15));
    }

    #[test]
    fn test_validation_rejects_bad_terms() {
        assert!(base_builder().preferred_day(0).build().is_err());
        assert!(base_builder().preferred_day(32).build().is_err());
        assert!(base_builder().delivery_date(date(2024, 12, 1)).build().is_err());
        assert!(base_builder().fgts_abatement(Money::from_major(-1)).build().is_err());
        assert!(base_builder().delivery_date(date(2076, 1, 1)).build().is_err());

        let mut too_many = base_builder();
        for _ in 0..=MAX_EXTRA_FEES {
            too_many = too_many.extra_fee(Rate::from_bps(10), FeePhase::Both);
        }
        assert!(matches!(
            too_many.build(),
            Err(FinancingError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_bank_installment_reduces_post_capacity() {
        let terms = base_builder().bank_installment(Money::from_major(1_200)).build().unwrap();
        assert_eq!(terms.post_delivery_installment(), Money::from_major(1_800));
    }

    #[test]
    fn test_json_roundtrip_and_defaults() {
        let json = r#"{
            "client_name": "João",
            "property_price": "450000",
            "preferred_day": 31,
            "pre_delivery_rate": "0.008",
            "post_delivery_rate": "0.01",
            "pre_payment_start": "2025-02-01",
            "delivery_date": "2027-06-30",
            "pre_delivery_capacity": "2500",
            "post_delivery_capacity": "4000",
            "fgts_abatement": "30000",
            "extra_fees": [{ "percentage": "0.001", "phase": "ambos" }],
            "one_off_payments": [
                { "date": "2025-12-20", "amount": "10000", "label": "Bonus", "associated": false }
            ],
            "semi_annual_series": [
                { "start_date": "2025-06-10", "amount": "5000", "associated": true }
            ],
            "options": { "day_count": "actual_prior_month" }
        }"#;

        let terms = ContractTerms::from_json(json).unwrap();
        assert_eq!(terms.client_name, "João");
        assert_eq!(terms.preferred_day, 31);
        assert_eq!(terms.extra_fees[0].phase, FeePhase::Both);
        assert_eq!(terms.delivery_fees, DeliveryFees::default());
        assert_eq!(terms.bank_financing, Money::ZERO);
        assert_eq!(terms.options.day_count, DayCountBasis::ActualPriorMonth);
        assert_eq!(terms.options.association, AssociationPolicy::Split);
        assert!(terms.semi_annual_series[0].associated);

        let reparsed = ContractTerms::from_json(&terms.to_json_pretty().unwrap()).unwrap();
        assert_eq!(reparsed, terms);
    }

    #[test]
    fn test_json_rejects_invalid_day() {
        let json = r#"{
            "client_name": "X",
            "property_price": "1000",
            "preferred_day": 40,
            "pre_delivery_rate": "0",
            "post_delivery_rate": "0",
            "pre_payment_start": "2025-01-01",
            "delivery_date": "2025-06-01",
            "pre_delivery_capacity": "100",
            "post_delivery_capacity": "100"
        }"#;

        assert!(matches!(
            ContractTerms::from_json(json),
            Err(FinancingError::InvalidConfiguration { .. })
        ));
    }
}
