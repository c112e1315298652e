use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::amortization::ledger::{Ledger, LedgerRow, RowKind};
use crate::amortization::Schedule;
use crate::calendar::billing_date;
use crate::config::ContractTerms;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{build_events, EventCursor, EventStream, PaymentEvent};
use crate::interest::{AccrualTracker, Charges};
use crate::types::{
    AccrualAnchor, AssociationPolicy, DeliveryCredit, DeliveryFeeKind, Infeasibility, Phase,
    Verdict,
};

/// upper bound on pre-delivery billing months
pub const MAX_PRE_DELIVERY_MONTHS: u32 = 600;

/// post-delivery installments allowed before the financing is declared infeasible
pub const MAX_POST_DELIVERY_INSTALLMENTS: u32 = 420;

/// engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    PreDelivery,
    Delivery,
    PostDelivery,
    Done,
}

/// walks a contract's event stream and builds its ledger
///
/// One engine computes one schedule: it owns the running balance, both
/// accrual trackers and the row list, and is consumed by [`LedgerEngine::run`].
pub struct LedgerEngine<'a> {
    terms: &'a ContractTerms,
    state: EngineState,
    balance: Money,
    pre_tracker: AccrualTracker,
    post_tracker: AccrualTracker,
    ledger: Ledger,
    verdict: Verdict,
    pre_installments: u32,
    post_installments: u32,
}

impl<'a> LedgerEngine<'a> {
    pub fn new(terms: &'a ContractTerms) -> Self {
        let basis = terms.options.day_count;
        Self {
            terms,
            state: EngineState::PreDelivery,
            balance: terms.property_price,
            pre_tracker: AccrualTracker::new(terms.pre_delivery_rate, terms.preferred_day, basis),
            post_tracker: AccrualTracker::new(terms.post_delivery_rate, terms.preferred_day, basis),
            ledger: Ledger::new(),
            verdict: Verdict::FullyAmortized,
            pre_installments: 0,
            post_installments: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// compute the full schedule
    pub fn run(mut self, time_provider: &SafeTimeProvider) -> Result<Schedule> {
        self.terms.validate()?;

        let terms = self.terms;
        let events = build_events(
            &terms.one_off_payments,
            &terms.semi_annual_series,
            &terms.annual_series,
            terms.preferred_day,
        );
        let stream = EventStream::partition(events, terms.delivery_date);
        debug!(
            contract_id = %terms.contract_id,
            pre_delivery_events = stream.pre_delivery().len(),
            post_delivery_events = stream.post_delivery().len(),
            "event stream built"
        );

        loop {
            match self.state {
                EngineState::PreDelivery => self.run_pre_delivery(stream.pre_delivery()),
                EngineState::Delivery => self.run_delivery(),
                EngineState::PostDelivery => self.run_post_delivery(stream.post_delivery()),
                EngineState::Done => break,
            }
        }

        Ok(self.finish(time_provider))
    }

    fn transition(&mut self, next: EngineState) {
        debug!(from = ?self.state, to = ?next, balance = %self.balance, "engine transition");
        self.state = next;
    }

    fn run_pre_delivery(&mut self, events: &[PaymentEvent]) {
        let terms = self.terms;
        let mut cursor = EventCursor::new(events);
        let mut halted = false;
        let mut overflowed = false;

        for month in 0..MAX_PRE_DELIVERY_MONTHS {
            let due = billing_date(terms.pre_payment_start, month, terms.preferred_day);
            if due >= terms.delivery_date {
                break;
            }

            let abatement = self
                .apply_events_until(Phase::PreDelivery, &mut cursor, due)
                .and_then(|associated| {
                    self.apply_installment(
                        Phase::PreDelivery,
                        due,
                        terms.pre_delivery_capacity,
                        &associated,
                    )
                });
            let Some(abatement) = abatement else {
                self.mark_infeasible(Infeasibility::BalanceOverflow { date: due });
                halted = true;
                overflowed = true;
                break;
            };

            if !abatement.is_positive() {
                self.mark_infeasible(Infeasibility::NonPositiveAbatement { date: due, abatement });
                halted = true;
                break;
            }
        }

        if !halted {
            for event in cursor.drain() {
                if self.apply_event(Phase::PreDelivery, event).is_none() {
                    self.mark_infeasible(Infeasibility::BalanceOverflow { date: event.date });
                    overflowed = true;
                    break;
                }
            }
        }

        if overflowed {
            self.transition(EngineState::Done);
        } else {
            self.transition(EngineState::Delivery);
        }
    }

    fn run_delivery(&mut self) {
        let terms = self.terms;
        let date = terms.delivery_date;
        let fees = terms.delivery_fees;

        let applied = self.apply_adjustment(
            date,
            RowKind::DeliveryCredit(DeliveryCredit::Fgts),
            terms.fgts_abatement,
        ) && self.apply_adjustment(
            date,
            RowKind::DeliveryCredit(DeliveryCredit::BankFinancing),
            terms.bank_financing,
        ) && self.apply_adjustment(date, RowKind::DeliveryFee(DeliveryFeeKind::Issuance), -fees.issuance)
            && self.apply_adjustment(
                date,
                RowKind::DeliveryFee(DeliveryFeeKind::LienRegistration),
                -fees.lien_registration,
            )
            && self.apply_adjustment(
                date,
                RowKind::DeliveryFee(DeliveryFeeKind::DeedRegistration),
                -fees.deed_registration,
            )
            && match self.balance.checked_apply(fees.insurance_premium) {
                Some(premium) => self.apply_adjustment(
                    date,
                    RowKind::DeliveryFee(DeliveryFeeKind::InsurancePremium),
                    -premium,
                ),
                None => false,
            };

        if !applied {
            self.mark_infeasible(Infeasibility::BalanceOverflow { date });
            self.transition(EngineState::Done);
            return;
        }

        let anchor = match terms.options.post_delivery_anchor {
            AccrualAnchor::DeliveryDate => date,
            AccrualAnchor::LastPreDeliveryCharge => {
                self.pre_tracker.last_charge_date().unwrap_or(date)
            }
        };
        self.post_tracker = AccrualTracker::anchored(
            terms.post_delivery_rate,
            terms.preferred_day,
            terms.options.day_count,
            anchor,
        );
        debug!(%anchor, "post-delivery accrual anchored");

        self.transition(EngineState::PostDelivery);
    }

    fn run_post_delivery(&mut self, events: &[PaymentEvent]) {
        let terms = self.terms;
        let installment = terms.post_delivery_installment();
        let mut cursor = EventCursor::new(events);
        let mut overflow = None;

        // first billing date strictly after delivery: a delivery on the billing
        // day itself is settled by the delivery rows, so billing starts next month
        let first_month = u32::from(
            billing_date(terms.delivery_date, 0, terms.preferred_day) <= terms.delivery_date,
        );

        'installments: while self.balance.is_positive()
            && self.post_installments < MAX_POST_DELIVERY_INSTALLMENTS
        {
            let due = billing_date(
                terms.delivery_date,
                first_month + self.post_installments,
                terms.preferred_day,
            );

            let mut associated = Vec::new();
            while let Some(event) = cursor.next_until(due) {
                if event.associated && event.date == due {
                    associated.push(event);
                    continue;
                }
                if self.apply_event(Phase::PostDelivery, event).is_none() {
                    overflow = Some(event.date);
                    break 'installments;
                }
                if !self.balance.is_positive() {
                    break 'installments;
                }
            }

            if self
                .apply_installment(Phase::PostDelivery, due, installment, &associated)
                .is_none()
            {
                overflow = Some(due);
                break;
            }
        }

        if let Some(date) = overflow {
            self.mark_infeasible(Infeasibility::BalanceOverflow { date });
        } else if self.balance.is_positive() {
            self.mark_infeasible(Infeasibility::InstallmentCapReached {
                cap: MAX_POST_DELIVERY_INSTALLMENTS,
                balance: self.balance,
            });
        }

        self.transition(EngineState::Done);
    }

    /// apply standalone events due on or before `due`, returning the ones
    /// associated with the installment on `due`; `None` on overflow
    fn apply_events_until<'e>(
        &mut self,
        phase: Phase,
        cursor: &mut EventCursor<'e>,
        due: NaiveDate,
    ) -> Option<Vec<&'e PaymentEvent>> {
        let mut associated = Vec::new();
        while let Some(event) = cursor.next_until(due) {
            if event.associated && event.date == due {
                associated.push(event);
            } else {
                self.apply_event(phase, event)?;
            }
        }
        Some(associated)
    }

    /// regular installment plus its associated payments; returns the
    /// installment row's abatement, `None` on overflow
    fn apply_installment(
        &mut self,
        phase: Phase,
        due: NaiveDate,
        base_amount: Money,
        associated: &[&PaymentEvent],
    ) -> Option<Money> {
        let number = match phase {
            Phase::PreDelivery => self.pre_installments,
            Phase::PostDelivery => self.post_installments,
        } + 1;
        let kind = RowKind::RegularInstallment { phase };

        let amount = match self.terms.options.association {
            AssociationPolicy::Merge => associated
                .iter()
                .try_fold(base_amount, |total, event| total.checked_add(event.amount))?,
            AssociationPolicy::Split => base_amount,
        };
        let abatement = self.apply_payment(phase, due, kind, amount, Some(number))?;
        match phase {
            Phase::PreDelivery => self.pre_installments = number,
            Phase::PostDelivery => self.post_installments = number,
        }

        if self.terms.options.association == AssociationPolicy::Split {
            for event in associated {
                self.apply_event(phase, event)?;
            }
        }
        Some(abatement)
    }

    fn apply_event(&mut self, phase: Phase, event: &PaymentEvent) -> Option<Money> {
        debug!(date = %event.date, label = event.label(), amount = %event.amount, ?phase, "payment event");
        let kind = RowKind::OneOffCharge {
            phase,
            category: event.category.clone(),
        };
        self.apply_payment(phase, event.date, kind, event.amount, None)
    }

    /// accrue, charge index and extra fees against the current balance, then
    /// apply `amount`; returns the abatement, or `None` without touching the
    /// ledger when any figure overflows
    fn apply_payment(
        &mut self,
        phase: Phase,
        date: NaiveDate,
        kind: RowKind,
        amount: Money,
        installment: Option<u32>,
    ) -> Option<Money> {
        let terms = self.terms;
        let balance = self.balance;

        let accrual = match phase {
            Phase::PreDelivery => self.pre_tracker.accrue(date, balance),
            Phase::PostDelivery => self.post_tracker.accrue(date, balance),
        }?;
        let (construction_index, price_index) = match phase {
            Phase::PreDelivery => (balance.checked_apply(terms.index_rates.construction)?, Money::ZERO),
            Phase::PostDelivery => (Money::ZERO, balance.checked_apply(terms.index_rates.price)?),
        };
        let extra_fees = terms
            .extra_fees
            .iter()
            .map(|fee| {
                if fee.phase.applies_to(phase) {
                    balance.checked_apply(fee.percentage)
                } else {
                    Some(Money::ZERO)
                }
            })
            .collect::<Option<Vec<Money>>>()?;

        let charges = Charges {
            interest: accrual.interest,
            construction_index,
            price_index,
            extra_fees,
        };

        let mut row = LedgerRow::payment(date, kind, amount, accrual, charges, balance)?;
        if let Some(number) = installment {
            row = row.with_installment(number);
        }

        let abatement = row.abatement;
        self.balance = row.balance;
        self.ledger.push(row);
        Some(abatement)
    }

    /// book a delivery row; `false` when the balance overflows
    fn apply_adjustment(&mut self, date: NaiveDate, kind: RowKind, amount: Money) -> bool {
        let Some(row) =
            LedgerRow::adjustment(date, kind, amount, self.terms.extra_fees.len(), self.balance)
        else {
            return false;
        };
        self.balance = row.balance;
        self.ledger.push(row);
        true
    }

    fn mark_infeasible(&mut self, reason: Infeasibility) {
        warn!(
            client = %self.terms.client_name,
            %reason,
            "financing is not feasible"
        );
        // the first detected cause is the one reported
        if self.verdict.is_feasible() {
            self.verdict = Verdict::Infeasible(reason);
        }
    }

    fn finish(self, time_provider: &SafeTimeProvider) -> Schedule {
        let terms = self.terms;
        info!(
            contract_id = %terms.contract_id,
            rows = self.ledger.len(),
            pre_installments = self.pre_installments,
            post_installments = self.post_installments,
            final_balance = %self.balance,
            feasible = self.verdict.is_feasible(),
            "schedule computed"
        );

        Schedule {
            contract_id: terms.contract_id,
            client_name: terms.client_name.clone(),
            opening_balance: terms.property_price,
            delivery_date: terms.delivery_date,
            extra_fee_count: terms.extra_fees.len(),
            rows: self.ledger.into_rows(),
            final_balance: self.balance,
            verdict: self.verdict,
            pre_delivery_installments: self.pre_installments,
            post_delivery_installments: self.post_installments,
            generated_at: time_provider.now(),
        }
    }
}
