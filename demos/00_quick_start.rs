/// quick start - compute a schedule and print its summary
use chrono::NaiveDate;
use construction_financing_rs::{generate_schedule, ContractTerms, Money, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // R$ 300,000 unit, delivered mid-2026
    let terms = ContractTerms::builder()
        .client_name("Ana Lima")
        .property_price(Money::from_major(300_000))
        .preferred_day(10)
        .pre_delivery_rate(Rate::from_percentage(1))
        .post_delivery_rate(Rate::from_percentage(1))
        .pre_payment_start(NaiveDate::from_ymd_opt(2025, 1, 1).ok_or("bad date")?)
        .delivery_date(NaiveDate::from_ymd_opt(2026, 6, 1).ok_or("bad date")?)
        .pre_delivery_capacity(Money::from_major(6_000))
        .post_delivery_capacity(Money::from_major(8_000))
        .fgts_abatement(Money::from_major(40_000))
        .bank_financing(Money::from_major(150_000))
        .build()?;

    let schedule = generate_schedule(&terms)?;

    println!("rows:          {}", schedule.rows.len());
    println!("pre-delivery:  {} installments", schedule.pre_delivery_installments);
    println!("post-delivery: {} installments", schedule.post_delivery_installments);
    println!("final balance: {}", schedule.final_balance.round_cents());
    println!("feasible:      {}", schedule.is_feasible());

    Ok(())
}
