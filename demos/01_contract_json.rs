/// contract json - load terms from a file and compute under a fixed clock
use chrono::{TimeZone, Utc};
use construction_financing_rs::{
    ContractTerms, LedgerEngine, SafeTimeProvider, ScheduleView, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/contract.json".to_string());
    let terms = ContractTerms::from_json_file(&path)?;

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    ));
    let schedule = LedgerEngine::new(&terms).run(&time)?;

    println!("{}", ScheduleView::from_schedule(&schedule).to_json_pretty()?);

    if let Err(err) = schedule.ensure_feasible() {
        eprintln!("{}", err);
    }

    Ok(())
}
