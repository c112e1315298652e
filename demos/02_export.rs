/// export - write the same schedule as xlsx and csv
use construction_financing_rs::export::{write_csv, write_xlsx, ScheduleTable};
use construction_financing_rs::{generate_schedule, ContractTerms};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let terms = ContractTerms::from_json_file("demos/contract.json")?;
    let schedule = generate_schedule(&terms)?;
    let table = ScheduleTable::from_schedule(&schedule);

    let dir = std::env::temp_dir();
    let xlsx = dir.join("financing-schedule.xlsx");
    write_xlsx(&table, &xlsx)?;
    println!("wrote {} ({} lines)", xlsx.display(), table.line_count());

    // csv straight to stdout
    write_csv(&table, std::io::stdout().lock())?;

    Ok(())
}
