use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use construction_financing_rs::{
    generate_schedule, write_schedule, ContractTerms, ExportFormat, Verdict,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Fmt {
    Xlsx,
    Csv,
    Json,
}

impl From<Fmt> for ExportFormat {
    fn from(fmt: Fmt) -> Self {
        match fmt {
            Fmt::Xlsx => ExportFormat::Xlsx,
            Fmt::Csv => ExportFormat::Csv,
            Fmt::Json => ExportFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "financing-schedule",
    version,
    about = "Amortization schedule for a construction-phase real-estate financing"
)]
struct Cli {
    /// contract terms as JSON
    contract: PathBuf,

    /// output file (defaults to `<contract>-schedule.<ext>` next to the contract)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// output format (inferred from --output, xlsx otherwise)
    #[arg(short = 'f', long = "format", value_enum)]
    format: Option<Fmt>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let terms = ContractTerms::from_json_file(&cli.contract)
        .with_context(|| format!("failed to load contract {}", cli.contract.display()))?;
    info!(
        contract_id = %terms.contract_id,
        client = %terms.client_name,
        "contract loaded"
    );

    let schedule = generate_schedule(&terms).context("failed to compute schedule")?;

    let format = cli
        .format
        .map(ExportFormat::from)
        .or_else(|| cli.output.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or_default();
    let output = cli
        .output
        .unwrap_or_else(|| default_output(&cli.contract, format));

    write_schedule(&schedule, format, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if let Verdict::Infeasible(reason) = &schedule.verdict {
        warn!(client = %schedule.client_name, %reason, "schedule written for an infeasible financing");
        eprintln!(
            "warning: financing for {} is not feasible: {}",
            schedule.client_name, reason
        );
    }

    println!("{}", output.display());
    Ok(())
}

fn default_output(contract: &Path, format: ExportFormat) -> PathBuf {
    let stem = contract
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("contract");
    contract.with_file_name(format!("{}-schedule.{}", stem, format.extension()))
}
