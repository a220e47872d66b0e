use clap::{Parser, Subcommand};
use claims::{build_claim, reconcile, render_x12, render_x12_835, simulate_remittance,
    ClaimContext, RemitOutcome};
use fhir::{project_diagnostic_report, project_observations, project_resources};
use intake_core::{
    export_rejects, parse_rows, process_message, reconcile_batch, InMemoryPatientStore,
    InMemoryTraceStore, TraceStore,
};
use std::fs;
use std::path::PathBuf;

const SAMPLE_ADMISSION: &str = "MSH|^~\\&|SENDING|FACILITY|RECEIVING|FACILITY|202501011230||ADT^A01|MSG00001|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101|M|||123 MAIN ST^^DALLAS^TX^75001\n\
PV1||I|W^389^1||||1234^PROVIDER^TEST|||||||||||||||||||||||||||||||||||||202501011200";

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "HL7 v2 intake, validation, and reconciliation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one HL7 v2 message end to end
    Process {
        /// Path to a file holding one raw message
        file: PathBuf,
        /// Simulate a denied remittance instead of a paid one
        #[arg(long)]
        deny: bool,
    },
    /// Reconcile a CSV patient batch against an empty registry
    Reconcile {
        /// Path to a CSV batch (identifier,family,given,birth_date,sex)
        file: PathBuf,
        /// Write rejected rows as CSV to this path
        #[arg(long)]
        rejects: Option<PathBuf>,
    },
    /// Print a built-in ADT^A01 sample message
    Sample,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Process { file, deny } => run_process(&file, deny),
        Commands::Reconcile { file, rejects } => run_reconcile(&file, rejects.as_deref()),
        Commands::Sample => {
            println!("{SAMPLE_ADMISSION}");
            Ok(())
        }
    }
}

fn run_process(file: &std::path::Path, deny: bool) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(file)?;
    let store = InMemoryTraceStore::new();

    let outcome = process_message(&raw, None, &store)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(record) = &outcome.canonical {
        let (patient, encounter) = project_resources(record);
        println!("{}", patient.to_json()?);
        if let Some(encounter) = encounter {
            println!("{}", encounter.to_json()?);
        }
        if let Some(report) = project_diagnostic_report(record) {
            println!("{}", report.to_json()?);
            for observation in project_observations(record) {
                println!("{}", observation.to_json()?);
            }
        }

        let claim = build_claim(record, &ClaimContext::default());
        println!("{}", render_x12(&claim));

        let remit_outcome = if deny {
            RemitOutcome::Denied
        } else {
            RemitOutcome::Paid
        };
        let remittance = simulate_remittance(&claim, remit_outcome);
        println!("{}", render_x12_835(&remittance));

        let reconciliation = reconcile(&claim, &remittance)?;
        println!("{}", serde_json::to_string_pretty(&reconciliation)?);
    }

    let id = intake_core::CorrelationId::new(outcome.correlation_id.clone());
    if let Some(trace) = store.get(&id)? {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    }
    Ok(())
}

fn run_reconcile(
    file: &std::path::Path,
    rejects: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(file)?;
    let rows = parse_rows(&text)?;
    let registry = InMemoryPatientStore::new();

    let summary = reconcile_batch(&rows, &registry)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = rejects {
        fs::write(path, export_rejects(&summary))?;
        tracing::info!(path = %path.display(), rejected = summary.rejected.len(), "wrote reject export");
    }
    Ok(())
}
