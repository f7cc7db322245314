use std::io::Write;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use constants::{EXIT_FAILURE, LOG_FILTER_ENV};
use report_importer::import::{run_import, run_inspect, ImportArgs, InspectArgs};

#[derive(Debug, Parser)]
#[command(
    version = std::env!("CARGO_PKG_VERSION"),
    name = "report-importer",
    about = "Imports test and static-analysis reports as per-file metrics"
)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate report files and write their metrics as JSON lines
    Import(ImportArgs),
    /// Parse a single report and print what was read from it
    Inspect(InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose.log_level_filter())?;
    match run(cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            log::error!("Error: {:?}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Import(import_args) => {
            print_cli_start_info();
            run_import(import_args)
        }
        Commands::Inspect(inspect_args) => run_inspect(inspect_args),
    }
}

fn setup_logger(level: log::LevelFilter) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);
    if let Ok(log) = std::env::var(LOG_FILTER_ENV) {
        builder.parse_filters(&log);
    }
    builder.try_init()?;
    Ok(())
}

fn print_cli_start_info() {
    log::info!("Starting report-importer {}", env!("CARGO_PKG_VERSION"));
}
