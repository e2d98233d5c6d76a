use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use fob_ledger::pipeline;
use fob_ledger::pipeline::Config;
use fob_ledger::reconcile::ColumnPolicy;
use fob_ledger::segment::SegmentOptions;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Turns daily FOB comparative reports into per-product history tables.
#[derive(Parser)]
#[command(name = "fob-ledger", version, about)]
struct Cli {
    /// Directory holding the daily reports
    #[arg(long, env = "FOB_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Directory holding the daily batch workbooks (FOB_YYYYMMDD.xlsx)
    #[arg(long, env = "FOB_BATCH_DIR", default_value = "csv", global = true)]
    batch_dir: PathBuf,

    /// Summary workbook with one table per product
    #[arg(long, env = "FOB_SUMMARY", default_value = "summary.xlsx", global = true)]
    summary: PathBuf,

    /// File name pattern selecting reports in the data directory
    #[arg(long, env = "FOB_DOCUMENT_GLOB", default_value = "RJODailyFOBComparative*.xlsx", global = true)]
    document_glob: String,

    /// Sections expected per report; other counts are logged
    #[arg(long, env = "FOB_EXPECTED_SECTIONS", default_value_t = 7, global = true)]
    expected_sections: usize,

    /// Longest label accepted as a contract month
    #[arg(long, env = "FOB_MAX_MONTH_LEN", default_value_t = 15, global = true)]
    max_month_len: usize,

    /// How batch columns are matched to table columns: positional or named
    #[arg(long, env = "FOB_COLUMN_POLICY", default_value = "positional", value_parser = ColumnPolicy::parse, global = true)]
    column_policy: ColumnPolicy,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Process new reports, then update the summary workbook (default)
    Run,
    /// Only turn new reports into batch workbooks
    Documents,
    /// Only merge batch workbooks into the summary workbook
    Summary,
    /// Create an empty summary workbook with one table per product
    Init {
        /// Replace an existing summary workbook
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            data_dir: self.data_dir.to_owned(),
            batch_dir: self.batch_dir.to_owned(),
            summary_path: self.summary.to_owned(),
            document_glob: self.document_glob.to_owned(),
            segment: SegmentOptions {
                expected_sections: self.expected_sections,
                max_month_len: self.max_month_len,
            },
            column_policy: self.column_policy,
        }
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    let config = cli.config();
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => pipeline::run(&config)?,
        Command::Documents => {
            pipeline::ensure_directories(&config)?;
            pipeline::process_daily_documents(&config)?;
        }
        Command::Summary => {
            pipeline::update_summary_workbook(&config)?;
        }
        Command::Init { force } => pipeline::init_summary(&config.summary_path, force)?,
    }
    info!("done");
    Ok(())
}
