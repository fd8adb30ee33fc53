mod commands;
mod output;

use clap::{Parser, Subcommand};
use qcmr_core::config::AssemblerConfig;
use qcmr_core::error::QcmrError;
use qcmr_core::parsing::categories::UnmappedPolicy;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "qcmr",
    version,
    about = "Extract and compare tables from Quarterly City Manager's Reports"
)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root holding raw/ PDFs and processed/ bundles
    #[arg(long, global = true, env = "QCMR_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Fail on row labels missing from the vocabulary instead of dropping them
    #[arg(long, global = true)]
    strict_categories: bool,

    /// Replace a section's vocabulary, e.g. gf_spending=spending.json
    #[arg(long = "vocab", global = true, value_name = "SECTION=FILE")]
    vocab: Vec<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, normalize and save the tables of one quarterly report
    Process {
        /// Fiscal year, e.g. 2019
        year: u32,
        /// Quarter, 1-4
        quarter: u32,

        /// Report(s) to process: cash-forecast, leave-usage, general-fund-obligations
        /// (default: all)
        #[arg(short, long = "report", value_name = "KIND")]
        reports: Vec<String>,

        /// Re-extract even if the output already exists
        #[arg(long)]
        fresh: bool,

        /// Fail on missing values instead of prompting for them
        #[arg(long)]
        non_interactive: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Show the pages each report was located on
    Pages {
        year: u32,
        quarter: u32,
    },
    /// Print a saved report bundle
    Show {
        /// Directory holding the bundle's tables
        bundle_dir: PathBuf,

        /// Only this section
        #[arg(short, long)]
        section: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Compare a report's cash projections month by month
    Compare {
        /// last-quarter, first-quarter or last-year
        kind: String,
        year: u32,
        quarter: u32,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Historical accuracy of annual projections made in a quarter
    Accuracy {
        /// fund-balance, revenue or spending
        kind: String,
        quarter: u32,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Projected annual changes from one quarter's reports against actual changes
    Changes {
        quarter: u32,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Fit Q1 audited fund balances against Q4 cash balances
    Revisions {
        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate category vocabularies
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },
}

#[derive(Subcommand)]
enum VocabAction {
    /// List the sections with a vocabulary in effect
    List,
    /// Print a section's label mappings
    Show {
        /// Section name (e.g., "gf_revenue")
        section: String,
    },
    /// Validate a custom vocabulary file
    Validate {
        /// Path to JSON vocabulary file
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,qcmr_core=info",
        1 => "info,qcmr_core=debug",
        _ => "debug,qcmr_core=trace",
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file, then environment and flags on top.
fn load_config(cli: &Cli) -> Result<AssemblerConfig, QcmrError> {
    let mut config = match &cli.config {
        Some(path) => AssemblerConfig::load(path)?,
        None => AssemblerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.strict_categories {
        config.unmapped = UnmappedPolicy::Fail;
    }
    for entry in &cli.vocab {
        let (section, file) = entry.split_once('=').ok_or_else(|| {
            QcmrError::VocabularyInvalid(format!("expected SECTION=FILE, got '{entry}'"))
        })?;
        config
            .vocabularies
            .insert(section.trim().to_string(), PathBuf::from(file.trim()));
    }
    debug!(
        data_dir = %config.data_dir.display(),
        unmapped = ?config.unmapped,
        overrides = config.vocabularies.len(),
        "configuration"
    );
    Ok(config)
}

fn run(cli: Cli) -> Result<(), QcmrError> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Process {
            year,
            quarter,
            reports,
            fresh,
            non_interactive,
            output,
        } => commands::process::run(&config, year, quarter, &reports, fresh, non_interactive, &output),
        Commands::Pages { year, quarter } => commands::pages::run(&config, year, quarter),
        Commands::Show {
            bundle_dir,
            section,
            output,
        } => commands::show::run(&bundle_dir, section.as_deref(), &output),
        Commands::Compare {
            kind,
            year,
            quarter,
            output,
        } => commands::compare::run(&config, &kind, year, quarter, &output),
        Commands::Accuracy {
            kind,
            quarter,
            output,
        } => commands::compare::accuracy(&config, &kind, quarter, &output),
        Commands::Changes { quarter, output } => {
            commands::compare::changes(&config, quarter, &output)
        }
        Commands::Revisions { output } => commands::compare::revisions(&config, &output),
        Commands::Vocab { action } => match action {
            VocabAction::List => commands::vocab::list(&config),
            VocabAction::Show { section } => commands::vocab::show(&config, &section),
            VocabAction::Validate { file } => commands::vocab::validate(&file),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
