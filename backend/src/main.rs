//! cwrgen CLI - CWR registrations, acknowledgments and royalty distribution
//!
//! # Commands
//!
//! ```bash
//! cwrgen generate catalog.json --recipient ASC   # Write a CWR transmission
//! cwrgen validate CW240315NFMASC.V21             # Structural check
//! cwrgen ack ASC_ACK.txt --catalog catalog.json  # Decode a society acknowledgment
//! cwrgen statement catalog.json q1.csv --gross "Amount" --csv-output q1-payout.csv
//! cwrgen statuses                                # Acknowledgment status codes
//! cwrgen serve                                   # Start HTTP server (port 3000)
//! ```
//!
//! Defaults come from the environment (see `cwrgen::config`); flags win.

use clap::{Parser, Subcommand};
use cwrgen::{
    acknowledge, check_transmission, distribute_statement, generate_transmission, import_statement,
    load_catalog_file, read_text_file, render_distribution_csv, status_descriptions, AppConfig, ColumnMapping,
    CwrVersion, GenerationOptions, PipelineError, StatementInfo, TransactionType,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cwrgen")]
#[command(about = "Generate CWR registrations, read acknowledgments and distribute royalties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a catalog's works as a CWR transmission
    Generate {
        /// Catalog JSON document
        catalog: PathBuf,

        /// CWR version: 2.1, 2.2, 3.0 or 3.1
        #[arg(long)]
        version: Option<String>,

        /// Transaction type: NWR or REV
        #[arg(long = "type", default_value = "NWR")]
        transaction_type: String,

        /// Receiving society code
        #[arg(short, long)]
        recipient: Option<String>,

        /// Submitter code (default: the catalog's delivery code)
        #[arg(short, long)]
        submitter: Option<String>,

        /// Only encode these catalog work ids (repeatable)
        #[arg(short, long = "work")]
        works: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Write into this directory under the standard transmission filename
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Fail on writer/publisher ids missing from the catalog
        #[arg(long)]
        strict: bool,
    },

    /// Check the record structure of a CWR file
    Validate {
        /// CWR file
        input: PathBuf,
    },

    /// Parse a society acknowledgment file
    Ack {
        /// Acknowledgment file (any common encoding)
        input: PathBuf,

        /// Catalog whose works, in order, were the submitted transmission
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Output file for the JSON result (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a royalty statement CSV and distribute it to writers
    Statement {
        /// Catalog JSON document
        catalog: PathBuf,

        /// Statement CSV export
        input: PathBuf,

        /// Gross amount column
        #[arg(long)]
        gross: String,

        /// Work title column
        #[arg(long, default_value = "Title")]
        title: String,

        /// ISWC column
        #[arg(long, default_value = "ISWC")]
        iswc: String,

        /// Right type column (PR/MR/SR)
        #[arg(long, default_value = "Right Type")]
        right_type: String,

        #[arg(long, default_value = "Territory")]
        territory: String,

        #[arg(long, default_value = "Usage Type")]
        usage_type: String,

        #[arg(long, default_value = "Units")]
        units: String,

        #[arg(long, default_value = "Net Amount")]
        net: String,

        /// Default admin fee percent for writers without an agreement fee
        #[arg(long)]
        fee: Option<f64>,

        /// Statement source (society or DSP name)
        #[arg(long, default_value = "")]
        source: String,

        /// Statement period, e.g. 2024-Q1
        #[arg(long, default_value = "")]
        period: String,

        #[arg(long, default_value = "USD")]
        currency: String,

        /// Output file for the JSON report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the report as CSV
        #[arg(long)]
        csv_output: Option<PathBuf>,
    },

    /// List acknowledgment transaction status codes
    Statuses,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: CWRGEN_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            catalog,
            version,
            transaction_type,
            recipient,
            submitter,
            works,
            output,
            out_dir,
            strict,
        } => {
            generate_options(&config, version, &transaction_type, recipient, submitter, works).and_then(|options| {
                cmd_generate(&catalog, &options, strict, output.as_deref(), out_dir.as_deref())
            })
        }

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Ack { input, catalog, output } => cmd_ack(&input, catalog.as_deref(), output.as_deref()),

        Commands::Statement {
            catalog,
            input,
            gross,
            title,
            iswc,
            right_type,
            territory,
            usage_type,
            units,
            net,
            fee,
            source,
            period,
            currency,
            output,
            csv_output,
        } => {
            let mapping = ColumnMapping {
                work_title: Some(title),
                iswc: Some(iswc),
                territory: Some(territory),
                right_type: Some(right_type),
                usage_type: Some(usage_type),
                units: Some(units),
                gross_amount: gross,
                net_amount: Some(net),
            };
            let info = StatementInfo {
                source,
                period,
                currency,
            };
            cmd_statement(
                &catalog,
                &input,
                &mapping,
                info,
                fee,
                config.default_fee,
                output.as_deref(),
                csv_output.as_deref(),
            )
        }

        Commands::Statuses => cmd_statuses(),

        Commands::Serve { port } => {
            let config = AppConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Flags first, then configuration.
fn generate_options(
    config: &AppConfig,
    version: Option<String>,
    transaction_type: &str,
    recipient: Option<String>,
    submitter: Option<String>,
    works: Vec<String>,
) -> Result<GenerationOptions, Box<dyn std::error::Error>> {
    let version = match version {
        Some(v) => v.parse::<CwrVersion>().map_err(PipelineError::UnsupportedVersion)?,
        None => config.default_version,
    };
    let transaction_type = transaction_type
        .parse::<TransactionType>()
        .map_err(|t| format!("Unknown transaction type: {} (expected NWR or REV)", t))?;

    Ok(GenerationOptions {
        version,
        transaction_type,
        recipient_society: recipient.unwrap_or_else(|| config.recipient_society.clone()),
        submitter_code: submitter.unwrap_or_default(),
        work_ids: works,
    })
}

fn cmd_generate(
    catalog_path: &Path,
    options: &GenerationOptions,
    strict: bool,
    output: Option<&Path>,
    out_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Catalog: {}", catalog_path.display());

    let catalog = load_catalog_file(catalog_path, strict)?;
    eprintln!(
        "   {} work(s), {} writer(s), {} publisher(s)",
        catalog.works.len(),
        catalog.writers.len(),
        catalog.publishers.len()
    );

    let generated = generate_transmission(&catalog, options)?;
    let transmission = &generated.transmission;

    if !generated.validation.valid {
        return Err(format!(
            "generated transmission failed validation: {}",
            generated.validation.errors.join("; ")
        )
        .into());
    }

    match out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(&transmission.filename);
            fs::write(&path, &transmission.content)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => {
            if output.is_none() {
                eprintln!("   Filename: {}", transmission.filename);
            }
            write_output(&transmission.content, output)?;
        }
    }

    eprintln!("✅ {} work(s) registered", transmission.transaction_count);
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let decoded = read_text_file(input)?;
    let report = check_transmission(&decoded.content);

    eprintln!(
        "\n📊 Results: {} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    );

    if !report.valid {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_ack(input: &Path, catalog_path: Option<&Path>, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Acknowledgment: {}", input.display());

    let catalog = catalog_path.map(|p| load_catalog_file(p, false)).transpose()?;
    let bytes = fs::read(input)?;
    let outcome = acknowledge(&bytes, catalog.as_ref().map(|c| c.works.as_slice()));

    if let Some(report) = &outcome.outcomes {
        for work in &report.outcomes {
            eprintln!(
                "   {} {} - {}",
                work.status,
                work.title,
                work.status_label.as_deref().unwrap_or("Unknown status")
            );
        }
    }

    let json = serde_json::to_string_pretty(&outcome)?;
    write_output(&json, output)?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_statement(
    catalog_path: &Path,
    input: &Path,
    mapping: &ColumnMapping,
    info: StatementInfo,
    fee: Option<f64>,
    fallback_fee: f64,
    output: Option<&Path>,
    csv_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(fee) = fee {
        if !(0.0..=100.0).contains(&fee) {
            return Err(format!("--fee must be between 0 and 100, got {}", fee).into());
        }
    }

    eprintln!("📄 Statement: {}", input.display());

    let catalog = load_catalog_file(catalog_path, false)?;
    let bytes = fs::read(input)?;
    let imported = import_statement(&bytes, mapping, info, &catalog)?;
    let report = distribute_statement(&catalog, imported.statement, fee, fallback_fee, false);

    eprintln!("\n📊 Distribution ({})", report.currency);
    eprintln!("   Gross:     {:.2}", report.total_gross);
    eprintln!("   Fees:      {:.2}", report.total_fees);
    eprintln!("   Net:       {:.2}", report.total_net);
    eprintln!("   Publisher: {:.2}", report.publisher.total_income);

    if let Some(path) = csv_output {
        fs::write(path, render_distribution_csv(&report)?)?;
        eprintln!("💾 CSV written to: {}", path.display());
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_statuses() -> Result<(), Box<dyn std::error::Error>> {
    for status in status_descriptions() {
        println!("{}  {:<24} {}", status.code, status.label, status.description);
    }
    Ok(())
}

async fn cmd_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    cwrgen::server::start_server(config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
