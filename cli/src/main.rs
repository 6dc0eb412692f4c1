//! Courier Billing: CLI
//!
//! Headless front end over the billing engine.
//!
//! ```sh
//! # Validate the configuration
//! courier-billing check
//!
//! # Ingest a rate workbook and print the row report; --upload stores it
//! courier-billing ingest --brackets dhl.xlsx --bracket-sheet Rates \
//!     --zones dhl.xlsx --zone-sheet Zones --rate-type perKg \
//!     --type Express --service DHL --original-name dhl-2024.xlsx --upload
//!
//! # Price a client's shipments from the rate master and bill them
//! courier-billing invoice --party CL001 --from 2024-03-01 --to 2024-03-31 \
//!     --rate-type Express --all --submit
//!
//! # Same, offline, from JSON exports
//! courier-billing invoice --shipments awb.json --parties clients.json --party CL001 --all
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table};
use tracing::{error, info};

use courier_billing::application::ingest::{IngestionReport, RateCardMeta, SheetKind};
use courier_billing::config::{config_path_from_env, init_tracing, AppConfig};
use courier_billing::domain::{
    BackOfficeSource, BillingParty, InvoiceStore, PartyKind, RateCardStore, RateType, Shipment,
};
use courier_billing::infrastructure::{load_json_list, read_sheet};
use courier_billing::{
    AppError, BackOfficeClient, ChargeCalculator, InMemoryStorage, InvoiceService, InvoiceSession, RateCardService,
    RateSource, WorkspaceSnapshot,
};

/// Courier Billing: rate ingestion and invoicing for a courier back office.
#[derive(Parser, Debug)]
#[command(
    name = "courier-billing",
    version,
    about = "Rate ingestion and billing computation for a courier back office",
    long_about = "Courier Billing: ingests rate sheets, prices shipments from their own \
                  rates or the rate master, and raises GST invoices.\n\n\
                  Default config: ~/.config/courier-billing/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "COURIER_BILLING_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the back-office base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file and exit.
    Check,
    /// Read bracket and zone sheets and report accepted/rejected rows.
    Ingest(IngestArgs),
    /// Price shipments for a client or franchise and optionally bill them.
    Invoice(InvoiceArgs),
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Workbook holding the weight-bracket sheet.
    #[arg(long)]
    brackets: PathBuf,
    /// Worksheet name (default: first sheet).
    #[arg(long)]
    bracket_sheet: Option<String>,
    /// Workbook holding the zone sheet.
    #[arg(long)]
    zones: PathBuf,
    #[arg(long)]
    zone_sheet: Option<String>,
    /// How prices are expressed: `base` or `perKg`.
    #[arg(long, default_value = "base")]
    rate_type: RateType,
    /// Rate type name (e.g. Express).
    #[arg(long = "type", default_value = "")]
    card_type: String,
    #[arg(long, default_value = "")]
    service: String,
    /// Name the card is stored under (defaults to the bracket file name).
    #[arg(long)]
    original_name: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    covid: f64,
    /// Fuel surcharge in percent.
    #[arg(long, default_value_t = 0.0)]
    fuel: f64,
    /// Store the card in the back office.
    #[arg(long)]
    upload: bool,
}

#[derive(Args, Debug)]
struct InvoiceArgs {
    /// Shipments JSON export; when set, works offline from files.
    #[arg(long)]
    shipments: Option<PathBuf>,
    /// Clients/franchises JSON export (offline mode).
    #[arg(long)]
    parties: Option<PathBuf>,
    /// Client or franchise reference code.
    #[arg(long)]
    party: Option<String>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Tracking number substring.
    #[arg(long)]
    tracking: Option<String>,
    /// Destination country substring.
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    hide_billed: bool,
    /// Price from the rate master using this rate type instead of each AWB's own rate.
    #[arg(long)]
    rate_type: Option<String>,
    #[arg(long)]
    cgst: Option<f64>,
    #[arg(long)]
    sgst: Option<f64>,
    #[arg(long)]
    igst: Option<f64>,
    #[arg(long)]
    profit: Option<f64>,
    /// Treat own-rate charges as GST inclusive.
    #[arg(long)]
    include_gst: bool,
    /// Shipment ids to select.
    #[arg(long = "select", value_delimiter = ',')]
    select: Vec<String>,
    /// Select every shipment in the filtered list.
    #[arg(long)]
    all: bool,
    /// Amount already paid.
    #[arg(long, default_value = "0")]
    paid: String,
    /// Create the bill.
    #[arg(long)]
    submit: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(config_path_from_env);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref url) = cli.base_url {
        config.backend.base_url = url.clone();
    }
    init_tracing(&config);
    info!(config = %config_path.display(), "Configuration loaded");

    let result = match cli.command {
        Command::Check => check(&config, &config_path),
        Command::Ingest(args) => ingest(&config, args).await,
        Command::Invoice(args) => invoice(&config, args).await,
    };
    if let Err(ref e) = result {
        error!("{}", e);
    }
    Ok(result?)
}

fn check(config: &AppConfig, config_path: &Path) -> Result<(), AppError> {
    config.validate()?;
    let tax = config.billing.tax_settings();
    println!("✅ Configuration is valid");
    println!("   Config file  : {}", config_path.display());
    println!("   Back office  : {}", config.backend.base_url);
    println!("   Timeout      : {}s", config.backend.timeout_secs);
    println!("   Concurrency  : {}", config.backend.max_concurrency);
    println!("   Retries      : {}", config.backend.retry_attempts);
    println!("   Tax          : {} ({}%)", tax_label(&tax), tax.effective_rate());
    println!("   Profit       : {}%", tax.profit_percent());
    println!("   Log level    : {}", config.logging.level);
    Ok(())
}

async fn ingest(config: &AppConfig, args: IngestArgs) -> Result<(), AppError> {
    let bracket_rows = read_sheet(&args.brackets, args.bracket_sheet.as_deref())?;
    let zone_rows = read_sheet(&args.zones, args.zone_sheet.as_deref())?;

    let client = BackOfficeClient::from_config(&config.backend)?;
    let service = RateCardService::new(Arc::new(client));
    let report = service.preview(args.rate_type, &bracket_rows, &zone_rows);
    print_ingestion(&report);

    if !args.upload {
        return Ok(());
    }

    let original_name = args.original_name.unwrap_or_else(|| {
        args.brackets
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let meta = RateCardMeta {
        card_type: args.card_type,
        service: args.service,
        original_name,
        covid_charges: args.covid,
        fuel_charges: args.fuel,
    };
    let upload = service
        .upload(&meta, args.rate_type, &bracket_rows, &zone_rows)
        .await?;
    println!(
        "✅ Rate card {} stored: {} bracket(s), {} zone(s)",
        upload.card.key(),
        upload.card.brackets.len(),
        upload.card.zones.len()
    );
    Ok(())
}

async fn invoice(config: &AppConfig, args: InvoiceArgs) -> Result<(), AppError> {
    let client = Arc::new(BackOfficeClient::from_config(&config.backend)?);

    // Offline runs read exports and bill into memory; online runs use the back office.
    let source: Arc<dyn BackOfficeSource>;
    let rate_cards: Arc<dyn RateCardStore>;
    let invoices: Arc<dyn InvoiceStore>;
    match &args.shipments {
        Some(path) => {
            let mut storage = InMemoryStorage::new().with_shipments(load_json_list::<Shipment>(path)?);
            if let Some(ref parties) = args.parties {
                storage = storage.with_parties(load_parties(parties)?);
            }
            let storage = Arc::new(storage);
            source = storage.clone();
            rate_cards = storage.clone();
            invoices = storage;
        }
        None => {
            source = client.clone();
            rate_cards = client.clone();
            invoices = client.clone();
        }
    }

    let snapshot = WorkspaceSnapshot::load(source.as_ref(), rate_cards.as_ref()).await?;
    let party = match args.party.as_deref() {
        Some(code) => Some(
            snapshot
                .find_party(code)
                .cloned()
                .unwrap_or_else(|| BillingParty::new(PartyKind::Client, code, code)),
        ),
        None => None,
    };

    let mut tax = config.billing.tax_settings();
    if let Some(v) = args.cgst {
        tax.set_cgst(v);
    }
    if let Some(v) = args.sgst {
        tax.set_sgst(v);
    }
    if let Some(v) = args.igst {
        tax.set_igst(v);
    }
    if let Some(v) = args.profit {
        tax.set_profit_percent(v);
    }
    if args.include_gst {
        tax.set_include_gst(true);
    }

    let mut session = snapshot.into_session(tax);
    session.select_party(party);
    session.update_filter(|f| {
        f.date_from = args.from;
        f.date_to = args.to;
        f.tracking_number = args.tracking.clone();
        f.country = args.country.clone();
        f.hide_billed = args.hide_billed;
    });

    let calculator = ChargeCalculator::new(client)
        .with_max_concurrency(config.backend.max_concurrency)
        .with_retry(config.backend.retry_config());
    let service = InvoiceService::new(calculator, invoices);

    if let Some(rate_type) = args.rate_type {
        session.set_rate_source(RateSource::rate_master(rate_type));
        service.refresh_rates(&mut session).await?;
    }

    if args.all {
        session.set_select_all(true);
    }
    for id in &args.select {
        session.select(id, true);
    }
    session.set_paid(&args.paid);

    print_session(&session);

    if args.submit {
        let receipt = service.submit(&mut session).await?;
        println!("✅ Bill {} created", receipt.bill_number);
    }
    Ok(())
}

fn load_parties(path: &Path) -> Result<Vec<BillingParty>, AppError> {
    Ok(load_json_list(path)?)
}

fn tax_label(tax: &courier_billing::domain::TaxSettings) -> String {
    if tax.is_inter_state() {
        format!("IGST {}%", tax.igst())
    } else {
        format!("CGST {}% + SGST {}%", tax.cgst(), tax.sgst())
    }
}

fn money(v: f64) -> String {
    format!("{:.2}", v)
}

fn print_ingestion(report: &IngestionReport) {
    let mut summary = Table::new();
    summary.set_header(vec![Cell::new("Sheet"), Cell::new("Accepted"), Cell::new("Rejected")]);
    for sheet in [SheetKind::Brackets, SheetKind::Zones] {
        summary.add_row(vec![
            Cell::new(sheet),
            Cell::new(report.accepted_in(sheet)),
            Cell::new(report.rejected_in(sheet)),
        ]);
    }
    println!("{summary}");

    if !report.rejected.is_empty() {
        let mut rejected = Table::new();
        rejected.set_header(vec![Cell::new("Sheet"), Cell::new("Row"), Cell::new("Reason")]);
        for row in &report.rejected {
            rejected.add_row(vec![
                Cell::new(row.sheet),
                Cell::new(row.row),
                Cell::new(&row.message).fg(Color::Rgb { r: 185, g: 28, b: 28 }),
            ]);
        }
        println!("{rejected}");
    }
    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }
}

fn print_session(session: &InvoiceSession) {
    let mut rows = Table::new();
    rows.set_header(vec![
        "", "AWB", "Date", "Consignee", "Country", "Weight", "Service", "Base", "Fuel", "Other",
        "Profit", "Subtotal", "GST", "Total", "Source",
    ]);
    for shipment in session.filtered_shipments() {
        let mark = if session.is_selected(&shipment.id) { "✓" } else { "" };
        let mut row = vec![
            Cell::new(mark),
            Cell::new(&shipment.tracking_number),
            Cell::new(shipment.date.format("%Y-%m-%d")),
            Cell::new(shipment.consignee_name()),
            Cell::new(shipment.country()),
        ];
        match session.charge(&shipment.id) {
            Some(c) => row.extend([
                Cell::new(c.weight),
                Cell::new(&c.service),
                Cell::new(money(c.base_charge)),
                Cell::new(money(c.fuel_surcharge)),
                Cell::new(money(c.other_charges)),
                Cell::new(money(c.profit_charges)),
                Cell::new(money(c.subtotal)),
                Cell::new(money(c.gst_amount)),
                Cell::new(money(c.total)),
                Cell::new(if c.is_from_external_resolution { "rate master" } else { "own" }),
            ]),
            None => row.push(Cell::new("pending")),
        }
        rows.add_row(row);
    }
    println!("{rows}");

    let totals = session.totals();
    let mut summary = Table::new();
    summary.set_header(vec![Cell::new("Totals"), Cell::new("")]);
    summary.add_row(vec![Cell::new("Subtotal"), Cell::new(money(totals.subtotal))]);
    if session.tax().is_inter_state() {
        summary.add_row(vec![Cell::new(format!("IGST {}%", session.tax().igst())), Cell::new(money(totals.igst_amount))]);
    } else {
        summary.add_row(vec![Cell::new(format!("CGST {}%", session.tax().cgst())), Cell::new(money(totals.cgst_amount))]);
        summary.add_row(vec![Cell::new(format!("SGST {}%", session.tax().sgst())), Cell::new(money(totals.sgst_amount))]);
    }
    summary.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(money(totals.total)).add_attribute(Attribute::Bold),
    ]);
    summary.add_row(vec![Cell::new("Paid"), Cell::new(money(totals.paid))]);
    summary.add_row(vec![Cell::new("Balance"), Cell::new(money(totals.balance))]);
    println!("{summary}");

    for warning in session.warnings() {
        println!("⚠️  {}", warning);
    }
}
