//! Selfscan kiosk CLI

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use selfscan::{
    catalog::{Catalog, FixtureCatalog, filter_products},
    config::KioskConfig,
    observability::{LoggingConfig, init_subscriber},
    pricing::{format_price, item_count_label},
    receipt::PaymentMethod,
    scan::{ScanInput, ScanSource, ScriptedScans},
    session::{Event, Notice, Session, SessionError, SessionObserver, SessionView},
};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "selfscan", about = "Self-checkout kiosk", long_about = None)]
struct Cli {
    /// Product fixture to use instead of the built-in store catalog
    #[arg(long, env = "SELFSCAN_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Kiosk configuration file
    #[arg(long, env = "SELFSCAN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List catalog products
    Catalog(CatalogArgs),

    /// List catalog categories
    Categories,

    /// Scan products, pay and print the receipt
    Checkout(CheckoutArgs),

    /// Print a receipt for a random cart
    Sample(SampleArgs),
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Case-insensitive search over name and description
    #[arg(long)]
    search: Option<String>,

    /// Exact category name
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Barcodes to scan, in order
    #[arg(long = "scan", required = true)]
    scans: Vec<String>,

    /// Payment method (pin, contactless, cash or any label)
    #[arg(long, default_value = "pin")]
    payment: String,
}

#[derive(Debug, Args)]
struct SampleArgs {
    /// Number of random draws; defaults to the configured sample size
    #[arg(long)]
    count: Option<usize>,

    /// Seed for reproducible samples
    #[arg(long)]
    seed: Option<u64>,
}

/// Collects shopper notices so they can be printed between events.
#[derive(Debug, Default)]
struct NoticeLog {
    messages: Vec<String>,
}

impl SessionObserver for NoticeLog {
    fn on_transition(&mut self, _event: &Event, _view: &SessionView<'_>, notice: Option<&Notice>) {
        if let Some(notice) = notice {
            self.messages.push(notice.to_string());
        }
    }

    fn on_rejected(&mut self, _event: &Event, _view: &SessionView<'_>, error: &SessionError) {
        if error.is_user_visible() {
            self.messages.push(error.to_string());
        }
    }
}

impl NoticeLog {
    fn flush(&mut self, out: &mut impl Write) -> io::Result<()> {
        for message in self.messages.drain(..) {
            writeln!(out, "> {message}")?;
        }

        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_subscriber(&cli.logging)?;

    let catalog = match &cli.catalog {
        Some(path) => FixtureCatalog::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => FixtureCatalog::store()?,
    };

    let config = match &cli.config {
        Some(path) => KioskConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => KioskConfig::default(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Catalog(args) => list_products(&catalog, &args, &mut out),
        Commands::Categories => {
            for category in catalog.categories() {
                writeln!(out, "{category}")?;
            }

            Ok(())
        }
        Commands::Checkout(args) => checkout(catalog, &config, args, &mut out),
        Commands::Sample(args) => sample(catalog, &config, &args, &mut out),
    }
}

fn list_products(catalog: &FixtureCatalog, args: &CatalogArgs, out: &mut impl Write) -> Result<()> {
    let products = filter_products(catalog, args.search.as_deref(), args.category.as_deref());

    let mut builder = Builder::default();

    builder.push_record(["", "Barcode", "Product", "Categorie", "Prijs"]);

    for product in &products {
        builder.push_record([
            product.image.clone(),
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            format_price(&product.price),
        ]);
    }

    let mut table = builder.build();

    table
        .with(Style::rounded())
        .modify(Columns::new(4..), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{}",
        item_count_label(u64::try_from(products.len()).unwrap_or(u64::MAX))
    )?;

    Ok(())
}

fn checkout(
    catalog: FixtureCatalog,
    config: &KioskConfig,
    args: CheckoutArgs,
    out: &mut impl Write,
) -> Result<()> {
    let currency = catalog.currency();
    let mut session = Session::new(catalog, currency);
    let mut notices = NoticeLog::default();
    let mut scans = ScriptedScans::new(args.scans.into_iter().map(ScanInput::Manual));

    while let Some(input) = scans.next_input() {
        let event = match input.resolve() {
            Ok(id) => Event::ScanSucceeded(id),
            Err(err) => Event::ScanFailed(err),
        };

        if session.dispatch_with_observer(event, &mut notices).is_ok()
            && session.staged().is_some()
        {
            // Rejections were already reported to the observer.
            let _added = session.dispatch_with_observer(Event::ConfirmAdd, &mut notices);
        }

        notices.flush(out)?;
    }

    let cart = session.cart();

    writeln!(
        out,
        "{} - {}",
        item_count_label(cart.item_count()),
        format_price(&cart.subtotal())
    )?;

    if cart.is_empty() {
        bail!("nothing to check out");
    }

    session.dispatch_with_observer(Event::BeginCheckout, &mut notices)?;
    session.dispatch_with_observer(
        Event::SelectPaymentMethod(PaymentMethod::from(args.payment.as_str())),
        &mut notices,
    )?;
    session.dispatch_with_observer(Event::PaymentSettled { at: Timestamp::now() }, &mut notices)?;
    notices.flush(out)?;

    let Some(receipt) = session.receipt() else {
        bail!("payment settled without a receipt");
    };

    debug!(receipt = %receipt.id(), "printing receipt");

    writeln!(out)?;
    receipt.write_to(&mut *out, &config.store_details()?)?;

    Ok(())
}

fn sample(
    catalog: FixtureCatalog,
    config: &KioskConfig,
    args: &SampleArgs,
    out: &mut impl Write,
) -> Result<()> {
    let currency = catalog.currency();
    let mut session = match args.seed {
        Some(seed) => Session::with_seed(catalog, currency, seed),
        None => Session::new(catalog, currency),
    };
    let mut notices = NoticeLog::default();

    session.dispatch_with_observer(
        Event::LoadSample {
            count: args.count.unwrap_or(config.sample_size),
            at: Timestamp::now(),
        },
        &mut notices,
    )?;
    notices.flush(out)?;

    let Some(receipt) = session.receipt() else {
        bail!("sample produced no receipt");
    };

    writeln!(out)?;
    receipt.write_to(&mut *out, &config.store_details()?)?;

    Ok(())
}
