//! Receipt

use std::{convert::Infallible, fmt, io, str::FromStr};

use decimal_percentage::Percentage;
use jiff::{Timestamp, tz::TimeZone};
use rand::{Rng, seq::SliceRandom};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::CartSnapshot,
    pricing::{PricingError, format_price, tax_on, tax_rate},
    products::ProductId,
};

const RECEIPT_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a generated [`ReceiptId`].
pub const RECEIPT_ID_LEN: usize = 9;

/// Errors that can occur when building or printing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Tax could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// How the shopper paid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// Debit card with PIN
    Pin,

    /// Contactless card or phone
    Contactless,

    /// Cash
    Cash,

    /// Any other method, labelled verbatim
    Other(String),
}

impl PaymentMethod {
    /// Label printed on the receipt and in payment notices.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            PaymentMethod::Pin => "PIN",
            PaymentMethod::Contactless => "Contactloos",
            PaymentMethod::Cash => "Contant",
            PaymentMethod::Other(method) => method,
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pin" => PaymentMethod::Pin,
            "contactless" => PaymentMethod::Contactless,
            "cash" => PaymentMethod::Cash,
            other => PaymentMethod::Other(other.to_string()),
        })
    }
}

impl From<&str> for PaymentMethod {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque, display-only receipt number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Wrap an existing receipt number.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Draw a random 9 character base-36 receipt number.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(
            (0..RECEIPT_ID_LEN)
                .filter_map(|_| RECEIPT_ID_ALPHABET.choose(&mut *rng).copied().map(char::from))
                .collect(),
        )
    }

    /// Borrow the receipt number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store details printed around the receipt body.
#[derive(Debug, Clone)]
pub struct StoreDetails {
    /// Store name, first header line
    pub name: String,

    /// Second header line
    pub address: String,

    /// Lines printed after the totals
    pub footer: Vec<String>,

    /// Zone used to print the timestamp
    pub time_zone: TimeZone,
}

impl Default for StoreDetails {
    fn default() -> Self {
        Self {
            name: "Albert Heijn".to_string(),
            address: "Zelfscanner Simulatie".to_string(),
            footer: vec![
                "Bedankt voor uw bezoek!".to_string(),
                "Albert Heijn - Hier vind je alles".to_string(),
            ],
            time_zone: TimeZone::UTC,
        }
    }
}

/// A purchased line, copied from the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product description
    pub description: String,

    /// Units bought
    pub quantity: u32,

    /// Price per unit
    pub unit_price: Money<'static, Currency>,

    /// `unit_price × quantity`
    pub total: Money<'static, Currency>,
}

/// Final receipt for a paid cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Purchased lines in cart order
    lines: SmallVec<[ReceiptLine; 8]>,

    /// Sum of line totals
    subtotal: Money<'static, Currency>,

    /// Tax rate applied to the subtotal
    tax_rate: Percentage,

    /// Tax on the subtotal, rounded to cents
    tax: Money<'static, Currency>,

    /// Amount paid
    total: Money<'static, Currency>,

    /// When the payment settled
    timestamp: Timestamp,

    /// How the shopper paid
    payment_method: PaymentMethod,

    /// Receipt number
    id: ReceiptId,
}

impl Receipt {
    /// Build a receipt for a finalised cart.
    ///
    /// The result depends only on the arguments. The printed total equals the
    /// subtotal: tax is shown as an informational line and not added on top.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if tax cannot be calculated.
    pub fn generate(
        cart: &CartSnapshot,
        timestamp: Timestamp,
        payment_method: PaymentMethod,
        id: ReceiptId,
    ) -> Result<Self, ReceiptError> {
        let lines = cart
            .lines()
            .iter()
            .map(|line| ReceiptLine {
                id: line.id().clone(),
                name: line.name().to_string(),
                description: line.description().to_string(),
                quantity: line.quantity(),
                unit_price: line.unit_price(),
                total: line.total(),
            })
            .collect();

        let subtotal = cart.subtotal();
        let tax = tax_on(&subtotal)?;

        Ok(Receipt {
            lines,
            subtotal,
            tax_rate: tax_rate(),
            tax,
            total: subtotal,
            timestamp,
            payment_method,
            id,
        })
    }

    /// Purchased lines in cart order
    #[must_use]
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Sum of line totals
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Tax rate applied to the subtotal
    #[must_use]
    pub fn tax_rate(&self) -> Percentage {
        self.tax_rate
    }

    /// Tax on the subtotal
    #[must_use]
    pub fn tax(&self) -> Money<'static, Currency> {
        self.tax
    }

    /// Amount paid
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// When the payment settled
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// How the shopper paid
    #[must_use]
    pub fn payment_method(&self) -> &PaymentMethod {
        &self.payment_method
    }

    /// Receipt number
    #[must_use]
    pub fn id(&self) -> &ReceiptId {
        &self.id
    }

    /// Number of units across all lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Prints the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write, store: &StoreDetails) -> Result<(), ReceiptError> {
        let printed_at = self
            .timestamp
            .to_zoned(store.time_zone.clone())
            .strftime("%d-%m-%Y %H:%M")
            .to_string();

        writeln!(out, "{}", store.name).map_err(|_err| ReceiptError::IO)?;
        writeln!(out, "{}", store.address).map_err(|_err| ReceiptError::IO)?;
        writeln!(out, "{printed_at}").map_err(|_err| ReceiptError::IO)?;

        let mut builder = Builder::default();

        for line in &self.lines {
            builder.push_record([
                format!("{} ({}x)", line.name, line.quantity),
                format_price(&line.total),
            ]);
        }

        builder.push_record([String::new(), String::new()]);
        builder.push_record(["Subtotaal:".to_string(), format_price(&self.subtotal)]);
        builder.push_record([
            format!("BTW ({}%):", percent_points(self.tax_rate)),
            format_price(&self.tax),
        ]);
        builder.push_record(["TOTAAL:".to_string(), format_price(&self.total)]);
        builder.push_record([
            "Betaald met:".to_string(),
            self.payment_method.label().to_string(),
        ]);

        let mut table = builder.build();

        table.with(Style::blank());
        table.modify(Columns::new(1..), Alignment::right());

        writeln!(out, "\n{table}\n").map_err(|_err| ReceiptError::IO)?;

        for line in &store.footer {
            writeln!(out, "{line}").map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out, "Bon #{}", self.id).map_err(|_err| ReceiptError::IO)
    }
}

fn percent_points(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.21), so multiply by 100 to print percent points.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).normalize()
}
