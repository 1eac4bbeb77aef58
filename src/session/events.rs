//! Session states, events and notices

use std::fmt;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{products::ProductId, receipt::PaymentMethod, scan::ScanError};

/// Where the shopper is in their trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Shopping: scanning products and editing the cart.
    #[default]
    Idle,

    /// A scanned product is shown and waits to be added or skipped.
    ProductStaged,

    /// The payment screen is open.
    CheckoutPending,

    /// A payment method was chosen and the payment is in flight.
    PaymentProcessing,

    /// Payment settled and the receipt is shown.
    ReceiptReady,
}

impl SessionState {
    /// Whether the cart can be edited and products scanned.
    #[must_use]
    pub fn is_shopping(self) -> bool {
        matches!(self, SessionState::Idle | SessionState::ProductStaged)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::ProductStaged => "product staged",
            SessionState::CheckoutPending => "checkout pending",
            SessionState::PaymentProcessing => "payment processing",
            SessionState::ReceiptReady => "receipt ready",
        };

        f.write_str(name)
    }
}

/// Something the shopper, a scanner or the payment terminal did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A scan was started; the scan control is disabled until it completes.
    ScanStarted,

    /// A scan resolved to an identifier.
    ScanSucceeded(ProductId),

    /// A scan produced nothing usable.
    ScanFailed(ScanError),

    /// Add the staged product to the cart.
    ConfirmAdd,

    /// Discard the staged product.
    Skip,

    /// Add one unit straight from the product browser.
    AddFromCatalog(ProductId),

    /// Change a line's quantity by `delta`.
    AdjustQuantity {
        /// Line to change
        id: ProductId,

        /// Signed change
        delta: i64,
    },

    /// Replace a line's quantity.
    SetQuantity {
        /// Line to change
        id: ProductId,

        /// New quantity; zero or less removes the line
        quantity: i64,
    },

    /// Remove a line.
    Remove(ProductId),

    /// Open the payment screen.
    BeginCheckout,

    /// Pick how to pay.
    SelectPaymentMethod(PaymentMethod),

    /// The payment went through.
    PaymentSettled {
        /// Settlement time printed on the receipt
        at: Timestamp,
    },

    /// Close the payment screen without paying.
    CancelCheckout,

    /// Start over after the receipt.
    StartNewTrip,

    /// Replace the cart with random products and pay for them.
    LoadSample {
        /// Number of random draws
        count: usize,

        /// Settlement time printed on the receipt
        at: Timestamp,
    },
}

impl Event {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::ScanStarted => "scan_started",
            Event::ScanSucceeded(_) => "scan_succeeded",
            Event::ScanFailed(_) => "scan_failed",
            Event::ConfirmAdd => "confirm_add",
            Event::Skip => "skip",
            Event::AddFromCatalog(_) => "add_from_catalog",
            Event::AdjustQuantity { .. } => "adjust_quantity",
            Event::SetQuantity { .. } => "set_quantity",
            Event::Remove(_) => "remove",
            Event::BeginCheckout => "begin_checkout",
            Event::SelectPaymentMethod(_) => "select_payment_method",
            Event::PaymentSettled { .. } => "payment_settled",
            Event::CancelCheckout => "cancel_checkout",
            Event::StartNewTrip => "start_new_trip",
            Event::LoadSample { .. } => "load_sample",
        }
    }
}

/// Feedback for the shopper after an applied event.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A scan found a product, which is now staged.
    ProductFound {
        /// Product name
        name: String,
    },

    /// A scan produced nothing usable.
    ScanFailed(ScanError),

    /// Units were added to the cart.
    Added {
        /// Product name
        name: String,

        /// Line quantity after the add
        quantity: u32,
    },

    /// The staged product was discarded.
    Skipped,

    /// A line's quantity changed; `None` means the line was removed.
    QuantityChanged {
        /// Line identifier
        id: ProductId,

        /// New quantity
        quantity: Option<u32>,
    },

    /// A line was removed (or was already absent).
    Removed(ProductId),

    /// The payment screen opened for this amount.
    CheckoutStarted {
        /// Amount due
        amount: Money<'static, Currency>,
    },

    /// The payment is being processed.
    PaymentProcessing(PaymentMethod),

    /// The payment succeeded and a receipt was generated.
    PaymentSucceeded(PaymentMethod),

    /// The payment screen was closed without paying.
    CheckoutCancelled,

    /// A new trip started with an empty cart.
    NewTrip,

    /// A random sample cart was paid for.
    SampleLoaded {
        /// Units in the sample cart
        item_count: u64,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ProductFound { name } => write!(f, "Product gevonden: {name}"),
            Notice::ScanFailed(ScanError::Empty) => f.write_str("Voer een barcode in"),
            Notice::ScanFailed(ScanError::TooShort(code)) => {
                write!(f, "Barcode {code} niet herkend")
            }
            Notice::Added { name, .. } => write!(f, "{name} toegevoegd aan winkelwagen"),
            Notice::Skipped => f.write_str("Product overgeslagen"),
            Notice::QuantityChanged { quantity: None, .. } | Notice::Removed(_) => {
                f.write_str("Product verwijderd uit winkelwagen")
            }
            Notice::QuantityChanged {
                quantity: Some(quantity),
                ..
            } => write!(f, "Aantal aangepast naar {quantity}"),
            Notice::CheckoutStarted { amount } => {
                write!(f, "Te betalen: {}", crate::pricing::format_price(amount))
            }
            Notice::PaymentProcessing(_) => f.write_str("Betaling wordt verwerkt..."),
            Notice::PaymentSucceeded(method) => {
                write!(f, "Betaling succesvol via {}!", method.label())
            }
            Notice::CheckoutCancelled => f.write_str("Betaling geannuleerd"),
            Notice::NewTrip => f.write_str("Nieuwe boodschappenlijst gestart"),
            Notice::SampleLoaded { .. } => f.write_str("Willekeurige bon geladen!"),
        }
    }
}
