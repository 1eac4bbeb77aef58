//! Selfscan prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine, CartSnapshot},
    catalog::{Catalog, FixtureCatalog, FixtureError, filter_products},
    config::{ConfigError, KioskConfig},
    pricing::{PricingError, format_price, tax_rate},
    products::{Product, ProductId},
    receipt::{PaymentMethod, Receipt, ReceiptError, ReceiptId, StoreDetails},
    scan::{ScanError, ScanInput, ScanSource, ScriptedScans},
    session::{
        Event, NoopObserver, Notice, Session, SessionError, SessionObserver, SessionState,
        SessionView, StagedProduct,
    },
};
