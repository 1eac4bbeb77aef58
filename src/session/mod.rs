//! Checkout session
//!
//! A [`Session`] is one shopping trip: it owns the cart, the staged product and
//! the last receipt, and moves through [`SessionState`]s as [`Event`]s arrive.
//! Events are applied one at a time and each runs to completion.
//!
//! ```text
//! Idle ──scan──▶ ProductStaged ──confirm/skip──▶ Idle
//! Idle ──begin checkout──▶ CheckoutPending ──method──▶ PaymentProcessing
//! PaymentProcessing ──settled──▶ ReceiptReady ──new trip──▶ Idle
//! CheckoutPending | PaymentProcessing ──cancel──▶ Idle
//! ```

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    cart::{Cart, CartLine, CartSnapshot},
    catalog::Catalog,
    products::{Product, ProductId},
    receipt::{PaymentMethod, Receipt, ReceiptId},
    sample,
    scan::ScanInput,
};

mod errors;
mod events;
mod observer;

pub use errors::SessionError;
pub use events::{Event, Notice, SessionState};
pub use observer::{NoopObserver, SessionObserver, SessionView};

/// A scanned product waiting to be added or skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedProduct {
    product: Product,
}

impl StagedProduct {
    /// Identifier the scan resolved to
    #[must_use]
    pub fn id(&self) -> &ProductId {
        &self.product.id
    }

    /// Catalog record captured at scan time
    #[must_use]
    pub fn product(&self) -> &Product {
        &self.product
    }
}

/// Result of applying an event.
pub type DispatchResult = Result<Option<Notice>, SessionError>;

/// One shopping trip.
#[derive(Debug)]
pub struct Session<C: Catalog> {
    catalog: C,
    state: SessionState,
    cart: Cart,
    staged: Option<StagedProduct>,
    receipt: Option<Receipt>,
    payment_method: Option<PaymentMethod>,
    scanning: bool,
    rng: StdRng,
}

impl<C: Catalog> Session<C> {
    /// Start an idle session with an empty cart priced in `currency`.
    pub fn new(catalog: C, currency: &'static rusty_money::iso::Currency) -> Self {
        Self::with_rng(catalog, currency, StdRng::from_entropy())
    }

    /// Start a session whose receipt numbers and samples come from `seed`.
    pub fn with_seed(catalog: C, currency: &'static rusty_money::iso::Currency, seed: u64) -> Self {
        Self::with_rng(catalog, currency, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: C, currency: &'static rusty_money::iso::Currency, rng: StdRng) -> Self {
        Self {
            catalog,
            state: SessionState::Idle,
            cart: Cart::new(currency),
            staged: None,
            receipt: None,
            payment_method: None,
            scanning: false,
            rng,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Copy of the cart
    #[must_use]
    pub fn cart(&self) -> CartSnapshot {
        self.cart.snapshot()
    }

    /// Product awaiting confirmation
    #[must_use]
    pub fn staged(&self) -> Option<&StagedProduct> {
        self.staged.as_ref()
    }

    /// Last receipt, kept until a new trip starts
    #[must_use]
    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Whether a scan is outstanding
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// The injected catalog
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Read-only view for rendering.
    #[must_use]
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            state: self.state,
            cart: self.cart.snapshot(),
            staged: self.staged.as_ref(),
            receipt: self.receipt.as_ref(),
            scanning: self.scanning,
            payment_method: self.payment_method.as_ref(),
        }
    }

    /// Resolve raw scan input and apply it as a completed scan.
    ///
    /// # Errors
    ///
    /// See [`Session::dispatch`].
    pub fn scan(&mut self, input: &ScanInput) -> DispatchResult {
        let event = match input.resolve() {
            Ok(id) => Event::ScanSucceeded(id),
            Err(err) => Event::ScanFailed(err),
        };

        self.dispatch(event)
    }

    /// Apply an event.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the event is rejected. A rejected event
    /// leaves state, cart, staged product and receipt unchanged; a rejected
    /// scan completion still clears the scanning flag.
    pub fn dispatch(&mut self, event: Event) -> DispatchResult {
        self.dispatch_with_observer(event, &mut NoopObserver)
    }

    /// Apply an event and report the outcome to `observer`.
    ///
    /// # Errors
    ///
    /// See [`Session::dispatch`].
    pub fn dispatch_with_observer<O: SessionObserver + ?Sized>(
        &mut self,
        event: Event,
        observer: &mut O,
    ) -> DispatchResult {
        match self.apply(&event) {
            Ok(notice) => {
                observer.on_transition(&event, &self.view(), notice.as_ref());

                Ok(notice)
            }
            Err(err) => {
                match &err {
                    SessionError::InvalidTransition { state, event } => {
                        debug!(%state, event, "ignored event");
                    }
                    SessionError::ProductNotFound(id) => {
                        warn!(product = %id, "product not found");
                    }
                    other => debug!(event = event.name(), error = %other, "rejected event"),
                }

                observer.on_rejected(&event, &self.view(), &err);

                Err(err)
            }
        }
    }

    fn apply(&mut self, event: &Event) -> DispatchResult {
        match (self.state, event) {
            (_, Event::ScanSucceeded(id)) => {
                self.scanning = false;
                self.require_shopping(event)?;
                self.stage(id)
            }
            (_, Event::ScanFailed(err)) => {
                self.scanning = false;
                warn!(error = %err, "scan failed");

                Ok(Some(Notice::ScanFailed(err.clone())))
            }
            (state, Event::ScanStarted) if state.is_shopping() => {
                if self.scanning {
                    return Err(SessionError::ScanInProgress);
                }

                self.scanning = true;

                Ok(None)
            }
            (SessionState::ProductStaged, Event::ConfirmAdd) => self.confirm_add(),
            (SessionState::ProductStaged, Event::Skip) => {
                self.staged = None;
                self.state = SessionState::Idle;

                Ok(Some(Notice::Skipped))
            }
            (state, Event::AddFromCatalog(id)) if state.is_shopping() => {
                let snapshot = self.cart.add_or_increment(&self.catalog, id, 1)?;

                Ok(snapshot.line(id).map(|line| Notice::Added {
                    name: line.name().to_string(),
                    quantity: line.quantity(),
                }))
            }
            (state, Event::AdjustQuantity { id, delta }) if state.is_shopping() => {
                let snapshot = self.cart.adjust_quantity(id, *delta)?;

                Ok(Some(quantity_changed(&snapshot, id)))
            }
            (state, Event::SetQuantity { id, quantity }) if state.is_shopping() => {
                let snapshot = self.cart.set_quantity(id, *quantity)?;

                Ok(Some(quantity_changed(&snapshot, id)))
            }
            (state, Event::Remove(id)) if state.is_shopping() => {
                self.cart.remove(id);

                Ok(Some(Notice::Removed(id.clone())))
            }
            (SessionState::Idle, Event::BeginCheckout) => self.begin_checkout(),
            (SessionState::CheckoutPending, Event::SelectPaymentMethod(method)) => {
                info!(method = method.label(), "payment started");

                self.payment_method = Some(method.clone());
                self.state = SessionState::PaymentProcessing;

                Ok(Some(Notice::PaymentProcessing(method.clone())))
            }
            (SessionState::PaymentProcessing, Event::PaymentSettled { at }) => {
                self.settle_payment(*at)
            }
            (SessionState::CheckoutPending | SessionState::PaymentProcessing, Event::CancelCheckout) => {
                info!("checkout cancelled");

                self.payment_method = None;
                self.state = SessionState::Idle;

                Ok(Some(Notice::CheckoutCancelled))
            }
            (SessionState::ReceiptReady, Event::StartNewTrip) => {
                self.cart.clear();
                self.receipt = None;
                self.staged = None;
                self.payment_method = None;
                self.state = SessionState::Idle;

                Ok(Some(Notice::NewTrip))
            }
            (state, Event::LoadSample { count, at }) if state.is_shopping() => {
                self.load_sample(*count, *at)
            }
            (state, event) => Err(SessionError::InvalidTransition {
                state,
                event: event.name(),
            }),
        }
    }

    fn require_shopping(&self, event: &Event) -> Result<(), SessionError> {
        if self.state.is_shopping() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                event: event.name(),
            })
        }
    }

    fn stage(&mut self, id: &ProductId) -> DispatchResult {
        let product = self
            .catalog
            .lookup(id)
            .ok_or_else(|| SessionError::ProductNotFound(id.clone()))?;

        let name = product.name.clone();

        self.staged = Some(StagedProduct { product });
        self.state = SessionState::ProductStaged;

        Ok(Some(Notice::ProductFound { name }))
    }

    fn confirm_add(&mut self) -> DispatchResult {
        let Some(staged) = self.staged.as_ref() else {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                event: Event::ConfirmAdd.name(),
            });
        };

        let snapshot = self.cart.add_product(&staged.product, 1)?;

        let notice = snapshot.line(staged.id()).map(|line| Notice::Added {
            name: line.name().to_string(),
            quantity: line.quantity(),
        });

        self.staged = None;
        self.state = SessionState::Idle;

        Ok(notice)
    }

    fn begin_checkout(&mut self) -> DispatchResult {
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let amount = self.cart.subtotal();

        info!(
            lines = self.cart.len(),
            items = self.cart.item_count(),
            amount_minor = amount.to_minor_units(),
            "checkout started"
        );

        self.state = SessionState::CheckoutPending;

        Ok(Some(Notice::CheckoutStarted { amount }))
    }

    fn settle_payment(&mut self, at: jiff::Timestamp) -> DispatchResult {
        let method = self
            .payment_method
            .clone()
            .ok_or(SessionError::InvalidTransition {
                state: self.state,
                event: "payment_settled",
            })?;

        let receipt = Receipt::generate(
            &self.cart.snapshot(),
            at,
            method.clone(),
            ReceiptId::random(&mut self.rng),
        )?;

        info!(
            receipt = %receipt.id(),
            method = method.label(),
            subtotal_minor = receipt.subtotal().to_minor_units(),
            tax_minor = receipt.tax().to_minor_units(),
            "payment settled"
        );

        self.receipt = Some(receipt);
        self.state = SessionState::ReceiptReady;

        Ok(Some(Notice::PaymentSucceeded(method)))
    }

    fn load_sample(&mut self, count: usize, at: jiff::Timestamp) -> DispatchResult {
        let draws = sample::draw(&self.catalog, &mut self.rng, count);

        let mut cart = Cart::new(self.cart.currency());

        for (product, quantity) in &draws {
            cart.add_product(product, *quantity)?;
        }

        if cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let method = PaymentMethod::Pin;
        let receipt = Receipt::generate(&cart.snapshot(), at, method.clone(), ReceiptId::random(&mut self.rng))?;
        let item_count = cart.item_count();

        info!(draws = draws.len(), items = item_count, receipt = %receipt.id(), "sample receipt generated");

        self.cart = cart;
        self.staged = None;
        self.payment_method = Some(method);
        self.receipt = Some(receipt);
        self.state = SessionState::ReceiptReady;

        Ok(Some(Notice::SampleLoaded { item_count }))
    }
}

fn quantity_changed(snapshot: &CartSnapshot, id: &ProductId) -> Notice {
    Notice::QuantityChanged {
        id: id.clone(),
        quantity: snapshot.line(id).map(CartLine::quantity),
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::{Money, iso::EUR};
    use testresult::TestResult;

    use crate::catalog::FixtureCatalog;

    use super::*;

    const MILK: &str = "8713800000015";
    const BREAD: &str = "8710398230046";

    fn session() -> Result<Session<FixtureCatalog>, crate::catalog::FixtureError> {
        Ok(Session::with_seed(FixtureCatalog::store()?, EUR, 7))
    }

    fn now() -> Result<Timestamp, jiff::Error> {
        Timestamp::from_second(1_700_000_000)
    }

    fn add(session: &mut Session<FixtureCatalog>, id: &str) -> TestResult {
        session.dispatch(Event::ScanSucceeded(ProductId::from(id)))?;
        session.dispatch(Event::ConfirmAdd)?;

        Ok(())
    }

    #[derive(Default)]
    struct Recorder {
        states: Vec<SessionState>,
        rejected: Vec<&'static str>,
        scanning: Vec<bool>,
    }

    impl SessionObserver for Recorder {
        fn on_transition(&mut self, _event: &Event, view: &SessionView<'_>, _notice: Option<&Notice>) {
            self.states.push(view.state);
            self.scanning.push(view.scanning);
        }

        fn on_rejected(&mut self, event: &Event, view: &SessionView<'_>, _error: &SessionError) {
            self.rejected.push(event.name());
            self.scanning.push(view.scanning);
        }
    }

    #[test]
    fn scan_stages_product() -> TestResult {
        let mut session = session()?;

        let notice = session.dispatch(Event::ScanSucceeded(ProductId::from(MILK)))?;

        assert_eq!(session.state(), SessionState::ProductStaged);
        assert_eq!(session.staged().map(|s| s.id().as_str()), Some(MILK));
        assert_eq!(
            notice,
            Some(Notice::ProductFound {
                name: "AH Verse melk".to_string()
            })
        );
        assert!(session.cart().is_empty());

        Ok(())
    }

    #[test]
    fn rescanning_replaces_staged_product() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanSucceeded(ProductId::from(MILK)))?;
        session.dispatch(Event::ScanSucceeded(ProductId::from(BREAD)))?;

        assert_eq!(session.staged().map(|s| s.id().as_str()), Some(BREAD));

        Ok(())
    }

    #[test]
    fn unknown_scan_keeps_staged_product() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanSucceeded(ProductId::from(MILK)))?;
        let result = session.dispatch(Event::ScanSucceeded(ProductId::from("000")));

        assert!(matches!(result, Err(SessionError::ProductNotFound(_))));
        assert_eq!(session.state(), SessionState::ProductStaged);
        assert_eq!(session.staged().map(|s| s.id().as_str()), Some(MILK));

        Ok(())
    }

    #[test]
    fn confirm_add_commits_and_returns_to_idle() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanSucceeded(ProductId::from(MILK)))?;
        let notice = session.dispatch(Event::ConfirmAdd)?;

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.staged().is_none());
        assert_eq!(
            notice,
            Some(Notice::Added {
                name: "AH Verse melk".to_string(),
                quantity: 1
            })
        );
        assert_eq!(session.cart().item_count(), 1);

        Ok(())
    }

    #[test]
    fn confirm_add_without_staged_product_is_ignored() -> TestResult {
        let mut session = session()?;

        let result = session.dispatch(Event::ConfirmAdd);

        assert!(matches!(result, Err(SessionError::InvalidTransition { .. })));
        assert_eq!(session.state(), SessionState::Idle);

        Ok(())
    }

    #[test]
    fn skip_discards_staged_product() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanSucceeded(ProductId::from(MILK)))?;
        session.dispatch(Event::Skip)?;

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.staged().is_none());
        assert!(session.cart().is_empty());

        Ok(())
    }

    #[test]
    fn second_scan_while_scanning_is_suppressed() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanStarted)?;

        assert!(session.is_scanning());
        assert!(matches!(
            session.dispatch(Event::ScanStarted),
            Err(SessionError::ScanInProgress)
        ));

        session.dispatch(Event::ScanSucceeded(ProductId::from(MILK)))?;

        assert!(!session.is_scanning());
        session.dispatch(Event::ScanStarted)?;

        Ok(())
    }

    #[test]
    fn failed_lookup_still_clears_scanning_flag() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanStarted)?;
        let result = session.dispatch(Event::ScanSucceeded(ProductId::from("000")));

        assert!(result.is_err());
        assert!(!session.is_scanning());

        Ok(())
    }

    #[test]
    fn blank_manual_scan_is_a_notice() -> TestResult {
        let mut session = session()?;

        let notice = session.scan(&ScanInput::Manual("  ".to_string()))?;

        assert_eq!(notice, Some(Notice::ScanFailed(crate::scan::ScanError::Empty)));
        assert_eq!(session.state(), SessionState::Idle);

        Ok(())
    }

    #[test]
    fn add_from_catalog_skips_staging() -> TestResult {
        let mut session = session()?;

        session.dispatch(Event::ScanSucceeded(ProductId::from(BREAD)))?;
        session.dispatch(Event::AddFromCatalog(ProductId::from(MILK)))?;

        assert_eq!(session.state(), SessionState::ProductStaged);
        assert_eq!(session.cart().item_count(), 1);
        assert!(matches!(
            session.dispatch(Event::AddFromCatalog(ProductId::from("000"))),
            Err(SessionError::ProductNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn quantity_events_edit_the_cart() -> TestResult {
        let mut session = session()?;
        let milk = ProductId::from(MILK);

        add(&mut session, MILK)?;

        session.dispatch(Event::AdjustQuantity {
            id: milk.clone(),
            delta: 2,
        })?;
        assert_eq!(session.cart().item_count(), 3);

        session.dispatch(Event::SetQuantity {
            id: milk.clone(),
            quantity: 1,
        })?;
        assert_eq!(session.cart().item_count(), 1);

        let notice = session.dispatch(Event::AdjustQuantity {
            id: milk.clone(),
            delta: -1,
        })?;
        assert_eq!(
            notice,
            Some(Notice::QuantityChanged {
                id: milk.clone(),
                quantity: None
            })
        );
        assert!(session.cart().is_empty());

        assert!(matches!(
            session.dispatch(Event::AdjustQuantity { id: milk, delta: 1 }),
            Err(SessionError::LineNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn begin_checkout_on_empty_cart_stays_idle() -> TestResult {
        let mut session = session()?;

        assert!(matches!(
            session.dispatch(Event::BeginCheckout),
            Err(SessionError::EmptyCart)
        ));
        assert_eq!(session.state(), SessionState::Idle);

        Ok(())
    }

    #[test]
    fn begin_checkout_with_staged_product_is_ignored() -> TestResult {
        let mut session = session()?;

        add(&mut session, MILK)?;
        session.dispatch(Event::ScanSucceeded(ProductId::from(BREAD)))?;

        assert!(matches!(
            session.dispatch(Event::BeginCheckout),
            Err(SessionError::InvalidTransition {
                state: SessionState::ProductStaged,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn checkout_flow_produces_receipt() -> TestResult {
        let mut session = session()?;

        add(&mut session, MILK)?;
        add(&mut session, MILK)?;

        let notice = session.dispatch(Event::BeginCheckout)?;
        assert_eq!(
            notice,
            Some(Notice::CheckoutStarted {
                amount: Money::from_minor(258, EUR)
            })
        );

        session.dispatch(Event::SelectPaymentMethod(PaymentMethod::Pin))?;
        assert_eq!(session.state(), SessionState::PaymentProcessing);

        session.dispatch(Event::PaymentSettled { at: now()? })?;
        assert_eq!(session.state(), SessionState::ReceiptReady);

        let receipt = session.receipt().ok_or("missing receipt")?;

        assert_eq!(receipt.subtotal(), Money::from_minor(258, EUR));
        assert_eq!(receipt.tax(), Money::from_minor(54, EUR));
        assert_eq!(receipt.total(), Money::from_minor(258, EUR));
        assert_eq!(receipt.payment_method(), &PaymentMethod::Pin);

        // Cart and receipt coexist until a new trip starts.
        assert_eq!(session.cart().item_count(), 2);

        Ok(())
    }

    #[test]
    fn cart_is_frozen_during_checkout() -> TestResult {
        let mut session = session()?;

        add(&mut session, MILK)?;
        session.dispatch(Event::BeginCheckout)?;

        assert!(matches!(
            session.dispatch(Event::Remove(ProductId::from(MILK))),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.dispatch(Event::ScanSucceeded(ProductId::from(BREAD))),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(session.cart().item_count(), 1);

        Ok(())
    }

    #[test]
    fn cancel_checkout_returns_to_idle_without_side_effects() -> TestResult {
        let mut session = session()?;

        add(&mut session, MILK)?;
        session.dispatch(Event::BeginCheckout)?;
        session.dispatch(Event::SelectPaymentMethod(PaymentMethod::Cash))?;
        session.dispatch(Event::CancelCheckout)?;

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.receipt().is_none());
        assert_eq!(session.cart().item_count(), 1);

        // A late settlement after cancelling is ignored.
        assert!(session.dispatch(Event::PaymentSettled { at: now()? }).is_err());
        assert!(session.receipt().is_none());

        Ok(())
    }

    #[test]
    fn start_new_trip_clears_everything() -> TestResult {
        let mut session = session()?;

        add(&mut session, MILK)?;
        session.dispatch(Event::BeginCheckout)?;
        session.dispatch(Event::SelectPaymentMethod(PaymentMethod::from("ideal")))?;
        session.dispatch(Event::PaymentSettled { at: now()? })?;
        session.dispatch(Event::StartNewTrip)?;

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.cart().is_empty());
        assert!(session.receipt().is_none());
        assert!(session.staged().is_none());

        Ok(())
    }

    #[test]
    fn load_sample_replaces_cart_and_pays() -> TestResult {
        let mut session = session()?;

        add(&mut session, MILK)?;
        let notice = session.dispatch(Event::LoadSample { count: 8, at: now()? })?;

        assert_eq!(session.state(), SessionState::ReceiptReady);

        let receipt = session.receipt().ok_or("missing receipt")?;
        let cart = session.cart();

        assert_eq!(receipt.subtotal(), cart.subtotal());
        assert_eq!(notice, Some(Notice::SampleLoaded { item_count: cart.item_count() }));
        assert!((8..=24).contains(&cart.item_count()));

        Ok(())
    }

    #[test]
    fn observer_sees_applied_and_rejected_events() -> TestResult {
        let mut session = session()?;
        let mut recorder = Recorder::default();

        session.dispatch_with_observer(Event::ScanSucceeded(ProductId::from(MILK)), &mut recorder)?;
        session.dispatch_with_observer(Event::ConfirmAdd, &mut recorder)?;
        let rejected = session.dispatch_with_observer(Event::StartNewTrip, &mut recorder);

        assert!(rejected.is_err());
        assert_eq!(recorder.states, vec![SessionState::ProductStaged, SessionState::Idle]);
        assert_eq!(recorder.rejected, vec!["start_new_trip"]);

        Ok(())
    }

    #[test]
    fn observer_sees_scanning_cleared_after_unknown_barcode() -> TestResult {
        let mut session = session()?;
        let mut recorder = Recorder::default();

        session.dispatch_with_observer(Event::ScanStarted, &mut recorder)?;
        let result =
            session.dispatch_with_observer(Event::ScanSucceeded(ProductId::from("000")), &mut recorder);

        assert!(matches!(result, Err(SessionError::ProductNotFound(_))));
        assert_eq!(recorder.scanning, vec![true, false]);
        assert_eq!(recorder.rejected, vec!["scan_succeeded"]);
        assert!(!session.is_scanning());

        Ok(())
    }
}
