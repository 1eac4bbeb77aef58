//! Session observers
//!
//! The presentation layer watches the session through [`SessionObserver`]. It
//! only ever sees borrowed, read-only views and cannot mutate the session.

use crate::{
    cart::CartSnapshot,
    receipt::{PaymentMethod, Receipt},
    session::{Event, Notice, SessionError, SessionState, StagedProduct},
};

/// Read-only view of a session, handed to observers after each event.
#[derive(Debug, Clone)]
pub struct SessionView<'a> {
    /// Current state
    pub state: SessionState,

    /// Copy of the cart
    pub cart: CartSnapshot,

    /// Product awaiting confirmation
    pub staged: Option<&'a StagedProduct>,

    /// Last receipt
    pub receipt: Option<&'a Receipt>,

    /// Whether a scan is outstanding (scan control disabled)
    pub scanning: bool,

    /// Chosen payment method while paying
    pub payment_method: Option<&'a PaymentMethod>,
}

/// Observer for session transitions.
///
/// When no observer is needed the session uses [`NoopObserver`].
pub trait SessionObserver {
    /// Called after an event was applied.
    fn on_transition(&mut self, event: &Event, view: &SessionView<'_>, notice: Option<&Notice>);

    /// Called when an event was rejected.
    ///
    /// The view is current: a completed scan re-enables scanning even when the
    /// lookup fails.
    fn on_rejected(&mut self, _event: &Event, _view: &SessionView<'_>, _error: &SessionError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_transition(&mut self, _event: &Event, _view: &SessionView<'_>, _notice: Option<&Notice>) {}
}
