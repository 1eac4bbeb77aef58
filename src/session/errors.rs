//! Session errors

use thiserror::Error;

use crate::{
    cart::CartError,
    products::ProductId,
    receipt::ReceiptError,
    session::SessionState,
};

/// Reasons an event was not applied.
///
/// None of these are fatal: a rejected event leaves the session exactly as it
/// was (apart from clearing the scanning flag when a scan completes).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The catalog has no product with this identifier.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart has no line for this identifier.
    #[error("No cart line for product {0}")]
    LineNotFound(ProductId),

    /// The event is not accepted in the current state.
    #[error("{event} is not accepted in state {state}")]
    InvalidTransition {
        /// State the session was in
        state: SessionState,

        /// Name of the rejected event
        event: &'static str,
    },

    /// A scan is already outstanding.
    #[error("A scan is already in progress")]
    ScanInProgress,

    /// Checkout needs at least one cart line.
    #[error("The cart is empty")]
    EmptyCart,

    /// Cart rejected the mutation for another reason.
    #[error(transparent)]
    Cart(CartError),

    /// Receipt could not be generated.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
}

impl From<CartError> for SessionError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(id) => SessionError::ProductNotFound(id),
            CartError::LineNotFound(id) => SessionError::LineNotFound(id),
            other @ CartError::CurrencyMismatch(..) => SessionError::Cart(other),
        }
    }
}

impl SessionError {
    /// Whether the shopper should be told about this error.
    ///
    /// Everything else is only interesting for diagnostics.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SessionError::ProductNotFound(_))
    }
}
