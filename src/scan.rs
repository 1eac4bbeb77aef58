//! Scan input
//!
//! Manual barcode entry and optical camera decodes both end up as a product
//! identifier (or a failure) before they reach the session.

use thiserror::Error;

use crate::products::ProductId;

/// Shortest optical decode accepted as a barcode; shorter reads are noise.
pub const MIN_OPTICAL_LENGTH: usize = 8;

/// Errors produced while normalising scan input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Nothing was entered.
    #[error("Enter a barcode")]
    Empty,

    /// The optical decoder produced a read too short to be a barcode.
    #[error("Decoded barcode {0:?} is too short")]
    TooShort(String),
}

/// Raw input from a scan source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// Text typed into the barcode field.
    Manual(String),

    /// A string decoded from the camera feed.
    Optical(String),
}

impl ScanInput {
    /// Turn raw input into a product identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Empty`] for blank input and
    /// [`ScanError::TooShort`] for optical reads under [`MIN_OPTICAL_LENGTH`].
    pub fn resolve(&self) -> Result<ProductId, ScanError> {
        match self {
            ScanInput::Manual(text) => {
                let text = text.trim();

                if text.is_empty() {
                    return Err(ScanError::Empty);
                }

                Ok(ProductId::from(text))
            }
            ScanInput::Optical(code) => {
                let code = code.trim();

                if code.is_empty() {
                    return Err(ScanError::Empty);
                }

                if code.chars().count() < MIN_OPTICAL_LENGTH {
                    return Err(ScanError::TooShort(code.to_string()));
                }

                Ok(ProductId::from(code))
            }
        }
    }
}

/// A source of scan input, e.g. a keyboard wedge or a camera decoder.
///
/// Sources are polled by the presentation layer; `None` means nothing was
/// read this time.
pub trait ScanSource {
    /// Next available input, if any.
    fn next_input(&mut self) -> Option<ScanInput>;
}

/// Scan source replaying a fixed list of manual entries.
#[derive(Debug, Clone, Default)]
pub struct ScriptedScans {
    inputs: std::collections::VecDeque<ScanInput>,
}

impl ScriptedScans {
    /// Replay `inputs` in order.
    pub fn new(inputs: impl IntoIterator<Item = ScanInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }
}

impl ScanSource for ScriptedScans {
    fn next_input(&mut self) -> Option<ScanInput> {
        self.inputs.pop_front()
    }
}
