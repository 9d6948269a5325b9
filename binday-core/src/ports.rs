//! Traits describing provider capabilities and the shared error type.

use std::error::Error as StdError;
use std::io::Error as IoError;

use async_trait::async_trait;

use crate::model::{AddressQuery, BinCollection, CouncilMeta};

/// Boxed error coming out of a provider's automation backend.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while retrieving collection dates.
pub enum PortError {
    /// The browser could not be launched or stopped responding.
    #[error("Browser error: {0}")]
    Browser(#[source] BoxError),
    /// A required step of the council's web form failed.
    #[error("Form step '{step}' failed: {source}")]
    FormStep {
        /// Short name of the step, e.g. "enter postcode".
        step: &'static str,
        /// Underlying automation error.
        #[source]
        source: BoxError,
    },
    /// The form offered no address for the postcode.
    #[error("Address not found")]
    AddressNotFound,
    /// The council has no registered plugin.
    #[error("Unsupported council")]
    UnsupportedCouncil,
    /// The address query is unusable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Writing a debug artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortError {
    /// Wrap an automation error raised while running `step`.
    #[must_use]
    pub fn form_step<E: Into<BoxError>>(step: &'static str, source: E) -> Self {
        Self::FormStep {
            step,
            source: source.into(),
        }
    }
}

#[async_trait]
/// Trait for council-specific collection date backends.
pub trait CollectionPort: Send + Sync {
    /// Metadata describing the council handled by this port.
    fn council(&self) -> &CouncilMeta;

    /// Look up the upcoming bin collections for a household.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the council's site cannot be driven to the results page.
    async fn collections(&self, query: &AddressQuery) -> Result<Vec<BinCollection>, PortError>;
}
