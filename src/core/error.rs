use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::template::TemplateError;

/// Errors that can occur while preparing or submitting an invoice.
///
/// Every variant is fatal for a submission run: nothing in this crate retries
/// or compensates, the error is surfaced to the caller as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KsefError {
    /// Missing or invalid settings.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The gateway rejected the authentication attempt.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Template file missing, malformed, or lacking a required element.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// A remote call to the gateway failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The metadata query did not return exactly one matching invoice.
    #[error("expected exactly one invoice with KSeF number {ksef_number}, found {matches}")]
    NotFound { ksef_number: String, matches: usize },

    /// Key generation, encryption or key parsing failed.
    #[error("cryptography error: {0}")]
    Crypto(String),

    /// A monetary value does not fit a `Decimal`.
    #[error("arithmetic overflow: {0}")]
    Arithmetic(String),

    /// Builder encountered invalid or missing input.
    #[error("builder error: {0}")]
    Builder(String),

    /// The overall run did not finish in time.
    #[error("submission did not finish within {0:?}")]
    Timeout(Duration),
}

impl KsefError {
    /// Whether this error came from the gateway rejecting the request outright
    /// (as opposed to a transport failure).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Gateway(GatewayError::Rejected { .. })
                | Self::Gateway(GatewayError::Unauthorized { .. })
        )
    }
}
