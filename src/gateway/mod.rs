//! KSeF gateway contract, wire models, and the default HTTP client.
//!
//! The submission flow only talks to [`KsefGateway`]; [`KsefClient`]
//! (feature `http`) is the reqwest implementation used by the binary.

#[cfg(feature = "http")]
mod client;
pub mod models;

use std::future::Future;

use thiserror::Error;

#[cfg(feature = "http")]
pub use client::KsefClient;
pub use models::*;

/// Errors from a remote gateway call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Connection, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// Missing, expired or insufficient access token.
    #[error("unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// The gateway refused the request (HTTP 4xx with an exception body).
    #[error("request rejected (HTTP {status}): {exception}")]
    Rejected {
        status: u16,
        exception: ExceptionResponse,
    },

    /// HTTP 5xx.
    #[error("server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Session and invoice operations of the KSeF gateway.
///
/// Implementations perform a single remote call per method and never retry.
pub trait KsefGateway {
    /// `POST /sessions/online`
    fn open_online_session(
        &self,
        request: &OpenOnlineSessionRequest,
        access_token: &str,
    ) -> impl Future<Output = Result<OpenOnlineSessionResponse, GatewayError>> + Send;

    /// `POST /sessions/online/{sessionReference}/invoices`
    fn send_online_session_invoice(
        &self,
        session_reference: &str,
        request: &SendInvoiceRequest,
        access_token: &str,
    ) -> impl Future<Output = Result<SendInvoiceResponse, GatewayError>> + Send;

    /// `GET /sessions/{sessionReference}/invoices/{invoiceReference}`
    fn session_invoice_status(
        &self,
        session_reference: &str,
        invoice_reference: &str,
        access_token: &str,
    ) -> impl Future<Output = Result<SessionInvoiceStatus, GatewayError>> + Send;

    /// `POST /sessions/online/{sessionReference}/close`
    fn close_online_session(
        &self,
        session_reference: &str,
        access_token: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// `POST /invoices/query/metadata`
    fn query_invoice_metadata(
        &self,
        filters: &InvoiceQueryFilters,
        access_token: &str,
    ) -> impl Future<Output = Result<QueryInvoiceMetadataResponse, GatewayError>> + Send;
}
